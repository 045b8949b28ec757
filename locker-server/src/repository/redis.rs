//! Redis pipeline repository
//!
//! Records are stored as JSON strings, without expiration, under
//! `<namespace><canonical key>`. Listing locked pipelines scans every key in
//! the namespace, so its cost grows with the number of pipelines ever
//! written.

use async_trait::async_trait;
use locker_core::domain::{KeyPolicy, Pipeline, PipelineIdentifier};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, Script};

use super::{PipelineRepository, Result, StorageError};

/// Prefix of every key written by the locker
pub const DEFAULT_NAMESPACE: &str = "pipeline-locker:";

const SCAN_BATCH: usize = 100;

/// Sets KEYS[1] to ARGV[1] unless it holds a record with a non-empty owner.
const ACQUIRE_SCRIPT: &str = r#"
local current = redis.call('GET', KEYS[1])
if current then
    local record = cjson.decode(current)
    if type(record.locked_by) == 'string' and record.locked_by ~= '' then
        return 0
    end
end
redis.call('SET', KEYS[1], ARGV[1])
return 1
"#;

#[derive(Clone)]
pub struct RedisPipelineRepository {
    connection: ConnectionManager,
    namespace: String,
    policy: KeyPolicy,
    acquire: Script,
}

impl RedisPipelineRepository {
    /// Opens a managed connection to `url`. The manager reconnects on its own
    /// after connection loss.
    pub async fn connect(url: &str, namespace: &str, policy: KeyPolicy) -> Result<Self> {
        let client = Client::open(url)?;
        let connection = ConnectionManager::new(client).await?;

        tracing::info!("Connected to Redis, key namespace {:?}", namespace);

        Ok(Self::new(connection, namespace, policy))
    }

    pub fn new(connection: ConnectionManager, namespace: &str, policy: KeyPolicy) -> Self {
        Self {
            connection,
            namespace: namespace.to_string(),
            policy,
            acquire: Script::new(ACQUIRE_SCRIPT),
        }
    }

    fn storage_key(&self, identifier: &PipelineIdentifier) -> String {
        format!("{}{}", self.namespace, identifier.key(self.policy))
    }

    async fn find_by_key(&self, key: &str) -> Result<Option<Pipeline>> {
        let mut conn = self.connection.clone();
        let value: Option<String> = conn.get(key).await?;

        value.map(|raw| decode(key, &raw)).transpose()
    }

    /// Every key in the namespace. A failing SCAN page aborts the whole scan.
    async fn scan_keys(&self) -> Result<Vec<String>> {
        let mut conn = self.connection.clone();
        let pattern = format!("{}*", escape_glob(&self.namespace));
        let mut cursor: u64 = 0;
        let mut keys = Vec::new();

        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await?;

            keys.extend(batch);

            if next == 0 {
                break;
            }
            cursor = next;
        }

        // SCAN may return a key more than once
        keys.sort_unstable();
        keys.dedup();

        Ok(keys)
    }
}

#[async_trait]
impl PipelineRepository for RedisPipelineRepository {
    async fn find(&self, identifier: &PipelineIdentifier) -> Result<Option<Pipeline>> {
        self.find_by_key(&self.storage_key(identifier)).await
    }

    async fn add(&self, pipeline: Pipeline) -> Result<()> {
        let key = self.storage_key(&pipeline.identifier);
        let payload = encode(&key, &pipeline)?;

        let mut conn = self.connection.clone();
        let _: () = conn.set(&key, payload).await?;

        Ok(())
    }

    async fn try_acquire(&self, pipeline: Pipeline) -> Result<bool> {
        let key = self.storage_key(&pipeline.identifier);
        let payload = encode(&key, &pipeline)?;

        let mut conn = self.connection.clone();
        let acquired: i64 = self
            .acquire
            .key(&key)
            .arg(&payload)
            .invoke_async(&mut conn)
            .await?;

        Ok(acquired == 1)
    }

    async fn find_locked_pipelines(&self) -> Result<Vec<Pipeline>> {
        let keys = self.scan_keys().await?;
        tracing::debug!("Scanned {} pipeline keys", keys.len());

        let mut locked = Vec::new();
        for key in keys {
            // Skips keys that disappeared after the scan
            if let Some(pipeline) = self.find_by_key(&key).await? {
                if pipeline.is_locked() {
                    locked.push(pipeline);
                }
            }
        }

        Ok(locked)
    }
}

fn encode(key: &str, pipeline: &Pipeline) -> Result<String> {
    serde_json::to_string(pipeline).map_err(|source| StorageError::Serialization {
        key: key.to_string(),
        source,
    })
}

fn decode(key: &str, raw: &str) -> Result<Pipeline> {
    serde_json::from_str(raw).map_err(|source| StorageError::Serialization {
        key: key.to_string(),
        source,
    })
}

/// Escapes glob metacharacters so the namespace matches literally in SCAN.
fn escape_glob(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_escape_glob() {
        assert_eq!(escape_glob("pipeline-locker:"), "pipeline-locker:");
        assert_eq!(escape_glob("a*b?[c]\\"), "a\\*b\\?\\[c\\]\\\\");
    }

    #[test]
    fn test_decode_malformed_value_is_storage_error() {
        let err = decode("pipeline-locker:k", "not json").unwrap_err();
        assert!(matches!(err, StorageError::Serialization { ref key, .. } if key == "pipeline-locker:k"));
    }

    #[test]
    fn test_encoded_record_is_flat() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let pipeline = Pipeline::locked(PipelineIdentifier::new("area51", "prod"), "bob", at);

        let raw = encode("k", &pipeline).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();

        assert_eq!(
            value,
            serde_json::json!({
                "project": "area51",
                "environment": "prod",
                "locked_by": "bob",
                "locked_at": "2024-05-01T12:00:00Z",
            })
        );
        assert_eq!(decode("k", &raw).unwrap(), pipeline);
    }

    // Requires a Redis server: REDIS_URL=redis://127.0.0.1/ cargo test -- --ignored

    async fn test_repository(name: &str, policy: KeyPolicy) -> RedisPipelineRepository {
        let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1/".to_string());
        let namespace = format!("locker-test:{}:{}:", std::process::id(), name);
        let repository = RedisPipelineRepository::connect(&url, &namespace, policy)
            .await
            .expect("Failed to connect to Redis");

        let mut conn = repository.connection.clone();
        for key in repository.scan_keys().await.unwrap() {
            let _: () = conn.del(key).await.unwrap();
        }

        repository
    }

    #[tokio::test]
    #[ignore = "requires a running Redis server"]
    async fn test_add_then_find_round_trips() {
        let repository = test_repository("round-trip", KeyPolicy::default()).await;
        let pipeline = Pipeline::locked(
            PipelineIdentifier::new("area51", "production"),
            "bob",
            Utc::now(),
        );

        repository.add(pipeline.clone()).await.unwrap();
        let found = repository.find(&pipeline.identifier).await.unwrap();

        assert_eq!(found, Some(pipeline));
    }

    #[tokio::test]
    #[ignore = "requires a running Redis server"]
    async fn test_find_missing_returns_none() {
        let repository = test_repository("missing", KeyPolicy::default()).await;
        let found = repository
            .find(&PipelineIdentifier::new("nope", "nope"))
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    #[ignore = "requires a running Redis server"]
    async fn test_try_acquire_and_list_locked() {
        let repository = test_repository("acquire", KeyPolicy::case_insensitive()).await;
        let first = Pipeline::locked(PipelineIdentifier::new("Area51", "Prod"), "alice", Utc::now());
        let second = Pipeline::locked(PipelineIdentifier::new("area51", "prod"), "bob", Utc::now());
        let other = Pipeline::locked(PipelineIdentifier::new("hangar", "prod"), "carol", Utc::now());

        assert!(repository.try_acquire(first.clone()).await.unwrap());
        assert!(!repository.try_acquire(second.clone()).await.unwrap());
        assert!(repository.try_acquire(other.clone()).await.unwrap());

        repository
            .add(Pipeline::unlocked(other.identifier.clone()))
            .await
            .unwrap();

        let locked = repository.find_locked_pipelines().await.unwrap();
        assert_eq!(locked, vec![first]);

        assert!(repository.try_acquire(other).await.unwrap());
    }

    #[tokio::test]
    #[ignore = "requires a running Redis server"]
    async fn test_malformed_record_fails_listing() {
        let repository = test_repository("malformed", KeyPolicy::default()).await;
        let valid = Pipeline::locked(PipelineIdentifier::new("area51", "prod"), "bob", Utc::now());
        repository.add(valid).await.unwrap();

        let broken_key = format!("{}broken", repository.namespace);
        let mut conn = repository.connection.clone();
        let _: () = conn.set(&broken_key, "not json").await.unwrap();

        let err = repository.find_locked_pipelines().await.unwrap_err();
        assert!(matches!(err, StorageError::Serialization { ref key, .. } if *key == broken_key));
    }
}
