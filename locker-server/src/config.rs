//! Server configuration
//!
//! Read once at startup from environment variables. The lock policy, key
//! policy and storage backend are fixed for the lifetime of the process.

use locker_core::domain::KeyPolicy;

use crate::repository::redis::DEFAULT_NAMESPACE;
use crate::service::LockPolicy;

const DEFAULT_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_ALLOW_OVERLOCKING: bool = false;
const DEFAULT_PIPELINES_CASE_SENSITIVE: bool = true;

/// Where lock records are persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    /// Process-local map, lost on restart
    Memory,
    Redis { url: String, namespace: String },
    Postgres { url: String },
}

impl StorageBackend {
    pub fn name(&self) -> &'static str {
        match self {
            StorageBackend::Memory => "memory",
            StorageBackend::Redis { .. } => "redis",
            StorageBackend::Postgres { .. } => "postgres",
        }
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Bind address, e.g. "0.0.0.0:8080" or ":8080"
    pub addr: String,

    /// Whether a lock request may replace a lock held by someone else
    pub allow_overlocking: bool,

    /// When false, project and environment are lower-cased before keying
    pub pipelines_case_sensitive: bool,

    pub storage: StorageBackend,
}

impl Config {
    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - ADDR (optional, default: 0.0.0.0:8080)
    /// - ALLOW_OVERLOCKING (optional, default: false)
    /// - PIPELINES_CASE_SENSITIVE (optional, default: true)
    /// - STORAGE_BACKEND (optional, memory | redis | postgres, default: memory)
    /// - REDIS_URL (required for redis)
    /// - REDIS_KEY_NAMESPACE (optional, default: "pipeline-locker:")
    /// - DATABASE_URL (required for postgres)
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Config::from_env`] over an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let addr = lookup("ADDR").unwrap_or_else(|| DEFAULT_ADDR.to_string());

        let allow_overlocking =
            bool_var(&lookup, "ALLOW_OVERLOCKING", DEFAULT_ALLOW_OVERLOCKING);

        let pipelines_case_sensitive = bool_var(
            &lookup,
            "PIPELINES_CASE_SENSITIVE",
            DEFAULT_PIPELINES_CASE_SENSITIVE,
        );

        let backend = lookup("STORAGE_BACKEND").unwrap_or_else(|| "memory".to_string());
        let storage = match backend.trim().to_ascii_lowercase().as_str() {
            "memory" => StorageBackend::Memory,
            "redis" => StorageBackend::Redis {
                url: lookup("REDIS_URL").ok_or_else(|| {
                    anyhow::anyhow!("REDIS_URL environment variable not set")
                })?,
                namespace: lookup("REDIS_KEY_NAMESPACE")
                    .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string()),
            },
            "postgres" | "postgresql" => StorageBackend::Postgres {
                url: lookup("DATABASE_URL").ok_or_else(|| {
                    anyhow::anyhow!("DATABASE_URL environment variable not set")
                })?,
            },
            other => anyhow::bail!(
                "Unknown STORAGE_BACKEND {:?} (expected memory, redis or postgres)",
                other
            ),
        };

        Ok(Self {
            addr,
            allow_overlocking,
            pipelines_case_sensitive,
            storage,
        })
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        let addr = self.bind_addr();
        let port = addr
            .rsplit_once(':')
            .map(|(_, port)| port)
            .ok_or_else(|| anyhow::anyhow!("addr {:?} has no port", self.addr))?;

        if port.parse::<u16>().is_err() {
            anyhow::bail!("addr {:?} has an invalid port", self.addr);
        }

        match &self.storage {
            StorageBackend::Memory => {}
            StorageBackend::Redis { url, .. } => {
                if !url.starts_with("redis://")
                    && !url.starts_with("rediss://")
                    && !url.starts_with("unix://")
                {
                    anyhow::bail!("REDIS_URL must start with redis://, rediss:// or unix://");
                }
            }
            StorageBackend::Postgres { url } => {
                if !url.starts_with("postgres://") && !url.starts_with("postgresql://") {
                    anyhow::bail!("DATABASE_URL must start with postgres:// or postgresql://");
                }
            }
        }

        Ok(())
    }

    /// Address passed to the listener. A bare ":8080" binds every interface.
    pub fn bind_addr(&self) -> String {
        if self.addr.starts_with(':') {
            format!("0.0.0.0{}", self.addr)
        } else {
            self.addr.clone()
        }
    }

    pub fn key_policy(&self) -> KeyPolicy {
        KeyPolicy {
            case_sensitive: self.pipelines_case_sensitive,
        }
    }

    pub fn lock_policy(&self) -> LockPolicy {
        LockPolicy {
            allow_overlocking: self.allow_overlocking,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
            allow_overlocking: DEFAULT_ALLOW_OVERLOCKING,
            pipelines_case_sensitive: DEFAULT_PIPELINES_CASE_SENSITIVE,
            storage: StorageBackend::Memory,
        }
    }
}

fn bool_var<F>(lookup: &F, key: &str, default: bool) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    let Some(value) = lookup(key) else {
        return default;
    };

    match parse_bool(&value) {
        Some(parsed) => parsed,
        None => {
            tracing::warn!(
                "Failed to parse {} value {:?} as a boolean, falling back to default {}",
                key,
                value,
                default
            );
            default
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}
