use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("flag store I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("flag store is corrupt: {0}")]
    Json(#[from] serde_json::Error),
}

/// Small string key/value store for local flags.
pub trait FlagStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn clear(&self, key: &str) -> Result<(), StoreError>;
}

#[derive(Debug, Default)]
pub struct MemoryFlagStore {
    flags: DashMap<String, String>,
}

impl MemoryFlagStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FlagStore for MemoryFlagStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.flags.get(key).map(|entry| entry.clone()))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.flags.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn clear(&self, key: &str) -> Result<(), StoreError> {
        self.flags.remove(key);
        Ok(())
    }
}

/// Flags kept in a JSON object on disk. A missing file reads as empty.
#[derive(Debug)]
pub struct FileFlagStore {
    path: PathBuf,
    // serializa read-modify-write
    write_lock: Mutex<()>,
}

impl FileFlagStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    fn load(&self) -> Result<BTreeMap<String, String>, StoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, flags: &BTreeMap<String, String>) -> Result<(), StoreError> {
        std::fs::write(&self.path, serde_json::to_vec_pretty(flags)?)?;
        Ok(())
    }
}

impl FlagStore for FileFlagStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock();
        let mut flags = self.load()?;
        flags.insert(key.to_string(), value.to_string());
        self.save(&flags)
    }

    fn clear(&self, key: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock();
        let mut flags = self.load()?;
        if flags.remove(key).is_some() {
            self.save(&flags)?;
        }
        Ok(())
    }
}

pub const DEFAULT_SESSION_KEY: &str = "checkout_account_active";

/// Explicit replacement for an ambient "logged in" flag.
#[derive(Clone)]
pub struct AuthSession {
    store: Arc<dyn FlagStore>,
    key: String,
}

impl AuthSession {
    pub fn new(store: Arc<dyn FlagStore>) -> Self {
        Self::with_key(store, DEFAULT_SESSION_KEY)
    }

    pub fn with_key(store: Arc<dyn FlagStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn is_authenticated(&self) -> Result<bool, StoreError> {
        Ok(self.store.get(&self.key)?.as_deref() == Some("true"))
    }

    pub fn sign_in(&self) -> Result<(), StoreError> {
        info!("Session flag {} set", self.key);
        self.store.set(&self.key, "true")
    }

    pub fn sign_out(&self) -> Result<(), StoreError> {
        info!("Session flag {} cleared", self.key);
        self.store.clear(&self.key)
    }
}
