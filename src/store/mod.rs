//! Durable string-keyed storage the session manager and ledger persist into.
//!
//! Values are JSON text. Every write replaces the whole value for its key.

pub mod file;
pub mod memory;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::StoreError;

pub use file::FileStore;
pub use memory::MemoryStore;

pub const AUTH_TOKEN_KEY: &str = "authToken";
pub const USER_DATA_KEY: &str = "userData";
pub const USER_DATABASE_KEY: &str = "userDatabase";
pub const PICKUP_REQUESTS_KEY: &str = "pickupRequests";

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    fn backend_tag(&self) -> &'static str;

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError>;

    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Reads and decodes a JSON value, `None` when the key is absent.
pub async fn get_json<T>(store: &dyn KeyValueStore, key: &str) -> Result<Option<T>, StoreError>
where
    T: DeserializeOwned,
{
    match store.get(key).await? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

pub async fn set_json<T>(store: &dyn KeyValueStore, key: &str, value: &T) -> Result<(), StoreError>
where
    T: Serialize + ?Sized,
{
    let raw = serde_json::to_string(value)?;
    store.set(key, raw).await
}

/// Whether a mutation that was already applied in memory also reached the
/// store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Durability {
    Persisted,
    Unpersisted { reason: String },
}

impl Durability {
    pub fn is_persisted(&self) -> bool {
        matches!(self, Durability::Persisted)
    }
}
