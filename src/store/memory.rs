use async_trait::async_trait;
use dashmap::DashMap;

use crate::error::StoreError;
use crate::store::KeyValueStore;

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    fn backend_tag(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryStore;
    use crate::store::{KeyValueStore, get_json, set_json};

    #[tokio::test]
    async fn set_get_remove() {
        let store = MemoryStore::new();
        assert_eq!(store.get("authToken").await.unwrap(), None);

        store.set("authToken", "token_1".to_string()).await.unwrap();
        assert_eq!(
            store.get("authToken").await.unwrap().as_deref(),
            Some("token_1")
        );

        store.remove("authToken").await.unwrap();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn json_helpers_encode_values_as_text() {
        let store = MemoryStore::new();
        set_json(&store, "numbers", &vec![1, 2, 3]).await.unwrap();

        assert_eq!(
            store.get("numbers").await.unwrap().as_deref(),
            Some("[1,2,3]")
        );
        let decoded: Option<Vec<i32>> = get_json(&store, "numbers").await.unwrap();
        assert_eq!(decoded, Some(vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn malformed_json_is_a_serialization_error() {
        let store = MemoryStore::new();
        store.set("numbers", "not json".to_string()).await.unwrap();

        let decoded: Result<Option<Vec<i32>>, _> = get_json(&store, "numbers").await;
        assert!(decoded.is_err());
    }
}
