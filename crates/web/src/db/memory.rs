//! In-process document store.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use okinawa_rentals_core::{Collection, Query};

use super::{Document, DocumentStore, RepositoryError};

/// Document store backed by in-memory maps. Evaluates queries with
/// [`Query::matches`] and [`Query::compare`].
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<HashMap<Collection, BTreeMap<String, Value>>>,
}

impl MemoryDocumentStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn matching(
        map: Option<&BTreeMap<String, Value>>,
        query: &Query,
    ) -> Vec<Document> {
        let Some(map) = map else {
            return Vec::new();
        };
        let mut docs: Vec<Document> = map
            .iter()
            .filter(|(_, data)| query.matches(data))
            .map(|(id, data)| Document {
                id: id.clone(),
                data: data.clone(),
            })
            .collect();
        docs.sort_by(|a, b| query.compare(&a.data, &b.data));
        docs
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn query(&self, query: &Query) -> Result<Vec<Document>, RepositoryError> {
        let collections = self.collections.read().await;
        let mut docs = Self::matching(collections.get(&query.collection), query);
        if let Some(limit) = query.limit {
            docs.truncate(limit);
        }
        Ok(docs)
    }

    async fn count(&self, query: &Query) -> Result<u64, RepositoryError> {
        let collections = self.collections.read().await;
        let count = collections
            .get(&query.collection)
            .map_or(0, |map| map.values().filter(|data| query.matches(data)).count());
        Ok(u64::try_from(count).unwrap_or(u64::MAX))
    }

    async fn get(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<Option<Document>, RepositoryError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .and_then(|map| map.get(id))
            .map(|data| Document {
                id: id.to_string(),
                data: data.clone(),
            }))
    }

    async fn insert(
        &self,
        collection: Collection,
        id: &str,
        data: Value,
    ) -> Result<(), RepositoryError> {
        let mut collections = self.collections.write().await;
        let map = collections.entry(collection).or_default();
        if map.contains_key(id) {
            return Err(RepositoryError::Conflict(format!("{collection}/{id} exists")));
        }
        map.insert(id.to_string(), data);
        Ok(())
    }

    async fn set(
        &self,
        collection: Collection,
        id: &str,
        data: Value,
    ) -> Result<(), RepositoryError> {
        let mut collections = self.collections.write().await;
        collections
            .entry(collection)
            .or_default()
            .insert(id.to_string(), data);
        Ok(())
    }

    async fn merge(
        &self,
        collection: Collection,
        id: &str,
        fields: Value,
    ) -> Result<(), RepositoryError> {
        let Value::Object(fields) = fields else {
            return Err(RepositoryError::DataCorruption(
                "merge fields must be a JSON object".to_string(),
            ));
        };
        let mut collections = self.collections.write().await;
        let target = collections
            .get_mut(&collection)
            .and_then(|map| map.get_mut(id))
            .and_then(Value::as_object_mut)
            .ok_or(RepositoryError::NotFound)?;
        for (key, value) in fields {
            target.insert(key, value);
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use okinawa_rentals_core::Direction;

    use super::*;

    async fn seeded() -> MemoryDocumentStore {
        let store = MemoryDocumentStore::new();
        for (id, city, price) in [("a", "chatan", 150_000), ("b", "naha", 90_000), ("c", "chatan", 220_000)] {
            store
                .insert(Collection::Listings, id, json!({ "city": city, "price": price }))
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_query_filters_orders_and_limits() {
        let store = seeded().await;
        let query = Query::new(Collection::Listings)
            .eq("city", "chatan")
            .order_by("price", Direction::Desc)
            .limit(1);
        let docs = store.query(&query).await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, "c");
        assert_eq!(store.count(&query).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_insert_conflict() {
        let store = seeded().await;
        let err = store
            .insert(Collection::Listings, "a", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_merge_is_shallow_and_requires_existing() {
        let store = seeded().await;
        store
            .merge(Collection::Listings, "a", json!({ "status": "sold" }))
            .await
            .unwrap();
        let doc = store.get(Collection::Listings, "a").await.unwrap().unwrap();
        assert_eq!(doc.data, json!({ "city": "chatan", "price": 150_000, "status": "sold" }));

        let err = store
            .merge(Collection::Listings, "zzz", json!({ "status": "sold" }))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn test_set_replaces_document() {
        let store = seeded().await;
        store
            .set(Collection::Listings, "a", json!({ "city": "kadena" }))
            .await
            .unwrap();
        let doc = store.get(Collection::Listings, "a").await.unwrap().unwrap();
        assert_eq!(doc.data, json!({ "city": "kadena" }));
    }

    #[tokio::test]
    async fn test_empty_collection() {
        let store = MemoryDocumentStore::new();
        let docs = store.query(&Query::new(Collection::Agencies)).await.unwrap();
        assert!(docs.is_empty());
        assert!(store.get(Collection::Agencies, "x").await.unwrap().is_none());
    }
}
