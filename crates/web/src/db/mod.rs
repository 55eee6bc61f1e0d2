//! Document store access.
//!
//! Every record lives in a named collection as a schemaless JSON document.
//! Handlers never talk to a store directly; they go through the typed
//! repositories in this module, which hold a `&dyn DocumentStore`.
//!
//! # Implementations
//!
//! - [`PgDocumentStore`] - one `documents` table with a JSONB column
//! - [`MemoryDocumentStore`] - process-local maps for development and tests
//!
//! # Migrations
//!
//! Migrations are stored in `crates/web/migrations/` and run via:
//! ```bash
//! cargo run -p okinawa-rentals-cli -- migrate
//! ```

pub mod activity;
pub mod agencies;
pub mod listings;
pub mod memory;
pub mod postgres;
pub mod tours;
pub mod users;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use okinawa_rentals_core::{Collection, Query};

pub use memory::MemoryDocumentStore;
pub use postgres::PgDocumentStore;

/// Errors returned by the document store and repositories.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored document does not have the expected shape.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested document was not found.
    #[error("not found")]
    NotFound,

    /// A document with the same id already exists.
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// A stored document and its key.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Value,
}

impl Document {
    /// Decode the body into `T`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if a present field has the wrong type.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, RepositoryError> {
        serde_json::from_value(self.data.clone()).map_err(|e| {
            RepositoryError::DataCorruption(format!("document {}: {e}", self.id))
        })
    }
}

/// Encode a record as a JSON object, dropping the `id` key (ids are document keys).
///
/// # Errors
///
/// Returns `RepositoryError::DataCorruption` if the value does not serialize
/// to a JSON object.
pub fn encode<T: Serialize>(value: &T) -> Result<Value, RepositoryError> {
    let mut data = serde_json::to_value(value)
        .map_err(|e| RepositoryError::DataCorruption(format!("encode failed: {e}")))?;
    match data.as_object_mut() {
        Some(map) => {
            map.remove("id");
            Ok(data)
        }
        None => Err(RepositoryError::DataCorruption(
            "documents must be JSON objects".to_string(),
        )),
    }
}

/// Schemaless document storage.
///
/// Reads are snapshots; there are no transactions across documents and
/// concurrent writes to the same document are last-write-wins.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Evaluate `query` once.
    async fn query(&self, query: &Query) -> Result<Vec<Document>, RepositoryError>;

    /// Number of documents matching `query` (ordering and limit ignored).
    async fn count(&self, query: &Query) -> Result<u64, RepositoryError>;

    async fn get(&self, collection: Collection, id: &str)
    -> Result<Option<Document>, RepositoryError>;

    /// Create a document. Fails with `Conflict` if `id` is taken.
    async fn insert(
        &self,
        collection: Collection,
        id: &str,
        data: Value,
    ) -> Result<(), RepositoryError>;

    /// Create or fully replace a document.
    async fn set(&self, collection: Collection, id: &str, data: Value)
    -> Result<(), RepositoryError>;

    /// Shallow-merge top-level `fields` into an existing document.
    /// Fails with `NotFound` if it does not exist.
    async fn merge(
        &self,
        collection: Collection,
        id: &str,
        fields: Value,
    ) -> Result<(), RepositoryError>;

    /// Cheap connectivity check for readiness probes.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Decode every document, skipping (and logging) those that do not fit `T`.
///
/// One malformed record must not blank a whole results page.
pub(crate) fn decode_all<T: DeserializeOwned>(docs: Vec<Document>) -> Vec<(String, T)> {
    docs.into_iter()
        .filter_map(|doc| match doc.decode::<T>() {
            Ok(value) => Some((doc.id, value)),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping undecodable document");
                None
            }
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use okinawa_rentals_core::{Listing, ListingId};

    use super::*;

    #[test]
    fn test_encode_drops_id() {
        let listing = Listing {
            id: ListingId::new("abc"),
            title: "Mihama Flat".to_string(),
            ..Listing::default()
        };
        let data = encode(&listing).unwrap();
        assert!(data.get("id").is_none());
        assert_eq!(data["title"], "Mihama Flat");
    }

    #[test]
    fn test_decode_reports_corruption() {
        let doc = Document {
            id: "l1".to_string(),
            data: json!({ "price": "a lot" }),
        };
        let err = doc.decode::<Listing>().unwrap_err();
        assert!(matches!(err, RepositoryError::DataCorruption(_)));
    }

    #[test]
    fn test_decode_all_skips_bad_documents() {
        let docs = vec![
            Document {
                id: "good".to_string(),
                data: json!({ "title": "ok" }),
            },
            Document {
                id: "bad".to_string(),
                data: json!({ "bedrooms": "three" }),
            },
        ];
        let decoded = decode_all::<Listing>(docs);
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].0, "good");
    }
}
