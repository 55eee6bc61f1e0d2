//! Agency repository.

use tracing::instrument;

use okinawa_rentals_core::{Agency, AgencyId, Collection, Direction, ListingStatus, Query};

use super::listings::ListingRepository;
use super::{DocumentStore, RepositoryError, decode_all, encode};

/// Repository for the `agencies` collection.
pub struct AgencyRepository<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> AgencyRepository<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    /// Every agency, by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the store cannot be reached.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Agency>, RepositoryError> {
        let query = Query::new(Collection::Agencies).order_by("name", Direction::Asc);
        let docs = self.store.query(&query).await?;
        Ok(decode_all::<Agency>(docs)
            .into_iter()
            .map(|(id, mut agency)| {
                agency.id = AgencyId::new(id);
                agency
            })
            .collect())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if the document does not decode.
    pub async fn get(&self, id: &AgencyId) -> Result<Option<Agency>, RepositoryError> {
        let Some(doc) = self.store.get(Collection::Agencies, id.as_str()).await? else {
            return Ok(None);
        };
        let mut agency: Agency = doc.decode()?;
        agency.id = id.clone();
        Ok(Some(agency))
    }

    /// Create or replace an agency under its own id (generated when empty).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the write fails.
    pub async fn save(&self, agency: &Agency) -> Result<AgencyId, RepositoryError> {
        let id = if agency.id.is_empty() {
            AgencyId::generate()
        } else {
            agency.id.clone()
        };
        self.store
            .set(Collection::Agencies, id.as_str(), encode(agency)?)
            .await?;
        tracing::info!(agency_id = %id, "Agency saved");
        Ok(id)
    }

    /// Number of available listings an agency has.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the store cannot be reached.
    pub async fn active_listing_count(&self, id: &AgencyId) -> Result<u64, RepositoryError> {
        let query =
            ListingRepository::agency_query(id).eq("status", ListingStatus::Active.as_str());
        self.store.count(&query).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::db::MemoryDocumentStore;

    #[tokio::test]
    async fn test_list_sorted_by_name_with_ids() {
        let store = MemoryDocumentStore::new();
        let repo = AgencyRepository::new(&store);
        for name in ["Sunabe Realty", "Awase Homes"] {
            repo.save(&Agency {
                name: name.to_string(),
                ..Agency::default()
            })
            .await
            .unwrap();
        }
        let agencies = repo.list().await.unwrap();
        assert_eq!(agencies[0].name, "Awase Homes");
        assert!(!agencies[0].id.is_empty());
    }

    #[tokio::test]
    async fn test_active_listing_count() {
        let store = MemoryDocumentStore::new();
        for (id, status) in [("l1", "active"), ("l2", "sold"), ("l3", "active")] {
            store
                .insert(
                    Collection::Listings,
                    id,
                    json!({ "agencyId": "ag1", "status": status }),
                )
                .await
                .unwrap();
        }
        let repo = AgencyRepository::new(&store);
        assert_eq!(repo.active_listing_count(&AgencyId::new("ag1")).await.unwrap(), 2);
        assert_eq!(repo.active_listing_count(&AgencyId::new("ag2")).await.unwrap(), 0);
    }
}
