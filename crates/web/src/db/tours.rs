//! Tour request repository.

use chrono::Utc;
use serde_json::json;
use tracing::instrument;

use okinawa_rentals_core::{
    AgencyId, Collection, Direction, Query, TourRequest, TourRequestId, TourStatus, UserId,
};

use super::{DocumentStore, RepositoryError, decode_all, encode};

/// Repository for the `tourRequests` collection.
pub struct TourRequestRepository<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> TourRequestRepository<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    async fn list(&self, query: Query) -> Result<Vec<TourRequest>, RepositoryError> {
        let docs = self
            .store
            .query(&query.order_by("createdAt", Direction::Desc))
            .await?;
        Ok(decode_all::<TourRequest>(docs)
            .into_iter()
            .map(|(id, mut tour)| {
                tour.id = TourRequestId::new(id);
                tour
            })
            .collect())
    }

    /// Store a new request as `pending`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the write fails.
    #[instrument(skip(self, tour), fields(listing_id = %tour.listing_id))]
    pub async fn create(&self, tour: &TourRequest) -> Result<TourRequestId, RepositoryError> {
        let id = TourRequestId::generate();
        let record = TourRequest {
            status: TourStatus::Pending,
            created_at: Some(Utc::now()),
            ..tour.clone()
        };
        self.store
            .insert(Collection::TourRequests, id.as_str(), encode(&record)?)
            .await?;
        tracing::info!(tour_id = %id, "Tour request created");
        Ok(id)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if the document does not decode.
    pub async fn get(&self, id: &TourRequestId) -> Result<Option<TourRequest>, RepositoryError> {
        let Some(doc) = self.store.get(Collection::TourRequests, id.as_str()).await? else {
            return Ok(None);
        };
        let mut tour: TourRequest = doc.decode()?;
        tour.id = id.clone();
        Ok(Some(tour))
    }

    /// Requests made by one user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the store cannot be reached.
    pub async fn for_user(&self, uid: &UserId) -> Result<Vec<TourRequest>, RepositoryError> {
        self.list(Query::new(Collection::TourRequests).eq("userId", uid.as_str()))
            .await
    }

    /// Requests for one agency's listings, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the store cannot be reached.
    pub async fn for_agency(
        &self,
        agency_id: &AgencyId,
    ) -> Result<Vec<TourRequest>, RepositoryError> {
        self.list(Query::new(Collection::TourRequests).eq("agencyId", agency_id.as_str()))
            .await
    }

    /// Every request, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the store cannot be reached.
    pub async fn all(&self) -> Result<Vec<TourRequest>, RepositoryError> {
        self.list(Query::new(Collection::TourRequests)).await
    }

    /// # Errors
    ///
    /// Returns `RepositoryError` if the store cannot be reached.
    pub async fn count_pending(&self, agency_id: &AgencyId) -> Result<u64, RepositoryError> {
        let query = Query::new(Collection::TourRequests)
            .eq("agencyId", agency_id.as_str())
            .eq("status", TourStatus::Pending.as_str());
        self.store.count(&query).await
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the request does not exist.
    #[instrument(skip(self))]
    pub async fn set_status(
        &self,
        id: &TourRequestId,
        status: TourStatus,
    ) -> Result<(), RepositoryError> {
        self.store
            .merge(
                Collection::TourRequests,
                id.as_str(),
                json!({ "status": status }),
            )
            .await?;
        tracing::info!(status = %status, "Tour request status changed");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use okinawa_rentals_core::ListingId;

    use super::*;
    use crate::db::MemoryDocumentStore;

    fn request(user: &str, agency: &str) -> TourRequest {
        TourRequest {
            listing_id: ListingId::new("l1"),
            user_id: UserId::new(user),
            agency_id: Some(AgencyId::new(agency)),
            status: TourStatus::Confirmed,
            ..TourRequest::default()
        }
    }

    #[tokio::test]
    async fn test_create_forces_pending() {
        let store = MemoryDocumentStore::new();
        let repo = TourRequestRepository::new(&store);
        let id = repo.create(&request("u1", "ag1")).await.unwrap();
        let stored = repo.get(&id).await.unwrap().unwrap();
        assert_eq!(stored.status, TourStatus::Pending);
        assert!(stored.created_at.is_some());
    }

    #[tokio::test]
    async fn test_scoped_listing_and_status() {
        let store = MemoryDocumentStore::new();
        let repo = TourRequestRepository::new(&store);
        let id = repo.create(&request("u1", "ag1")).await.unwrap();
        repo.create(&request("u2", "ag1")).await.unwrap();
        repo.create(&request("u1", "ag2")).await.unwrap();

        assert_eq!(repo.for_user(&UserId::new("u1")).await.unwrap().len(), 2);
        assert_eq!(repo.for_agency(&AgencyId::new("ag1")).await.unwrap().len(), 2);
        assert_eq!(repo.count_pending(&AgencyId::new("ag1")).await.unwrap(), 2);

        repo.set_status(&id, TourStatus::Confirmed).await.unwrap();
        assert_eq!(repo.count_pending(&AgencyId::new("ag1")).await.unwrap(), 1);
    }
}
