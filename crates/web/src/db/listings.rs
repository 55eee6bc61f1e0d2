//! Listing repository.

use chrono::Utc;
use serde_json::json;
use tracing::instrument;

use okinawa_rentals_core::{
    AgencyId, Collection, Direction, Listing, ListingId, ListingStatus, Query, UserId,
};

use super::{DocumentStore, RepositoryError, decode_all, encode};

/// Repository for the `listings` collection.
pub struct ListingRepository<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> ListingRepository<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    /// Run a listings query. Undecodable documents are skipped.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the store cannot be reached.
    #[instrument(skip(self, query), fields(predicates = query.predicates.len()))]
    pub async fn search(&self, query: &Query) -> Result<Vec<Listing>, RepositoryError> {
        let docs = self.store.query(query).await?;
        Ok(decode_all::<Listing>(docs)
            .into_iter()
            .map(|(id, mut listing)| {
                listing.id = ListingId::new(id);
                listing
            })
            .collect())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if the document does not decode.
    pub async fn get(&self, id: &ListingId) -> Result<Option<Listing>, RepositoryError> {
        let Some(doc) = self.store.get(Collection::Listings, id.as_str()).await? else {
            return Ok(None);
        };
        let mut listing: Listing = doc.decode()?;
        listing.id = id.clone();
        Ok(Some(listing))
    }

    /// Store a new listing under a fresh id, stamping both timestamps.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the write fails.
    #[instrument(skip(self, listing), fields(title = %listing.title))]
    pub async fn create(&self, listing: &Listing) -> Result<ListingId, RepositoryError> {
        let id = ListingId::generate();
        let now = Utc::now();
        let record = Listing {
            created_at: Some(now),
            updated_at: Some(now),
            ..listing.clone()
        };
        self.store
            .insert(Collection::Listings, id.as_str(), encode(&record)?)
            .await?;
        tracing::info!(listing_id = %id, "Listing created");
        Ok(id)
    }

    /// Create or replace a listing under its own id. Missing timestamps are
    /// stamped; used by the seed command.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if the listing has no id.
    #[instrument(skip(self, listing), fields(listing_id = %listing.id))]
    pub async fn save(&self, listing: &Listing) -> Result<(), RepositoryError> {
        if listing.id.is_empty() {
            return Err(RepositoryError::DataCorruption(
                "listing id is required".to_string(),
            ));
        }
        let now = Utc::now();
        let record = Listing {
            created_at: listing.created_at.or(Some(now)),
            updated_at: listing.updated_at.or(Some(now)),
            ..listing.clone()
        };
        self.store
            .set(Collection::Listings, listing.id.as_str(), encode(&record)?)
            .await
    }

    /// Replace a listing, refreshing `updatedAt`. Creation metadata is kept
    /// from the stored copy.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the listing does not exist.
    #[instrument(skip(self, listing), fields(listing_id = %listing.id))]
    pub async fn update(&self, listing: &Listing) -> Result<(), RepositoryError> {
        let existing = self.get(&listing.id).await?.ok_or(RepositoryError::NotFound)?;
        let record = Listing {
            created_at: existing.created_at,
            created_by: existing.created_by,
            updated_at: Some(Utc::now()),
            ..listing.clone()
        };
        self.store
            .set(Collection::Listings, listing.id.as_str(), encode(&record)?)
            .await?;
        tracing::info!("Listing updated");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the listing does not exist.
    #[instrument(skip(self))]
    pub async fn set_status(
        &self,
        id: &ListingId,
        status: ListingStatus,
    ) -> Result<(), RepositoryError> {
        self.store
            .merge(
                Collection::Listings,
                id.as_str(),
                json!({ "status": status, "updatedAt": Utc::now() }),
            )
            .await?;
        tracing::info!(status = %status, "Listing status changed");
        Ok(())
    }

    /// Featured, available listings for the home page.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the store cannot be reached.
    pub async fn featured(&self, limit: usize) -> Result<Vec<Listing>, RepositoryError> {
        let query = Query::new(Collection::Listings)
            .eq("featured", true)
            .eq("status", ListingStatus::Active.as_str())
            .order_by("updatedAt", Direction::Desc)
            .limit(limit);
        self.search(&query).await
    }

    /// An agency's listings, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the store cannot be reached.
    pub async fn for_agency(
        &self,
        agency_id: &AgencyId,
        limit: Option<usize>,
    ) -> Result<Vec<Listing>, RepositoryError> {
        let mut query = Self::agency_query(agency_id).order_by("createdAt", Direction::Desc);
        if let Some(limit) = limit {
            query = query.limit(limit);
        }
        self.search(&query).await
    }

    /// Listings a user posted themselves, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the store cannot be reached.
    pub async fn created_by(&self, uid: &UserId) -> Result<Vec<Listing>, RepositoryError> {
        let query = Query::new(Collection::Listings)
            .eq("createdBy", uid.as_str())
            .order_by("createdAt", Direction::Desc);
        self.search(&query).await
    }

    /// All listings, most recently changed first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the store cannot be reached.
    pub async fn all(&self, limit: Option<usize>) -> Result<Vec<Listing>, RepositoryError> {
        let mut query = Query::new(Collection::Listings).order_by("updatedAt", Direction::Desc);
        if let Some(limit) = limit {
            query = query.limit(limit);
        }
        self.search(&query).await
    }

    /// # Errors
    ///
    /// Returns `RepositoryError` if the store cannot be reached.
    pub async fn count(&self, query: &Query) -> Result<u64, RepositoryError> {
        self.store.count(query).await
    }

    /// Query for every listing owned by `agency_id`.
    #[must_use]
    pub fn agency_query(agency_id: &AgencyId) -> Query {
        Query::new(Collection::Listings).eq("agencyId", agency_id.as_str())
    }
}
