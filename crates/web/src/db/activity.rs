//! Agency inquiries and the activity feed.

use chrono::Utc;

use okinawa_rentals_core::{
    Activity, ActivityId, AgencyId, Collection, Direction, Inquiry, InquiryId, InquiryStatus,
    Query,
};

use super::{DocumentStore, RepositoryError, decode_all, encode};

/// Repository for the `activities` collection.
pub struct ActivityRepository<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> ActivityRepository<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    /// Append an entry to an agency's feed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the write fails.
    pub async fn record(
        &self,
        agency_id: &AgencyId,
        kind: &str,
        description: impl Into<String>,
    ) -> Result<(), RepositoryError> {
        let id = ActivityId::generate();
        let activity = Activity {
            id: id.clone(),
            agency_id: agency_id.clone(),
            kind: kind.to_string(),
            description: description.into(),
            timestamp: Some(Utc::now()),
        };
        self.store
            .insert(Collection::Activities, id.as_str(), encode(&activity)?)
            .await
    }

    /// Most recent entries first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the store cannot be reached.
    pub async fn recent(
        &self,
        agency_id: &AgencyId,
        limit: usize,
    ) -> Result<Vec<Activity>, RepositoryError> {
        let query = Query::new(Collection::Activities)
            .eq("agencyId", agency_id.as_str())
            .order_by("timestamp", Direction::Desc)
            .limit(limit);
        let docs = self.store.query(&query).await?;
        Ok(decode_all::<Activity>(docs)
            .into_iter()
            .map(|(id, mut activity)| {
                activity.id = ActivityId::new(id);
                activity
            })
            .collect())
    }
}

/// Repository for the `inquiries` collection.
pub struct InquiryRepository<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> InquiryRepository<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    /// # Errors
    ///
    /// Returns `RepositoryError` if the write fails.
    pub async fn create(&self, inquiry: &Inquiry) -> Result<InquiryId, RepositoryError> {
        let id = InquiryId::generate();
        let record = Inquiry {
            status: InquiryStatus::New,
            created_at: Some(Utc::now()),
            ..inquiry.clone()
        };
        self.store
            .insert(Collection::Inquiries, id.as_str(), encode(&record)?)
            .await?;
        Ok(id)
    }

    /// Unread inquiries for the console badge.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the store cannot be reached.
    pub async fn count_new(&self, agency_id: &AgencyId) -> Result<u64, RepositoryError> {
        let query = Query::new(Collection::Inquiries)
            .eq("agencyId", agency_id.as_str())
            .eq("status", "new");
        self.store.count(&query).await
    }
}
