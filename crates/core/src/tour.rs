//! Tenant engagement records: tour requests, inquiries and agency activity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::listing::lenient_timestamp;
use crate::types::{
    ActivityId, AgencyId, InquiryId, InquiryStatus, ListingId, TourRequestId, TourStatus, UserId,
};

/// Message used when the requester leaves the field blank.
pub const DEFAULT_TOUR_MESSAGE: &str = "I would like to schedule a tour.";

/// A request to view a listing, stored in `tourRequests`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct TourRequest {
    #[serde(skip_serializing_if = "TourRequestId::is_empty")]
    pub id: TourRequestId,
    pub listing_id: ListingId,
    pub listing_title: String,
    pub listing_location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agency_id: Option<AgencyId>,
    pub user_id: UserId,
    pub user_email: String,
    pub user_name: String,
    pub phone: String,
    pub message: String,
    pub status: TourStatus,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_timestamp"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

/// A question sent to an agency about one of its listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Inquiry {
    #[serde(skip_serializing_if = "InquiryId::is_empty")]
    pub id: InquiryId,
    pub agency_id: AgencyId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listing_id: Option<ListingId>,
    pub name: String,
    pub email: String,
    pub message: String,
    pub status: InquiryStatus,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_timestamp"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

/// Entry in an agency's recent activity feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Activity {
    #[serde(skip_serializing_if = "ActivityId::is_empty")]
    pub id: ActivityId,
    pub agency_id: AgencyId,
    /// Short machine tag, e.g. `listing_updated`.
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_timestamp"
    )]
    pub timestamp: Option<DateTime<Utc>>,
}
