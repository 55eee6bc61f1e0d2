//! Status enums for listings and engagement records.
//!
//! Stored values are lowercase, but older documents were written with
//! capitalised values ("Active", "Pending"), so every enum accepts both.

use serde::{Deserialize, Serialize};

/// Listing availability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    /// Visible and available.
    #[default]
    #[serde(alias = "Active")]
    Active,
    /// Application in progress.
    #[serde(alias = "Pending")]
    Pending,
    /// Taken off the market (sale or long-term lease).
    #[serde(alias = "Sold")]
    Sold,
    /// Currently rented.
    #[serde(alias = "Rented")]
    Rented,
    /// Hidden by the owner or an admin instead of deleting it.
    #[serde(alias = "Inactive")]
    Inactive,
}

impl ListingStatus {
    /// All statuses, in the order shown in status pickers.
    pub const ALL: [Self; 5] = [
        Self::Active,
        Self::Pending,
        Self::Sold,
        Self::Rented,
        Self::Inactive,
    ];

    /// Stable lowercase name, as stored and as used in query predicates.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Pending => "pending",
            Self::Sold => "sold",
            Self::Rented => "rented",
            Self::Inactive => "inactive",
        }
    }

    /// Human-readable badge text.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Active => "Available",
            Self::Pending => "Pending",
            Self::Sold => "Sold",
            Self::Rented => "Rented",
            Self::Inactive => "Hidden",
        }
    }
}

impl std::fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ListingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "pending" => Ok(Self::Pending),
            "sold" => Ok(Self::Sold),
            "rented" => Ok(Self::Rented),
            "inactive" => Ok(Self::Inactive),
            other => Err(format!("invalid listing status: {other}")),
        }
    }
}

/// Tour request lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TourStatus {
    #[default]
    #[serde(alias = "Pending")]
    Pending,
    #[serde(alias = "Confirmed")]
    Confirmed,
    #[serde(alias = "Cancelled")]
    Cancelled,
    #[serde(alias = "Completed")]
    Completed,
}

impl TourStatus {
    /// Stable lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        }
    }
}

impl std::fmt::Display for TourStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TourStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "cancelled" => Ok(Self::Cancelled),
            "completed" => Ok(Self::Completed),
            other => Err(format!("invalid tour status: {other}")),
        }
    }
}

/// Agency inquiry triage state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum InquiryStatus {
    #[default]
    #[serde(alias = "New")]
    New,
    #[serde(alias = "Read")]
    Read,
    #[serde(alias = "Replied")]
    Replied,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_status_accepts_legacy_capitalisation() {
        let status: ListingStatus = serde_json::from_str("\"Active\"").unwrap_or_default();
        assert_eq!(status, ListingStatus::Active);
        let status: ListingStatus =
            serde_json::from_str("\"Pending\"").unwrap_or(ListingStatus::Sold);
        assert_eq!(status, ListingStatus::Pending);
    }

    #[test]
    fn test_listing_status_serializes_lowercase() {
        let json = serde_json::to_string(&ListingStatus::Inactive).unwrap_or_default();
        assert_eq!(json, "\"inactive\"");
    }

    #[test]
    fn test_listing_status_from_str() {
        for status in ListingStatus::ALL {
            assert_eq!(status.as_str().parse::<ListingStatus>(), Ok(status));
        }
        assert!("gone".parse::<ListingStatus>().is_err());
    }

    #[test]
    fn test_tour_status_from_str() {
        assert_eq!("Confirmed".parse::<TourStatus>(), Ok(TourStatus::Confirmed));
        assert!("maybe".parse::<TourStatus>().is_err());
    }
}
