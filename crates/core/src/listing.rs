//! Listing document shape.
//!
//! Listings are schemaless documents in the store. Every field decodes with a
//! default so that a sparse or partially migrated record still renders; the
//! only hard requirement is that present fields have the right JSON type.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::types::{AgencyId, ListingId, ListingStatus, UserId};

/// Kind of dwelling.
///
/// Unknown values round-trip unchanged through [`ListingType::Other`] so that
/// agency-entered types are never lost on edit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ListingType {
    House,
    Apartment,
    Condo,
    Townhouse,
    Mansion,
    Other(String),
}

impl ListingType {
    /// Known types, in the order shown in filter dropdowns.
    pub const KNOWN: [Self; 5] = [
        Self::House,
        Self::Apartment,
        Self::Condo,
        Self::Townhouse,
        Self::Mansion,
    ];

    /// Stored (lowercase) value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::House => "house",
            Self::Apartment => "apartment",
            Self::Condo => "condo",
            Self::Townhouse => "townhouse",
            Self::Mansion => "mansion",
            Self::Other(other) => other,
        }
    }

    /// Singular display name ("House").
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Other(other) => title_case(other),
            known => title_case(known.as_str()),
        }
    }

    /// Plural heading used on search pages ("Houses").
    ///
    /// Types without a dedicated heading fall back to the generic one.
    #[must_use]
    pub const fn plural_heading(&self) -> &'static str {
        match self {
            Self::House => "Houses",
            Self::Apartment => "Apartments",
            Self::Mansion => "Mansions",
            Self::Condo => "Condos",
            Self::Townhouse => "Townhouses",
            Self::Other(_) => "Homes & Apartments",
        }
    }
}

impl From<String> for ListingType {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "house" => Self::House,
            "apartment" => Self::Apartment,
            "condo" => Self::Condo,
            "townhouse" => Self::Townhouse,
            "mansion" => Self::Mansion,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for ListingType {
    fn from(value: &str) -> Self {
        Self::from(value.to_owned())
    }
}

impl From<ListingType> for String {
    fn from(value: ListingType) -> Self {
        match value {
            ListingType::Other(other) => other,
            known => known.as_str().to_owned(),
        }
    }
}

/// A military installation near the listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct NearbyBase {
    pub name: String,
    /// Driving distance in kilometres.
    pub distance: f64,
    pub shuttle_available: bool,
}

/// A rental unit record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Listing {
    /// Document key. Not stored inside the document body.
    #[serde(skip_serializing_if = "ListingId::is_empty")]
    pub id: ListingId,
    pub title: String,
    pub description: String,
    /// Monthly rent in yen.
    pub price: u64,
    /// Display figure in whole US dollars, entered with the listing.
    #[serde(rename = "priceUSD", skip_serializing_if = "Option::is_none")]
    pub price_usd: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listing_type: Option<ListingType>,
    /// Field name used by older records; queries match either one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_type: Option<ListingType>,
    pub status: ListingStatus,
    pub city: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub location: String,
    /// Slug of the nearest base, e.g. `kadena air base`.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub base: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub nearby_bases: Vec<NearbyBase>,
    pub bedrooms: u32,
    pub bathrooms: f64,
    pub square_meters: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parking_spaces: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year_built: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lease_term: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_deposit: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_money: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agency_fee: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guarantor_fee: Option<u64>,
    pub utilities_included: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub pet_policy: Vec<String>,
    pub featured: bool,
    pub negotiable: bool,
    /// Flat amenity tags. Older records stored them pre-bucketed; those are
    /// flattened on read.
    #[serde(deserialize_with = "flat_amenities")]
    pub amenities: Vec<String>,
    pub images: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub floor_plan: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agency_id: Option<AgencyId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<UserId>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_timestamp"
    )]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_timestamp"
    )]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Listing {
    /// The dwelling type, preferring the current field over the legacy one.
    #[must_use]
    pub const fn kind(&self) -> Option<&ListingType> {
        match (&self.listing_type, &self.property_type) {
            (Some(kind), _) | (None, Some(kind)) => Some(kind),
            (None, None) => None,
        }
    }

    /// Whether `agency_id` owns this listing.
    #[must_use]
    pub fn is_owned_by(&self, agency_id: &AgencyId) -> bool {
        self.agency_id.as_ref() == Some(agency_id)
    }

    /// Text shown under the title: city, falling back to the free-form location.
    #[must_use]
    pub fn location_line(&self) -> String {
        let place = if self.city.is_empty() {
            &self.location
        } else {
            &self.city
        };
        title_case(place)
    }
}

/// Amenities as they may appear in stored documents.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredAmenities {
    Flat(Vec<String>),
    Bucketed(BTreeMap<String, Vec<String>>),
}

fn flat_amenities<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let stored: Option<StoredAmenities> = Option::deserialize(deserializer)?;
    Ok(match stored {
        None => Vec::new(),
        Some(StoredAmenities::Flat(tags)) => tags,
        Some(StoredAmenities::Bucketed(buckets)) => buckets.into_values().flatten().collect(),
    })
}

/// Parse an RFC 3339 timestamp, treating anything unparsable as absent.
pub(crate) fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| {
        DateTime::parse_from_rfc3339(&s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }))
}

/// Capitalise each space- or hyphen-separated word ("okinawa-city" → "Okinawa City").
#[must_use]
pub fn title_case(input: &str) -> String {
    input
        .split([' ', '-'])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect::<String>()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_sparse_document_decodes_with_defaults() {
        let listing: Listing = serde_json::from_value(json!({ "title": "Sunabe Seawall Apt" })).unwrap();
        assert_eq!(listing.title, "Sunabe Seawall Apt");
        assert_eq!(listing.price, 0);
        assert_eq!(listing.price_usd, None);
        assert_eq!(listing.status, ListingStatus::Active);
        assert!(listing.amenities.is_empty());
        assert!(listing.kind().is_none());
    }

    #[test]
    fn test_bucketed_amenities_are_flattened() {
        let listing: Listing = serde_json::from_value(json!({
            "amenities": { "kitchen": ["Gas Stove"], "interior": ["Storage"] }
        }))
        .unwrap();
        assert_eq!(listing.amenities, vec!["Storage", "Gas Stove"]);
    }

    #[test]
    fn test_legacy_property_type_is_used_when_listing_type_missing() {
        let listing: Listing =
            serde_json::from_value(json!({ "propertyType": "House" })).unwrap();
        assert_eq!(listing.kind(), Some(&ListingType::House));
    }

    #[test]
    fn test_unknown_listing_type_roundtrips() {
        let kind = ListingType::from("duplex");
        assert_eq!(kind, ListingType::Other("duplex".to_owned()));
        assert_eq!(String::from(kind), "duplex");
    }

    #[test]
    fn test_unparsable_timestamp_is_absent() {
        let listing: Listing =
            serde_json::from_value(json!({ "createdAt": "last tuesday" })).unwrap();
        assert!(listing.created_at.is_none());
    }

    #[test]
    fn test_id_and_empty_fields_not_serialized() {
        let value = serde_json::to_value(Listing::default()).unwrap();
        assert!(value.get("id").is_none());
        assert!(value.get("priceUSD").is_none());
        assert!(value.get("base").is_none());
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("okinawa-city"), "Okinawa City");
        assert_eq!(title_case("kadena air base"), "Kadena Air Base");
        assert_eq!(title_case(""), "");
    }
}
