//! Listing view model.

use serde::Serialize;

use super::amenity::{CategorizedAmenities, categorize};
use super::format::{format_datetime, format_number, format_usd, format_yen};
use crate::listing::{Listing, NearbyBase};
use crate::types::ListingStatus;

/// Everything a card or detail page renders for one listing, pre-formatted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingView {
    pub id: String,
    pub title: String,
    pub description: String,
    pub kind: String,
    pub price_yen: String,
    pub price_usd: String,
    pub bedrooms: String,
    pub bathrooms: String,
    pub area: String,
    pub location: String,
    pub base: String,
    pub nearby_bases: Vec<NearbyBase>,
    pub primary_image: Option<String>,
    pub images: Vec<String>,
    pub amenities: CategorizedAmenities,
    pub status: ListingStatus,
    pub status_label: &'static str,
    pub featured: bool,
    pub agency_id: Option<String>,
    pub lat: f64,
    pub lng: f64,
    /// Move-in costs as (label, amount) pairs; only those recorded.
    pub fees: Vec<(&'static str, String)>,
    pub listed_on: String,
    pub updated_on: String,
}

impl From<&Listing> for ListingView {
    fn from(listing: &Listing) -> Self {
        let fees = [
            ("Security deposit", listing.security_deposit),
            ("Key money", listing.key_money),
            ("Agency fee", listing.agency_fee),
            ("Guarantor fee", listing.guarantor_fee),
        ]
        .into_iter()
        .filter_map(|(label, amount)| amount.map(|n| (label, format_yen(n))))
        .collect();

        Self {
            id: listing.id.to_string(),
            title: if listing.title.is_empty() {
                "Untitled listing".to_owned()
            } else {
                listing.title.clone()
            },
            description: listing.description.clone(),
            kind: listing.kind().map(|k| k.label()).unwrap_or_default(),
            price_yen: format_yen(listing.price),
            price_usd: format_usd(listing.price_usd),
            bedrooms: match listing.bedrooms {
                0 => "Studio".to_owned(),
                1 => "1 bed".to_owned(),
                n => format!("{n} beds"),
            },
            bathrooms: match format_number(listing.bathrooms) {
                n if n == "1" => "1 bath".to_owned(),
                n => format!("{n} baths"),
            },
            area: if listing.square_meters > 0.0 {
                format!("{} m²", format_number(listing.square_meters))
            } else {
                String::new()
            },
            location: listing.location_line(),
            base: crate::listing::title_case(&listing.base),
            nearby_bases: listing.nearby_bases.clone(),
            primary_image: listing.images.first().cloned(),
            images: listing.images.clone(),
            amenities: categorize(&listing.amenities),
            status: listing.status,
            status_label: listing.status.label(),
            featured: listing.featured,
            agency_id: listing.agency_id.as_ref().map(ToString::to_string),
            lat: listing.lat.unwrap_or(0.0),
            lng: listing.lng.unwrap_or(0.0),
            fees,
            listed_on: listing
                .created_at
                .as_ref()
                .map(format_datetime)
                .unwrap_or_default(),
            updated_on: listing
                .updated_at
                .as_ref()
                .map(format_datetime)
                .unwrap_or_default(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::shape::AmenityCategory;

    #[test]
    fn test_view_from_sparse_listing() {
        let view = ListingView::from(&Listing::default());
        assert_eq!(view.title, "Untitled listing");
        assert_eq!(view.price_yen, "¥0");
        assert_eq!(view.price_usd, "$0");
        assert_eq!(view.bedrooms, "Studio");
        assert_eq!(view.area, "");
        assert!(view.primary_image.is_none());
        assert!(view.amenities.is_empty());
        assert_eq!(view.listed_on, "");
        assert!(view.fees.is_empty());
    }

    #[test]
    fn test_view_from_full_listing() {
        let listing: Listing = serde_json::from_value(json!({
            "title": "Chatan Ocean View",
            "price": 150_000,
            "priceUSD": 1000,
            "listingType": "apartment",
            "city": "chatan",
            "bedrooms": 3,
            "bathrooms": 1.5,
            "squareMeters": 85,
            "images": ["/a.jpg", "/b.jpg"],
            "amenities": ["Gas Stove", "Elevator"],
            "keyMoney": 150_000,
            "createdAt": "2025-03-05T10:00:00Z",
            "lat": 26.31
        }))
        .unwrap();
        let view = ListingView::from(&listing);
        assert_eq!(view.price_yen, "¥150,000");
        assert_eq!(view.price_usd, "$1,000");
        assert_eq!(view.kind, "Apartment");
        assert_eq!(view.bedrooms, "3 beds");
        assert_eq!(view.bathrooms, "1.5 baths");
        assert_eq!(view.area, "85 m²");
        assert_eq!(view.location, "Chatan");
        assert_eq!(view.primary_image.as_deref(), Some("/a.jpg"));
        assert_eq!(view.amenities.get(AmenityCategory::Building), ["Elevator"]);
        assert_eq!(view.fees, vec![("Key money", "¥150,000".to_owned())]);
        assert_eq!(view.listed_on, "Mar 5, 2025");
        assert!((view.lng - 0.0).abs() < f64::EPSILON);
    }
}
