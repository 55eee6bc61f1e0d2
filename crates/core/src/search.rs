//! Listing search: URL parameters to a [`Query`] over `listings`.
//!
//! Each recognised parameter contributes at most one predicate, and the
//! resulting query is the conjunction of exactly those predicates. Blank or
//! unparsable values are ignored rather than rejected, so a hand-edited URL
//! still shows results.

use std::collections::{BTreeMap, HashMap};

use crate::listing::{ListingType, title_case};
use crate::query::{Collection, Query};
use crate::shape::format_yen;

const LOCATION: &[&str] = &["location"];
const CITY: &[&str] = &["city"];
const BASE: &[&str] = &["base", "nearestBase"];
const TYPE: &[&str] = &["propertyType", "listingType"];
const PRICE_RANGE: &[&str] = &["price", "priceRange"];
const MIN_PRICE: &[&str] = &["minPrice"];
const MAX_PRICE: &[&str] = &["maxPrice"];
const BEDROOMS: &[&str] = &["bedrooms", "beds"];
const BATHROOMS: &[&str] = &["bathrooms", "baths"];
const STATUS: &[&str] = &["status"];
const AGENCY: &[&str] = &["agencyId"];

/// Raw search parameters from the query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchParams {
    raw: BTreeMap<String, String>,
}

impl SearchParams {
    /// Build from key/value pairs. Later duplicates replace earlier ones.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            raw: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// First non-blank value among `keys`, trimmed.
    #[must_use]
    pub fn first(&self, keys: &[&str]) -> Option<&str> {
        keys.iter()
            .filter_map(|key| self.raw.get(*key))
            .map(|value| value.trim())
            .find(|value| !value.is_empty())
    }

    fn lowered(&self, keys: &[&str]) -> Option<String> {
        self.first(keys).map(str::to_lowercase)
    }

    #[must_use]
    pub fn location(&self) -> Option<String> {
        self.lowered(LOCATION)
    }

    #[must_use]
    pub fn city(&self) -> Option<String> {
        self.lowered(CITY)
    }

    #[must_use]
    pub fn base(&self) -> Option<String> {
        self.lowered(BASE)
    }

    #[must_use]
    pub fn listing_type(&self) -> Option<String> {
        self.lowered(TYPE)
    }

    #[must_use]
    pub fn status(&self) -> Option<String> {
        self.lowered(STATUS)
    }

    #[must_use]
    pub fn agency_id(&self) -> Option<&str> {
        self.first(AGENCY)
    }

    /// Bounds from `price`/`priceRange`, then overridden by `minPrice`/`maxPrice`.
    ///
    /// In a range, a bound of zero means "unbounded".
    #[must_use]
    pub fn price_bounds(&self) -> (Option<u64>, Option<u64>) {
        let (mut min, mut max) = self
            .first(PRICE_RANGE)
            .map_or((None, None), parse_price_range);
        if let Some(n) = self.first(MIN_PRICE).and_then(parse_count) {
            min = Some(n);
        }
        if let Some(n) = self.first(MAX_PRICE).and_then(parse_count) {
            max = Some(n);
        }
        (min, max)
    }

    #[must_use]
    pub fn min_bedrooms(&self) -> Option<u32> {
        self.first(BEDROOMS)
            .and_then(parse_count)
            .and_then(|n| u32::try_from(n).ok())
    }

    #[must_use]
    pub fn min_bathrooms(&self) -> Option<f64> {
        self.first(BATHROOMS)
            .map(|v| v.trim_end_matches('+'))
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|n| n.is_finite() && *n >= 0.0)
    }

    /// Compile into a query over `listings`.
    #[must_use]
    pub fn to_query(&self) -> Query {
        let mut query = Query::new(Collection::Listings);
        if let Some(location) = self.location() {
            query = query.any_of(["city", "base"], location);
        }
        if let Some(city) = self.city() {
            query = query.eq("city", city);
        }
        if let Some(base) = self.base() {
            query = query.eq("base", base);
        }
        if let Some(kind) = self.listing_type() {
            query = query.any_of(["listingType", "propertyType"], kind);
        }
        let (min, max) = self.price_bounds();
        if let Some(min) = min {
            query = query.gte("price", min);
        }
        if let Some(max) = max {
            query = query.lte("price", max);
        }
        if let Some(beds) = self.min_bedrooms() {
            query = query.gte("bedrooms", beds);
        }
        if let Some(baths) = self.min_bathrooms() {
            query = query.gte("bathrooms", baths);
        }
        if let Some(status) = self.status() {
            query = query.eq("status", status);
        }
        if let Some(agency) = self.agency_id() {
            query = query.eq("agencyId", agency);
        }
        query
    }

    /// True when no recognised parameter is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to_query().predicates.is_empty()
    }
}

impl From<HashMap<String, String>> for SearchParams {
    fn from(map: HashMap<String, String>) -> Self {
        Self::from_pairs(map)
    }
}

/// Parse a non-negative whole number, tolerating a trailing `+` and digit
/// grouping commas (`"3+"`, `"150,000"`).
fn parse_count(value: &str) -> Option<u64> {
    let cleaned: String = value
        .trim()
        .trim_end_matches('+')
        .chars()
        .filter(|c| *c != ',')
        .collect();
    cleaned.parse().ok()
}

/// `"min-max"`, `"min-"`, `"-max"` or `"min"`. Zero bounds are dropped.
fn parse_price_range(value: &str) -> (Option<u64>, Option<u64>) {
    let (min, max) = match value.split_once('-') {
        Some((min, max)) => (parse_count(min), parse_count(max)),
        None => (parse_count(value), None),
    };
    (min.filter(|n| *n > 0), max.filter(|n| *n > 0))
}

/// Page copy derived from the same parameters as the query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchSummary {
    /// e.g. "Houses for Rent in Chatan".
    pub heading: String,
    /// Document `<title>`.
    pub title: String,
    pub meta_description: String,
    /// "Living in Chatan" / "Living near Kadena Air Base".
    pub blurb_title: Option<String>,
    /// Human-readable active filters ("3+ Bedrooms", "¥100,000 - ¥200,000").
    pub chips: Vec<String>,
}

impl SearchSummary {
    #[must_use]
    pub fn from_params(params: &SearchParams) -> Self {
        let kind = params
            .listing_type()
            .map(|t| ListingType::from(t).plural_heading())
            .unwrap_or("Homes & Apartments");

        let (place, blurb_title) = if let Some(city) = params.city() {
            let city = title_case(&city);
            (format!("in {city}"), Some(format!("Living in {city}")))
        } else if let Some(base) = params.base() {
            let base = title_case(&base);
            (format!("near {base}"), Some(format!("Living near {base}")))
        } else if let Some(location) = params.location() {
            let location = title_case(&location);
            (format!("in {location}"), Some(format!("Living in {location}")))
        } else {
            ("in Okinawa".to_owned(), None)
        };

        let heading = format!("{kind} for Rent {place}");
        let mut chips = Vec::new();
        if let Some(beds) = params.min_bedrooms() {
            chips.push(bedroom_text(beds));
        }
        if let Some(text) = price_text(params.price_bounds()) {
            chips.push(text);
        }

        let mut meta_description = format!(
            "Browse {} for rent {place}, with listings close to US military bases.",
            kind.to_lowercase()
        );
        if !chips.is_empty() {
            meta_description.push_str(" Filters: ");
            meta_description.push_str(&chips.join(", "));
            meta_description.push('.');
        }

        Self {
            title: format!("{heading} | Okinawa Rentals"),
            heading,
            meta_description,
            blurb_title,
            chips,
        }
    }
}

/// "1+ Bedroom", "3+ Bedrooms".
#[must_use]
pub fn bedroom_text(beds: u32) -> String {
    if beds == 1 {
        "1+ Bedroom".to_owned()
    } else {
        format!("{beds}+ Bedrooms")
    }
}

/// "¥100,000+", "¥100,000 - ¥200,000", "Up to ¥200,000".
#[must_use]
pub fn price_text(bounds: (Option<u64>, Option<u64>)) -> Option<String> {
    match bounds {
        (Some(min), Some(max)) => Some(format!("{} - {}", format_yen(min), format_yen(max))),
        (Some(min), None) => Some(format!("{}+", format_yen(min))),
        (None, Some(max)) => Some(format!("Up to {}", format_yen(max))),
        (None, None) => None,
    }
}

/// A canned search shown as a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PopularSearch {
    pub label: &'static str,
    pub href: &'static str,
}

pub const POPULAR_SEARCHES: [PopularSearch; 5] = [
    PopularSearch {
        label: "Homes near Kadena",
        href: "/listings?base=kadena+air+base",
    },
    PopularSearch {
        label: "Apartments in Chatan",
        href: "/listings?city=chatan&propertyType=apartment",
    },
    PopularSearch {
        label: "Houses in American Village",
        href: "/listings?city=chatan&propertyType=house",
    },
    PopularSearch {
        label: "Foster Housing",
        href: "/listings?base=camp+foster",
    },
    PopularSearch {
        label: "Luxury Homes",
        href: "/listings?minPrice=300000",
    },
];

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::query::Predicate;

    fn params(pairs: &[(&str, &str)]) -> SearchParams {
        SearchParams::from_pairs(pairs.iter().copied())
    }

    #[test]
    fn test_absent_and_blank_params_add_nothing() {
        assert!(params(&[]).to_query().predicates.is_empty());
        let blank = params(&[("city", "  "), ("bedrooms", ""), ("price", "abc"), ("utm", "x")]);
        assert!(blank.to_query().predicates.is_empty());
        assert!(blank.is_empty());
    }

    #[test]
    fn test_one_predicate_per_present_param() {
        let q = params(&[("city", " Chatan "), ("beds", "3"), ("status", "ACTIVE")]).to_query();
        assert_eq!(q.predicates.len(), 3);
        assert!(q.predicates.contains(&Predicate::Eq {
            field: "city".into(),
            value: "chatan".into()
        }));
        assert!(q.predicates.contains(&Predicate::Eq {
            field: "status".into(),
            value: "active".into()
        }));
    }

    #[test]
    fn test_city_and_type_scenario() {
        let q = params(&[("city", "chatan"), ("propertyType", "house")]).to_query();
        assert!(q.matches(&json!({ "city": "chatan", "listingType": "house" })));
        assert!(q.matches(&json!({ "city": "chatan", "propertyType": "house" })));
        assert!(!q.matches(&json!({ "city": "chatan", "listingType": "apartment" })));
        assert!(!q.matches(&json!({ "city": "naha", "listingType": "house" })));
    }

    #[test]
    fn test_location_matches_city_or_base() {
        let q = params(&[("location", "Kadena Air Base")]).to_query();
        assert!(q.matches(&json!({ "base": "kadena air base" })));
        assert!(q.matches(&json!({ "city": "kadena air base" })));
        assert!(!q.matches(&json!({ "city": "chatan" })));
    }

    #[test]
    fn test_price_range_forms() {
        assert_eq!(
            params(&[("price", "100000-200000")]).price_bounds(),
            (Some(100_000), Some(200_000))
        );
        assert_eq!(params(&[("priceRange", "0-200000")]).price_bounds(), (None, Some(200_000)));
        assert_eq!(params(&[("price", "150000-")]).price_bounds(), (Some(150_000), None));
        assert_eq!(params(&[("price", "-90000")]).price_bounds(), (None, Some(90_000)));
        assert_eq!(params(&[("price", "0-0")]).price_bounds(), (None, None));
        assert_eq!(
            params(&[("price", "100000-200000"), ("minPrice", "120,000")]).price_bounds(),
            (Some(120_000), Some(200_000))
        );
    }

    #[test]
    fn test_bedrooms_and_bathrooms_are_minimums() {
        let q = params(&[("bedrooms", "3+"), ("baths", "1.5")]).to_query();
        assert!(q.matches(&json!({ "bedrooms": 4, "bathrooms": 2 })));
        assert!(!q.matches(&json!({ "bedrooms": 2, "bathrooms": 2 })));
        assert!(!q.matches(&json!({ "bedrooms": 3, "bathrooms": 1 })));
    }

    #[test]
    fn test_primary_key_wins_over_alias() {
        let p = params(&[("base", "camp foster"), ("nearestBase", "kadena air base")]);
        assert_eq!(p.base().as_deref(), Some("camp foster"));
    }

    #[test]
    fn test_summary_city_and_type() {
        let summary = SearchSummary::from_params(&params(&[("city", "chatan"), ("propertyType", "house")]));
        assert_eq!(summary.heading, "Houses for Rent in Chatan");
        assert_eq!(summary.title, "Houses for Rent in Chatan | Okinawa Rentals");
        assert_eq!(summary.blurb_title.as_deref(), Some("Living in Chatan"));
    }

    #[test]
    fn test_summary_base_and_generic_type() {
        let summary = SearchSummary::from_params(&params(&[
            ("base", "kadena air base"),
            ("bedrooms", "1"),
            ("price", "100000-200000"),
        ]));
        assert_eq!(summary.heading, "Homes & Apartments for Rent near Kadena Air Base");
        assert_eq!(summary.blurb_title.as_deref(), Some("Living near Kadena Air Base"));
        assert_eq!(summary.chips, vec!["1+ Bedroom", "¥100,000 - ¥200,000"]);
    }

    #[test]
    fn test_summary_defaults_to_okinawa() {
        let summary = SearchSummary::from_params(&SearchParams::default());
        assert_eq!(summary.heading, "Homes & Apartments for Rent in Okinawa");
        assert!(summary.blurb_title.is_none());
        assert!(summary.chips.is_empty());
    }

    #[test]
    fn test_price_text() {
        assert_eq!(price_text((Some(100_000), None)).as_deref(), Some("¥100,000+"));
        assert_eq!(price_text((None, None)), None);
    }
}
