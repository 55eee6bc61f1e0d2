//! Amenity buckets.
//!
//! Listings store a flat list of amenity tags. Pages group them into seven
//! fixed buckets by table lookup; tags found in no table land in
//! [`AmenityCategory::Other`]. Lookup ignores ASCII case and surrounding
//! whitespace. Tables must stay disjoint under that comparison.

use serde::Serialize;

pub const INTERIOR: &[&str] = &[
    "Air Conditioning",
    "Heating",
    "Washer/Dryer",
    "Washer/Dryer Hookups",
    "Walk-in Closet",
    "Storage",
    "Furnished",
    "Hardwood Floors",
    "Carpet",
    "Ceiling Fan",
];

pub const BATHROOM: &[&str] = &[
    "Unit Bath",
    "Separate Bath/Shower",
    "Double Sink",
    "Toilet with Washlet",
    "Vanity Mirror",
];

pub const KITCHEN: &[&str] = &[
    "Full Kitchen",
    "IH Stove",
    "Gas Stove",
    "Dishwasher",
    "Microwave",
    "Refrigerator",
    "Counter Space",
    "Island Kitchen",
];

pub const BUILDING: &[&str] = &[
    "Elevator",
    "Auto-lock",
    "Mail Box",
    "Bicycle Parking",
    "Trash Room",
    "Common Area",
    "Rooftop Access",
];

pub const UTILITY: &[&str] = &[
    "Internet Ready",
    "Cable Ready",
    "Water Included",
    "Gas Included",
    "Electricity Included",
    "Internet Included",
];

pub const SECURITY: &[&str] = &[
    "Security Camera",
    "Security Guard",
    "Intercom",
    "Double Lock",
    "Key Card Access",
];

pub const LOCATION: &[&str] = &[
    "Near Train Station",
    "Near Bus Stop",
    "Near Supermarket",
    "Near School",
    "Near Park",
    "Near Hospital",
    "Near Shopping",
    "Near Restaurant",
    "Quiet Area",
    "Safe Neighborhood",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AmenityCategory {
    Interior,
    Bathroom,
    Kitchen,
    Building,
    Utility,
    Security,
    Location,
    Other,
}

impl AmenityCategory {
    /// Display order.
    pub const ALL: [Self; 8] = [
        Self::Interior,
        Self::Bathroom,
        Self::Kitchen,
        Self::Building,
        Self::Utility,
        Self::Security,
        Self::Location,
        Self::Other,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Interior => "Interior",
            Self::Bathroom => "Bathroom",
            Self::Kitchen => "Kitchen",
            Self::Building => "Building",
            Self::Utility => "Utilities",
            Self::Security => "Security",
            Self::Location => "Location",
            Self::Other => "Other",
        }
    }

    /// Membership table. `Other` has none.
    #[must_use]
    pub const fn table(self) -> &'static [&'static str] {
        match self {
            Self::Interior => INTERIOR,
            Self::Bathroom => BATHROOM,
            Self::Kitchen => KITCHEN,
            Self::Building => BUILDING,
            Self::Utility => UTILITY,
            Self::Security => SECURITY,
            Self::Location => LOCATION,
            Self::Other => &[],
        }
    }

    /// Bucket for a single tag.
    #[must_use]
    pub fn of(tag: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|category| lookup(category.table(), tag).is_some())
            .unwrap_or(Self::Other)
    }

    const fn index(self) -> usize {
        self as usize
    }
}

fn lookup(table: &'static [&'static str], tag: &str) -> Option<&'static str> {
    let tag = tag.trim();
    table.iter().copied().find(|known| known.eq_ignore_ascii_case(tag))
}

/// Table spelling of a known tag, e.g. `"washer/dryer"` to `"Washer/Dryer"`.
#[must_use]
pub fn canonical(tag: &str) -> Option<&'static str> {
    AmenityCategory::ALL
        .into_iter()
        .find_map(|category| lookup(category.table(), tag))
}

/// Tags grouped by bucket, each bucket in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CategorizedAmenities {
    buckets: [Vec<String>; 8],
}

impl CategorizedAmenities {
    #[must_use]
    pub fn get(&self, category: AmenityCategory) -> &[String] {
        self.buckets
            .get(category.index())
            .map_or(&[][..], Vec::as_slice)
    }

    /// Non-empty buckets in display order.
    pub fn iter(&self) -> impl Iterator<Item = (AmenityCategory, &[String])> {
        AmenityCategory::ALL
            .into_iter()
            .map(|category| (category, self.get(category)))
            .filter(|(_, tags)| !tags.is_empty())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All tags, bucket by bucket.
    #[must_use]
    pub fn flatten(&self) -> Vec<String> {
        self.buckets.iter().flatten().cloned().collect()
    }
}

/// Group `tags` into buckets.
///
/// Total: every input tag lands in exactly one bucket, duplicates included.
#[must_use]
pub fn categorize(tags: &[String]) -> CategorizedAmenities {
    let mut out = CategorizedAmenities::default();
    for tag in tags {
        if let Some(bucket) = out.buckets.get_mut(AmenityCategory::of(tag).index()) {
            bucket.push(tag.clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn tags(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn test_tables_are_disjoint() {
        let mut seen = HashSet::new();
        for category in AmenityCategory::ALL {
            for tag in category.table() {
                assert!(
                    seen.insert(tag.to_ascii_lowercase()),
                    "{tag} appears in more than one table"
                );
            }
        }
    }

    #[test]
    fn test_categorize_known_and_unknown() {
        let grouped = categorize(&tags(&["Gas Stove", "Intercom", "Rooftop Pool", "Storage"]));
        assert_eq!(grouped.get(AmenityCategory::Kitchen), ["Gas Stove"]);
        assert_eq!(grouped.get(AmenityCategory::Security), ["Intercom"]);
        assert_eq!(grouped.get(AmenityCategory::Interior), ["Storage"]);
        assert_eq!(grouped.get(AmenityCategory::Other), ["Rooftop Pool"]);
        assert!(grouped.get(AmenityCategory::Bathroom).is_empty());
    }

    #[test]
    fn test_categorize_is_total() {
        let input = tags(&["Elevator", "Elevator", "Near Park", "mystery", "Water Included"]);
        let grouped = categorize(&input);
        assert_eq!(grouped.len(), input.len());
        let mut flat = grouped.flatten();
        let mut expected = input;
        flat.sort();
        expected.sort();
        assert_eq!(flat, expected);
    }

    #[test]
    fn test_categorize_is_idempotent() {
        let input = tags(&["Near Park", "Heating", "Unit Bath", "Pool", "Heating"]);
        let once = categorize(&input);
        let twice = categorize(&once.flatten());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_lookup_ignores_case_and_keeps_text() {
        let grouped = categorize(&tags(&["elevator", "Elevator", " washer/dryer ", "washer"]));
        assert_eq!(grouped.get(AmenityCategory::Building), ["elevator", "Elevator"]);
        assert_eq!(grouped.get(AmenityCategory::Interior), [" washer/dryer "]);
        assert_eq!(grouped.get(AmenityCategory::Other), ["washer"]);
        assert_eq!(categorize(&grouped.flatten()), grouped);
    }

    #[test]
    fn test_canonical() {
        assert_eq!(canonical("security camera"), Some("Security Camera"));
        assert_eq!(canonical("IH STOVE"), Some("IH Stove"));
        assert_eq!(canonical("Rooftop Pool"), None);
    }

    #[test]
    fn test_iter_skips_empty_buckets_in_order() {
        let grouped = categorize(&tags(&["Near Park", "Heating"]));
        let order: Vec<_> = grouped.iter().map(|(c, _)| c.label()).collect();
        assert_eq!(order, vec!["Interior", "Location"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(categorize(&[]).is_empty());
    }
}
