//! Agency directory filtering and sorting.

use std::cmp::Ordering;

use crate::agency::Agency;
use crate::query::Direction;

/// Column the directory is sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AgencySortKey {
    #[default]
    Name,
    Location,
}

impl AgencySortKey {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Location => "location",
        }
    }

    /// Unknown values fall back to sorting by name.
    #[must_use]
    pub fn parse_lenient(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("location") {
            Self::Location
        } else {
            Self::Name
        }
    }
}

/// Directory view settings from `?q=&sort=&order=`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgencyDirectory {
    pub query: String,
    pub sort: AgencySortKey,
    pub direction: Direction,
}

impl AgencyDirectory {
    #[must_use]
    pub fn new(query: Option<&str>, sort: Option<&str>, order: Option<&str>) -> Self {
        Self {
            query: query.unwrap_or_default().trim().to_owned(),
            sort: sort.map(AgencySortKey::parse_lenient).unwrap_or_default(),
            direction: match order.map(str::trim) {
                Some(o) if o.eq_ignore_ascii_case("desc") => Direction::Desc,
                _ => Direction::Asc,
            },
        }
    }

    /// Case-insensitive substring match over name, location and address.
    #[must_use]
    pub fn matches(&self, agency: &Agency) -> bool {
        if self.query.is_empty() {
            return true;
        }
        let needle = self.query.to_lowercase();
        [&agency.name, &agency.location, &agency.address]
            .into_iter()
            .any(|field| field.to_lowercase().contains(&needle))
    }

    fn compare(&self, a: &Agency, b: &Agency) -> Ordering {
        let key = |agency: &Agency| match self.sort {
            AgencySortKey::Name => agency.name.to_lowercase(),
            AgencySortKey::Location => agency.location.to_lowercase(),
        };
        let ordering = key(a).cmp(&key(b));
        match self.direction {
            Direction::Asc => ordering,
            Direction::Desc => ordering.reverse(),
        }
    }

    /// Filter then sort. Ties keep their input order.
    #[must_use]
    pub fn apply(&self, agencies: &[Agency]) -> Vec<Agency> {
        let mut out: Vec<Agency> = agencies
            .iter()
            .filter(|agency| self.matches(agency))
            .cloned()
            .collect();
        out.sort_by(|a, b| self.compare(a, b));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agency(name: &str, location: &str, address: &str) -> Agency {
        Agency {
            name: name.to_owned(),
            location: location.to_owned(),
            address: address.to_owned(),
            ..Agency::default()
        }
    }

    fn sample() -> Vec<Agency> {
        vec![
            agency("Sunabe Realty", "Chatan", "1-2 Sunabe"),
            agency("Awase Homes", "Kitanakagusuku", "3 Awase"),
            agency("Kadena Housing", "Kadena", "Gate 2 St"),
        ]
    }

    fn names(agencies: &[Agency]) -> Vec<&str> {
        agencies.iter().map(|a| a.name.as_str()).collect()
    }

    #[test]
    fn test_filter_matches_any_field_case_insensitively() {
        let dir = AgencyDirectory::new(Some("GATE"), None, None);
        assert_eq!(names(&dir.apply(&sample())), vec!["Kadena Housing"]);
        let dir = AgencyDirectory::new(Some("chat"), None, None);
        assert_eq!(names(&dir.apply(&sample())), vec!["Sunabe Realty"]);
    }

    #[test]
    fn test_sort_by_name_and_location() {
        let dir = AgencyDirectory::new(None, None, None);
        assert_eq!(
            names(&dir.apply(&sample())),
            vec!["Awase Homes", "Kadena Housing", "Sunabe Realty"]
        );
        let dir = AgencyDirectory::new(None, Some("location"), Some("desc"));
        assert_eq!(
            names(&dir.apply(&sample())),
            vec!["Awase Homes", "Kadena Housing", "Sunabe Realty"]
        );
        let dir = AgencyDirectory::new(None, Some("location"), Some("asc"));
        assert_eq!(
            names(&dir.apply(&sample())),
            vec!["Sunabe Realty", "Kadena Housing", "Awase Homes"]
        );
    }

    #[test]
    fn test_unknown_sort_falls_back_to_name() {
        let dir = AgencyDirectory::new(Some(""), Some("rating"), Some("sideways"));
        assert_eq!(dir.sort, AgencySortKey::Name);
        assert_eq!(dir.direction, Direction::Asc);
    }
}
