//! Agency document shape.

use serde::{Deserialize, Serialize};

use crate::types::AgencyId;

/// Opening times as free text, e.g. `"9:00 - 18:00"` or `"Closed"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct OfficeHours {
    pub weekday: String,
    pub saturday: String,
    pub sunday: String,
}

impl OfficeHours {
    /// True when no day has any hours recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.weekday.is_empty() && self.saturday.is_empty() && self.sunday.is_empty()
    }
}

/// A real-estate agency. Listings point at an agency through `agencyId`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Agency {
    #[serde(skip_serializing_if = "AgencyId::is_empty")]
    pub id: AgencyId,
    pub name: String,
    pub description: String,
    pub location: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "OfficeHours::is_empty")]
    pub office_hours: OfficeHours,
    pub languages: Vec<String>,
    pub features: Vec<String>,
    pub areas: Vec<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_agency_decodes_office_hours() {
        let agency: Agency = serde_json::from_value(json!({
            "name": "Chatan Homes",
            "officeHours": { "weekday": "9:00 - 18:00", "sunday": "Closed" }
        }))
        .unwrap();
        assert_eq!(agency.office_hours.weekday, "9:00 - 18:00");
        assert_eq!(agency.office_hours.saturday, "");
        assert!(agency.languages.is_empty());
    }
}
