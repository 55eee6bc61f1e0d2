//! User profile document shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::listing::lenient_timestamp;
use crate::types::{AgencyId, ListingId, UserId, UserRole};

/// How the account holder relates to the bases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MilitaryStatus {
    Active,
    Dependent,
    Civilian,
    Contractor,
}

impl MilitaryStatus {
    pub const ALL: [Self; 4] = [Self::Active, Self::Dependent, Self::Civilian, Self::Contractor];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Dependent => "dependent",
            Self::Civilian => "civilian",
            Self::Contractor => "contractor",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Active => "Active duty",
            Self::Dependent => "Dependent",
            Self::Civilian => "DoD civilian",
            Self::Contractor => "Contractor",
        }
    }

    /// Parse a stored or submitted value. Unknown values give `None`.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(raw))
    }
}

/// Ways an agency can reach the account holder besides email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_id: Option<String>,
}

/// What the account holder is looking for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct HousingPreferences {
    /// Lowercased, matching the stored listing `base`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub near_base: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_budget: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_bedrooms: Option<u32>,
    pub pet_friendly: bool,
}

impl HousingPreferences {
    /// Search parameters that reproduce these preferences on `/listings`.
    #[must_use]
    pub fn search_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(base) = &self.near_base {
            pairs.push(("base", base.clone()));
        }
        if let Some(max) = self.max_budget {
            pairs.push(("maxPrice", max.to_string()));
        }
        if let Some(bedrooms) = self.min_bedrooms {
            pairs.push(("bedrooms", bedrooms.to_string()));
        }
        pairs
    }
}

/// Profile stored in the `users` collection, keyed by `uid`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    pub uid: UserId,
    pub email: String,
    pub display_name: String,
    pub role: UserRole,
    /// Agency the account works for (agency role only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agency_id: Option<AgencyId>,
    pub favorites: Vec<ListingId>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient_status")]
    pub military_status: Option<MilitaryStatus>,
    pub contact: ContactDetails,
    pub preferences: HousingPreferences,
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

impl UserProfile {
    #[must_use]
    pub fn has_favorite(&self, listing_id: &ListingId) -> bool {
        self.favorites.contains(listing_id)
    }

    /// Add or remove `listing_id` from favorites. Returns whether it is now a favorite.
    pub fn toggle_favorite(&mut self, listing_id: &ListingId) -> bool {
        if let Some(pos) = self.favorites.iter().position(|id| id == listing_id) {
            self.favorites.remove(pos);
            false
        } else {
            self.favorites.push(listing_id.clone());
            true
        }
    }

    /// Name to greet the user with, falling back to the email local part.
    #[must_use]
    pub fn greeting_name(&self) -> &str {
        if self.display_name.is_empty() {
            self.email.split('@').next().unwrap_or_default()
        } else {
            &self.display_name
        }
    }
}

/// Unknown statuses read as unset rather than failing the whole profile.
fn lenient_status<'de, D>(deserializer: D) -> Result<Option<MilitaryStatus>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(MilitaryStatus::parse))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_missing_role_defaults_to_user() {
        let profile: UserProfile =
            serde_json::from_value(json!({ "uid": "u1", "email": "a@b.co" })).unwrap();
        assert_eq!(profile.role, UserRole::User);
        assert_eq!(profile.greeting_name(), "a");
    }

    #[test]
    fn test_toggle_favorite() {
        let mut profile = UserProfile::default();
        let id = ListingId::new("l1");
        assert!(profile.toggle_favorite(&id));
        assert!(profile.has_favorite(&id));
        assert!(!profile.toggle_favorite(&id));
        assert!(profile.favorites.is_empty());
    }

    #[test]
    fn test_profile_sections_default_and_tolerate_unknown_status() {
        let profile: UserProfile = serde_json::from_value(json!({
            "email": "a@b.co",
            "militaryStatus": "retired",
            "preferences": { "nearBase": "camp foster", "maxBudget": 180000 }
        }))
        .unwrap();
        assert_eq!(profile.military_status, None);
        assert_eq!(profile.contact, ContactDetails::default());
        assert_eq!(profile.preferences.near_base.as_deref(), Some("camp foster"));
        assert!(!profile.preferences.pet_friendly);

        let profile: UserProfile =
            serde_json::from_value(json!({ "militaryStatus": "Dependent" })).unwrap();
        assert_eq!(profile.military_status, Some(MilitaryStatus::Dependent));
    }

    #[test]
    fn test_preferences_search_pairs() {
        assert!(HousingPreferences::default().search_pairs().is_empty());
        let prefs = HousingPreferences {
            near_base: Some("kadena air base".to_string()),
            max_budget: Some(200_000),
            min_bedrooms: Some(3),
            pet_friendly: true,
        };
        assert_eq!(
            prefs.search_pairs(),
            vec![
                ("base", "kadena air base".to_string()),
                ("maxPrice", "200000".to_string()),
                ("bedrooms", "3".to_string()),
            ]
        );
    }
}
