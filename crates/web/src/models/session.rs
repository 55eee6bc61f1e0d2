//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};

use okinawa_rentals_core::{AgencyId, UserId, UserProfile, UserRole};

/// Session-stored user identity.
///
/// The role is a snapshot taken at login. Role-gated extractors re-read the
/// profile so that a role change applies on the next request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub uid: UserId,
    pub email: String,
    pub display_name: String,
    pub role: UserRole,
    pub agency_id: Option<AgencyId>,
}

impl CurrentUser {
    /// Name for greetings and the navigation bar.
    #[must_use]
    pub fn name(&self) -> &str {
        if self.display_name.is_empty() {
            self.email.split('@').next().unwrap_or_default()
        } else {
            &self.display_name
        }
    }

    #[must_use]
    pub const fn can_post_listings(&self) -> bool {
        self.role.can_post_listings()
    }

    #[must_use]
    pub const fn can_access_agency_console(&self) -> bool {
        self.role.can_access_agency_console()
    }

    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

impl From<&UserProfile> for CurrentUser {
    fn from(profile: &UserProfile) -> Self {
        Self {
            uid: profile.uid.clone(),
            email: profile.email.clone(),
            display_name: profile.display_name.clone(),
            role: profile.role,
            agency_id: profile.agency_id.clone(),
        }
    }
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_falls_back_to_local_part() {
        let profile = UserProfile {
            email: "kai@example.com".to_string(),
            role: UserRole::Paid,
            ..UserProfile::default()
        };
        let user = CurrentUser::from(&profile);
        assert_eq!(user.name(), "kai");
        assert!(user.can_post_listings());
        assert!(!user.can_access_agency_console());
    }
}
