//! Account roles and the capabilities they grant.

use serde::{Deserialize, Serialize};

/// Error returned when a role string is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid role: {0} (expected user, paid, agency or admin)")]
pub struct RoleError(pub String);

/// Account role stored on the user profile.
///
/// Roles are ordered by privilege, but capability checks go through the
/// methods below rather than comparisons so a new role cannot silently
/// inherit access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Renter with a free account.
    #[default]
    User,
    /// Renter or private landlord with a paid plan (may post listings).
    Paid,
    /// Real-estate agency staff.
    Agency,
    /// Site administrator.
    Admin,
}

impl UserRole {
    /// All roles, in the order shown in the admin role picker.
    pub const ALL: [Self; 4] = [Self::User, Self::Paid, Self::Agency, Self::Admin];

    /// May create listings through the "list a rental" form.
    #[must_use]
    pub const fn can_post_listings(self) -> bool {
        matches!(self, Self::Paid | Self::Agency | Self::Admin)
    }

    /// May open the agency console.
    #[must_use]
    pub const fn can_access_agency_console(self) -> bool {
        matches!(self, Self::Agency | Self::Admin)
    }

    /// May open the admin console and change other users' roles.
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Stable lowercase name, as stored.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Paid => "paid",
            Self::Agency => "agency",
            Self::Admin => "admin",
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UserRole {
    type Err = RoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Self::User),
            "paid" => Ok(Self::Paid),
            "agency" => Ok(Self::Agency),
            "admin" => Ok(Self::Admin),
            other => Err(RoleError(other.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capabilities() {
        assert!(!UserRole::User.can_post_listings());
        assert!(UserRole::Paid.can_post_listings());
        assert!(!UserRole::Paid.can_access_agency_console());
        assert!(UserRole::Agency.can_access_agency_console());
        assert!(!UserRole::Agency.is_admin());
        assert!(UserRole::Admin.can_access_agency_console());
        assert!(UserRole::Admin.is_admin());
    }

    #[test]
    fn test_from_str_roundtrips_display() {
        for role in UserRole::ALL {
            assert_eq!(role.to_string().parse::<UserRole>(), Ok(role));
        }
        assert_eq!(" Admin ".parse::<UserRole>(), Ok(UserRole::Admin));
        assert!("agent".parse::<UserRole>().is_err());
    }
}
