//! User profiles and password credentials.
//!
//! Profiles live in `users` keyed by uid. Password hashes live apart from the
//! profile in `credentials`, keyed by the normalised email, so that profile
//! reads never carry a hash.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::instrument;

use okinawa_rentals_core::{
    AgencyId, Collection, Direction, Email, ListingId, Query, UserId, UserProfile, UserRole,
};

use super::{DocumentStore, RepositoryError, decode_all, encode};

/// Stored password credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordCredential {
    pub uid: UserId,
    /// PHC-format argon2 hash.
    pub password_hash: String,
}

/// Repository for the `users` and `credentials` collections.
pub struct UserRepository<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> UserRepository<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if the profile does not decode.
    pub async fn get(&self, uid: &UserId) -> Result<Option<UserProfile>, RepositoryError> {
        let Some(doc) = self.store.get(Collection::Users, uid.as_str()).await? else {
            return Ok(None);
        };
        let mut profile: UserProfile = doc.decode()?;
        profile.uid = uid.clone();
        Ok(Some(profile))
    }

    /// # Errors
    ///
    /// Returns `RepositoryError` if the store cannot be reached.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<UserProfile>, RepositoryError> {
        let query = Query::new(Collection::Users)
            .eq("email", email.as_str())
            .limit(1);
        let docs = self.store.query(&query).await?;
        Ok(decode_all::<UserProfile>(docs)
            .into_iter()
            .next()
            .map(|(id, mut profile)| {
                profile.uid = UserId::new(id);
                profile
            }))
    }

    /// Every profile, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the store cannot be reached.
    pub async fn list(&self) -> Result<Vec<UserProfile>, RepositoryError> {
        let query = Query::new(Collection::Users).order_by("createdAt", Direction::Desc);
        let docs = self.store.query(&query).await?;
        Ok(decode_all::<UserProfile>(docs)
            .into_iter()
            .map(|(id, mut profile)| {
                profile.uid = UserId::new(id);
                profile
            })
            .collect())
    }

    /// Create a profile together with its password credential.
    ///
    /// The credential is written first; a taken email fails with `Conflict`
    /// before any profile exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email is already registered.
    #[instrument(skip(self, password_hash), fields(email = %email))]
    pub async fn create_with_password(
        &self,
        email: &Email,
        display_name: &str,
        password_hash: &str,
    ) -> Result<UserProfile, RepositoryError> {
        let uid = UserId::generate();
        let credential = PasswordCredential {
            uid: uid.clone(),
            password_hash: password_hash.to_string(),
        };
        self.store
            .insert(Collection::Credentials, email.as_str(), encode(&credential)?)
            .await?;

        let now = Utc::now();
        let profile = UserProfile {
            uid: uid.clone(),
            email: email.as_str().to_string(),
            display_name: display_name.trim().to_string(),
            role: UserRole::User,
            agency_id: None,
            created_at: Some(now),
            updated_at: Some(now),
            ..UserProfile::default()
        };
        self.store
            .set(Collection::Users, uid.as_str(), encode(&profile)?)
            .await?;
        tracing::info!(uid = %uid, "User created");
        Ok(profile)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if the credential does not decode.
    pub async fn get_credential(
        &self,
        email: &Email,
    ) -> Result<Option<PasswordCredential>, RepositoryError> {
        match self.store.get(Collection::Credentials, email.as_str()).await? {
            Some(doc) => Ok(Some(doc.decode()?)),
            None => Ok(None),
        }
    }

    /// Change a user's role and, for agency staff, the agency they belong to.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    #[instrument(skip(self))]
    pub async fn set_role(
        &self,
        uid: &UserId,
        role: UserRole,
        agency_id: Option<&AgencyId>,
    ) -> Result<(), RepositoryError> {
        self.store
            .merge(
                Collection::Users,
                uid.as_str(),
                json!({ "role": role, "agencyId": agency_id, "updatedAt": Utc::now() }),
            )
            .await?;
        tracing::info!(role = %role, "User role changed");
        Ok(())
    }

    /// Save the self-service parts of a profile: display name, military
    /// status, contact details and housing preferences. Role, agency and
    /// favorites are untouched.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    #[instrument(skip(self, profile), fields(uid = %profile.uid))]
    pub async fn update_details(&self, profile: &UserProfile) -> Result<(), RepositoryError> {
        self.store
            .merge(
                Collection::Users,
                profile.uid.as_str(),
                json!({
                    "displayName": profile.display_name.trim(),
                    "militaryStatus": profile.military_status,
                    "contact": profile.contact,
                    "preferences": profile.preferences,
                    "updatedAt": Utc::now(),
                }),
            )
            .await?;
        tracing::info!("Profile updated");
        Ok(())
    }

    /// Toggle a favorite. Returns whether the listing is now a favorite.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    pub async fn toggle_favorite(
        &self,
        uid: &UserId,
        listing_id: &ListingId,
    ) -> Result<bool, RepositoryError> {
        let mut profile = self.get(uid).await?.ok_or(RepositoryError::NotFound)?;
        let now_favorite = profile.toggle_favorite(listing_id);
        self.store
            .merge(
                Collection::Users,
                uid.as_str(),
                json!({ "favorites": profile.favorites, "updatedAt": Utc::now() }),
            )
            .await?;
        Ok(now_favorite)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError` if the store cannot be reached.
    pub async fn count(&self) -> Result<u64, RepositoryError> {
        self.store.count(&Query::new(Collection::Users)).await
    }
}
