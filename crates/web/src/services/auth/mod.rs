//! Email and password authentication.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use tracing::instrument;

use okinawa_rentals_core::{Email, UserProfile};

use crate::db::users::UserRepository;
use crate::db::{DocumentStore, RepositoryError};

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Authentication service over the `users` and `credentials` collections.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn DocumentStore) -> Self {
        Self {
            users: UserRepository::new(store),
        }
    }

    /// Register a new `user`-role account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password is too short.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    #[instrument(skip(self, password, display_name))]
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<UserProfile, AuthError> {
        let email = Email::parse(email)?;
        validate_password(password)?;
        let password_hash = hash_password(password)?;

        self.users
            .create_with_password(&email, display_name, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })
    }

    /// Check a password and return the stored profile.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<UserProfile, AuthError> {
        let email = Email::parse(email)?;
        let credential = self
            .users
            .get_credential(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &credential.password_hash)?;

        self.users
            .get(&credential.uid)
            .await?
            .ok_or(AuthError::ProfileMissing)
    }
}

fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters."
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use okinawa_rentals_core::UserRole;

    use super::*;
    use crate::db::MemoryDocumentStore;

    #[test]
    fn test_hash_then_verify() {
        let hash = hash_password("ryukyu-sunset").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("ryukyu-sunset", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong-password", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_short_password_rejected() {
        assert!(matches!(validate_password("short"), Err(AuthError::WeakPassword(_))));
        assert!(validate_password("longenough").is_ok());
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let store = MemoryDocumentStore::new();
        let auth = AuthService::new(&store);
        let created = auth
            .register("Tenant@Example.com", "ryukyu-sunset", "Tenant")
            .await
            .unwrap();
        assert_eq!(created.role, UserRole::User);

        let profile = auth.login("tenant@example.com", "ryukyu-sunset").await.unwrap();
        assert_eq!(profile.uid, created.uid);

        assert!(matches!(
            auth.login("tenant@example.com", "not-the-password").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.login("nobody@example.com", "ryukyu-sunset").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_register_duplicate() {
        let store = MemoryDocumentStore::new();
        let auth = AuthService::new(&store);
        auth.register("a@b.co", "password1", "").await.unwrap();
        assert!(matches!(
            auth.register("A@B.CO", "password2", "").await,
            Err(AuthError::UserAlreadyExists)
        ));
    }
}
