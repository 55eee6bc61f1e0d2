//! User role management.
//!
//! Accounts are created through `/auth/register`; this command promotes
//! them, which is how the first admin is made.

use okinawa_rentals_core::{AgencyId, Email, UserRole};
use okinawa_rentals_web::db::PgDocumentStore;
use okinawa_rentals_web::db::users::UserRepository;

use super::{CliError, connect};

/// Set the role of the account registered with `email`.
///
/// `agency` is stored only for the `agency` role and cleared otherwise.
///
/// # Errors
///
/// Returns `CliError` if the role or email is invalid, the user does not
/// exist, or the database is unreachable.
pub async fn set_role(email: &str, role: &str, agency: Option<&str>) -> Result<(), CliError> {
    let role: UserRole = role
        .parse()
        .map_err(|_| CliError::InvalidRole(role.to_owned()))?;
    let email = Email::parse(email).map_err(|_| CliError::InvalidEmail(email.to_owned()))?;

    if role != UserRole::Agency && agency.is_some() {
        tracing::warn!("--agency only applies to the agency role; ignoring it");
    }
    let agency_id = agency
        .filter(|_| role == UserRole::Agency)
        .map(AgencyId::new);
    if role == UserRole::Agency && agency_id.is_none() {
        tracing::warn!("Agency role without --agency: the console will show no records");
    }

    let store = PgDocumentStore::new(connect().await?);
    let users = UserRepository::new(&store);
    let profile = users
        .get_by_email(&email)
        .await?
        .ok_or_else(|| CliError::UserNotFound(email.to_string()))?;

    users.set_role(&profile.uid, role, agency_id.as_ref()).await?;
    tracing::info!(uid = %profile.uid, email = %email, role = %role, "Role updated");
    Ok(())
}
