//! Authentication and role-gating extractors.
//!
//! Not signed in: HTML requests redirect to `/auth/login`, `/api/` requests
//! get 401. Signed in with an insufficient role: HTML requests redirect to
//! `/dashboard`, `/api/` requests get 403. Either way no handler runs, so no
//! partial data is rendered.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use okinawa_rentals_core::UserRole;

use crate::db::users::UserRepository;
use crate::models::{CurrentUser, session_keys};
use crate::state::AppState;

/// Extractor that requires a signed-in user of any role.
///
/// ```rust,ignore
/// async fn dashboard(RequireUser(user): RequireUser) -> impl IntoResponse {
///     format!("Hello, {}!", user.name())
/// }
/// ```
pub struct RequireUser(pub CurrentUser);

/// Signed-in user, if any.
pub struct OptionalUser(pub Option<CurrentUser>);

/// Agency console access: `agency` or `admin`.
pub struct RequireAgency(pub CurrentUser);

/// Admin console access.
pub struct RequireAdmin(pub CurrentUser);

/// May post listings: `paid`, `agency` or `admin`.
pub struct RequirePoster(pub CurrentUser);

/// Why a gated request was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRejection {
    RedirectToLogin,
    Unauthorized,
    RedirectToDashboard,
    Forbidden,
}

impl AuthRejection {
    fn unauthenticated(parts: &Parts) -> Self {
        if is_api(parts) {
            Self::Unauthorized
        } else {
            Self::RedirectToLogin
        }
    }

    fn insufficient_role(parts: &Parts) -> Self {
        if is_api(parts) {
            Self::Forbidden
        } else {
            Self::RedirectToDashboard
        }
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/auth/login").into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
            Self::RedirectToDashboard => Redirect::to("/dashboard").into_response(),
            Self::Forbidden => (StatusCode::FORBIDDEN, "Insufficient role").into_response(),
        }
    }
}

fn is_api(parts: &Parts) -> bool {
    parts.uri.path().starts_with("/api/")
}

async fn session_user(parts: &Parts) -> Option<CurrentUser> {
    let session = parts.extensions.get::<Session>()?;
    session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten()
}

/// Load the session user and check `allowed` against the stored role.
///
/// A profile that has disappeared is treated as signed out.
async fn gated(
    parts: &Parts,
    state: &AppState,
    allowed: fn(UserRole) -> bool,
) -> Result<CurrentUser, AuthRejection> {
    let user = session_user(parts)
        .await
        .ok_or_else(|| AuthRejection::unauthenticated(parts))?;

    let profile = UserRepository::new(state.store())
        .get(&user.uid)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to load profile for role check");
            AuthRejection::insufficient_role(parts)
        })?
        .ok_or_else(|| AuthRejection::unauthenticated(parts))?;

    if !allowed(profile.role) {
        tracing::info!(uid = %user.uid, role = %profile.role, path = %parts.uri.path(), "Role check failed");
        return Err(AuthRejection::insufficient_role(parts));
    }
    Ok(CurrentUser::from(&profile))
}

impl<S> FromRequestParts<S> for RequireUser
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        session_user(parts)
            .await
            .map(Self)
            .ok_or_else(|| AuthRejection::unauthenticated(parts))
    }
}

impl<S> FromRequestParts<S> for OptionalUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(session_user(parts).await))
    }
}

impl FromRequestParts<AppState> for RequireAgency {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        gated(parts, state, UserRole::can_access_agency_console)
            .await
            .map(Self)
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        gated(parts, state, UserRole::is_admin).await.map(Self)
    }
}

impl FromRequestParts<AppState> for RequirePoster {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        gated(parts, state, UserRole::can_post_listings)
            .await
            .map(Self)
    }
}

/// Store the signed-in user in the session, rotating the session id.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Clear the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}

#[cfg(test)]
mod tests {
    use axum::http::Request;

    use super::*;

    fn parts(path: &str) -> Parts {
        let (parts, ()) = Request::builder().uri(path).body(()).unwrap_or_default().into_parts();
        parts
    }

    #[test]
    fn test_rejection_depends_on_path() {
        assert_eq!(
            AuthRejection::unauthenticated(&parts("/agency")),
            AuthRejection::RedirectToLogin
        );
        assert_eq!(
            AuthRejection::unauthenticated(&parts("/api/contact")),
            AuthRejection::Unauthorized
        );
        assert_eq!(
            AuthRejection::insufficient_role(&parts("/admin/users")),
            AuthRejection::RedirectToDashboard
        );
        assert_eq!(
            AuthRejection::insufficient_role(&parts("/api/admin")),
            AuthRejection::Forbidden
        );
    }

    #[test]
    fn test_rejection_responses() {
        let response = AuthRejection::RedirectToDashboard.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()["location"], "/dashboard");
        assert_eq!(
            AuthRejection::Unauthorized.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
    }
}
