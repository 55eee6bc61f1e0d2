//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                               - Home page (featured listings)
//!
//! # Listings
//! GET  /listings                       - Search results (list + map)
//! GET  /listings/{id}                  - Listing detail
//! POST /listings/{id}/tour             - Request a tour (signed in)
//! POST /listings/{id}/favorite         - Toggle favorite (signed in)
//!
//! # Agencies
//! GET  /agencies                       - Directory (?q=&sort=&order=)
//! GET  /agencies/{id}                  - Agency detail
//!
//! # Contact
//! GET  /contact                        - Contact page
//! POST /api/contact                    - Contact relay (JSON, rate limited)
//!
//! # Auth
//! GET  /auth/login, POST /auth/login   - Login (POST rate limited)
//! GET  /auth/register, POST            - Register (POST rate limited)
//! POST /auth/logout                    - Logout
//!
//! # Signed in
//! GET  /dashboard                      - Favorites, tour requests, own listings
//! GET  /profile, POST                  - Profile and housing preferences
//! GET  /list-a-rental, POST            - New listing (paid, agency, admin)
//!
//! # Agency console (agency, admin)
//! GET  /agency                         - Overview
//! GET  /agency/listings                - Listings
//! GET  /agency/listings/{id}/edit, POST - Edit listing (also paid posters, own listings)
//! POST /agency/listings/{id}/status    - Status flip (also paid posters, own listings)
//! GET  /agency/tours                   - Tour requests
//! POST /agency/tours/{id}/status       - Confirm / cancel
//!
//! # Admin console (admin)
//! GET  /admin                          - Overview
//! GET  /admin/users                    - Users
//! POST /admin/users/{uid}/role         - Role change
//! GET  /admin/listings                 - All listings
//! GET  /admin/agencies                 - Agencies
//! ```

pub mod admin;
pub mod agencies;
pub mod agency;
pub mod auth;
pub mod contact;
pub mod dashboard;
pub mod home;
pub mod listing_form;
pub mod listings;
pub mod profile;

use axum::{
    Router,
    routing::{get, post},
};
use serde::Deserialize;

use crate::middleware::{auth_rate_limiter, contact_rate_limiter};
use crate::state::AppState;

/// Query parameters for flash messages after a redirect.
///
/// Values are message codes, never display text.
#[derive(Debug, Default, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
    pub success: Option<String>,
}

impl MessageQuery {
    #[must_use]
    pub fn error_text(&self) -> Option<String> {
        self.error.as_deref().and_then(message_text).map(String::from)
    }

    #[must_use]
    pub fn success_text(&self) -> Option<String> {
        self.success.as_deref().and_then(message_text).map(String::from)
    }
}

/// Display text for a flash message code. Unknown codes show nothing.
fn message_text(code: &str) -> Option<&'static str> {
    Some(match code {
        "signed_out" => "You have been signed out.",
        "signed_up" => "Welcome! Your account is ready.",
        "session" => "Your session could not be saved. Please try again.",
        "tour_requested" => "Tour request sent. The agency will be in touch.",
        "tour_updated" => "Tour request updated.",
        "favorite_added" => "Saved to your favorites.",
        "favorite_removed" => "Removed from your favorites.",
        "listing_created" => "Your listing is live.",
        "listing_updated" => "Listing saved.",
        "status_updated" => "Listing status updated.",
        "role_updated" => "Role updated.",
        "profile_updated" => "Profile saved.",
        "invalid_status" => "That status is not valid.",
        "invalid_role" => "That role is not valid.",
        "not_owner" => "You can only manage listings you or your agency posted.",
        "not_found" => "That record no longer exists.",
        _ => return None,
    })
}

/// Serialize `value` for embedding inside a `<script>` element.
pub(crate) fn script_json<T: serde::Serialize>(value: &T) -> String {
    match serde_json::to_string(value) {
        Ok(json) => json.replace("</", "<\\/"),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize script data");
            "null".to_string()
        }
    }
}

/// Inline alert shown when a page's reads fail.
pub const LOAD_FAILED: &str = "We couldn't load this data right now.";

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/login",
            get(auth::login_page).merge(post(auth::login).layer(auth_rate_limiter())),
        )
        .route(
            "/register",
            get(auth::register_page).merge(post(auth::register).layer(auth_rate_limiter())),
        )
        .route("/logout", post(auth::logout))
}

fn listing_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(listings::index))
        .route("/{id}", get(listings::show))
        .route("/{id}/tour", post(listings::request_tour))
        .route("/{id}/favorite", post(listings::toggle_favorite))
}

fn agency_directory_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(agencies::index))
        .route("/{id}", get(agencies::show))
}

fn agency_console_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(agency::overview))
        .route("/listings", get(agency::listings))
        .route(
            "/listings/{id}/edit",
            get(agency::edit_page).post(agency::update),
        )
        .route("/listings/{id}/status", post(agency::set_status))
        .route("/tours", get(agency::tours))
        .route("/tours/{id}/status", post(agency::set_tour_status))
}

fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(admin::overview))
        .route("/users", get(admin::users))
        .route("/users/{uid}/role", post(admin::set_role))
        .route("/listings", get(admin::listings))
        .route("/agencies", get(admin::agencies))
}

/// Create all page and API routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .nest("/listings", listing_routes())
        .nest("/agencies", agency_directory_routes())
        .route("/contact", get(contact::contact_page))
        .route(
            "/api/contact",
            post(contact::submit).layer(contact_rate_limiter()),
        )
        .nest("/auth", auth_routes())
        .route("/dashboard", get(dashboard::dashboard))
        .route(
            "/profile",
            get(profile::profile_page).post(profile::update_profile),
        )
        .route(
            "/list-a-rental",
            get(listings::new_listing_page).post(listings::create_listing),
        )
        .nest("/agency", agency_console_routes())
        .nest("/admin", admin_routes())
}
