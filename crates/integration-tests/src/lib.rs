//! Integration tests for Okinawa Rentals.
//!
//! Each test starts the full web router on an ephemeral port over the
//! in-memory document and session stores, then drives it over HTTP with a
//! cookie-keeping client. No database or SMTP server is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p okinawa-rentals-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `public_pages` - Health checks, search and listing pages
//! - `role_gating` - Redirects for anonymous and under-privileged users
//! - `agency_console` - Agency edits and status changes
//! - `contact_relay` - The `/api/contact` endpoint

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

use reqwest::Client;
use reqwest::redirect::Policy;
use secrecy::SecretString;
use tokio::net::TcpListener;
use tower_sessions::MemoryStore;

use okinawa_rentals_core::{Agency, AgencyId, Email, Listing, UserRole};
use okinawa_rentals_web::config::{LogFormat, StoreConfig, WebConfig};
use okinawa_rentals_web::db::{DocumentStore, MemoryDocumentStore};
use okinawa_rentals_web::db::agencies::AgencyRepository;
use okinawa_rentals_web::db::listings::ListingRepository;
use okinawa_rentals_web::db::users::UserRepository;
use okinawa_rentals_web::middleware::create_session_layer;
use okinawa_rentals_web::state::AppState;

/// Password used for every account registered by the tests.
pub const PASSWORD: &str = "kadena-gate-2-street";

/// A running server plus direct access to its document store.
pub struct TestContext {
    pub base_url: String,
    pub store: Arc<MemoryDocumentStore>,
    /// Cookie-keeping client that does not follow redirects.
    pub client: Client,
}

fn test_config() -> WebConfig {
    WebConfig {
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        base_url: "http://localhost".to_string(),
        session_secret: SecretString::from("q8Vn2xLr7TbW4mZk9PcH3sYf6JdG1uEa"),
        store: StoreConfig::Memory,
        static_dir: PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/../web/static")),
        log_format: LogFormat::Text,
        email: None,
        sentry_dsn: None,
        sentry_environment: None,
    }
}

impl TestContext {
    /// Start a server with an empty store.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot bind or the state cannot be built.
    pub async fn start() -> Self {
        let config = test_config();
        let store = Arc::new(MemoryDocumentStore::new());
        let shared: Arc<dyn DocumentStore> = Arc::clone(&store) as Arc<dyn DocumentStore>;
        let state = AppState::new(config.clone(), shared)
            .expect("state without SMTP always builds");
        let app = okinawa_rentals_web::app(
            state,
            create_session_layer(MemoryStore::default(), &config),
        );

        let listener = TcpListener::bind(SocketAddr::from((Ipv4Addr::LOCALHOST, 0)))
            .await
            .expect("bind ephemeral port");
        let addr = listener.local_addr().expect("listener address");
        tokio::spawn(async move {
            axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
                .await
                .expect("test server");
        });

        Self {
            base_url: format!("http://{addr}"),
            store,
            client: new_client(),
        }
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// A second, signed-out client against the same server.
    #[must_use]
    pub fn anonymous_client(&self) -> Client {
        new_client()
    }

    /// Store an agency under its own id.
    ///
    /// # Panics
    ///
    /// Panics if the write fails.
    pub async fn seed_agency(&self, id: &str, name: &str) -> AgencyId {
        let agency = Agency {
            id: AgencyId::new(id),
            name: name.to_string(),
            ..Agency::default()
        };
        AgencyRepository::new(self.store.as_ref())
            .save(&agency)
            .await
            .expect("seed agency")
    }

    /// Store a listing under its own id.
    ///
    /// # Panics
    ///
    /// Panics if the write fails.
    pub async fn seed_listing(&self, listing: Listing) -> Listing {
        ListingRepository::new(self.store.as_ref())
            .save(&listing)
            .await
            .expect("seed listing");
        listing
    }

    /// Read a listing straight from the store.
    ///
    /// # Panics
    ///
    /// Panics if the listing is missing.
    pub async fn listing(&self, listing: &Listing) -> Listing {
        ListingRepository::new(self.store.as_ref())
            .get(&listing.id)
            .await
            .expect("read listing")
            .expect("listing exists")
    }

    /// Register `email` through the sign-up form, leaving `self.client`
    /// signed in.
    ///
    /// # Panics
    ///
    /// Panics if registration does not redirect to the dashboard.
    pub async fn register(&self, email: &str) {
        let resp = self
            .client
            .post(self.url("/auth/register"))
            .form(&[
                ("email", email),
                ("password", PASSWORD),
                ("password_confirm", PASSWORD),
                ("display_name", "Test Renter"),
            ])
            .send()
            .await
            .expect("register request");
        assert_eq!(location(&resp), Some("/dashboard?success=signed_up"));
    }

    /// Change the role of a registered account, as `rentals-cli users set-role` does.
    ///
    /// # Panics
    ///
    /// Panics if the account does not exist.
    pub async fn set_role(&self, email: &str, role: UserRole, agency: Option<&AgencyId>) {
        let users = UserRepository::new(self.store.as_ref());
        let email = Email::parse(email).expect("valid email");
        let profile = users
            .get_by_email(&email)
            .await
            .expect("read user")
            .expect("user exists");
        users
            .set_role(&profile.uid, role, agency)
            .await
            .expect("set role");
    }
}

fn new_client() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(Policy::none())
        .build()
        .expect("Failed to create HTTP client")
}

/// The `Location` header of a redirect, if any.
#[must_use]
pub fn location(resp: &reqwest::Response) -> Option<&str> {
    resp.headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
}
