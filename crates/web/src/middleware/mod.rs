//! HTTP middleware stack.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request span with a `request_id` field)
//! 3. Request ID (records into the span, tags Sentry, echoes the header)
//! 4. Session layer (tower-sessions)
//! 5. Rate limiting on auth and contact endpoints (governor)

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod session;

pub use auth::{
    OptionalUser, RequireAdmin, RequireAgency, RequirePoster, RequireUser, clear_current_user,
    set_current_user,
};
pub use rate_limit::{auth_rate_limiter, contact_rate_limiter};
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
pub use session::create_session_layer;
