//! Okinawa Rentals Core - Domain types and the listing search pipeline.
//!
//! This crate is shared by the `web` server and the `cli` tools:
//!
//! - [`types`] - Newtype IDs, emails, roles and statuses
//! - [`listing`], [`agency`], [`user`], [`tour`] - Document shapes as stored
//! - [`query`] - Store-agnostic query description (predicates, ordering, limit)
//! - [`search`] - URL search parameters to a listings [`query::Query`]
//! - [`shape`] - Listing records to display view models
//! - [`sync`] - Shared hover/selection state between list and map views
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP. Queries are *described* here and *evaluated* by a document
//! store in the `web` crate.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod agency;
pub mod listing;
pub mod query;
pub mod search;
pub mod shape;
pub mod sync;
pub mod tour;
pub mod types;
pub mod user;

pub use agency::{Agency, OfficeHours};
pub use listing::{Listing, ListingType, NearbyBase};
pub use query::{Collection, Direction, FieldValue, Predicate, Query};
pub use search::{SearchParams, SearchSummary};
pub use tour::{Activity, DEFAULT_TOUR_MESSAGE, Inquiry, TourRequest};
pub use types::*;
pub use user::{ContactDetails, HousingPreferences, MilitaryStatus, UserProfile};
