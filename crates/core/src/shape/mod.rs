//! Result shaping: raw listing records to display view models.
//!
//! - [`amenity`] - fixed amenity buckets
//! - [`format`] - yen, dollar and date strings
//! - [`view`] - per-listing card/detail view model
//! - [`directory`] - agency directory filter and sort

pub mod amenity;
pub mod directory;
pub mod format;
pub mod view;

pub use amenity::{AmenityCategory, CategorizedAmenities, canonical as canonical_amenity, categorize};
pub use directory::{AgencyDirectory, AgencySortKey};
pub use format::{format_date, format_datetime, format_number, format_usd, format_yen};
pub use view::ListingView;
