//! Newtype IDs for type-safe document references.
//!
//! Document stores key records by opaque strings, so every ID here wraps a
//! `String`. Use the `define_id!` macro to create wrappers that prevent
//! accidentally passing an agency ID where a listing ID is expected.

/// Macro to define a type-safe document ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - `new()`, `generate()`, `as_str()`, `into_inner()`
/// - `Display`, `From<String>`, `From<&str>`, `AsRef<str>`
///
/// # Example
///
/// ```rust
/// # use okinawa_rentals_core::define_id;
/// define_id!(ListingId);
/// define_id!(AgencyId);
///
/// let listing = ListingId::new("abc123");
/// let agency = AgencyId::new("abc123");
///
/// // These are different types, so this won't compile:
/// // let _: ListingId = agency;
/// assert_eq!(listing.as_str(), agency.as_str());
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            Default,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap an existing document ID.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Generate a fresh random document ID (UUID v4, hyphenless).
            #[must_use]
            pub fn generate() -> Self {
                Self(::uuid::Uuid::new_v4().simple().to_string())
            }

            /// Borrow the underlying string.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the wrapper and return the underlying string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }

            /// Whether the ID is the empty string (documents read without an ID).
            #[must_use]
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

// Define standard document IDs
define_id!(ListingId);
define_id!(AgencyId);
define_id!(UserId);
define_id!(TourRequestId);
define_id!(InquiryId);
define_id!(ActivityId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique_and_hyphenless() {
        let a = ListingId::generate();
        let b = ListingId::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 32);
        assert!(!a.as_str().contains('-'));
    }

    #[test]
    fn test_serde_is_transparent() {
        let id = AgencyId::new("ace-housing");
        let json = serde_json::to_string(&id).unwrap_or_default();
        assert_eq!(json, "\"ace-housing\"");
    }

    #[test]
    fn test_default_is_empty() {
        assert!(UserId::default().is_empty());
    }
}
