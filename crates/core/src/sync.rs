//! Shared highlight state between the list view and the map view.
//!
//! Both views read one [`ListingSelection`]; hovering a card highlights its
//! marker and vice versa. The server renders the initial state and
//! `static/js/listing-sync.js` applies the same transitions in the browser.

use serde::Serialize;

use crate::listing::Listing;
use crate::shape::format_yen;
use crate::types::ListingId;

/// Map centre when no listing has coordinates (central Okinawa).
pub const DEFAULT_CENTER: (f64, f64) = (26.3344, 127.7997);

/// Initial zoom for the search map.
pub const DEFAULT_ZOOM: u8 = 11;

/// At most one highlighted listing.
///
/// A click pins the highlight: hover and leave are ignored until the next
/// click or a reset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingSelection {
    current: Option<ListingId>,
    pinned: bool,
}

impl ListingSelection {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            current: None,
            pinned: false,
        }
    }

    /// Pointer entered a card or marker.
    pub fn hover(&mut self, id: ListingId) {
        if !self.pinned {
            self.current = Some(id);
        }
    }

    /// Pointer left a card or marker. A stale leave for a different id is ignored.
    pub fn leave(&mut self, id: &ListingId) {
        if !self.pinned && self.current.as_ref() == Some(id) {
            self.current = None;
        }
    }

    /// Card or marker clicked. Replaces any earlier pin.
    pub fn select(&mut self, id: ListingId) {
        self.current = Some(id);
        self.pinned = true;
    }

    /// Escape or navigation.
    pub fn reset(&mut self) {
        self.current = None;
        self.pinned = false;
    }

    #[must_use]
    pub fn is_highlighted(&self, id: &ListingId) -> bool {
        self.current.as_ref() == Some(id)
    }

    #[must_use]
    pub const fn is_pinned(&self) -> bool {
        self.pinned
    }

    #[must_use]
    pub const fn current(&self) -> Option<&ListingId> {
        self.current.as_ref()
    }
}

/// One marker on the search map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapMarker {
    pub id: String,
    pub lat: f64,
    pub lng: f64,
    pub title: String,
    pub price_label: String,
    pub highlighted: bool,
}

/// Markers plus viewport, serialised into the page for the map script.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapView {
    pub center: (f64, f64),
    pub zoom: u8,
    pub markers: Vec<MapMarker>,
}

impl MapView {
    /// Missing coordinates default to `0.0` so every listing keeps its marker.
    #[must_use]
    pub fn from_listings(listings: &[Listing], selection: &ListingSelection) -> Self {
        let markers = listings
            .iter()
            .map(|listing| MapMarker {
                id: listing.id.to_string(),
                lat: listing.lat.unwrap_or(0.0),
                lng: listing.lng.unwrap_or(0.0),
                title: listing.title.clone(),
                price_label: format_yen(listing.price),
                highlighted: selection.is_highlighted(&listing.id),
            })
            .collect();
        Self {
            center: DEFAULT_CENTER,
            zoom: DEFAULT_ZOOM,
            markers,
        }
    }
}
