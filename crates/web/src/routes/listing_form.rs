//! The listing create/edit form.
//!
//! Every field is posted as text and parsed here, so a bad number re-renders
//! the form with the submitted values instead of failing extraction.

use serde::Deserialize;

use okinawa_rentals_core::shape::canonical_amenity;
use okinawa_rentals_core::{Listing, ListingStatus, ListingType, NearbyBase};

/// Raw form fields. Checkboxes are present only when ticked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ListingForm {
    pub title: String,
    pub description: String,
    pub price: String,
    pub price_usd: String,
    pub listing_type: String,
    pub status: String,
    pub city: String,
    pub location: String,
    pub base: String,
    /// One per line: `Kadena Air Base | 3.5 | shuttle`.
    pub nearby_bases: String,
    pub bedrooms: String,
    pub bathrooms: String,
    pub square_meters: String,
    pub parking_spaces: String,
    pub year_built: String,
    pub available_from: String,
    pub lease_term: String,
    pub lat: String,
    pub lng: String,
    pub security_deposit: String,
    pub key_money: String,
    pub agency_fee: String,
    pub guarantor_fee: String,
    /// Comma separated.
    pub pet_policy: String,
    /// One tag per line.
    pub amenities: String,
    /// One URL per line.
    pub images: String,
    pub floor_plan: String,
    pub utilities_included: Option<String>,
    pub featured: Option<String>,
    pub negotiable: Option<String>,
}

/// A `<select>` option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

impl ListingForm {
    /// Prefill from a stored listing.
    #[must_use]
    pub fn from_listing(listing: &Listing) -> Self {
        Self {
            title: listing.title.clone(),
            description: listing.description.clone(),
            price: listing.price.to_string(),
            price_usd: opt(listing.price_usd),
            listing_type: listing
                .kind()
                .map(|k| k.as_str().to_string())
                .unwrap_or_default(),
            status: listing.status.as_str().to_string(),
            city: listing.city.clone(),
            location: listing.location.clone(),
            base: listing.base.clone(),
            nearby_bases: listing
                .nearby_bases
                .iter()
                .map(|b| {
                    if b.shuttle_available {
                        format!("{} | {} | shuttle", b.name, b.distance)
                    } else {
                        format!("{} | {}", b.name, b.distance)
                    }
                })
                .collect::<Vec<_>>()
                .join("\n"),
            bedrooms: listing.bedrooms.to_string(),
            bathrooms: listing.bathrooms.to_string(),
            square_meters: listing.square_meters.to_string(),
            parking_spaces: opt(listing.parking_spaces),
            year_built: opt(listing.year_built),
            available_from: listing.available_from.clone().unwrap_or_default(),
            lease_term: listing.lease_term.clone().unwrap_or_default(),
            lat: opt(listing.lat),
            lng: opt(listing.lng),
            security_deposit: opt(listing.security_deposit),
            key_money: opt(listing.key_money),
            agency_fee: opt(listing.agency_fee),
            guarantor_fee: opt(listing.guarantor_fee),
            pet_policy: listing.pet_policy.join(", "),
            amenities: listing.amenities.join("\n"),
            images: listing.images.join("\n"),
            floor_plan: listing.floor_plan.clone().unwrap_or_default(),
            utilities_included: checkbox(listing.utilities_included),
            featured: checkbox(listing.featured),
            negotiable: checkbox(listing.negotiable),
        }
    }

    /// Parse into a listing. Ids, ownership and timestamps are left for the caller.
    ///
    /// # Errors
    ///
    /// Returns one message per invalid field.
    pub fn to_listing(&self) -> Result<Listing, Vec<String>> {
        let mut errors = Vec::new();

        let title = self.title.trim().to_string();
        if title.is_empty() {
            errors.push("Title is required.".to_string());
        }
        let price = match required::<u64>(&self.price, "Monthly rent", &mut errors) {
            Some(0) => {
                errors.push("Monthly rent must be more than zero.".to_string());
                0
            }
            Some(n) => n,
            None => 0,
        };
        let status = if self.status.trim().is_empty() {
            ListingStatus::Active
        } else {
            self.status.parse().unwrap_or_else(|_| {
                errors.push("Status is not valid.".to_string());
                ListingStatus::Active
            })
        };
        let nearby_bases = self
            .nearby_bases
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| {
                parse_nearby_base(line).or_else(|| {
                    errors.push(format!(
                        "Nearby base \"{}\" should look like \"Camp Foster | 2.5 | shuttle\".",
                        line.trim()
                    ));
                    None
                })
            })
            .collect();

        let listing = Listing {
            title,
            description: self.description.trim().to_string(),
            price,
            price_usd: optional(&self.price_usd, "Rent in USD", &mut errors),
            listing_type: non_empty(&self.listing_type).map(ListingType::from),
            status,
            city: self.city.trim().to_lowercase(),
            location: self.location.trim().to_string(),
            base: self.base.trim().to_lowercase(),
            nearby_bases,
            bedrooms: optional(&self.bedrooms, "Bedrooms", &mut errors).unwrap_or(0),
            bathrooms: non_negative(&self.bathrooms, "Bathrooms", &mut errors),
            square_meters: non_negative(&self.square_meters, "Floor area", &mut errors),
            parking_spaces: optional(&self.parking_spaces, "Parking spaces", &mut errors),
            year_built: optional(&self.year_built, "Year built", &mut errors),
            available_from: non_empty(&self.available_from),
            lease_term: non_empty(&self.lease_term),
            lat: optional(&self.lat, "Latitude", &mut errors),
            lng: optional(&self.lng, "Longitude", &mut errors),
            security_deposit: optional(&self.security_deposit, "Security deposit", &mut errors),
            key_money: optional(&self.key_money, "Key money", &mut errors),
            agency_fee: optional(&self.agency_fee, "Agency fee", &mut errors),
            guarantor_fee: optional(&self.guarantor_fee, "Guarantor fee", &mut errors),
            utilities_included: self.utilities_included.is_some(),
            pet_policy: split_list(&self.pet_policy, ','),
            featured: self.featured.is_some(),
            negotiable: self.negotiable.is_some(),
            amenities: split_list(&self.amenities, '\n')
                .into_iter()
                .map(|tag| canonical_amenity(&tag).map_or(tag, String::from))
                .collect(),
            images: split_list(&self.images, '\n'),
            floor_plan: non_empty(&self.floor_plan),
            ..Listing::default()
        };

        if errors.is_empty() {
            Ok(listing)
        } else {
            Err(errors)
        }
    }

    /// Options for the property type select.
    #[must_use]
    pub fn type_options(&self) -> Vec<SelectOption> {
        let current = self.listing_type.trim().to_lowercase();
        ListingType::KNOWN
            .iter()
            .map(|kind| SelectOption {
                value: kind.as_str().to_string(),
                label: kind.label(),
                selected: kind.as_str() == current,
            })
            .collect()
    }

    /// Options for the status select.
    #[must_use]
    pub fn status_options(&self) -> Vec<SelectOption> {
        status_options(self.status.parse().unwrap_or_default())
    }
}

/// Status select options with `current` selected.
#[must_use]
pub fn status_options(current: ListingStatus) -> Vec<SelectOption> {
    ListingStatus::ALL
        .iter()
        .map(|status| SelectOption {
            value: status.as_str().to_string(),
            label: status.label().to_string(),
            selected: *status == current,
        })
        .collect()
}

fn opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn checkbox(on: bool) -> Option<String> {
    on.then(|| "on".to_string())
}

fn non_empty(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn split_list(raw: &str, separator: char) -> Vec<String> {
    raw.split(separator)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Accepts `150,000` as well as `150000`.
fn clean_number(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|c| *c != ',' && *c != '¥' && *c != '$')
        .collect()
}

fn optional<T: std::str::FromStr>(raw: &str, label: &str, errors: &mut Vec<String>) -> Option<T> {
    let cleaned = clean_number(raw);
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse().map_or_else(
        |_| {
            errors.push(format!("{label} must be a number."));
            None
        },
        Some,
    )
}

fn required<T: std::str::FromStr>(raw: &str, label: &str, errors: &mut Vec<String>) -> Option<T> {
    if clean_number(raw).is_empty() {
        errors.push(format!("{label} is required."));
        return None;
    }
    optional(raw, label, errors)
}

fn non_negative(raw: &str, label: &str, errors: &mut Vec<String>) -> f64 {
    match optional::<f64>(raw, label, errors) {
        Some(n) if n.is_finite() && n >= 0.0 => n,
        Some(_) => {
            errors.push(format!("{label} cannot be negative."));
            0.0
        }
        None => 0.0,
    }
}

fn parse_nearby_base(line: &str) -> Option<NearbyBase> {
    let mut parts = line.split('|').map(str::trim);
    let name = parts.next().filter(|s| !s.is_empty())?.to_string();
    let distance = match parts.next() {
        Some(d) if !d.is_empty() => d.trim_end_matches("km").trim().parse().ok()?,
        _ => 0.0,
    };
    let shuttle_available = parts
        .next()
        .is_some_and(|s| s.eq_ignore_ascii_case("shuttle") || s.eq_ignore_ascii_case("yes"));
    Some(NearbyBase {
        name,
        distance,
        shuttle_available,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn full_listing() -> Listing {
        Listing {
            title: "Araha Beach House".to_string(),
            description: "Three bedrooms, a short walk to the seawall.".to_string(),
            price: 230_000,
            price_usd: Some(1_550),
            listing_type: Some(ListingType::House),
            status: ListingStatus::Pending,
            city: "chatan".to_string(),
            location: "Araha, Chatan".to_string(),
            base: "camp foster".to_string(),
            nearby_bases: vec![
                NearbyBase {
                    name: "Camp Foster".to_string(),
                    distance: 2.5,
                    shuttle_available: true,
                },
                NearbyBase {
                    name: "Kadena Air Base".to_string(),
                    distance: 6.0,
                    shuttle_available: false,
                },
            ],
            bedrooms: 3,
            bathrooms: 1.5,
            square_meters: 112.5,
            parking_spaces: Some(2),
            year_built: Some(2016),
            available_from: Some("2025-04-01".to_string()),
            lease_term: Some("1 year".to_string()),
            lat: Some(26.3081),
            lng: Some(127.7568),
            security_deposit: Some(230_000),
            key_money: Some(0),
            agency_fee: Some(115_000),
            guarantor_fee: None,
            utilities_included: true,
            pet_policy: vec!["Cats OK".to_string(), "Small dogs".to_string()],
            featured: true,
            negotiable: false,
            amenities: vec!["Air Conditioning".to_string(), "Ocean View".to_string()],
            images: vec!["/static/img/araha-1.jpg".to_string()],
            floor_plan: Some("/static/img/araha-plan.png".to_string()),
            ..Listing::default()
        }
    }

    #[test]
    fn test_round_trip_preserves_every_field() {
        let listing = full_listing();
        let parsed = ListingForm::from_listing(&listing).to_listing().unwrap();
        assert_eq!(parsed, listing);
    }

    #[test]
    fn test_blank_form_reports_required_fields() {
        let errors = ListingForm::default().to_listing().unwrap_err();
        assert!(errors.iter().any(|e| e.contains("Title")));
        assert!(errors.iter().any(|e| e.contains("Monthly rent")));
    }

    #[test]
    fn test_numbers_accept_grouping_and_reject_text() {
        let form = ListingForm {
            title: "Flat".to_string(),
            price: "¥150,000".to_string(),
            bedrooms: "two".to_string(),
            ..ListingForm::default()
        };
        let errors = form.to_listing().unwrap_err();
        assert_eq!(errors, vec!["Bedrooms must be a number.".to_string()]);

        let form = ListingForm {
            bedrooms: "2".to_string(),
            ..form
        };
        let listing = form.to_listing().unwrap();
        assert_eq!(listing.price, 150_000);
        assert_eq!(listing.status, ListingStatus::Active);
    }

    #[test]
    fn test_city_and_base_are_normalised_for_search() {
        let form = ListingForm {
            title: "Flat".to_string(),
            price: "90000".to_string(),
            city: " Chatan ".to_string(),
            base: "Kadena Air Base".to_string(),
            ..ListingForm::default()
        };
        let listing = form.to_listing().unwrap();
        assert_eq!(listing.city, "chatan");
        assert_eq!(listing.base, "kadena air base");
    }

    #[test]
    fn test_known_amenities_take_table_spelling() {
        let form = ListingForm {
            title: "Flat".to_string(),
            price: "90000".to_string(),
            amenities: "elevator\nsecurity camera\n\nrooftop pool".to_string(),
            ..ListingForm::default()
        };
        let listing = form.to_listing().unwrap();
        assert_eq!(listing.amenities, ["Elevator", "Security Camera", "rooftop pool"]);
    }

    #[test]
    fn test_type_options_mark_current() {
        let form = ListingForm {
            listing_type: "Condo".to_string(),
            ..ListingForm::default()
        };
        let selected: Vec<_> = form
            .type_options()
            .into_iter()
            .filter(|o| o.selected)
            .map(|o| o.value)
            .collect();
        assert_eq!(selected, vec!["condo".to_string()]);
    }
}
