//! Listing search, detail, tour request, favorites and the "list a rental" flow.

use std::collections::HashMap;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use okinawa_rentals_core::search::{POPULAR_SEARCHES, PopularSearch};
use okinawa_rentals_core::shape::{ListingView, format_date, format_number};
use okinawa_rentals_core::sync::{ListingSelection, MapView};
use okinawa_rentals_core::{
    Agency, DEFAULT_TOUR_MESSAGE, Listing, ListingId, ListingStatus, SearchParams,
    SearchSummary, TourRequest, UserRole,
};

use super::listing_form::{ListingForm, SelectOption};
use super::{LOAD_FAILED, MessageQuery, script_json};
use crate::db::activity::ActivityRepository;
use crate::db::agencies::AgencyRepository;
use crate::db::listings::ListingRepository;
use crate::db::tours::TourRequestRepository;
use crate::db::users::UserRepository;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{OptionalUser, RequirePoster, RequireUser};
use crate::models::CurrentUser;
use crate::state::AppState;

/// A result card plus its initial highlight state.
pub struct ListingCard {
    pub view: ListingView,
    pub highlighted: bool,
}

/// Current filter values echoed back into the search form.
#[derive(Debug, Default)]
pub struct SearchForm {
    pub location: String,
    pub property_type: String,
    pub price: String,
    pub bedrooms: String,
    pub bathrooms: String,
}

impl SearchForm {
    fn from_params(params: &SearchParams) -> Self {
        let value = |keys: &[&str]| params.first(keys).unwrap_or_default().to_string();
        Self {
            location: value(&["location", "city", "base", "nearestBase"]),
            property_type: value(&["propertyType", "listingType"]).to_lowercase(),
            price: value(&["price", "priceRange"]),
            bedrooms: value(&["bedrooms", "beds"]),
            bathrooms: value(&["bathrooms", "baths"]),
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "listings/index.html")]
pub struct ListingsIndexTemplate {
    pub user: Option<CurrentUser>,
    pub summary: SearchSummary,
    pub form: SearchForm,
    pub type_options: Vec<SelectOption>,
    pub cards: Vec<ListingCard>,
    pub map_json: String,
    pub popular: &'static [PopularSearch],
    pub alert: Option<String>,
    pub retry_href: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "listings/show.html")]
pub struct ListingShowTemplate {
    pub user: Option<CurrentUser>,
    pub listing: ListingView,
    pub facts: Vec<(&'static str, String)>,
    pub agency: Option<Agency>,
    pub is_favorite: bool,
    pub can_edit: bool,
    pub map_json: String,
    pub default_tour_message: &'static str,
    pub error: Option<String>,
    pub success: Option<String>,
}

#[derive(Template, WebTemplate)]
#[template(path = "listings/form.html")]
pub struct ListingFormTemplate {
    pub user: Option<CurrentUser>,
    pub heading: String,
    pub action: String,
    pub form: ListingForm,
    pub type_options: Vec<SelectOption>,
    pub status_options: Vec<SelectOption>,
    pub errors: Vec<String>,
}

/// Tour request form data.
#[derive(Debug, Deserialize)]
pub struct TourForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub message: String,
}

/// `/listings` with the same query string, keys sorted.
fn listings_href(raw: &HashMap<String, String>) -> String {
    let mut pairs: Vec<_> = raw.iter().filter(|(_, v)| !v.trim().is_empty()).collect();
    if pairs.is_empty() {
        return "/listings".to_string();
    }
    pairs.sort();
    let query = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish();
    format!("/listings?{query}")
}

/// Search results page.
///
/// Reads fail soft: the page renders with an inline alert and a retry link.
/// Hidden (`inactive`) listings never appear publicly.
#[instrument(skip(state, user, raw))]
pub async fn index(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    Query(raw): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let retry_href = listings_href(&raw);
    let params = SearchParams::from(raw);
    let query = params.to_query();

    let (listings, alert) = match ListingRepository::new(state.store()).search(&query).await {
        Ok(found) => (
            found
                .into_iter()
                .filter(|l| l.status != ListingStatus::Inactive)
                .collect::<Vec<_>>(),
            None,
        ),
        Err(e) => {
            tracing::error!(error = %e, "Listing search failed");
            (Vec::new(), Some(LOAD_FAILED.to_string()))
        }
    };

    let mut selection = ListingSelection::new();
    if let Some(id) = params.first(&["selected"]) {
        selection.select(ListingId::new(id));
    }
    let map = MapView::from_listings(&listings, &selection);
    let cards = listings
        .iter()
        .map(|listing| ListingCard {
            view: ListingView::from(listing),
            highlighted: selection.is_highlighted(&listing.id),
        })
        .collect();

    let form = SearchForm::from_params(&params);
    let type_options = ListingForm {
        listing_type: form.property_type.clone(),
        ..ListingForm::default()
    }
    .type_options();

    ListingsIndexTemplate {
        user,
        summary: SearchSummary::from_params(&params),
        form,
        type_options,
        cards,
        map_json: script_json(&map),
        popular: &POPULAR_SEARCHES,
        alert,
        retry_href,
    }
}

/// Listing detail page.
#[instrument(skip(state, user, messages))]
pub async fn show(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    Path(id): Path<String>,
    Query(messages): Query<MessageQuery>,
) -> Result<Response> {
    let id = ListingId::new(id);
    let listing = ListingRepository::new(state.store())
        .get(&id)
        .await?
        .filter(|l| l.status != ListingStatus::Inactive || can_manage(user.as_ref(), l))
        .ok_or_else(|| AppError::NotFound(format!("listing {id}")))?;

    let agency = match &listing.agency_id {
        Some(agency_id) => AgencyRepository::new(state.store())
            .get(agency_id)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Failed to load listing agency");
                None
            }),
        None => None,
    };

    let is_favorite = match &user {
        Some(u) => UserRepository::new(state.store())
            .get(&u.uid)
            .await
            .ok()
            .flatten()
            .is_some_and(|p| p.has_favorite(&id)),
        None => false,
    };

    let map = MapView::from_listings(std::slice::from_ref(&listing), &ListingSelection::new());

    Ok(ListingShowTemplate {
        can_edit: can_manage(user.as_ref(), &listing),
        facts: facts(&listing),
        listing: ListingView::from(&listing),
        map_json: script_json(&map),
        agency,
        is_favorite,
        user,
        default_tour_message: DEFAULT_TOUR_MESSAGE,
        error: messages.error_text(),
        success: messages.success_text(),
    }
    .into_response())
}

/// Admins manage everything; agency staff manage their agency's listings.
pub(crate) fn can_manage(user: Option<&CurrentUser>, listing: &Listing) -> bool {
    match user {
        Some(u) if u.role == UserRole::Admin => true,
        Some(u) if u.role == UserRole::Agency => u
            .agency_id
            .as_ref()
            .is_some_and(|agency| listing.is_owned_by(agency)),
        Some(u) => listing.created_by.as_ref() == Some(&u.uid),
        None => false,
    }
}

/// Key facts shown beside the description; only recorded ones.
fn facts(listing: &Listing) -> Vec<(&'static str, String)> {
    let mut facts = Vec::new();
    if let Some(n) = listing.parking_spaces {
        facts.push(("Parking", n.to_string()));
    }
    if let Some(year) = listing.year_built {
        facts.push(("Year built", year.to_string()));
    }
    if let Some(from) = listing.available_from.as_deref() {
        let formatted = format_date(Some(from));
        facts.push((
            "Available from",
            if formatted.is_empty() { from.to_string() } else { formatted },
        ));
    }
    if let Some(term) = &listing.lease_term {
        facts.push(("Lease term", term.clone()));
    }
    if !listing.pet_policy.is_empty() {
        facts.push(("Pets", listing.pet_policy.join(", ")));
    }
    if listing.utilities_included {
        facts.push(("Utilities", "Included".to_string()));
    }
    if listing.negotiable {
        facts.push(("Rent", "Negotiable".to_string()));
    }
    if listing.square_meters > 0.0 {
        facts.push(("Floor area", format!("{} m²", format_number(listing.square_meters))));
    }
    facts
}

/// Request a tour of a listing.
#[instrument(skip(state, user, form), fields(uid = %user.uid))]
pub async fn request_tour(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<String>,
    Form(form): Form<TourForm>,
) -> Result<Redirect> {
    let id = ListingId::new(id);
    let listing = ListingRepository::new(state.store())
        .get(&id)
        .await?
        .filter(|l| l.status != ListingStatus::Inactive)
        .ok_or_else(|| AppError::NotFound(format!("listing {id}")))?;

    let message = form.message.trim();
    let name = form.name.trim();
    let tour = TourRequest {
        listing_id: id.clone(),
        listing_title: listing.title.clone(),
        listing_location: listing.location_line(),
        agency_id: listing.agency_id.clone(),
        user_id: user.uid.clone(),
        user_email: user.email.clone(),
        user_name: if name.is_empty() { user.name().to_string() } else { name.to_string() },
        phone: form.phone.trim().to_string(),
        message: if message.is_empty() {
            DEFAULT_TOUR_MESSAGE.to_string()
        } else {
            message.to_string()
        },
        ..TourRequest::default()
    };
    TourRequestRepository::new(state.store()).create(&tour).await?;

    if let Some(agency_id) = &listing.agency_id
        && let Err(e) = ActivityRepository::new(state.store())
            .record(
                agency_id,
                "tour_requested",
                format!("Tour requested for {}", listing.title),
            )
            .await
    {
        tracing::warn!(error = %e, "Failed to record tour activity");
    }

    Ok(Redirect::to(&format!("/listings/{id}?success=tour_requested")))
}

/// Add or remove a listing from the signed-in user's favorites.
#[instrument(skip(state, user), fields(uid = %user.uid))]
pub async fn toggle_favorite(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<String>,
) -> Result<Redirect> {
    let id = ListingId::new(id);
    let added = UserRepository::new(state.store())
        .toggle_favorite(&user.uid, &id)
        .await?;
    let code = if added { "favorite_added" } else { "favorite_removed" };
    Ok(Redirect::to(&format!("/listings/{id}?success={code}")))
}

/// Blank "list a rental" form.
pub async fn new_listing_page(RequirePoster(user): RequirePoster) -> impl IntoResponse {
    form_page(Some(user), ListingForm::default(), Vec::new())
}

fn form_page(
    user: Option<CurrentUser>,
    form: ListingForm,
    errors: Vec<String>,
) -> ListingFormTemplate {
    ListingFormTemplate {
        user,
        heading: "List a rental".to_string(),
        action: "/list-a-rental".to_string(),
        type_options: form.type_options(),
        status_options: form.status_options(),
        form,
        errors,
    }
}

/// Create a listing owned by the poster (and their agency, for agency staff).
#[instrument(skip(state, user, form), fields(uid = %user.uid))]
pub async fn create_listing(
    State(state): State<AppState>,
    RequirePoster(user): RequirePoster,
    Form(form): Form<ListingForm>,
) -> Result<Response> {
    let listing = match form.to_listing() {
        Ok(listing) => listing,
        Err(errors) => return Ok(form_page(Some(user), form, errors).into_response()),
    };

    let agency_id = if user.role == UserRole::Agency {
        user.agency_id.clone()
    } else {
        None
    };
    let listing = Listing {
        agency_id: agency_id.clone(),
        created_by: Some(user.uid.clone()),
        ..listing
    };
    let id = ListingRepository::new(state.store()).create(&listing).await?;

    if let Some(agency_id) = &agency_id
        && let Err(e) = ActivityRepository::new(state.store())
            .record(agency_id, "listing_created", format!("Listed {}", listing.title))
            .await
    {
        tracing::warn!(error = %e, "Failed to record listing activity");
    }

    Ok(Redirect::to(&format!("/listings/{id}?success=listing_created")).into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use okinawa_rentals_core::{AgencyId, UserId};

    use super::*;

    fn user(role: UserRole, agency: Option<&str>) -> CurrentUser {
        CurrentUser {
            uid: UserId::new("u1"),
            email: "u1@example.com".to_string(),
            display_name: String::new(),
            role,
            agency_id: agency.map(AgencyId::new),
        }
    }

    #[test]
    fn test_can_manage() {
        let listing = Listing {
            agency_id: Some(AgencyId::new("ag1")),
            ..Listing::default()
        };
        assert!(can_manage(Some(&user(UserRole::Admin, None)), &listing));
        assert!(can_manage(Some(&user(UserRole::Agency, Some("ag1"))), &listing));
        assert!(!can_manage(Some(&user(UserRole::Agency, Some("ag2"))), &listing));
        assert!(!can_manage(Some(&user(UserRole::Agency, None)), &listing));
        assert!(!can_manage(Some(&user(UserRole::User, None)), &listing));
        assert!(!can_manage(None, &listing));

        let own = Listing {
            created_by: Some(UserId::new("u1")),
            ..Listing::default()
        };
        assert!(can_manage(Some(&user(UserRole::Paid, None)), &own));
    }

    #[test]
    fn test_listings_href() {
        let mut raw = HashMap::new();
        assert_eq!(listings_href(&raw), "/listings");
        raw.insert("propertyType".to_string(), "house".to_string());
        raw.insert("city".to_string(), "chatan".to_string());
        raw.insert("bedrooms".to_string(), " ".to_string());
        assert_eq!(listings_href(&raw), "/listings?city=chatan&propertyType=house");
    }

    #[test]
    fn test_facts_only_recorded() {
        assert!(facts(&Listing::default()).is_empty());
        let listing = Listing {
            available_from: Some("2025-04-01".to_string()),
            pet_policy: vec!["Cats OK".to_string()],
            ..Listing::default()
        };
        assert_eq!(
            facts(&listing),
            vec![
                ("Available from", "Apr 1, 2025".to_string()),
                ("Pets", "Cats OK".to_string()),
            ]
        );
    }
}
