//! Agency console: an agency's listings, tour requests and activity.
//!
//! Agency staff see their own agency's records. Admins see everything.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use okinawa_rentals_core::shape::ListingView;
use okinawa_rentals_core::{
    Activity, AgencyId, Collection, Listing, ListingId, ListingStatus, Query as StoreQuery,
    TourRequest, TourRequestId, TourStatus,
};

use super::listing_form::{ListingForm, SelectOption, status_options};
use super::listings::{ListingFormTemplate, can_manage};
use super::{LOAD_FAILED, MessageQuery};
use crate::db::activity::{ActivityRepository, InquiryRepository};
use crate::db::listings::ListingRepository;
use crate::db::tours::TourRequestRepository;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{RequireAgency, RequirePoster};
use crate::models::CurrentUser;
use crate::state::AppState;

const RECENT_LIMIT: usize = 5;

/// Which records a console user may see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    All,
    Agency(AgencyId),
    /// Agency role without an agency assignment: sees nothing.
    Unassigned,
}

impl Scope {
    #[must_use]
    pub fn of(user: &CurrentUser) -> Self {
        if user.is_admin() {
            return Self::All;
        }
        user.agency_id
            .clone()
            .map_or(Self::Unassigned, Self::Agency)
    }

    fn allows(&self, agency_id: Option<&AgencyId>) -> bool {
        match self {
            Self::All => true,
            Self::Agency(own) => agency_id == Some(own),
            Self::Unassigned => false,
        }
    }
}

/// Headline numbers on the overview.
#[derive(Debug, Default)]
pub struct ConsoleStats {
    pub listings: u64,
    pub active_listings: u64,
    pub pending_tours: u64,
    pub new_inquiries: u64,
}

/// A listing row with its status picker.
pub struct ListingRow {
    pub view: ListingView,
    pub status_options: Vec<SelectOption>,
}

impl ListingRow {
    #[must_use]
    pub fn new(listing: &Listing) -> Self {
        Self {
            view: ListingView::from(listing),
            status_options: status_options(listing.status),
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "agency/overview.html")]
pub struct OverviewTemplate {
    pub user: Option<CurrentUser>,
    pub scope_label: String,
    pub stats: ConsoleStats,
    pub recent_listings: Vec<ListingView>,
    pub activity: Vec<Activity>,
    pub alert: Option<&'static str>,
}

#[derive(Template, WebTemplate)]
#[template(path = "agency/listings.html")]
pub struct ListingsTemplate {
    pub user: Option<CurrentUser>,
    pub rows: Vec<ListingRow>,
    pub alert: Option<&'static str>,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// A tour request with its display date.
pub struct TourRow {
    pub tour: TourRequest,
    pub requested_on: String,
    pub is_pending: bool,
}

#[derive(Template, WebTemplate)]
#[template(path = "agency/tours.html")]
pub struct ToursTemplate {
    pub user: Option<CurrentUser>,
    pub rows: Vec<TourRow>,
    pub alert: Option<&'static str>,
    pub error: Option<String>,
    pub success: Option<String>,
}

fn scope_label(scope: &Scope, user: &CurrentUser) -> String {
    match scope {
        Scope::All => "All agencies".to_string(),
        Scope::Agency(id) => format!("Agency {id}"),
        Scope::Unassigned => format!("{} (no agency assigned)", user.name()),
    }
}

async fn scoped_listings(state: &AppState, scope: &Scope) -> Result<Vec<Listing>> {
    let repo = ListingRepository::new(state.store());
    Ok(match scope {
        Scope::All => repo.all(None).await?,
        Scope::Agency(id) => repo.for_agency(id, None).await?,
        Scope::Unassigned => Vec::new(),
    })
}

async fn stats(state: &AppState, scope: &Scope) -> Result<ConsoleStats> {
    let listings = ListingRepository::new(state.store());
    Ok(match scope {
        Scope::All => ConsoleStats {
            listings: listings.count(&StoreQuery::new(Collection::Listings)).await?,
            active_listings: listings
                .count(
                    &StoreQuery::new(Collection::Listings)
                        .eq("status", ListingStatus::Active.as_str()),
                )
                .await?,
            pending_tours: state
                .store()
                .count(
                    &StoreQuery::new(Collection::TourRequests)
                        .eq("status", TourStatus::Pending.as_str()),
                )
                .await?,
            new_inquiries: state
                .store()
                .count(&StoreQuery::new(Collection::Inquiries).eq("status", "new"))
                .await?,
        },
        Scope::Agency(id) => ConsoleStats {
            listings: listings.count(&ListingRepository::agency_query(id)).await?,
            active_listings: listings
                .count(
                    &ListingRepository::agency_query(id)
                        .eq("status", ListingStatus::Active.as_str()),
                )
                .await?,
            pending_tours: TourRequestRepository::new(state.store())
                .count_pending(id)
                .await?,
            new_inquiries: InquiryRepository::new(state.store()).count_new(id).await?,
        },
        Scope::Unassigned => ConsoleStats::default(),
    })
}

/// Console overview.
#[instrument(skip(state, user), fields(uid = %user.uid))]
pub async fn overview(
    State(state): State<AppState>,
    RequireAgency(user): RequireAgency,
) -> impl IntoResponse {
    let scope = Scope::of(&user);
    let mut alert = None;

    let stats = stats(&state, &scope).await.unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to load console stats");
        alert = Some(LOAD_FAILED);
        ConsoleStats::default()
    });

    let recent = match &scope {
        Scope::All => ListingRepository::new(state.store()).all(Some(RECENT_LIMIT)).await,
        Scope::Agency(id) => {
            ListingRepository::new(state.store())
                .for_agency(id, Some(RECENT_LIMIT))
                .await
        }
        Scope::Unassigned => Ok(Vec::new()),
    };
    let recent_listings = recent
        .map(|listings| listings.iter().map(ListingView::from).collect())
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to load recent listings");
            alert = Some(LOAD_FAILED);
            Vec::new()
        });

    let activity = match &scope {
        Scope::Agency(id) => ActivityRepository::new(state.store())
            .recent(id, RECENT_LIMIT * 2)
            .await
            .unwrap_or_else(|e| {
                tracing::error!(error = %e, "Failed to load activity");
                alert = Some(LOAD_FAILED);
                Vec::new()
            }),
        Scope::All | Scope::Unassigned => Vec::new(),
    };

    OverviewTemplate {
        scope_label: scope_label(&scope, &user),
        user: Some(user),
        stats,
        recent_listings,
        activity,
        alert,
    }
}

/// The console's listings table.
#[instrument(skip(state, user, messages), fields(uid = %user.uid))]
pub async fn listings(
    State(state): State<AppState>,
    RequireAgency(user): RequireAgency,
    Query(messages): Query<MessageQuery>,
) -> impl IntoResponse {
    let (rows, alert) = match scoped_listings(&state, &Scope::of(&user)).await {
        Ok(listings) => (listings.iter().map(ListingRow::new).collect(), None),
        Err(e) => {
            tracing::error!(error = %e, "Failed to load console listings");
            (Vec::new(), Some(LOAD_FAILED))
        }
    };
    ListingsTemplate {
        user: Some(user),
        rows,
        alert,
        error: messages.error_text(),
        success: messages.success_text(),
    }
}

/// Load a listing the user may manage, or the redirect to send instead.
async fn managed_listing(
    state: &AppState,
    user: &CurrentUser,
    id: &ListingId,
    back: &str,
) -> Result<std::result::Result<Listing, Redirect>> {
    let Some(listing) = ListingRepository::new(state.store()).get(id).await? else {
        return Ok(Err(Redirect::to(&format!("{back}?error=not_found"))));
    };
    if !can_manage(Some(user), &listing) {
        tracing::info!(uid = %user.uid, listing_id = %id, "Listing edit refused");
        return Ok(Err(Redirect::to(&format!("{back}?error=not_owner"))));
    }
    Ok(Ok(listing))
}

fn edit_form(
    user: CurrentUser,
    id: &ListingId,
    form: ListingForm,
    errors: Vec<String>,
) -> ListingFormTemplate {
    ListingFormTemplate {
        user: Some(user),
        heading: "Edit listing".to_string(),
        action: format!("/agency/listings/{id}/edit"),
        type_options: form.type_options(),
        status_options: form.status_options(),
        form,
        errors,
    }
}

/// Edit form prefilled from the stored listing.
#[instrument(skip(state, user), fields(uid = %user.uid))]
pub async fn edit_page(
    State(state): State<AppState>,
    RequirePoster(user): RequirePoster,
    Path(id): Path<String>,
) -> Result<Response> {
    let id = ListingId::new(id);
    let listing = match managed_listing(&state, &user, &id, listings_home(&user)).await? {
        Ok(listing) => listing,
        Err(redirect) => return Ok(redirect.into_response()),
    };
    Ok(edit_form(user, &id, ListingForm::from_listing(&listing), Vec::new()).into_response())
}

/// Save an edited listing. Ownership and creation metadata are kept.
#[instrument(skip(state, user, form), fields(uid = %user.uid))]
pub async fn update(
    State(state): State<AppState>,
    RequirePoster(user): RequirePoster,
    Path(id): Path<String>,
    Form(form): Form<ListingForm>,
) -> Result<Response> {
    let id = ListingId::new(id);
    let home = listings_home(&user);
    let existing = match managed_listing(&state, &user, &id, home).await? {
        Ok(listing) => listing,
        Err(redirect) => return Ok(redirect.into_response()),
    };

    let edited = match form.to_listing() {
        Ok(listing) => listing,
        Err(errors) => return Ok(edit_form(user, &id, form, errors).into_response()),
    };
    let listing = Listing {
        id: id.clone(),
        agency_id: existing.agency_id.clone(),
        created_by: existing.created_by.clone(),
        ..edited
    };

    if let Err(e) = ListingRepository::new(state.store()).update(&listing).await {
        tracing::error!(error = %e, "Failed to save listing");
        let errors = vec!["We couldn't save your changes. Please try again.".to_string()];
        return Ok(edit_form(user, &id, form, errors).into_response());
    }
    record(
        &state,
        listing.agency_id.as_ref(),
        "listing_updated",
        format!("Updated {}", listing.title),
    )
    .await;

    Ok(Redirect::to(&format!("{home}?success=listing_updated")).into_response())
}

/// Where a user's listing management lives: the console for agency staff
/// and admins, the dashboard for independent posters.
fn listings_home(user: &CurrentUser) -> &'static str {
    if user.can_access_agency_console() {
        "/agency/listings"
    } else {
        "/dashboard"
    }
}

async fn record(state: &AppState, agency_id: Option<&AgencyId>, kind: &str, description: String) {
    let Some(agency_id) = agency_id else {
        return;
    };
    if let Err(e) = ActivityRepository::new(state.store())
        .record(agency_id, kind, description)
        .await
    {
        tracing::warn!(error = %e, kind, "Failed to record activity");
    }
}

/// Status change form. `back` returns the user to the console page they came from.
#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: String,
    #[serde(default)]
    pub back: String,
}

impl StatusForm {
    /// Only pages that list manageable listings are valid return targets.
    fn back(&self, user: &CurrentUser) -> &str {
        match self.back.as_str() {
            back @ ("/agency" | "/agency/listings" | "/admin" | "/admin/listings")
                if user.can_access_agency_console() =>
            {
                back
            }
            back @ "/dashboard" => back,
            _ => listings_home(user),
        }
    }
}

/// Flip a listing's status.
#[instrument(skip(state, user, form), fields(uid = %user.uid, status = %form.status))]
pub async fn set_status(
    State(state): State<AppState>,
    RequirePoster(user): RequirePoster,
    Path(id): Path<String>,
    Form(form): Form<StatusForm>,
) -> Result<Redirect> {
    let back = form.back(&user);
    let Ok(status) = form.status.parse::<ListingStatus>() else {
        return Ok(Redirect::to(&format!("{back}?error=invalid_status")));
    };
    let id = ListingId::new(id);
    let listing = match managed_listing(&state, &user, &id, back).await? {
        Ok(listing) => listing,
        Err(redirect) => return Ok(redirect),
    };

    ListingRepository::new(state.store()).set_status(&id, status).await?;
    record(
        &state,
        listing.agency_id.as_ref(),
        "status_changed",
        format!("{} marked {}", listing.title, status.label()),
    )
    .await;

    Ok(Redirect::to(&format!("{back}?success=status_updated")))
}

/// Tour requests for the console user's scope.
#[instrument(skip(state, user, messages), fields(uid = %user.uid))]
pub async fn tours(
    State(state): State<AppState>,
    RequireAgency(user): RequireAgency,
    Query(messages): Query<MessageQuery>,
) -> impl IntoResponse {
    let repo = TourRequestRepository::new(state.store());
    let found = match Scope::of(&user) {
        Scope::All => repo.all().await,
        Scope::Agency(id) => repo.for_agency(&id).await,
        Scope::Unassigned => Ok(Vec::new()),
    };
    let (rows, alert) = match found {
        Ok(tours) => (
            tours
                .into_iter()
                .map(|tour| TourRow {
                    requested_on: tour
                        .created_at
                        .as_ref()
                        .map(okinawa_rentals_core::shape::format_datetime)
                        .unwrap_or_default(),
                    is_pending: tour.status == TourStatus::Pending,
                    tour,
                })
                .collect(),
            None,
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to load tour requests");
            (Vec::new(), Some(LOAD_FAILED))
        }
    };
    ToursTemplate {
        user: Some(user),
        rows,
        alert,
        error: messages.error_text(),
        success: messages.success_text(),
    }
}

#[derive(Debug, Deserialize)]
pub struct TourStatusForm {
    pub status: String,
}

/// Confirm, cancel or complete a tour request.
#[instrument(skip(state, user, form), fields(uid = %user.uid, status = %form.status))]
pub async fn set_tour_status(
    State(state): State<AppState>,
    RequireAgency(user): RequireAgency,
    Path(id): Path<String>,
    Form(form): Form<TourStatusForm>,
) -> Result<Redirect> {
    let Ok(status) = form.status.parse::<TourStatus>() else {
        return Ok(Redirect::to("/agency/tours?error=invalid_status"));
    };
    let id = TourRequestId::new(id);
    let repo = TourRequestRepository::new(state.store());
    let Some(tour) = repo.get(&id).await? else {
        return Ok(Redirect::to("/agency/tours?error=not_found"));
    };
    if !Scope::of(&user).allows(tour.agency_id.as_ref()) {
        return Err(AppError::Forbidden("tour request belongs to another agency".to_string()));
    }

    repo.set_status(&id, status).await?;
    record(
        &state,
        tour.agency_id.as_ref(),
        "tour_updated",
        format!("Tour for {} {status}", tour.listing_title),
    )
    .await;

    Ok(Redirect::to("/agency/tours?success=tour_updated"))
}

#[cfg(test)]
mod tests {
    use okinawa_rentals_core::{UserId, UserRole};

    use super::*;

    fn user(role: UserRole, agency: Option<&str>) -> CurrentUser {
        CurrentUser {
            uid: UserId::new("u1"),
            email: "staff@example.com".to_string(),
            display_name: String::new(),
            role,
            agency_id: agency.map(AgencyId::new),
        }
    }

    #[test]
    fn test_scope_of() {
        assert_eq!(Scope::of(&user(UserRole::Admin, Some("ag1"))), Scope::All);
        assert_eq!(
            Scope::of(&user(UserRole::Agency, Some("ag1"))),
            Scope::Agency(AgencyId::new("ag1"))
        );
        assert_eq!(Scope::of(&user(UserRole::Agency, None)), Scope::Unassigned);
    }

    #[test]
    fn test_scope_allows() {
        let own = AgencyId::new("ag1");
        let other = AgencyId::new("ag2");
        assert!(Scope::All.allows(None));
        assert!(Scope::Agency(own.clone()).allows(Some(&own)));
        assert!(!Scope::Agency(own.clone()).allows(Some(&other)));
        assert!(!Scope::Agency(own).allows(None));
        assert!(!Scope::Unassigned.allows(Some(&other)));
    }

    #[test]
    fn test_status_form_back_is_restricted() {
        let form = |back: &str| StatusForm {
            status: "sold".to_string(),
            back: back.to_string(),
        };
        let staff = user(UserRole::Agency, Some("ag1"));
        assert_eq!(form("/admin/listings").back(&staff), "/admin/listings");
        assert_eq!(form("https://evil.example").back(&staff), "/agency/listings");
        assert_eq!(form("").back(&staff), "/agency/listings");
    }

    #[test]
    fn test_status_form_back_for_independent_poster() {
        let form = |back: &str| StatusForm {
            status: "sold".to_string(),
            back: back.to_string(),
        };
        let poster = user(UserRole::Paid, None);
        assert_eq!(form("/dashboard").back(&poster), "/dashboard");
        assert_eq!(form("/agency").back(&poster), "/dashboard");
        assert_eq!(form("").back(&poster), "/dashboard");
        assert_eq!(listings_home(&poster), "/dashboard");
        assert_eq!(listings_home(&user(UserRole::Admin, None)), "/agency/listings");
    }
}
