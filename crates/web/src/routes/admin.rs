//! Admin console: site-wide counts, user roles, listings and agencies.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect},
};
use serde::Deserialize;
use tracing::instrument;

use okinawa_rentals_core::shape::format_datetime;
use okinawa_rentals_core::{
    Agency, AgencyId, Collection, ListingStatus, Query as StoreQuery, TourStatus, UserId,
    UserProfile, UserRole,
};

use super::agency::ListingRow;
use super::listing_form::SelectOption;
use super::{LOAD_FAILED, MessageQuery};
use crate::db::agencies::AgencyRepository;
use crate::db::listings::ListingRepository;
use crate::db::users::UserRepository;
use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::models::CurrentUser;
use crate::state::AppState;

/// Site-wide totals.
#[derive(Debug, Default)]
pub struct SiteStats {
    pub users: u64,
    pub listings: u64,
    pub active_listings: u64,
    pub agencies: u64,
    pub pending_tours: u64,
}

#[derive(Template, WebTemplate)]
#[template(path = "admin/overview.html")]
pub struct OverviewTemplate {
    pub user: Option<CurrentUser>,
    pub stats: SiteStats,
    pub alert: Option<&'static str>,
}

/// A user row with its role picker.
pub struct UserRow {
    pub profile: UserProfile,
    pub joined_on: String,
    pub role_options: Vec<SelectOption>,
    pub agency_id: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "admin/users.html")]
pub struct UsersTemplate {
    pub user: Option<CurrentUser>,
    pub rows: Vec<UserRow>,
    pub alert: Option<&'static str>,
    pub error: Option<String>,
    pub success: Option<String>,
}

#[derive(Template, WebTemplate)]
#[template(path = "admin/listings.html")]
pub struct ListingsTemplate {
    pub user: Option<CurrentUser>,
    pub rows: Vec<ListingRow>,
    pub alert: Option<&'static str>,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// An agency with its available-listing count.
pub struct AgencyRow {
    pub agency: Agency,
    pub active_listings: u64,
}

#[derive(Template, WebTemplate)]
#[template(path = "admin/agencies.html")]
pub struct AgenciesTemplate {
    pub user: Option<CurrentUser>,
    pub rows: Vec<AgencyRow>,
    pub alert: Option<&'static str>,
}

fn role_options(current: UserRole) -> Vec<SelectOption> {
    UserRole::ALL
        .iter()
        .map(|role| SelectOption {
            value: role.as_str().to_string(),
            label: role.as_str().to_string(),
            selected: *role == current,
        })
        .collect()
}

async fn site_stats(state: &AppState) -> Result<SiteStats> {
    let store = state.store();
    Ok(SiteStats {
        users: UserRepository::new(store).count().await?,
        listings: store.count(&StoreQuery::new(Collection::Listings)).await?,
        active_listings: store
            .count(
                &StoreQuery::new(Collection::Listings).eq("status", ListingStatus::Active.as_str()),
            )
            .await?,
        agencies: store.count(&StoreQuery::new(Collection::Agencies)).await?,
        pending_tours: store
            .count(
                &StoreQuery::new(Collection::TourRequests)
                    .eq("status", TourStatus::Pending.as_str()),
            )
            .await?,
    })
}

/// Admin overview.
#[instrument(skip(state, user), fields(uid = %user.uid))]
pub async fn overview(
    State(state): State<AppState>,
    RequireAdmin(user): RequireAdmin,
) -> impl IntoResponse {
    let (stats, alert) = match site_stats(&state).await {
        Ok(stats) => (stats, None),
        Err(e) => {
            tracing::error!(error = %e, "Failed to load site stats");
            (SiteStats::default(), Some(LOAD_FAILED))
        }
    };
    OverviewTemplate {
        user: Some(user),
        stats,
        alert,
    }
}

/// Every user, newest first.
#[instrument(skip(state, user, messages), fields(uid = %user.uid))]
pub async fn users(
    State(state): State<AppState>,
    RequireAdmin(user): RequireAdmin,
    Query(messages): Query<MessageQuery>,
) -> impl IntoResponse {
    let (rows, alert) = match UserRepository::new(state.store()).list().await {
        Ok(profiles) => (
            profiles
                .into_iter()
                .map(|profile| UserRow {
                    joined_on: profile
                        .created_at
                        .as_ref()
                        .map(format_datetime)
                        .unwrap_or_default(),
                    role_options: role_options(profile.role),
                    agency_id: profile
                        .agency_id
                        .as_ref()
                        .map(ToString::to_string)
                        .unwrap_or_default(),
                    profile,
                })
                .collect(),
            None,
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to load users");
            (Vec::new(), Some(LOAD_FAILED))
        }
    };
    UsersTemplate {
        user: Some(user),
        rows,
        alert,
        error: messages.error_text(),
        success: messages.success_text(),
    }
}

/// Role change form. `agency_id` applies to the agency role only.
#[derive(Debug, Deserialize)]
pub struct RoleForm {
    pub role: String,
    #[serde(default)]
    pub agency_id: String,
}

/// Change a user's role.
///
/// The new role takes effect on the user's next request: role-gated
/// extractors re-read the profile.
#[instrument(skip(state, user, form), fields(uid = %user.uid, target_uid = %uid, role = %form.role))]
pub async fn set_role(
    State(state): State<AppState>,
    RequireAdmin(user): RequireAdmin,
    Path(uid): Path<String>,
    Form(form): Form<RoleForm>,
) -> Result<Redirect> {
    let Ok(role) = form.role.parse::<UserRole>() else {
        return Ok(Redirect::to("/admin/users?error=invalid_role"));
    };
    let agency_id = match form.agency_id.trim() {
        id if role == UserRole::Agency && !id.is_empty() => Some(AgencyId::new(id)),
        _ => None,
    };

    UserRepository::new(state.store())
        .set_role(&UserId::new(uid), role, agency_id.as_ref())
        .await?;

    Ok(Redirect::to("/admin/users?success=role_updated"))
}

/// Every listing, with status controls.
#[instrument(skip(state, user, messages), fields(uid = %user.uid))]
pub async fn listings(
    State(state): State<AppState>,
    RequireAdmin(user): RequireAdmin,
    Query(messages): Query<MessageQuery>,
) -> impl IntoResponse {
    let (rows, alert) = match ListingRepository::new(state.store()).all(None).await {
        Ok(listings) => (listings.iter().map(ListingRow::new).collect(), None),
        Err(e) => {
            tracing::error!(error = %e, "Failed to load listings");
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

/// Every agency with its available-listing count.
#[instrument(skip(state, user), fields(uid = %user.uid))]
pub async fn agencies(
    State(state): State<AppState>,
    RequireAdmin(user): RequireAdmin,
) -> impl IntoResponse {
    let repo = AgencyRepository::new(state.store());
    let (rows, alert) = match state.agencies().await {
        Ok(all) => {
            let mut rows = Vec::with_capacity(all.len());
            let mut failed = false;
            for agency in all.iter() {
                let active_listings =
                    repo.active_listing_count(&agency.id).await.unwrap_or_else(|e| {
                        tracing::warn!(error = %e, agency_id = %agency.id, "Failed to count listings");
                        failed = true;
                        0
                    });
                rows.push(AgencyRow {
                    agency: agency.clone(),
                    active_listings,
                });
            }
            (rows, failed.then_some(LOAD_FAILED))
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to load agencies");
            (Vec::new(), Some(LOAD_FAILED))
        }
    };
    AgenciesTemplate {
        user: Some(user),
        rows,
        alert,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_options_mark_current() {
        let options = role_options(UserRole::Agency);
        assert_eq!(options.len(), UserRole::ALL.len());
        let selected: Vec<_> = options.iter().filter(|o| o.selected).collect();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].value, "agency");
    }
}
