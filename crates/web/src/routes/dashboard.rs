//! Signed-in tenant dashboard.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use tracing::instrument;

use okinawa_rentals_core::shape::ListingView;
use okinawa_rentals_core::{HousingPreferences, ListingStatus, TourRequest};

use super::agency::ListingRow;
use super::{LOAD_FAILED, MessageQuery};
use crate::db::listings::ListingRepository;
use crate::db::tours::TourRequestRepository;
use crate::db::users::UserRepository;
use crate::filters;
use crate::middleware::RequireUser;
use crate::models::CurrentUser;
use crate::state::AppState;

#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub user: Option<CurrentUser>,
    pub me: CurrentUser,
    pub favorites: Vec<ListingView>,
    pub tours: Vec<TourRequest>,
    /// `/listings` link built from saved housing preferences, if any are set.
    pub preference_search: Option<String>,
    /// Listings the user posted, for roles that may post.
    pub own_listings: Vec<ListingRow>,
    pub alert: Option<&'static str>,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Favorites, tour requests and own listings for the signed-in user.
#[instrument(skip(state, user, messages), fields(uid = %user.uid))]
pub async fn dashboard(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Query(messages): Query<MessageQuery>,
) -> impl IntoResponse {
    let mut alert = None;

    let (favorite_ids, preference_search) =
        match UserRepository::new(state.store()).get(&user.uid).await {
            Ok(Some(profile)) => (
                profile.favorites,
                preference_search(&profile.preferences),
            ),
            Ok(None) => (Vec::new(), None),
            Err(e) => {
                tracing::error!(error = %e, "Failed to load profile");
                alert = Some(LOAD_FAILED);
                (Vec::new(), None)
            }
        };

    let listings = ListingRepository::new(state.store());
    let mut favorites = Vec::with_capacity(favorite_ids.len());
    for id in &favorite_ids {
        match listings.get(id).await {
            Ok(Some(listing)) if listing.status != ListingStatus::Inactive => {
                favorites.push(ListingView::from(&listing));
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(error = %e, listing_id = %id, "Failed to load favorite");
                alert = Some(LOAD_FAILED);
            }
        }
    }

    let tours = TourRequestRepository::new(state.store())
        .for_user(&user.uid)
        .await
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to load tour requests");
            alert = Some(LOAD_FAILED);
            Vec::new()
        });

    let own_listings = if user.can_post_listings() {
        listings
            .created_by(&user.uid)
            .await
            .map(|own| own.iter().map(ListingRow::new).collect())
            .unwrap_or_else(|e| {
                tracing::error!(error = %e, "Failed to load own listings");
                alert = Some(LOAD_FAILED);
                Vec::new()
            })
    } else {
        Vec::new()
    };

    DashboardTemplate {
        user: Some(user.clone()),
        me: user,
        favorites,
        tours,
        preference_search,
        own_listings,
        alert,
        error: messages.error_text(),
        success: messages.success_text(),
    }
}

fn preference_search(prefs: &HousingPreferences) -> Option<String> {
    let pairs = prefs.search_pairs();
    if pairs.is_empty() {
        return None;
    }
    let query = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish();
    Some(format!("/listings?{query}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preference_search_href() {
        assert_eq!(preference_search(&HousingPreferences::default()), None);
        let prefs = HousingPreferences {
            near_base: Some("camp foster".to_string()),
            min_bedrooms: Some(2),
            ..HousingPreferences::default()
        };
        assert_eq!(
            preference_search(&prefs).as_deref(),
            Some("/listings?base=camp+foster&bedrooms=2")
        );
    }
}
