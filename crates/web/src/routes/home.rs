//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use okinawa_rentals_core::search::{POPULAR_SEARCHES, PopularSearch};
use okinawa_rentals_core::shape::ListingView;

use super::LOAD_FAILED;
use crate::db::listings::ListingRepository;
use crate::filters;
use crate::middleware::OptionalUser;
use crate::models::CurrentUser;
use crate::state::AppState;

const FEATURED_LIMIT: usize = 6;

/// Bases offered as one-click searches under the hero.
pub const BASE_LINKS: [(&str, &str); 6] = [
    ("Kadena Air Base", "/listings?base=kadena+air+base"),
    ("Camp Foster", "/listings?base=camp+foster"),
    ("Camp Kinser", "/listings?base=camp+kinser"),
    ("Camp Courtney", "/listings?base=camp+courtney"),
    ("Camp Hansen", "/listings?base=camp+hansen"),
    ("MCAS Futenma", "/listings?base=mcas+futenma"),
];

#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub user: Option<CurrentUser>,
    pub featured: Vec<ListingView>,
    pub popular: &'static [PopularSearch],
    pub bases: &'static [(&'static str, &'static str)],
    pub alert: Option<&'static str>,
}

/// Display the home page with featured listings.
#[instrument(skip(state, user))]
pub async fn home(State(state): State<AppState>, OptionalUser(user): OptionalUser) -> impl IntoResponse {
    let (featured, alert) = match ListingRepository::new(state.store())
        .featured(FEATURED_LIMIT)
        .await
    {
        Ok(listings) => (listings.iter().map(ListingView::from).collect(), None),
        Err(e) => {
            tracing::error!(error = %e, "Failed to load featured listings");
            (Vec::new(), Some(LOAD_FAILED))
        }
    };

    HomeTemplate {
        user,
        featured,
        popular: &POPULAR_SEARCHES,
        bases: &BASE_LINKS,
        alert,
    }
}
