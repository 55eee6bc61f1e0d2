//! Agency directory and agency detail pages.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::instrument;

use okinawa_rentals_core::shape::{AgencyDirectory, ListingView};
use okinawa_rentals_core::{Agency, AgencyId, ListingStatus};

use super::LOAD_FAILED;
use crate::db::agencies::AgencyRepository;
use crate::db::listings::ListingRepository;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::OptionalUser;
use crate::models::CurrentUser;
use crate::state::AppState;

/// `?q=&sort=&order=`
#[derive(Debug, Default, Deserialize)]
pub struct DirectoryQuery {
    pub q: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
}

/// A sortable column header link.
pub struct SortLink {
    pub label: &'static str,
    pub href: String,
    pub active: bool,
}

#[derive(Template, WebTemplate)]
#[template(path = "agencies/index.html")]
pub struct AgenciesIndexTemplate {
    pub user: Option<CurrentUser>,
    pub query: String,
    pub agencies: Vec<Agency>,
    pub sort_links: Vec<SortLink>,
    pub total: usize,
    pub alert: Option<&'static str>,
}

#[derive(Template, WebTemplate)]
#[template(path = "agencies/show.html")]
pub struct AgencyShowTemplate {
    pub user: Option<CurrentUser>,
    pub agency: Agency,
    pub listings: Vec<ListingView>,
    pub alert: Option<&'static str>,
}

/// Header links for the directory. Clicking the active column flips its order.
fn sort_links(directory: &AgencyDirectory) -> Vec<SortLink> {
    use okinawa_rentals_core::Direction;
    use okinawa_rentals_core::shape::AgencySortKey;

    [("Name", AgencySortKey::Name), ("Location", AgencySortKey::Location)]
        .into_iter()
        .map(|(label, key)| {
            let active = directory.sort == key;
            let order = if active && directory.direction == Direction::Asc {
                "desc"
            } else {
                "asc"
            };
            let mut href = format!("/agencies?sort={}&order={order}", key.as_str());
            if !directory.query.is_empty() {
                href.push_str("&q=");
                href.push_str(&urlencoding::encode(&directory.query));
            }
            SortLink { label, href, active }
        })
        .collect()
}

/// Agency directory with search and sorting.
#[instrument(skip(state, user))]
pub async fn index(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    Query(params): Query<DirectoryQuery>,
) -> impl IntoResponse {
    let directory = AgencyDirectory::new(
        params.q.as_deref(),
        params.sort.as_deref(),
        params.order.as_deref(),
    );

    let (agencies, total, alert) = match state.agencies().await {
        Ok(all) => (directory.apply(&all), all.len(), None),
        Err(e) => {
            tracing::error!(error = %e, "Failed to load agencies");
            (Vec::new(), 0, Some(LOAD_FAILED))
        }
    };

    AgenciesIndexTemplate {
        user,
        sort_links: sort_links(&directory),
        query: directory.query,
        agencies,
        total,
        alert,
    }
}

/// Agency detail with its available listings.
#[instrument(skip(state, user))]
pub async fn show(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    Path(id): Path<String>,
) -> Result<Response> {
    let id = AgencyId::new(id);
    let agency = AgencyRepository::new(state.store())
        .get(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("agency {id}")))?;

    let query = ListingRepository::agency_query(&id).eq("status", ListingStatus::Active.as_str());
    let (listings, alert) = match ListingRepository::new(state.store()).search(&query).await {
        Ok(found) => (found.iter().map(ListingView::from).collect(), None),
        Err(e) => {
            tracing::error!(error = %e, "Failed to load agency listings");
            (Vec::new(), Some(LOAD_FAILED))
        }
    };

    Ok(AgencyShowTemplate {
        user,
        agency,
        listings,
        alert,
    }
    .into_response())
}
