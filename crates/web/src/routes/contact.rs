//! Contact page and the JSON contact relay.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use okinawa_rentals_core::{AgencyId, Email, Inquiry, ListingId};

use crate::db::activity::{ActivityRepository, InquiryRepository};
use crate::error::AppError;
use crate::filters;
use crate::middleware::OptionalUser;
use crate::models::CurrentUser;
use crate::services::email::ContactMessage;
use crate::state::AppState;

const MAX_MESSAGE_LENGTH: usize = 5000;

/// `?agency=&listing=&subject=` prefill for "ask about this listing" links.
#[derive(Debug, Default, Deserialize)]
pub struct ContactQuery {
    pub agency: Option<String>,
    pub listing: Option<String>,
    pub subject: Option<String>,
}

#[derive(Template, WebTemplate)]
#[template(path = "contact.html")]
pub struct ContactTemplate {
    pub user: Option<CurrentUser>,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub agency_id: String,
    pub listing_id: String,
}

/// Display the contact page, prefilled for signed-in users.
pub async fn contact_page(
    OptionalUser(user): OptionalUser,
    Query(query): Query<ContactQuery>,
) -> impl IntoResponse {
    let (name, email) = user
        .as_ref()
        .map(|u| (u.display_name.clone(), u.email.clone()))
        .unwrap_or_default();
    ContactTemplate {
        user,
        name,
        email,
        subject: query.subject.unwrap_or_default(),
        agency_id: query.agency.unwrap_or_default(),
        listing_id: query.listing.unwrap_or_default(),
    }
}

/// Contact relay request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub agency_id: Option<String>,
    #[serde(default)]
    pub listing_id: Option<String>,
}

/// Response for form submission.
#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub success: bool,
    pub message: String,
}

impl ContactResponse {
    fn rejected(message: impl Into<String>) -> Response {
        (
            StatusCode::BAD_REQUEST,
            Json(Self {
                success: false,
                message: message.into(),
            }),
        )
            .into_response()
    }
}

impl ContactRequest {
    /// Trim and check required fields.
    ///
    /// # Errors
    ///
    /// Returns the first problem as a user-facing message.
    pub fn validate(&self) -> Result<ContactMessage, String> {
        let name = self.name.trim();
        let subject = self.subject.trim();
        let message = self.message.trim();
        if name.is_empty() || subject.is_empty() || message.is_empty() {
            return Err("Name, subject and message are required.".to_string());
        }
        if message.chars().count() > MAX_MESSAGE_LENGTH {
            return Err(format!("Messages are limited to {MAX_MESSAGE_LENGTH} characters."));
        }
        let email = Email::parse(&self.email)
            .map_err(|_| "Please enter a valid email address.".to_string())?;
        Ok(ContactMessage {
            name: name.to_string(),
            email,
            subject: subject.to_string(),
            message: message.to_string(),
        })
    }

    fn agency_id(&self) -> Option<AgencyId> {
        self.agency_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(AgencyId::new)
    }

    fn listing_id(&self) -> Option<ListingId> {
        self.listing_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(ListingId::new)
    }
}

/// Relay a contact message to the site inbox.
///
/// POST /api/contact
///
/// When the message is about an agency, an inquiry is also recorded for
/// that agency's console.
#[instrument(skip(state, request), fields(email = %request.email))]
pub async fn submit(State(state): State<AppState>, Json(request): Json<ContactRequest>) -> Response {
    let contact = match request.validate() {
        Ok(contact) => contact,
        Err(message) => return ContactResponse::rejected(message),
    };

    let Some(mailer) = state.email() else {
        return AppError::Unavailable("contact relay is not configured".to_string())
            .into_json_response();
    };

    if let Err(e) = mailer.send_contact(&contact).await {
        return AppError::from(e).into_json_response();
    }

    if let Some(agency_id) = request.agency_id() {
        record_inquiry(&state, &agency_id, request.listing_id(), &contact).await;
    }

    Json(ContactResponse {
        success: true,
        message: "Thanks! Your message has been sent.".to_string(),
    })
    .into_response()
}

/// Store the inquiry for the agency console. Failures are logged only; the
/// email has already gone out.
async fn record_inquiry(
    state: &AppState,
    agency_id: &AgencyId,
    listing_id: Option<ListingId>,
    contact: &ContactMessage,
) {
    let inquiry = Inquiry {
        agency_id: agency_id.clone(),
        listing_id,
        name: contact.name.clone(),
        email: contact.email.as_str().to_string(),
        message: contact.message.clone(),
        ..Inquiry::default()
    };
    if let Err(e) = InquiryRepository::new(state.store()).create(&inquiry).await {
        tracing::warn!(error = %e, "Failed to record inquiry");
        return;
    }
    if let Err(e) = ActivityRepository::new(state.store())
        .record(agency_id, "inquiry_received", format!("Inquiry from {}", contact.name))
        .await
    {
        tracing::warn!(error = %e, "Failed to record inquiry activity");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn request(email: &str, message: &str) -> ContactRequest {
        ContactRequest {
            name: " Sam ".to_string(),
            email: email.to_string(),
            subject: "Viewing".to_string(),
            message: message.to_string(),
            agency_id: Some("  ".to_string()),
            listing_id: None,
        }
    }

    #[test]
    fn test_validate_trims_fields() {
        let contact = request("sam@example.com", " Is it still available? ").validate().unwrap();
        assert_eq!(contact.name, "Sam");
        assert_eq!(contact.message, "Is it still available?");
        assert_eq!(contact.email.as_str(), "sam@example.com");
    }

    #[test]
    fn test_validate_rejects_bad_input() {
        assert!(request("not-an-email", "hi").validate().is_err());
        assert!(request("sam@example.com", "   ").validate().is_err());
        let long = "x".repeat(MAX_MESSAGE_LENGTH + 1);
        assert!(request("sam@example.com", &long).validate().is_err());
    }

    #[test]
    fn test_blank_agency_id_is_ignored() {
        assert!(request("sam@example.com", "hi").agency_id().is_none());
    }
}
