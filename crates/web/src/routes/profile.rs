//! Self-service profile: display name, military status, contact details and
//! housing preferences.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use okinawa_rentals_core::{ContactDetails, HousingPreferences, MilitaryStatus, UserProfile};

use super::listing_form::SelectOption;
use crate::db::users::UserRepository;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{RequireUser, set_current_user};
use crate::models::CurrentUser;
use crate::state::AppState;

const MAX_NAME_LEN: usize = 80;

/// Raw profile form. Every field is text so a bad number re-renders the form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProfileForm {
    pub display_name: String,
    pub military_status: String,
    pub phone: String,
    pub line_id: String,
    pub near_base: String,
    pub max_budget: String,
    pub min_bedrooms: String,
    pub pet_friendly: Option<String>,
}

impl ProfileForm {
    #[must_use]
    pub fn from_profile(profile: &UserProfile) -> Self {
        let prefs = &profile.preferences;
        Self {
            display_name: profile.display_name.clone(),
            military_status: profile
                .military_status
                .map(|s| s.as_str().to_string())
                .unwrap_or_default(),
            phone: profile.contact.phone.clone().unwrap_or_default(),
            line_id: profile.contact.line_id.clone().unwrap_or_default(),
            near_base: prefs.near_base.clone().unwrap_or_default(),
            max_budget: prefs.max_budget.map(|n| n.to_string()).unwrap_or_default(),
            min_bedrooms: prefs.min_bedrooms.map(|n| n.to_string()).unwrap_or_default(),
            pet_friendly: prefs.pet_friendly.then(|| "on".to_string()),
        }
    }

    /// Apply the submitted values on top of `profile`.
    ///
    /// # Errors
    ///
    /// Returns one message per invalid field.
    pub fn apply(&self, profile: &UserProfile) -> std::result::Result<UserProfile, Vec<String>> {
        let mut errors = Vec::new();

        let display_name = self.display_name.trim().to_string();
        if display_name.chars().count() > MAX_NAME_LEN {
            errors.push(format!("Name must be at most {MAX_NAME_LEN} characters."));
        }
        let military_status = match self.military_status.trim() {
            "" => None,
            raw => MilitaryStatus::parse(raw).or_else(|| {
                errors.push("Military status is not valid.".to_string());
                None
            }),
        };
        let max_budget = number(&self.max_budget, "Monthly budget", &mut errors);
        let min_bedrooms = number(&self.min_bedrooms, "Bedrooms", &mut errors);

        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(UserProfile {
            display_name,
            military_status,
            contact: ContactDetails {
                phone: text(&self.phone),
                line_id: text(&self.line_id),
            },
            preferences: HousingPreferences {
                near_base: text(&self.near_base).map(|base| base.to_lowercase()),
                max_budget,
                min_bedrooms,
                pet_friendly: self.pet_friendly.is_some(),
            },
            ..profile.clone()
        })
    }

    #[must_use]
    pub fn status_options(&self) -> Vec<SelectOption> {
        let current = self.military_status.trim();
        std::iter::once(SelectOption {
            value: String::new(),
            label: "Prefer not to say".to_string(),
            selected: current.is_empty(),
        })
        .chain(MilitaryStatus::ALL.into_iter().map(|status| SelectOption {
            value: status.as_str().to_string(),
            label: status.label().to_string(),
            selected: status.as_str().eq_ignore_ascii_case(current),
        }))
        .collect()
    }
}

fn text(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn number<T: std::str::FromStr>(raw: &str, label: &str, errors: &mut Vec<String>) -> Option<T> {
    let cleaned: String = raw
        .trim()
        .trim_start_matches('¥')
        .chars()
        .filter(|c| *c != ',')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse().map_or_else(
        |_| {
            errors.push(format!("{label} must be a whole number."));
            None
        },
        Some,
    )
}

#[derive(Template, WebTemplate)]
#[template(path = "profile.html")]
pub struct ProfileTemplate {
    pub user: Option<CurrentUser>,
    pub status_options: Vec<SelectOption>,
    pub form: ProfileForm,
    pub errors: Vec<String>,
}

fn page(user: CurrentUser, form: ProfileForm, errors: Vec<String>) -> ProfileTemplate {
    ProfileTemplate {
        user: Some(user),
        status_options: form.status_options(),
        form,
        errors,
    }
}

async fn load(state: &AppState, user: &CurrentUser) -> Result<UserProfile> {
    UserRepository::new(state.store())
        .get(&user.uid)
        .await?
        .ok_or_else(|| AppError::NotFound("profile".to_string()))
}

/// Profile form prefilled from the stored profile.
#[instrument(skip(state, user), fields(uid = %user.uid))]
pub async fn profile_page(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Response> {
    let profile = load(&state, &user).await?;
    Ok(page(user, ProfileForm::from_profile(&profile), Vec::new()).into_response())
}

/// Save the profile and refresh the session's display name.
#[instrument(skip(state, user, session, form), fields(uid = %user.uid))]
pub async fn update_profile(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    session: Session,
    Form(form): Form<ProfileForm>,
) -> Result<Response> {
    let stored = load(&state, &user).await?;
    let updated = match form.apply(&stored) {
        Ok(profile) => profile,
        Err(errors) => return Ok(page(user, form, errors).into_response()),
    };

    if let Err(e) = UserRepository::new(state.store()).update_details(&updated).await {
        tracing::error!(error = %e, "Failed to save profile");
        let errors = vec!["We couldn't save your profile. Please try again.".to_string()];
        return Ok(page(user, form, errors).into_response());
    }

    let refreshed = CurrentUser {
        display_name: updated.display_name.clone(),
        ..user
    };
    if let Err(e) = set_current_user(&session, &refreshed).await {
        tracing::warn!(error = %e, "Failed to refresh session after profile update");
    }

    Ok(Redirect::to("/dashboard?success=profile_updated").into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use okinawa_rentals_core::{ListingId, UserRole};

    use super::*;

    fn stored() -> UserProfile {
        UserProfile {
            email: "sam@example.com".to_string(),
            role: UserRole::Paid,
            favorites: vec![ListingId::new("l1")],
            ..UserProfile::default()
        }
    }

    #[test]
    fn test_apply_parses_every_section() {
        let form = ProfileForm {
            display_name: " Sam Higa ".to_string(),
            military_status: "dependent".to_string(),
            phone: "090-1234-5678".to_string(),
            line_id: String::new(),
            near_base: "Camp Foster".to_string(),
            max_budget: "¥180,000".to_string(),
            min_bedrooms: "2".to_string(),
            pet_friendly: Some("on".to_string()),
        };
        let profile = form.apply(&stored()).unwrap();
        assert_eq!(profile.display_name, "Sam Higa");
        assert_eq!(profile.military_status, Some(MilitaryStatus::Dependent));
        assert_eq!(profile.contact.phone.as_deref(), Some("090-1234-5678"));
        assert_eq!(profile.contact.line_id, None);
        assert_eq!(profile.preferences.near_base.as_deref(), Some("camp foster"));
        assert_eq!(profile.preferences.max_budget, Some(180_000));
        assert_eq!(profile.preferences.min_bedrooms, Some(2));
        assert!(profile.preferences.pet_friendly);
        assert_eq!(profile.role, UserRole::Paid);
        assert_eq!(profile.favorites, vec![ListingId::new("l1")]);
    }

    #[test]
    fn test_apply_reports_bad_fields() {
        let form = ProfileForm {
            military_status: "general".to_string(),
            max_budget: "lots".to_string(),
            min_bedrooms: "-1".to_string(),
            ..ProfileForm::default()
        };
        let errors = form.apply(&stored()).unwrap_err();
        assert_eq!(
            errors,
            vec![
                "Military status is not valid.".to_string(),
                "Monthly budget must be a whole number.".to_string(),
                "Bedrooms must be a whole number.".to_string(),
            ]
        );
    }

    #[test]
    fn test_form_round_trip() {
        let form = ProfileForm {
            display_name: "Sam".to_string(),
            military_status: "active".to_string(),
            near_base: "kadena air base".to_string(),
            max_budget: "200000".to_string(),
            ..ProfileForm::default()
        };
        let profile = form.apply(&stored()).unwrap();
        assert_eq!(ProfileForm::from_profile(&profile), form);
    }

    #[test]
    fn test_status_options_mark_current() {
        let form = ProfileForm {
            military_status: "civilian".to_string(),
            ..ProfileForm::default()
        };
        let selected: Vec<_> = form
            .status_options()
            .into_iter()
            .filter(|o| o.selected)
            .map(|o| o.value)
            .collect();
        assert_eq!(selected, vec!["civilian".to_string()]);
    }
}
