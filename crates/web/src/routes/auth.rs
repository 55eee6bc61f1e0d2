//! Sign in, registration and sign out.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::MessageQuery;
use crate::error::{add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{OptionalUser, clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::services::auth::{AuthError, AuthService};
use crate::state::AppState;

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    #[serde(default)]
    pub display_name: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub user: Option<CurrentUser>,
    pub email: String,
    pub error: Option<String>,
    pub success: Option<String>,
}

#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub user: Option<CurrentUser>,
    pub email: String,
    pub display_name: String,
    pub error: Option<String>,
}

/// Display the login page. Signed-in users go straight to the dashboard.
pub async fn login_page(
    OptionalUser(user): OptionalUser,
    Query(query): Query<MessageQuery>,
) -> Response {
    if user.is_some() {
        return Redirect::to("/dashboard").into_response();
    }
    LoginTemplate {
        user: None,
        email: String::new(),
        error: query.error_text(),
        success: query.success_text(),
    }
    .into_response()
}

fn log_auth_failure(action: &str, err: &AuthError) {
    if err.is_internal() {
        tracing::error!(error = %err, action, "Authentication failed");
    } else {
        tracing::info!(error = %err, action, "Authentication rejected");
    }
}

/// Sign in with email and password.
#[instrument(skip(state, session, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    let profile = match AuthService::new(state.store())
        .login(&form.email, &form.password)
        .await
    {
        Ok(profile) => profile,
        Err(e) => {
            log_auth_failure("login", &e);
            return LoginTemplate {
                user: None,
                email: form.email,
                error: Some(e.user_message()),
                success: None,
            }
            .into_response();
        }
    };

    let user = CurrentUser::from(&profile);
    if let Err(e) = set_current_user(&session, &user).await {
        tracing::error!(error = %e, "Failed to set session");
        return Redirect::to("/auth/login?error=session").into_response();
    }
    set_sentry_user(&user.uid, Some(&user.email));
    add_breadcrumb("auth", "Signed in", None);
    tracing::info!(uid = %user.uid, role = %user.role, "User signed in");

    Redirect::to("/dashboard").into_response()
}

/// Display the registration page.
pub async fn register_page(OptionalUser(user): OptionalUser) -> Response {
    if user.is_some() {
        return Redirect::to("/dashboard").into_response();
    }
    RegisterTemplate {
        user: None,
        email: String::new(),
        display_name: String::new(),
        error: None,
    }
    .into_response()
}

/// Create a `user`-role account and sign it in.
#[instrument(skip(state, session, form))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Response {
    let display_name = form.display_name.trim().to_string();
    let rerender = |error: String| RegisterTemplate {
        user: None,
        email: form.email.clone(),
        display_name: display_name.clone(),
        error: Some(error),
    };

    if form.password != form.password_confirm {
        return rerender("Passwords do not match.".to_string()).into_response();
    }

    let profile = match AuthService::new(state.store())
        .register(&form.email, &form.password, &display_name)
        .await
    {
        Ok(profile) => profile,
        Err(e) => {
            log_auth_failure("register", &e);
            return rerender(e.user_message()).into_response();
        }
    };

    let user = CurrentUser::from(&profile);
    if let Err(e) = set_current_user(&session, &user).await {
        tracing::error!(error = %e, "Failed to set session after registration");
        return Redirect::to("/auth/login?error=session").into_response();
    }
    set_sentry_user(&user.uid, Some(&user.email));
    tracing::info!(uid = %user.uid, "User registered");

    Redirect::to("/dashboard?success=signed_up").into_response()
}

/// Sign out and clear the session.
pub async fn logout(session: Session) -> Redirect {
    if let Err(e) = clear_current_user(&session).await {
        tracing::error!(error = %e, "Failed to clear session");
    }
    clear_sentry_user();
    Redirect::to("/auth/login?success=signed_out")
}
