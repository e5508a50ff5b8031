//! Authentication route handlers.
//!
//! Login, signup, logout and the emailed password reset flow. Forms that fail
//! validation re-render with HTTP 422, the first error as a banner, per-field
//! annotations and the previous input. Passwords are never echoed back.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use larder_core::UserId;

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{OptionalAuth, clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::services::auth::{AuthError, AuthService, FieldErrors, SignupInput};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Signup form data.
#[derive(Debug, Deserialize)]
pub struct SignupForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// Password reset request form data.
#[derive(Debug, Deserialize)]
pub struct ResetForm {
    pub email: String,
}

/// New password form data.
#[derive(Debug, Deserialize)]
pub struct NewPasswordForm {
    pub user_id: String,
    pub token: String,
    pub password: String,
}

// =============================================================================
// Query Types
// =============================================================================

/// Error code carried across a redirect.
#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
}

/// Banner text for a redirect error code.
fn error_message(code: &str) -> &'static str {
    match code {
        "unknown_email" => "No account with that email found.",
        "invalid_token" => "That reset link is invalid or has expired.",
        _ => "Something went wrong, please try again.",
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub current_user: Option<CurrentUser>,
    pub error: Option<String>,
    pub errors: FieldErrors,
    pub old_email: String,
}

/// Signup page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/signup.html")]
pub struct SignupTemplate {
    pub current_user: Option<CurrentUser>,
    pub error: Option<String>,
    pub errors: FieldErrors,
    pub old_name: String,
    pub old_email: String,
}

/// Password reset request page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/reset.html")]
pub struct ResetTemplate {
    pub current_user: Option<CurrentUser>,
    pub error: Option<String>,
}

/// New password page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/new_password.html")]
pub struct NewPasswordTemplate {
    pub current_user: Option<CurrentUser>,
    pub error: Option<String>,
    pub errors: FieldErrors,
    pub user_id: UserId,
    pub token: String,
}

/// Split an auth failure into a form re-render or a hard error.
fn form_errors(err: AuthError) -> std::result::Result<FieldErrors, AppError> {
    err.field_errors().ok_or_else(|| err.into())
}

fn unprocessable(template: impl IntoResponse) -> Response {
    (StatusCode::UNPROCESSABLE_ENTITY, template).into_response()
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
pub async fn login_page(OptionalAuth(current_user): OptionalAuth) -> impl IntoResponse {
    LoginTemplate {
        current_user,
        error: None,
        errors: FieldErrors::new(),
        old_email: String::new(),
    }
}

/// Handle login form submission.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let auth = AuthService::new(state.pool(), state.config().password_hash_cost);

    let user = match auth.login(&form.email, &form.password).await {
        Ok(user) => user,
        Err(e) => {
            let errors = form_errors(e)?;
            tracing::info!(error = %errors, "Login rejected");
            return Ok(unprocessable(LoginTemplate {
                current_user: None,
                error: errors.first_message().map(str::to_string),
                errors,
                old_email: form.email,
            }));
        }
    };

    let current_user = CurrentUser::from(&user);
    set_current_user(&session, &current_user)
        .await
        .map_err(|e| AppError::Internal(format!("failed to store session: {e}")))?;
    set_sentry_user(&user.id, Some(user.email.as_str()));

    tracing::info!(user_id = %user.id, "User logged in");
    Ok(Redirect::to("/").into_response())
}

/// Log out by destroying the session.
#[instrument(skip_all)]
pub async fn logout(session: Session) -> Result<Redirect> {
    clear_current_user(&session)
        .await
        .map_err(|e| AppError::Internal(format!("failed to destroy session: {e}")))?;
    clear_sentry_user();

    Ok(Redirect::to("/"))
}

// =============================================================================
// Signup Routes
// =============================================================================

/// Display the signup page.
pub async fn signup_page(OptionalAuth(current_user): OptionalAuth) -> impl IntoResponse {
    SignupTemplate {
        current_user,
        error: None,
        errors: FieldErrors::new(),
        old_name: String::new(),
        old_email: String::new(),
    }
}

/// Handle signup form submission.
#[instrument(skip_all)]
pub async fn signup(
    State(state): State<AppState>,
    Form(form): Form<SignupForm>,
) -> Result<Response> {
    let auth = AuthService::new(state.pool(), state.config().password_hash_cost);
    let input = SignupInput {
        name: &form.name,
        email: &form.email,
        password: &form.password,
        confirm_password: &form.confirm_password,
    };

    let user = match auth.signup(&input).await {
        Ok(user) => user,
        Err(e) => {
            let errors = form_errors(e)?;
            return Ok(unprocessable(SignupTemplate {
                current_user: None,
                error: errors.first_message().map(str::to_string),
                errors,
                old_name: form.name,
                old_email: form.email,
            }));
        }
    };

    tracing::info!(user_id = %user.id, "User signed up");
    let email = state.email();
    email.spawn_send(email.welcome_email(&user.email, &user.name));

    Ok(Redirect::to("/login").into_response())
}

// =============================================================================
// Password Reset Routes
// =============================================================================

/// Display the password reset request page.
pub async fn reset_page(
    OptionalAuth(current_user): OptionalAuth,
    Query(query): Query<MessageQuery>,
) -> impl IntoResponse {
    ResetTemplate {
        current_user,
        error: query.error.as_deref().map(|code| error_message(code).to_string()),
    }
}

/// Handle a password reset request: issue a token and email the link.
#[instrument(skip_all)]
pub async fn reset(State(state): State<AppState>, Form(form): Form<ResetForm>) -> Result<Redirect> {
    let auth = AuthService::new(state.pool(), state.config().password_hash_cost);

    let (user, reset) = match auth.request_password_reset(&form.email).await {
        Ok(issued) => issued,
        Err(AuthError::UserNotFound) => {
            return Ok(Redirect::to("/reset?error=unknown_email"));
        }
        Err(e) => return Err(e.into()),
    };

    let reset_url = state
        .config()
        .absolute_url(&format!("/reset/{}", reset.token));
    let email = state.email();
    email.spawn_send(email.password_reset_email(&user.email, &user.name, &reset_url));

    tracing::info!(user_id = %user.id, "Password reset requested");
    Ok(Redirect::to("/"))
}

/// Display the new password form for a valid reset token.
#[instrument(skip_all)]
pub async fn new_password_page(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Response> {
    let auth = AuthService::new(state.pool(), state.config().password_hash_cost);

    match auth.verify_reset_token(&token).await {
        Ok(reset) => Ok(NewPasswordTemplate {
            current_user: None,
            error: None,
            errors: FieldErrors::new(),
            user_id: reset.user_id,
            token: reset.token,
        }
        .into_response()),
        Err(AuthError::InvalidResetToken) => {
            Ok(Redirect::to("/reset?error=invalid_token").into_response())
        }
        Err(e) => Err(e.into()),
    }
}

/// Handle the new password form.
#[instrument(skip_all)]
pub async fn new_password(
    State(state): State<AppState>,
    Form(form): Form<NewPasswordForm>,
) -> Result<Response> {
    let invalid_token = || Redirect::to("/reset?error=invalid_token").into_response();

    let Ok(user_id) = form.user_id.parse::<UserId>() else {
        return Ok(invalid_token());
    };

    let auth = AuthService::new(state.pool(), state.config().password_hash_cost);
    match auth
        .set_new_password(user_id, &form.token, &form.password)
        .await
    {
        Ok(()) => {
            tracing::info!(user_id = %user_id, "Password reset completed");
            Ok(Redirect::to("/login").into_response())
        }
        Err(AuthError::InvalidResetToken) => Ok(invalid_token()),
        Err(e) => {
            let errors = form_errors(e)?;
            Ok(unprocessable(NewPasswordTemplate {
                current_user: None,
                error: errors.first_message().map(str::to_string),
                errors,
                user_id,
                token: form.token,
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_have_messages() {
        assert_eq!(
            error_message("unknown_email"),
            "No account with that email found."
        );
        assert_eq!(
            error_message("invalid_token"),
            "That reset link is invalid or has expired."
        );
        assert_eq!(
            error_message("<script>"),
            "Something went wrong, please try again."
        );
    }

    #[test]
    fn test_login_failure_is_a_form_error() {
        let errors = form_errors(AuthError::IncorrectPassword).unwrap_or_default();
        assert_eq!(errors.message_for("password"), Some("Password is incorrect."));
    }

    #[test]
    fn test_hash_failure_is_not_a_form_error() {
        assert!(matches!(
            form_errors(AuthError::PasswordHash),
            Err(AppError::Internal(_))
        ));
    }
}
