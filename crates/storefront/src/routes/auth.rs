//! Authentication route handlers.
//!
//! Login, registration, OTP verification, and password reset against the
//! EcoBloom backend. Every submit validates locally first; a failed
//! validation redirects back with the message and never reaches the
//! network. Backend messages are surfaced verbatim, transport failures get
//! generic wording.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::backend::NewAccount;
use crate::filters;
use crate::middleware::{clear_current_user, set_current_user};
use crate::models::{CurrentUser, session_keys};
use crate::routes::{MessageQuery, flash_error, flash_success};
use crate::state::AppState;
use crate::validate;

/// Seconds a user must wait between OTP resends.
const RESEND_COOLDOWN_SECS: i64 = 30;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub number: String,
    pub password: String,
}

/// OTP submission form data.
#[derive(Debug, Deserialize)]
pub struct OtpForm {
    pub email: String,
    pub otp: String,
}

/// Email-only form data (OTP request / resend).
#[derive(Debug, Deserialize)]
pub struct EmailForm {
    pub email: String,
}

/// Password reset form data (forgot-password step 2).
#[derive(Debug, Deserialize)]
pub struct ResetPasswordForm {
    pub email: String,
    pub otp: String,
    pub new_password: String,
    pub confirm_password: String,
}

// =============================================================================
// Query Types
// =============================================================================

/// Query parameters for the two-step OTP pages.
#[derive(Debug, Deserialize)]
pub struct StepQuery {
    pub step: Option<u8>,
    pub email: Option<String>,
    pub error: Option<String>,
    pub success: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub error: Option<String>,
}

/// Post-registration OTP page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/verify_otp.html")]
pub struct VerifyOtpTemplate {
    pub email: String,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Two-step account verification template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/verify_account.html")]
pub struct VerifyAccountTemplate {
    pub step2: bool,
    pub email: String,
    pub cooldown: i64,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Two-step forgot-password template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/forgot_password.html")]
pub struct ForgotPasswordTemplate {
    pub step2: bool,
    pub email: String,
    pub error: Option<String>,
    pub success: Option<String>,
}

// =============================================================================
// Session cooldown helpers
// =============================================================================

/// Seconds left before the session may request another OTP.
async fn resend_cooldown_remaining(session: &Session) -> i64 {
    let last_sent: Option<i64> = session
        .get(session_keys::OTP_LAST_SENT)
        .await
        .ok()
        .flatten();
    last_sent.map_or(0, |sent| {
        (sent + RESEND_COOLDOWN_SECS - Utc::now().timestamp()).max(0)
    })
}

/// Record that an OTP was just sent for this session.
async fn mark_otp_sent(session: &Session) {
    if let Err(e) = session
        .insert(session_keys::OTP_LAST_SENT, Utc::now().timestamp())
        .await
    {
        tracing::warn!(error = %e, "failed to record OTP cooldown");
    }
}

fn step2_url(base: &str, email: &str) -> String {
    format!("{base}?step=2&email={}", urlencoding::encode(email))
}

// =============================================================================
// Login / Logout
// =============================================================================

/// Display the login page.
pub async fn login_page(Query(query): Query<MessageQuery>) -> impl IntoResponse {
    LoginTemplate {
        error: query.error,
        success: query.success,
    }
}

/// Handle login form submission.
///
/// Captures the backend session cookie, then probes `GET /users/me` exactly
/// once to populate the session identity.
#[instrument(skip_all, fields(email = %form.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    let email = form.email.trim();
    if email.is_empty() || form.password.is_empty() {
        return flash_error("/auth/login", "Email and password are required").into_response();
    }

    let token = match state.backend().login(email, &form.password).await {
        Ok(token) => token,
        Err(e) => {
            tracing::warn!(error = %e, "login failed");
            return flash_error("/auth/login", &e.user_message("Login failed")).into_response();
        }
    };

    match state.backend().me(&token).await {
        Ok(user) => {
            let current = CurrentUser::new(user, token);
            if let Err(e) = set_current_user(&session, &current).await {
                tracing::error!(error = %e, "failed to set session");
                return flash_error("/auth/login", "Session error, please try again")
                    .into_response();
            }
            Redirect::to("/").into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "identity probe failed after login");
            flash_error("/auth/login", &e.user_message("Login failed")).into_response()
        }
    }
}

/// Handle logout.
///
/// Invalidates the backend session best-effort, then destroys ours.
#[instrument(skip_all)]
pub async fn logout(State(state): State<AppState>, session: Session) -> Response {
    if let Ok(Some(user)) = session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await
        && let Err(e) = state.backend().logout(user.token()).await
    {
        tracing::warn!(error = %e, "backend logout failed");
    }

    if let Err(e) = clear_current_user(&session).await {
        tracing::error!(error = %e, "failed to clear session");
    }
    if let Err(e) = session.flush().await {
        tracing::error!(error = %e, "failed to flush session");
    }

    Redirect::to("/auth/login").into_response()
}

// =============================================================================
// Registration
// =============================================================================

/// Display the registration page.
pub async fn register_page(Query(query): Query<MessageQuery>) -> impl IntoResponse {
    RegisterTemplate { error: query.error }
}

/// Handle registration form submission. The backend mails an OTP; on
/// success the user lands on the verify page with the email pre-filled.
#[instrument(skip_all, fields(email = %form.email))]
pub async fn register(State(state): State<AppState>, Form(form): Form<RegisterForm>) -> Response {
    if form.name.trim().is_empty()
        || form.email.trim().is_empty()
        || form.number.trim().is_empty()
        || form.password.is_empty()
    {
        return flash_error("/auth/register", "All fields are required").into_response();
    }
    let email = match validate::email(&form.email) {
        Ok(email) => email,
        Err(message) => return flash_error("/auth/register", &message).into_response(),
    };
    let number = match validate::phone(&form.number) {
        Ok(number) => number,
        Err(message) => return flash_error("/auth/register", &message).into_response(),
    };
    if let Err(message) = validate::password(&form.password) {
        return flash_error("/auth/register", &message).into_response();
    }

    let account = NewAccount {
        name: form.name.trim().to_string(),
        email: email.to_string(),
        number: number.to_string(),
        password: form.password,
    };

    match state.backend().register(&account).await {
        Ok(_) => flash_success(
            &format!(
                "/auth/verify-otp?email={}",
                urlencoding::encode(email.as_str())
            ),
            "Registered! OTP sent to your email.",
        )
        .into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "registration failed");
            flash_error("/auth/register", &e.user_message("Registration failed")).into_response()
        }
    }
}

// =============================================================================
// Post-registration OTP
// =============================================================================

/// Display the post-registration OTP page. Without an email to verify,
/// fall back to the self-service verify-account flow.
pub async fn verify_otp_page(Query(query): Query<StepQuery>) -> Response {
    let Some(email) = query.email.filter(|e| !e.is_empty()) else {
        return Redirect::to("/auth/verify-account").into_response();
    };
    VerifyOtpTemplate {
        email,
        error: query.error,
        success: query.success,
    }
    .into_response()
}

/// Handle OTP submission after registration.
#[instrument(skip_all, fields(email = %form.email))]
pub async fn verify_otp(State(state): State<AppState>, Form(form): Form<OtpForm>) -> Response {
    let email = form.email.trim();
    let otp = form.otp.trim();
    let back = format!("/auth/verify-otp?email={}", urlencoding::encode(email));

    if email.is_empty() || otp.is_empty() {
        return flash_error(&back, "Email and OTP are required").into_response();
    }

    match state.backend().verify_otp(email, otp).await {
        Ok(_) => {
            flash_success("/auth/login", "Account verified! Please login.").into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "OTP verification failed");
            flash_error(&back, &e.user_message("Verification failed")).into_response()
        }
    }
}

// =============================================================================
// Two-step account verification
// =============================================================================

/// Display the verify-account page.
///
/// Step 1 collects the email; step 2 shows the OTP entry with a resend
/// control. The "use a different email" link is a plain navigation back to
/// step 1 - no network call, OTP field gone.
pub async fn verify_account_page(
    session: Session,
    Query(query): Query<StepQuery>,
) -> impl IntoResponse {
    let email = query.email.unwrap_or_default();
    let step2 = query.step == Some(2) && !email.is_empty();
    let cooldown = if step2 {
        resend_cooldown_remaining(&session).await
    } else {
        0
    };

    VerifyAccountTemplate {
        step2,
        email,
        cooldown,
        error: query.error,
        success: query.success,
    }
}

/// Step 1: request an OTP and move to step 2.
#[instrument(skip_all, fields(email = %form.email))]
pub async fn verify_account_send(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<EmailForm>,
) -> Response {
    let email = match validate::email(&form.email) {
        Ok(email) => email,
        Err(_) => {
            return flash_error("/auth/verify-account", "Please enter a valid email")
                .into_response();
        }
    };

    match state.backend().resend_otp(email.as_str()).await {
        Ok(_) => {
            mark_otp_sent(&session).await;
            flash_success(
                &step2_url("/auth/verify-account", email.as_str()),
                "OTP sent to your email",
            )
            .into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to send OTP");
            flash_error(
                "/auth/verify-account",
                &e.user_message("Failed to send OTP"),
            )
            .into_response()
        }
    }
}

/// Step 2: resend the OTP, refused while the cooldown runs.
#[instrument(skip_all, fields(email = %form.email))]
pub async fn verify_account_resend(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<EmailForm>,
) -> Response {
    let email = match validate::email(&form.email) {
        Ok(email) => email,
        Err(_) => {
            return flash_error("/auth/verify-account", "Please enter a valid email")
                .into_response();
        }
    };
    let back = step2_url("/auth/verify-account", email.as_str());

    let remaining = resend_cooldown_remaining(&session).await;
    if remaining > 0 {
        return flash_error(
            &back,
            &format!("Please wait {remaining}s before resending"),
        )
        .into_response();
    }

    match state.backend().resend_otp(email.as_str()).await {
        Ok(_) => {
            mark_otp_sent(&session).await;
            flash_success(&back, "OTP resent").into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to resend OTP");
            flash_error(&back, &e.user_message("Failed to resend OTP")).into_response()
        }
    }
}

/// Step 2: submit the OTP.
#[instrument(skip_all, fields(email = %form.email))]
pub async fn verify_account(State(state): State<AppState>, Form(form): Form<OtpForm>) -> Response {
    let email = match validate::email(&form.email) {
        Ok(email) => email,
        Err(_) => return flash_error("/auth/verify-account", "Invalid email").into_response(),
    };
    let back = step2_url("/auth/verify-account", email.as_str());

    let otp = form.otp.trim();
    if otp.is_empty() {
        return flash_error(&back, "Please enter the OTP").into_response();
    }

    match state.backend().verify_otp(email.as_str(), otp).await {
        Ok(_) => {
            flash_success("/", "Account verified! You can log in now.").into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "OTP verification failed");
            flash_error(&back, &e.user_message("OTP verification failed")).into_response()
        }
    }
}

// =============================================================================
// Forgot password
// =============================================================================

/// Display the forgot-password page (two steps, like verify-account).
pub async fn forgot_password_page(Query(query): Query<StepQuery>) -> impl IntoResponse {
    let email = query.email.unwrap_or_default();
    ForgotPasswordTemplate {
        step2: query.step == Some(2) && !email.is_empty(),
        email,
        error: query.error,
        success: query.success,
    }
}

/// Step 1: request a password-reset OTP.
#[instrument(skip_all, fields(email = %form.email))]
pub async fn forgot_password_send(
    State(state): State<AppState>,
    Form(form): Form<EmailForm>,
) -> Response {
    let email = match validate::email(&form.email) {
        Ok(email) => email,
        Err(_) => {
            return flash_error("/auth/forgot-password", "Please enter a valid email")
                .into_response();
        }
    };

    match state.backend().forgot_password(email.as_str()).await {
        Ok(_) => flash_success(
            &step2_url("/auth/forgot-password", email.as_str()),
            "OTP sent to your email",
        )
        .into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "failed to send reset OTP");
            flash_error(
                "/auth/forgot-password",
                &e.user_message("Failed to send OTP"),
            )
            .into_response()
        }
    }
}

/// Step 2: resend the reset OTP.
#[instrument(skip_all, fields(email = %form.email))]
pub async fn forgot_password_resend(
    State(state): State<AppState>,
    Form(form): Form<EmailForm>,
) -> Response {
    let email = match validate::email(&form.email) {
        Ok(email) => email,
        Err(_) => {
            return flash_error("/auth/forgot-password", "Please enter a valid email")
                .into_response();
        }
    };
    let back = step2_url("/auth/forgot-password", email.as_str());

    match state.backend().forgot_password(email.as_str()).await {
        Ok(_) => flash_success(&back, "OTP resent").into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "failed to resend reset OTP");
            flash_error(&back, &e.user_message("Failed to resend OTP")).into_response()
        }
    }
}

/// Step 2: reset the password with the mailed OTP.
#[instrument(skip_all, fields(email = %form.email))]
pub async fn reset_password(
    State(state): State<AppState>,
    Form(form): Form<ResetPasswordForm>,
) -> Response {
    let email = match validate::email(&form.email) {
        Ok(email) => email,
        Err(_) => return flash_error("/auth/forgot-password", "Invalid email").into_response(),
    };
    let back = step2_url("/auth/forgot-password", email.as_str());

    let otp = form.otp.trim();
    if otp.is_empty() {
        return flash_error(&back, "OTP is required").into_response();
    }
    if form.new_password.len() < validate::MIN_PASSWORD_LENGTH {
        return flash_error(&back, "New password must be at least 8 characters").into_response();
    }
    if let Err(message) = validate::matching_passwords(&form.new_password, &form.confirm_password)
    {
        return flash_error(&back, &message).into_response();
    }

    match state
        .backend()
        .reset_password(
            email.as_str(),
            otp,
            &form.new_password,
            &form.confirm_password,
        )
        .await
    {
        Ok(_) => flash_success(
            "/auth/login",
            "Password reset successful. Please log in.",
        )
        .into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "password reset failed");
            flash_error(&back, &e.user_message("Failed to reset password")).into_response()
        }
    }
}
