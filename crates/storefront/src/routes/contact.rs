//! Contact form route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::instrument;

use crate::backend::ContactMessage;
use crate::filters;
use crate::routes::{MessageQuery, flash_error, flash_success};
use crate::state::AppState;
use crate::validate;

/// Contact form data.
#[derive(Debug, Deserialize)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    pub message: String,
}

/// Contact page template.
#[derive(Template, WebTemplate)]
#[template(path = "contact.html")]
pub struct ContactTemplate {
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Display the contact page.
pub async fn page(Query(query): Query<MessageQuery>) -> impl IntoResponse {
    ContactTemplate {
        error: query.error,
        success: query.success,
    }
}

/// Handle the contact form submission.
#[instrument(skip_all, fields(email = %form.email))]
pub async fn submit(State(state): State<AppState>, Form(form): Form<ContactForm>) -> Response {
    if form.name.trim().is_empty() || form.email.trim().is_empty() || form.message.trim().is_empty()
    {
        return flash_error("/contact", "Name, email, and message are required").into_response();
    }
    let email = match validate::email(&form.email) {
        Ok(email) => email,
        Err(_) => return flash_error("/contact", "Please enter a valid email").into_response(),
    };

    let message = ContactMessage {
        name: form.name.trim().to_string(),
        email: email.to_string(),
        phone: Some(form.phone.trim().to_string()).filter(|p| !p.is_empty()),
        message: form.message.trim().to_string(),
    };

    match state.backend().submit_contact(&message).await {
        Ok(_) => {
            flash_success("/contact", "Thanks! We received your message.").into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "contact submission failed");
            flash_error("/contact", &e.user_message("Failed to submit message")).into_response()
        }
    }
}
