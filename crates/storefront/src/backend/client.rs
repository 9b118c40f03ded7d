//! EcoBloom backend API client implementation.
//!
//! Thin typed wrapper over `reqwest` with envelope normalization. Categories
//! are cached via `moka` (5-minute TTL); everything else is fetched fresh on
//! every call.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::header::COOKIE;
use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, instrument};

use ecobloom_core::{OrderId, PaymentMethod, PaymentStatus, PlantId, TrackingStatus};

use super::types::{
    Ack, CategoriesResponse, Category, ImageUpload, MeResponse, NewAccount, NewOrder, OrderPage,
    Plant, PlantFields, PlantPage, PlantResponse, SessionUser,
};
use super::{AuthToken, BackendError, ContactMessage};
use crate::config::BackendConfig;

const CATEGORY_CACHE_KEY: &str = "categories";
const CATEGORY_CACHE_TTL: Duration = Duration::from_secs(300);

/// Query parameters for `GET /plants`.
#[derive(Debug, Clone, Default)]
pub struct PlantQuery {
    pub page: u32,
    pub limit: u32,
    pub category: Option<String>,
    pub available: Option<bool>,
    pub search: Option<String>,
}

/// Query parameters for `GET /orders/admin/orders`.
#[derive(Debug, Clone, Default)]
pub struct AdminOrderQuery {
    pub page: u32,
    pub limit: u32,
    pub q: Option<String>,
    pub payment_status: Option<PaymentStatus>,
    pub tracking_status: Option<TrackingStatus>,
    pub payment_method: Option<PaymentMethod>,
}

/// Client for the EcoBloom backend API.
///
/// Cheaply cloneable; all state is behind an `Arc`.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    http: reqwest::Client,
    base_url: String,
    auth_cookie: String,
    categories: Cache<&'static str, Vec<Category>>,
}

impl BackendClient {
    /// Create a new backend client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let categories = Cache::builder()
            .max_capacity(1)
            .time_to_live(CATEGORY_CACHE_TTL)
            .build();

        Ok(Self {
            inner: Arc::new(BackendClientInner {
                http,
                base_url: config.base_url.trim_end_matches('/').to_string(),
                auth_cookie: config.auth_cookie.clone(),
                categories,
            }),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }

    /// Start a request, replaying the backend session cookie when a token is
    /// given.
    fn request(&self, method: Method, path: &str, token: Option<&AuthToken>) -> RequestBuilder {
        let mut req = self.inner.http.request(method, self.url(path));
        if let Some(token) = token {
            req = req.header(
                COOKIE,
                format!("{}={}", self.inner.auth_cookie, token.as_str()),
            );
        }
        req
    }

    /// Execute a request and decode the JSON body.
    ///
    /// Non-success statuses are still read: the backend reports logical
    /// failures with an envelope body on 4xx too, and that message beats a
    /// bare status code.
    async fn execute<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, BackendError> {
        let response = req.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            if let Ok(ack) = serde_json::from_str::<Ack>(&text)
                && let Some(message) = ack.message
            {
                return Err(BackendError::Rejected(message));
            }
            tracing::warn!(
                status = %status,
                body = %text.chars().take(200).collect::<String>(),
                "backend returned non-success status"
            );
            return Err(BackendError::Status(status));
        }

        serde_json::from_str(&text).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %text.chars().take(500).collect::<String>(),
                "failed to parse backend response"
            );
            BackendError::Parse(e)
        })
    }

    /// Execute a mutation that answers the plain envelope. Returns the
    /// success message, if any.
    async fn acknowledge(&self, req: RequestBuilder) -> Result<Option<String>, BackendError> {
        let ack: Ack = self.execute(req).await?;
        if ack.success {
            Ok(ack.message)
        } else {
            Err(BackendError::Rejected(ack.message.unwrap_or_default()))
        }
    }

    // =========================================================================
    // Auth lifecycle
    // =========================================================================

    /// Log in and capture the backend session cookie.
    ///
    /// # Errors
    ///
    /// `Rejected` with the backend's message on bad credentials;
    /// `MissingAuthCookie` if the backend approved but set no cookie.
    #[instrument(skip(self, email, password), fields(email = %email))]
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthToken, BackendError> {
        let response = self
            .request(Method::POST, "/users/login", None)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        let status = response.status();
        let token = response
            .cookies()
            .find(|c| c.name() == self.inner.auth_cookie)
            .map(|c| AuthToken::new(c.value()));
        let text = response.text().await?;

        let ack: Ack = match serde_json::from_str(&text) {
            Ok(ack) => ack,
            Err(e) if status.is_success() => return Err(BackendError::Parse(e)),
            Err(_) => return Err(BackendError::Status(status)),
        };
        if !ack.success {
            return Err(BackendError::Rejected(ack.message.unwrap_or_default()));
        }

        token.ok_or(BackendError::MissingAuthCookie)
    }

    /// Fetch the logged-in identity (`GET /users/me`).
    ///
    /// # Errors
    ///
    /// `Rejected` when the token is stale or the probe answers
    /// `success: false`.
    #[instrument(skip(self, token))]
    pub async fn me(&self, token: &AuthToken) -> Result<SessionUser, BackendError> {
        let me: MeResponse = self
            .execute(self.request(Method::GET, "/users/me", Some(token)))
            .await?;
        match me.user {
            Some(user) if me.success => Ok(user),
            _ => Err(BackendError::Rejected(me.message.unwrap_or_default())),
        }
    }

    /// Register a new account. The backend mails an OTP on success.
    #[instrument(skip(self, account), fields(email = %account.email))]
    pub async fn register(&self, account: &NewAccount) -> Result<Option<String>, BackendError> {
        self.acknowledge(
            self.request(Method::POST, "/users/register", None)
                .json(account),
        )
        .await
    }

    /// Invalidate the backend session.
    #[instrument(skip(self, token))]
    pub async fn logout(&self, token: &AuthToken) -> Result<(), BackendError> {
        self.acknowledge(self.request(Method::POST, "/users/logout", Some(token)))
            .await?;
        Ok(())
    }

    /// Confirm an account with the mailed OTP.
    #[instrument(skip(self, email, otp), fields(email = %email))]
    pub async fn verify_otp(&self, email: &str, otp: &str) -> Result<Option<String>, BackendError> {
        self.acknowledge(
            self.request(Method::POST, "/users/verify-otp", None)
                .json(&json!({ "email": email, "otp": otp })),
        )
        .await
    }

    /// Request a fresh verification OTP.
    #[instrument(skip(self, email), fields(email = %email))]
    pub async fn resend_otp(&self, email: &str) -> Result<Option<String>, BackendError> {
        self.acknowledge(
            self.request(Method::POST, "/users/resend-otp", None)
                .json(&json!({ "email": email })),
        )
        .await
    }

    /// Request a password-reset OTP.
    #[instrument(skip(self, email), fields(email = %email))]
    pub async fn forgot_password(&self, email: &str) -> Result<Option<String>, BackendError> {
        self.acknowledge(
            self.request(Method::POST, "/users/forgot-password", None)
                .json(&json!({ "email": email })),
        )
        .await
    }

    /// Reset the password with the mailed OTP.
    #[instrument(skip(self, email, otp, new_password, confirm_password), fields(email = %email))]
    pub async fn reset_password(
        &self,
        email: &str,
        otp: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> Result<Option<String>, BackendError> {
        self.acknowledge(
            self.request(Method::POST, "/users/reset-password", None)
                .json(&json!({
                    "email": email,
                    "otp": otp,
                    "newPassword": new_password,
                    "confirmPassword": confirm_password,
                })),
        )
        .await
    }

    // =========================================================================
    // Profile
    // =========================================================================

    /// Update the profile name and phone number (`PUT /users/me`).
    #[instrument(skip(self, token))]
    pub async fn update_profile(
        &self,
        token: &AuthToken,
        name: &str,
        number: &str,
    ) -> Result<Option<String>, BackendError> {
        self.acknowledge(
            self.request(Method::PUT, "/users/me", Some(token))
                .json(&json!({ "name": name, "number": number })),
        )
        .await
    }

    /// Change the account password (`PATCH /users/change-password`).
    #[instrument(skip_all)]
    pub async fn change_password(
        &self,
        token: &AuthToken,
        current_password: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> Result<Option<String>, BackendError> {
        self.acknowledge(
            self.request(Method::PATCH, "/users/change-password", Some(token))
                .json(&json!({
                    "currentPassword": current_password,
                    "newPassword": new_password,
                    "confirmPassword": confirm_password,
                })),
        )
        .await
    }

    // =========================================================================
    // Plants
    // =========================================================================

    /// Fetch one catalog page.
    #[instrument(skip(self))]
    pub async fn plants(&self, query: &PlantQuery) -> Result<PlantPage, BackendError> {
        let mut params: Vec<(&str, String)> = vec![
            ("page", query.page.to_string()),
            ("limit", query.limit.to_string()),
        ];
        if let Some(category) = &query.category {
            params.push(("category", category.clone()));
        }
        if let Some(available) = query.available {
            params.push(("available", available.to_string()));
        }
        if let Some(search) = &query.search {
            params.push(("search", search.clone()));
        }

        self.execute(self.request(Method::GET, "/plants", None).query(&params))
            .await
    }

    /// Fetch one plant by id.
    ///
    /// # Errors
    ///
    /// `Rejected` when the backend answers without a plant (not found).
    #[instrument(skip(self, id), fields(plant = %id))]
    pub async fn plant(&self, id: &PlantId) -> Result<Plant, BackendError> {
        let response: PlantResponse = self
            .execute(self.request(Method::GET, &format!("/plants/{id}"), None))
            .await?;
        response
            .plant
            .ok_or_else(|| BackendError::Rejected(response.message.unwrap_or_default()))
    }

    /// Create a plant via multipart upload (admin).
    #[instrument(skip(self, token, fields, image), fields(name = %fields.name))]
    pub async fn create_plant(
        &self,
        token: &AuthToken,
        fields: &PlantFields,
        image: ImageUpload,
    ) -> Result<Option<String>, BackendError> {
        let form = plant_form(fields, Some(image))?;
        self.acknowledge(
            self.request(Method::POST, "/plants", Some(token))
                .multipart(form),
        )
        .await
    }

    /// Update a plant via multipart upload (admin). A missing image keeps
    /// the existing one.
    #[instrument(skip(self, token, id, fields, image), fields(plant = %id))]
    pub async fn update_plant(
        &self,
        token: &AuthToken,
        id: &PlantId,
        fields: &PlantFields,
        image: Option<ImageUpload>,
    ) -> Result<Option<String>, BackendError> {
        let form = plant_form(fields, image)?;
        self.acknowledge(
            self.request(Method::PUT, &format!("/plants/{id}"), Some(token))
                .multipart(form),
        )
        .await
    }

    /// Delete a plant (admin).
    #[instrument(skip(self, token, id), fields(plant = %id))]
    pub async fn delete_plant(
        &self,
        token: &AuthToken,
        id: &PlantId,
    ) -> Result<Option<String>, BackendError> {
        self.acknowledge(self.request(Method::DELETE, &format!("/plants/{id}"), Some(token)))
            .await
    }

    /// Fetch the category list, cached for five minutes.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Vec<Category>, BackendError> {
        if let Some(cached) = self.inner.categories.get(CATEGORY_CACHE_KEY).await {
            debug!("cache hit for categories");
            return Ok(cached);
        }

        let response: CategoriesResponse = self
            .execute(self.request(Method::GET, "/categories", None))
            .await?;
        let categories = response.into_vec();

        self.inner
            .categories
            .insert(CATEGORY_CACHE_KEY, categories.clone())
            .await;

        Ok(categories)
    }

    /// Drop the cached category list after a plant mutation.
    pub async fn invalidate_categories(&self) {
        self.inner.categories.invalidate(&CATEGORY_CACHE_KEY).await;
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Place an order (`POST /orders`).
    #[instrument(skip(self, token, order), fields(items = order.items.len()))]
    pub async fn place_order(
        &self,
        token: &AuthToken,
        order: &NewOrder,
    ) -> Result<Option<String>, BackendError> {
        self.acknowledge(
            self.request(Method::POST, "/orders", Some(token))
                .json(order),
        )
        .await
    }

    /// Fetch one page of the caller's own orders.
    #[instrument(skip(self, token))]
    pub async fn my_orders(
        &self,
        token: &AuthToken,
        page: u32,
        limit: u32,
    ) -> Result<OrderPage, BackendError> {
        self.execute(
            self.request(Method::GET, "/orders/me", Some(token))
                .query(&[("page", page.to_string()), ("limit", limit.to_string())]),
        )
        .await
    }

    /// Fetch one page of all orders with filters (admin).
    #[instrument(skip(self, token))]
    pub async fn admin_orders(
        &self,
        token: &AuthToken,
        query: &AdminOrderQuery,
    ) -> Result<OrderPage, BackendError> {
        let mut params: Vec<(&str, String)> = vec![
            ("page", query.page.to_string()),
            ("limit", query.limit.to_string()),
        ];
        if let Some(q) = &query.q {
            params.push(("q", q.clone()));
        }
        if let Some(status) = query.payment_status {
            params.push(("paymentStatus", status.to_string()));
        }
        // The backend calls the tracking filter plain `status`
        if let Some(status) = query.tracking_status {
            params.push(("status", status.to_string()));
        }
        if let Some(method) = query.payment_method {
            params.push(("paymentMethod", method.to_string()));
        }

        self.execute(
            self.request(Method::GET, "/orders/admin/orders", Some(token))
                .query(&params),
        )
        .await
    }

    /// Update one order's payment status (admin).
    #[instrument(skip(self, token, id, status), fields(order = %id, status = %status))]
    pub async fn set_payment_status(
        &self,
        token: &AuthToken,
        id: &OrderId,
        status: PaymentStatus,
    ) -> Result<Option<String>, BackendError> {
        self.acknowledge(
            self.request(Method::PATCH, &format!("/orders/admin/orders/{id}"), Some(token))
                .json(&json!({ "paymentStatus": status })),
        )
        .await
    }

    /// Update one order's tracking status (admin).
    ///
    /// The backend expects the field spelled `OrderStatus` here, unlike
    /// every other camelCase field.
    #[instrument(skip(self, token, id, status), fields(order = %id, status = %status))]
    pub async fn set_tracking_status(
        &self,
        token: &AuthToken,
        id: &OrderId,
        status: TrackingStatus,
    ) -> Result<Option<String>, BackendError> {
        self.acknowledge(
            self.request(
                Method::PATCH,
                &format!("/orders/admin/orders/{id}/status"),
                Some(token),
            )
            .json(&json!({ "OrderStatus": status })),
        )
        .await
    }

    /// Delete an order (admin).
    #[instrument(skip(self, token, id), fields(order = %id))]
    pub async fn delete_order(
        &self,
        token: &AuthToken,
        id: &OrderId,
    ) -> Result<Option<String>, BackendError> {
        self.acknowledge(self.request(
            Method::DELETE,
            &format!("/orders/admin/orders/{id}"),
            Some(token),
        ))
        .await
    }

    // =========================================================================
    // Contact
    // =========================================================================

    /// Submit the contact form (`POST /contacts`).
    #[instrument(skip(self, message), fields(email = %message.email))]
    pub async fn submit_contact(
        &self,
        message: &ContactMessage,
    ) -> Result<Option<String>, BackendError> {
        self.acknowledge(self.request(Method::POST, "/contacts", None).json(message))
            .await
    }
}

/// Build the multipart form shared by plant create and update.
fn plant_form(fields: &PlantFields, image: Option<ImageUpload>) -> Result<Form, BackendError> {
    let mut form = Form::new()
        .text("name", fields.name.clone())
        .text("price", fields.price.amount().to_string())
        .text("available", fields.available.to_string());

    for category in &fields.categories {
        form = form.text("categories[]", category.clone());
    }

    if let Some(image) = image {
        let part = Part::bytes(image.bytes)
            .file_name(image.filename)
            .mime_str(&image.content_type)?;
        form = form.part("image", part);
    }

    Ok(form)
}
