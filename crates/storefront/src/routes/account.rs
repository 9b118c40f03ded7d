//! Account route handlers: profile, password change, personal orders.

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

use crate::backend::Order;
use crate::filters;
use crate::middleware::{RequireAuth, clear_current_user, set_current_user};
use crate::pagination::{Pager, TABLE_PAGE_SIZES, requested_page, table_limit};
use crate::routes::{MessageQuery, flash_error, flash_success};
use crate::state::AppState;
use crate::validate;

// =============================================================================
// Profile overview
// =============================================================================

/// How many recent orders the profile page shows.
const RECENT_ORDER_LIMIT: u32 = 3;

/// One order row for display.
#[derive(Clone)]
pub struct OrderRow {
    pub id: String,
    pub id_short: String,
    pub item_count: u32,
    pub payment_method: String,
    pub payment_status: &'static str,
    pub tracking_status: &'static str,
    pub placed: String,
    pub total: String,
}

impl From<&Order> for OrderRow {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.to_string(),
            id_short: order.id.short().to_string(),
            item_count: order.item_count(),
            payment_method: order
                .payment_method
                .map_or_else(|| "—".to_string(), |m| m.to_string()),
            payment_status: order.payment_status.label(),
            tracking_status: order.tracking_status.label(),
            placed: order
                .created_at
                .map_or_else(|| "—".to_string(), |t| t.format("%d %b %Y %H:%M").to_string()),
            total: order.total().to_string(),
        }
    }
}

/// Profile page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/profile.html")]
pub struct ProfileTemplate {
    pub name: String,
    pub email: String,
    pub number: String,
    pub member_since: String,
    pub is_admin: bool,
    pub is_verified: bool,
    pub recent_orders: Vec<OrderRow>,
    pub orders_error: Option<String>,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Display the profile page.
///
/// Re-probes `GET /users/me` for fresh data; a logical rejection means the
/// backend no longer honors the token, so the session ends too. On a
/// transport failure the session copy renders with an inline message.
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Query(query): Query<MessageQuery>,
) -> Response {
    let mut error = query.error;
    let (name, email, number, member_since, is_admin, is_verified) =
        match state.backend().me(user.token()).await {
            Ok(me) => (
                me.name,
                me.email.to_string(),
                me.number.map_or_else(|| "—".to_string(), |n| n.to_string()),
                me.created_at
                    .map_or_else(|| "—".to_string(), |t| t.format("%d %b %Y").to_string()),
                me.is_admin,
                me.is_verified,
            ),
            Err(e) if !e.is_transport() => {
                // Stale backend session: end ours as well
                let _ = clear_current_user(&session).await;
                let _ = session.flush().await;
                return flash_error("/auth/login", "Session expired, please login again")
                    .into_response();
            }
            Err(e) => {
                tracing::warn!(error = %e, "profile probe failed");
                error = Some(e.user_message("Failed to load profile"));
                (
                    user.name.clone(),
                    user.email.to_string(),
                    user.number
                        .as_ref()
                        .map_or_else(|| "—".to_string(), |n| n.to_string()),
                    "—".to_string(),
                    user.is_admin,
                    user.is_verified,
                )
            }
        };

    let (recent_orders, orders_error) = match state
        .backend()
        .my_orders(user.token(), 1, RECENT_ORDER_LIMIT)
        .await
    {
        Ok(page) => (page.orders.iter().map(OrderRow::from).collect(), None),
        Err(e) => {
            tracing::warn!(error = %e, "recent orders fetch failed");
            (Vec::new(), Some(e.user_message("Failed to load recent orders")))
        }
    };

    ProfileTemplate {
        name,
        email,
        number,
        member_since,
        is_admin,
        is_verified,
        recent_orders,
        orders_error,
        error,
        success: query.success,
    }
    .into_response()
}

// =============================================================================
// Profile mutation
// =============================================================================

/// Profile edit form data.
#[derive(Debug, Deserialize)]
pub struct ProfileForm {
    pub name: String,
    pub number: String,
}

/// Handle the profile edit submission.
///
/// On success the session copy is patched in place - no re-probe.
#[instrument(skip_all)]
pub async fn update_profile(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Form(form): Form<ProfileForm>,
) -> Response {
    let name = match validate::required(&form.name, "Name") {
        Ok(name) => name,
        Err(message) => return flash_error("/account", &message).into_response(),
    };
    let number = match validate::phone(&form.number) {
        Ok(number) => number,
        Err(message) => return flash_error("/account", &message).into_response(),
    };

    match state
        .backend()
        .update_profile(user.token(), &name, number.as_str())
        .await
    {
        Ok(_) => {
            let mut patched = user;
            patched.apply_profile(name, Some(number));
            if let Err(e) = set_current_user(&session, &patched).await {
                tracing::error!(error = %e, "failed to patch session after profile edit");
            }
            flash_success("/account", "Profile updated").into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "profile update failed");
            flash_error("/account", &e.user_message("Update failed")).into_response()
        }
    }
}

/// Change-password form data.
#[derive(Debug, Deserialize)]
pub struct ChangePasswordForm {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

/// Handle the change-password submission.
#[instrument(skip_all)]
pub async fn change_password(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Form(form): Form<ChangePasswordForm>,
) -> Response {
    if form.current_password.is_empty()
        || form.new_password.is_empty()
        || form.confirm_password.is_empty()
    {
        return flash_error("/account", "All password fields are required").into_response();
    }
    if form.new_password.len() < validate::MIN_PASSWORD_LENGTH {
        return flash_error("/account", "New password must be at least 8 characters")
            .into_response();
    }
    if let Err(message) = validate::matching_passwords(&form.new_password, &form.confirm_password)
    {
        return flash_error("/account", &message).into_response();
    }

    match state
        .backend()
        .change_password(
            user.token(),
            &form.current_password,
            &form.new_password,
            &form.confirm_password,
        )
        .await
    {
        Ok(_) => flash_success("/account", "Password updated").into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "password change failed");
            flash_error("/account", &e.user_message("Failed to update password")).into_response()
        }
    }
}

// =============================================================================
// Personal orders
// =============================================================================

/// Personal order history query parameters.
#[derive(Debug, Deserialize)]
pub struct OrdersQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub q: Option<String>,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Personal order history template.
#[derive(Template, WebTemplate)]
#[template(path = "account/orders.html")]
pub struct MyOrdersTemplate {
    pub orders: Vec<OrderRow>,
    pub shown: usize,
    pub pager: Pager,
    pub prev_url: String,
    pub next_url: String,
    pub q: String,
    pub limit_options: Vec<(u32, bool)>,
    pub error: Option<String>,
    pub success: Option<String>,
}

fn my_orders_url(page: u32, limit: u32, q: &str) -> String {
    let mut url = format!("/account/orders?page={page}&limit={limit}");
    if !q.is_empty() {
        url.push_str(&format!("&q={}", urlencoding::encode(q)));
    }
    url
}

/// Display the personal order history.
///
/// The free-text filter narrows the rendered page by order id substring; it
/// does not refetch.
#[instrument(skip(state, user))]
pub async fn orders(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(query): Query<OrdersQuery>,
) -> Response {
    let page = requested_page(query.page);
    let limit = table_limit(query.limit);
    let q = query.q.unwrap_or_default().trim().to_lowercase();

    let (orders, total, error) = match state.backend().my_orders(user.token(), page, limit).await {
        Ok(data) => {
            let total = data.total();
            (data.orders, total, query.error)
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to load personal orders");
            (
                Vec::new(),
                0,
                Some(e.user_message("Failed to load your orders")),
            )
        }
    };

    let pager = Pager::new(page, limit, total);
    if pager.clamped(page) {
        return Redirect::to(&my_orders_url(pager.page, limit, &q)).into_response();
    }

    let rows: Vec<OrderRow> = orders
        .iter()
        .filter(|order| q.is_empty() || order.id.as_str().to_lowercase().contains(&q))
        .map(OrderRow::from)
        .collect();

    MyOrdersTemplate {
        shown: rows.len(),
        orders: rows,
        prev_url: my_orders_url(pager.prev(), limit, &q),
        next_url: my_orders_url(pager.next(), limit, &q),
        pager,
        q,
        limit_options: TABLE_PAGE_SIZES.iter().map(|&n| (n, n == limit)).collect(),
        error,
        success: query.success,
    }
    .into_response()
}
