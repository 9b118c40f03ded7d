//! Admin order management: filterable table plus per-row actions.
//!
//! Row actions (status edits, delete) post with a `back` field carrying the
//! current filter query string, so every mutation returns to the same
//! filtered page and the table refetches.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use ecobloom_core::{OrderId, PaymentMethod, PaymentStatus, TrackingStatus};

use crate::backend::{AdminOrderQuery, Order};
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::pagination::{Pager, TABLE_PAGE_SIZES, requested_page, table_limit};
use crate::state::AppState;

// =============================================================================
// Query and view types
// =============================================================================

/// Admin order table query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct AdminOrdersQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub q: Option<String>,
    pub payment_status: Option<String>,
    pub status: Option<String>,
    pub payment_method: Option<String>,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// The normalized filter state threaded through links and row actions.
#[derive(Debug, Clone)]
struct FilterState {
    page: u32,
    limit: u32,
    q: String,
    payment_status: Option<PaymentStatus>,
    tracking_status: Option<TrackingStatus>,
    payment_method: Option<PaymentMethod>,
}

impl FilterState {
    fn from_query(query: &AdminOrdersQuery) -> Self {
        Self {
            page: requested_page(query.page),
            limit: table_limit(query.limit),
            q: query.q.clone().unwrap_or_default().trim().to_string(),
            payment_status: query
                .payment_status
                .as_deref()
                .and_then(|s| s.parse().ok()),
            tracking_status: query.status.as_deref().and_then(|s| s.parse().ok()),
            payment_method: query
                .payment_method
                .as_deref()
                .and_then(|s| s.parse().ok()),
        }
    }

    /// The query string for this state, without a leading `?`.
    fn query_string(&self, page: u32) -> String {
        let mut parts = vec![format!("page={page}"), format!("limit={}", self.limit)];
        if !self.q.is_empty() {
            parts.push(format!("q={}", urlencoding::encode(&self.q)));
        }
        if let Some(status) = self.payment_status {
            parts.push(format!("payment_status={status}"));
        }
        if let Some(status) = self.tracking_status {
            parts.push(format!("status={status}"));
        }
        if let Some(method) = self.payment_method {
            parts.push(format!("payment_method={method}"));
        }
        parts.join("&")
    }

    fn url(&self, page: u32) -> String {
        format!("/admin/orders?{}", self.query_string(page))
    }
}

/// A select option with its selected flag precomputed.
#[derive(Clone)]
pub struct StatusOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

/// One row of the admin order table.
#[derive(Clone)]
pub struct AdminOrderRow {
    pub id: String,
    pub id_short: String,
    pub customer_name: String,
    pub customer_email: String,
    pub item_count: u32,
    pub payment_method: String,
    pub total: String,
    pub payment_options: Vec<StatusOption>,
    pub tracking_options: Vec<StatusOption>,
}

impl AdminOrderRow {
    fn new(order: &Order) -> Self {
        Self {
            id: order.id.to_string(),
            id_short: order.id.short().to_string(),
            customer_name: order.customer_name().unwrap_or("—").to_string(),
            customer_email: order.customer_email().unwrap_or("—").to_string(),
            item_count: order.item_count(),
            payment_method: order
                .payment_method
                .map_or_else(|| "—".to_string(), |m| m.to_string()),
            total: order.total().to_string(),
            payment_options: PaymentStatus::ALL
                .iter()
                .map(|&status| StatusOption {
                    value: status.to_string(),
                    label: status.label().to_string(),
                    selected: status == order.payment_status,
                })
                .collect(),
            tracking_options: TrackingStatus::ALL
                .iter()
                .map(|&status| StatusOption {
                    value: status.to_string(),
                    label: status.label().to_string(),
                    selected: status == order.tracking_status,
                })
                .collect(),
        }
    }
}

/// Admin order table template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/orders.html")]
pub struct AdminOrdersTemplate {
    pub rows: Vec<AdminOrderRow>,
    pub pager: Pager,
    pub prev_url: String,
    pub next_url: String,
    /// Current filter query string, echoed by row-action forms.
    pub back: String,
    pub q: String,
    pub payment_status_options: Vec<StatusOption>,
    pub tracking_status_options: Vec<StatusOption>,
    pub payment_method_options: Vec<StatusOption>,
    pub limit_options: Vec<(u32, bool)>,
    pub error: Option<String>,
    pub success: Option<String>,
}

// =============================================================================
// Table
// =============================================================================

/// Display the admin order table.
#[instrument(skip(state, admin))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Query(query): Query<AdminOrdersQuery>,
) -> Response {
    let filters = FilterState::from_query(&query);

    let fetch = state
        .backend()
        .admin_orders(
            admin.token(),
            &AdminOrderQuery {
                page: filters.page,
                limit: filters.limit,
                q: Some(filters.q.clone()).filter(|q| !q.is_empty()),
                payment_status: filters.payment_status,
                tracking_status: filters.tracking_status,
                payment_method: filters.payment_method,
            },
        )
        .await;

    let (orders, total, error) = match fetch {
        Ok(data) => {
            let total = data.total();
            (data.orders, total, query.error)
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to load admin orders");
            (Vec::new(), 0, Some(e.user_message("Failed to load orders")))
        }
    };

    let pager = Pager::new(filters.page, filters.limit, total);
    if pager.clamped(filters.page) {
        return Redirect::to(&filters.url(pager.page)).into_response();
    }

    AdminOrdersTemplate {
        rows: orders.iter().map(AdminOrderRow::new).collect(),
        prev_url: filters.url(pager.prev()),
        next_url: filters.url(pager.next()),
        back: filters.query_string(pager.page),
        pager,
        q: filters.q.clone(),
        payment_status_options: PaymentStatus::ALL
            .iter()
            .map(|&status| StatusOption {
                value: status.to_string(),
                label: status.label().to_string(),
                selected: Some(status) == filters.payment_status,
            })
            .collect(),
        tracking_status_options: TrackingStatus::ALL
            .iter()
            .map(|&status| StatusOption {
                value: status.to_string(),
                label: status.label().to_string(),
                selected: Some(status) == filters.tracking_status,
            })
            .collect(),
        payment_method_options: PaymentMethod::ALL
            .iter()
            .map(|&method| StatusOption {
                value: method.to_string(),
                label: method.to_string(),
                selected: Some(method) == filters.payment_method,
            })
            .collect(),
        limit_options: TABLE_PAGE_SIZES
            .iter()
            .map(|&n| (n, n == filters.limit))
            .collect(),
        error,
        success: query.success,
    }
    .into_response()
}

// =============================================================================
// Row actions
// =============================================================================

/// Row-action form data: the new value plus the filter state to return to.
#[derive(Debug, Deserialize)]
pub struct RowActionForm {
    pub value: String,
    #[serde(default)]
    pub back: String,
}

/// Delete form data: only the filter state.
#[derive(Debug, Deserialize)]
pub struct DeleteForm {
    #[serde(default)]
    pub back: String,
}

fn back_url(back: &str, key: &str, message: &str) -> String {
    let base = if back.is_empty() {
        "/admin/orders?".to_string()
    } else {
        format!("/admin/orders?{back}&")
    };
    format!("{base}{key}={}", urlencoding::encode(message))
}

/// Update one order's payment status, then return to the filtered table.
#[instrument(skip(state, admin, form))]
pub async fn set_payment_status(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<String>,
    Form(form): Form<RowActionForm>,
) -> Response {
    let id = OrderId::new(id);
    let Ok(status) = form.value.parse::<PaymentStatus>() else {
        return Redirect::to(&back_url(&form.back, "error", "Invalid payment status"))
            .into_response();
    };

    match state
        .backend()
        .set_payment_status(admin.token(), &id, status)
        .await
    {
        Ok(_) => Redirect::to(&back_url(&form.back, "success", "Payment status updated"))
            .into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "payment status update failed");
            Redirect::to(&back_url(
                &form.back,
                "error",
                &e.user_message("Failed to update payment status"),
            ))
            .into_response()
        }
    }
}

/// Update one order's tracking status, then return to the filtered table.
#[instrument(skip(state, admin, form))]
pub async fn set_tracking_status(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<String>,
    Form(form): Form<RowActionForm>,
) -> Response {
    let id = OrderId::new(id);
    let Ok(status) = form.value.parse::<TrackingStatus>() else {
        return Redirect::to(&back_url(&form.back, "error", "Invalid tracking status"))
            .into_response();
    };

    match state
        .backend()
        .set_tracking_status(admin.token(), &id, status)
        .await
    {
        Ok(_) => Redirect::to(&back_url(&form.back, "success", "Tracking status updated"))
            .into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "tracking status update failed");
            Redirect::to(&back_url(
                &form.back,
                "error",
                &e.user_message("Failed to update tracking status"),
            ))
            .into_response()
        }
    }
}

/// Delete an order, then return to the filtered table.
#[instrument(skip(state, admin, form))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<String>,
    Form(form): Form<DeleteForm>,
) -> Response {
    let id = OrderId::new(id);
    match state.backend().delete_order(admin.token(), &id).await {
        Ok(_) => Redirect::to(&back_url(&form.back, "success", "Order deleted")).into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "order deletion failed");
            Redirect::to(&back_url(
                &form.back,
                "error",
                &e.user_message("Failed to delete order"),
            ))
            .into_response()
        }
    }
}
