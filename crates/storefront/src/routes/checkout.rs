//! Checkout route handlers.
//!
//! The detail page hands off here with a plant id and quantity in the query
//! string - a pure navigation, no order is created until the form posts.
//! The price is re-snapshotted server-side when the page renders, and that
//! snapshot travels through the form as `priceAtPurchase`.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use ecobloom_core::{PaymentMethod, PlantId};

use crate::backend::{Address, NewOrder, NewOrderItem};
use crate::filters;
use crate::middleware::RequireAuth;
use crate::routes::{flash_error, flash_success};
use crate::state::AppState;
use crate::validate;

/// Checkout entry parameters: the handed-off item.
#[derive(Debug, Deserialize)]
pub struct CheckoutQuery {
    pub plant: Option<String>,
    pub qty: Option<u32>,
    pub error: Option<String>,
}

/// The single line item shown on the checkout page.
#[derive(Clone)]
pub struct CheckoutItem {
    pub plant_id: String,
    pub name: String,
    pub quantity: u32,
    pub unit_price: String,
    /// Raw decimal amount carried through the form as the price snapshot.
    pub unit_price_raw: String,
    pub line_total: String,
}

/// A payment method radio option.
#[derive(Clone)]
pub struct MethodOption {
    pub value: String,
    pub checked: bool,
}

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout.html")]
pub struct CheckoutTemplate {
    pub item: CheckoutItem,
    pub total: String,
    pub methods: Vec<MethodOption>,
    pub error: Option<String>,
}

/// Display the checkout page for one handed-off item.
///
/// Requires a session: the guard redirects anonymous visitors to the login
/// page before any order endpoint is touched.
#[instrument(skip(state, _user))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    Query(query): Query<CheckoutQuery>,
) -> Response {
    // Entering checkout without an item list goes straight home
    let Some(plant_id) = query.plant.filter(|p| !p.is_empty()) else {
        return Redirect::to("/").into_response();
    };
    let quantity = query.qty.unwrap_or(1).max(1);

    let plant = match state.backend().plant(&PlantId::new(plant_id)).await {
        Ok(plant) => plant,
        Err(e) => {
            tracing::warn!(error = %e, "failed to load plant for checkout");
            return flash_error("/", &e.user_message("Failed to load plant")).into_response();
        }
    };

    if !plant.available {
        return flash_error(
            &format!("/plants/{}", plant.id),
            "This plant is out of stock",
        )
        .into_response();
    }

    let line_total = plant.price.times(quantity);
    CheckoutTemplate {
        item: CheckoutItem {
            plant_id: plant.id.to_string(),
            name: plant.name.clone(),
            quantity,
            unit_price: plant.price.to_string(),
            unit_price_raw: plant.price.amount().to_string(),
            line_total: line_total.to_string(),
        },
        total: line_total.to_string(),
        methods: PaymentMethod::ALL
            .iter()
            .map(|&m| MethodOption {
                value: m.to_string(),
                checked: m == PaymentMethod::default(),
            })
            .collect(),
        error: query.error,
    }
    .into_response()
}

/// Checkout form data.
#[derive(Debug, Deserialize)]
pub struct CheckoutForm {
    pub plant: String,
    pub quantity: u32,
    pub price_at_purchase: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    #[serde(default)]
    pub country: String,
    pub payment_method: String,
}

/// Handle the place-order submission.
#[instrument(skip(state, user, form))]
pub async fn place_order(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Form(form): Form<CheckoutForm>,
) -> Response {
    let back = format!(
        "/checkout?plant={}&qty={}",
        urlencoding::encode(&form.plant),
        form.quantity
    );

    // Address validation happens before any network call
    if [&form.street, &form.city, &form.state, &form.pincode]
        .iter()
        .any(|field| field.trim().is_empty())
    {
        return flash_error(&back, "Please fill all required address fields").into_response();
    }
    if form.quantity < 1 {
        return flash_error(&back, "Quantity must be at least 1").into_response();
    }
    let Ok(payment_method) = form.payment_method.parse::<PaymentMethod>() else {
        return flash_error(&back, "Select a valid payment method").into_response();
    };
    let Ok(price_at_purchase) = validate::price(&form.price_at_purchase) else {
        return flash_error(&back, "Invalid price snapshot").into_response();
    };

    let order = NewOrder {
        items: vec![NewOrderItem {
            plant: PlantId::new(form.plant.clone()),
            quantity: form.quantity,
            price_at_purchase,
        }],
        address: Address {
            street: form.street.trim().to_string(),
            city: form.city.trim().to_string(),
            state: form.state.trim().to_string(),
            pincode: form.pincode.trim().to_string(),
            country: {
                let country = form.country.trim();
                if country.is_empty() {
                    "India".to_string()
                } else {
                    country.to_string()
                }
            },
        },
        payment_method,
    };

    match state.backend().place_order(user.token(), &order).await {
        Ok(_) => {
            flash_success("/account/orders", "Order placed successfully!").into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to place order");
            flash_error(&back, &e.user_message("Failed to place order")).into_response()
        }
    }
}
