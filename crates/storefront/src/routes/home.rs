//! Catalog route handler: the storefront landing page.
//!
//! One backend fetch per render, filters posted as a GET form. The filter
//! form carries no page field, so changing any filter restarts at page 1;
//! only the prev/next links thread the page number through.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use crate::backend::{CategoryRef, Plant, PlantQuery};
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::pagination::{CATALOG_PAGE_SIZE, Pager, requested_page};
use crate::state::AppState;

/// The fixed category keywords offered by the filter dropdown. Backend
/// categories map onto these by keyword.
pub const CATEGORY_OPTIONS: [&str; 10] = [
    "Indoor",
    "Outdoor",
    "Succulent",
    "Air Purifying",
    "Home Decor",
    "Flowering",
    "Medicinal",
    "Decor",
    "Edible",
    "Shade",
];

/// Catalog query parameters.
#[derive(Debug, Deserialize)]
pub struct CatalogQuery {
    pub page: Option<u32>,
    pub category: Option<String>,
    pub available: Option<String>,
    pub search: Option<String>,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Plant card display data for templates.
#[derive(Clone)]
pub struct PlantCard {
    pub id: String,
    pub name: String,
    pub price: String,
    pub image: Option<String>,
    pub available: bool,
    pub categories: Vec<String>,
}

/// A select option with its selected flag precomputed.
#[derive(Clone)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

/// Catalog page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub plants: Vec<PlantCard>,
    pub total: u64,
    pub pager: Pager,
    pub prev_url: String,
    pub next_url: String,
    pub category_options: Vec<SelectOption>,
    pub availability_options: Vec<SelectOption>,
    pub search: String,
    pub is_admin: bool,
    pub error: Option<String>,
    pub success: Option<String>,
}

impl From<&Plant> for PlantCard {
    fn from(plant: &Plant) -> Self {
        Self {
            id: plant.id.to_string(),
            name: plant.name.clone(),
            price: plant.price.to_string(),
            image: plant.image.clone(),
            available: plant.available,
            categories: plant
                .categories
                .iter()
                .map(|c| CategoryRef::label(c).to_string())
                .collect(),
        }
    }
}

/// Build a catalog URL preserving the active filters.
fn catalog_url(page: u32, category: &str, availability: &str, search: &str) -> String {
    let mut url = format!("/?page={page}");
    if !category.is_empty() {
        url.push_str(&format!("&category={}", urlencoding::encode(category)));
    }
    if !availability.is_empty() {
        url.push_str(&format!("&available={availability}"));
    }
    if !search.is_empty() {
        url.push_str(&format!("&search={}", urlencoding::encode(search)));
    }
    url
}

/// Display the catalog page.
#[instrument(skip(state, user))]
pub async fn index(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<CatalogQuery>,
) -> Response {
    let page = requested_page(query.page);
    let category = query.category.unwrap_or_default();
    let availability = query.available.unwrap_or_default();
    let search = query.search.unwrap_or_default().trim().to_string();
    let available = match availability.as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    };
    let is_admin = user.is_some_and(|u| u.is_admin);

    let fetch = state
        .backend()
        .plants(&PlantQuery {
            page,
            limit: CATALOG_PAGE_SIZE,
            category: Some(category.clone()).filter(|c| !c.is_empty()),
            available,
            search: Some(search.clone()).filter(|s| !s.is_empty()),
        })
        .await;

    let (plants, total, error) = match fetch {
        Ok(data) => (data.plants, data.total, query.error),
        Err(e) => {
            tracing::warn!(error = %e, "failed to load catalog page");
            (Vec::new(), 0, Some(e.user_message("Failed to load plants")))
        }
    };

    let pager = Pager::new(page, CATALOG_PAGE_SIZE, total);
    if pager.clamped(page) {
        return Redirect::to(&catalog_url(pager.page, &category, &availability, &search))
            .into_response();
    }

    let category_options = CATEGORY_OPTIONS
        .iter()
        .map(|&opt| SelectOption {
            value: opt.to_string(),
            label: opt.to_string(),
            selected: category == opt,
        })
        .collect();

    let availability_options = [("true", "In stock"), ("false", "Out of stock")]
        .iter()
        .map(|&(value, label)| SelectOption {
            value: value.to_string(),
            label: label.to_string(),
            selected: availability == value,
        })
        .collect();

    HomeTemplate {
        plants: plants.iter().map(PlantCard::from).collect(),
        total,
        prev_url: catalog_url(pager.prev(), &category, &availability, &search),
        next_url: catalog_url(pager.next(), &category, &availability, &search),
        pager,
        category_options,
        availability_options,
        search,
        is_admin,
        error,
        success: query.success,
    }
    .into_response()
}
