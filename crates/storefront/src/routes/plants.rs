//! Plant detail page and search suggestion endpoint.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use ecobloom_core::{PlantId, looks_like_object_id};

use crate::backend::{CategoryRef, Plant, PlantQuery};
use crate::filters;
use crate::routes::MessageQuery;
use crate::state::AppState;

/// Plant detail display data.
#[derive(Clone)]
pub struct PlantView {
    pub id: String,
    pub name: String,
    pub price: String,
    pub image: Option<String>,
    pub available: bool,
    pub categories: Vec<String>,
}

impl From<&Plant> for PlantView {
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

/// Plant detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "plant.html")]
pub struct PlantShowTemplate {
    pub plant: Option<PlantView>,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Display the plant detail page.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<MessageQuery>,
) -> impl IntoResponse {
    match state.backend().plant(&PlantId::new(id)).await {
        Ok(plant) => PlantShowTemplate {
            plant: Some(PlantView::from(&plant)),
            error: query.error,
            success: query.success,
        },
        Err(e) => {
            tracing::warn!(error = %e, "failed to load plant");
            PlantShowTemplate {
                plant: None,
                error: Some(e.user_message("Plant not found")),
                success: None,
            }
        }
    }
}

// =============================================================================
// Search suggestions
// =============================================================================

/// How many suggestions the dropdown shows.
const SUGGESTION_LIMIT: u32 = 8;

/// Search query parameter.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

/// One search suggestion.
#[derive(Debug, Serialize)]
pub struct Suggestion {
    pub id: String,
    pub name: String,
    pub price: String,
    pub image: Option<String>,
}

/// Response for the suggestion endpoint.
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub success: bool,
    pub plants: Vec<Suggestion>,
}

/// Return search suggestions as JSON.
///
/// GET /api/plants/search?q=...
///
/// Empty and object-id-shaped queries return no suggestions: the id form is
/// a direct jump to the detail page, not a search. Backend failures answer
/// an empty list instead of an error page - the dropdown just shows "No
/// matches".
#[instrument(skip(state))]
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Json<SearchResponse> {
    let q = query.q.unwrap_or_default().trim().to_string();
    if q.is_empty() || looks_like_object_id(&q) {
        return Json(SearchResponse {
            success: true,
            plants: Vec::new(),
        });
    }

    match state
        .backend()
        .plants(&PlantQuery {
            page: 1,
            limit: SUGGESTION_LIMIT,
            search: Some(q),
            ..Default::default()
        })
        .await
    {
        Ok(page) => Json(SearchResponse {
            success: true,
            plants: page
                .plants
                .iter()
                .map(|p| Suggestion {
                    id: p.id.to_string(),
                    name: p.name.clone(),
                    price: p.price.to_string(),
                    image: p.image.clone(),
                })
                .collect(),
        }),
        Err(e) => {
            tracing::warn!(error = %e, "search suggestions failed");
            Json(SearchResponse {
                success: false,
                plants: Vec::new(),
            })
        }
    }
}
