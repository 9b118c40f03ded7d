//! Admin plant CRUD: add, edit, delete.
//!
//! Create and update post multipart (the image travels with the fields) and
//! are forwarded to the backend as multipart unchanged. The category picker
//! mixes backend category ids with the static keyword list, deduplicated by
//! string value; two categories sharing a first keyword would collide here,
//! which is a known upstream modeling gap (see DESIGN.md).

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Multipart, Path, Query, State},
    response::{IntoResponse, Response},
};
use tracing::instrument;

use ecobloom_core::PlantId;

use crate::backend::{Category, CategoryRef, ImageUpload, Plant, PlantFields};
use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::routes::home::CATEGORY_OPTIONS;
use crate::routes::{MessageQuery, flash_error, flash_success};
use crate::state::AppState;
use crate::validate;

/// A category option in the multi-select.
#[derive(Clone)]
pub struct CategoryOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

/// Shared add/edit plant form template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/plant_form.html")]
pub struct PlantFormTemplate {
    pub heading: String,
    pub action: String,
    pub name: String,
    pub price: String,
    pub available: bool,
    pub options: Vec<CategoryOption>,
    pub image: Option<String>,
    /// Create requires an upload; edit keeps the existing image when empty.
    pub require_image: bool,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Merge backend categories with the static keyword options, deduplicated
/// by string value, backend entries first.
fn merge_category_options(backend: &[Category], selected: &[String]) -> Vec<CategoryOption> {
    let mut options: Vec<CategoryOption> = Vec::new();
    let push_unique = |value: String, label: String, options: &mut Vec<CategoryOption>| {
        if !options.iter().any(|o| o.value == value) {
            let selected = selected.contains(&value);
            options.push(CategoryOption {
                value,
                label,
                selected,
            });
        }
    };

    for category in backend {
        push_unique(
            category.id.to_string(),
            category.label().to_string(),
            &mut options,
        );
    }
    for &keyword in &CATEGORY_OPTIONS {
        push_unique(keyword.to_string(), keyword.to_string(), &mut options);
    }
    // Selected values missing from both sets still need an entry, or the
    // form would silently drop them on save
    for value in selected {
        push_unique(value.clone(), value.clone(), &mut options);
    }

    options
}

// =============================================================================
// Multipart parsing
// =============================================================================

/// The parsed plant form fields, before validation.
struct PlantSubmission {
    name: String,
    price: String,
    categories: Vec<String>,
    available: bool,
    image: Option<ImageUpload>,
}

/// Drain the multipart stream into a [`PlantSubmission`].
async fn read_plant_form(mut multipart: Multipart) -> Result<PlantSubmission, AppError> {
    let mut submission = PlantSubmission {
        name: String::new(),
        price: String::new(),
        categories: Vec::new(),
        available: false,
        image: None,
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("invalid form submission: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "name" => {
                submission.name = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
            }
            "price" => {
                submission.price = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
            }
            "available" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                submission.available = matches!(value.as_str(), "on" | "true");
            }
            "categories" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                if !value.is_empty() {
                    submission.categories.push(value);
                }
            }
            "image" => {
                let filename = field.file_name().map(str::to_owned);
                let content_type = field.content_type().map(str::to_owned);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                if let Some(filename) = filename
                    && !bytes.is_empty()
                {
                    submission.image = Some(ImageUpload {
                        filename,
                        content_type: content_type
                            .unwrap_or_else(|| "application/octet-stream".to_string()),
                        bytes: bytes.to_vec(),
                    });
                }
            }
            _ => {}
        }
    }

    Ok(submission)
}

/// Validate the shared plant fields. Returns the user-facing message of the
/// first failing rule.
fn validate_plant(submission: &PlantSubmission) -> Result<PlantFields, String> {
    let name = validate::required(&submission.name, "Name")?;
    let price = validate::price(&submission.price)?;
    if submission.categories.is_empty() {
        return Err("Select at least one category".to_string());
    }
    Ok(PlantFields {
        name,
        price,
        categories: submission.categories.clone(),
        available: submission.available,
    })
}

// =============================================================================
// Add plant
// =============================================================================

/// Display the add-plant form.
#[instrument(skip(state, _admin))]
pub async fn new_page(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(query): Query<MessageQuery>,
) -> impl IntoResponse {
    // The static keyword list stands alone if the category fetch fails
    let backend_categories = state.backend().categories().await.unwrap_or_default();

    PlantFormTemplate {
        heading: "Add New Plant".to_string(),
        action: "/admin/plants".to_string(),
        name: String::new(),
        price: String::new(),
        available: true,
        options: merge_category_options(&backend_categories, &[]),
        image: None,
        require_image: true,
        error: query.error,
        success: query.success,
    }
}

/// Handle the add-plant submission.
#[instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let submission = read_plant_form(multipart).await?;

    let fields = match validate_plant(&submission) {
        Ok(fields) => fields,
        Err(message) => return Ok(flash_error("/admin/plants/new", &message).into_response()),
    };
    let Some(image) = submission.image else {
        return Ok(flash_error("/admin/plants/new", "Please select an image").into_response());
    };

    match state
        .backend()
        .create_plant(admin.token(), &fields, image)
        .await
    {
        Ok(_) => {
            state.backend().invalidate_categories().await;
            Ok(flash_success("/", "Plant added successfully!").into_response())
        }
        Err(e) => {
            tracing::warn!(error = %e, "plant creation failed");
            Ok(
                flash_error("/admin/plants/new", &e.user_message("Failed to add plant"))
                    .into_response(),
            )
        }
    }
}

// =============================================================================
// Edit plant
// =============================================================================

/// Selected category values for a plant, deduplicated in order.
fn selected_categories(plant: &Plant) -> Vec<String> {
    let mut values: Vec<String> = Vec::new();
    for category in &plant.categories {
        let value = CategoryRef::value(category).to_string();
        if !values.contains(&value) {
            values.push(value);
        }
    }
    values
}

/// Display the edit-plant form, pre-filled from the plant fetch.
#[instrument(skip(state, _admin))]
pub async fn edit_page(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<String>,
    Query(query): Query<MessageQuery>,
) -> Response {
    let id = PlantId::new(id);
    let (plant, backend_categories) =
        tokio::join!(state.backend().plant(&id), state.backend().categories());

    let plant = match plant {
        Ok(plant) => plant,
        Err(e) => {
            tracing::warn!(error = %e, "failed to load plant for editing");
            return flash_error("/", &e.user_message("Failed to load plant")).into_response();
        }
    };
    let backend_categories = backend_categories.unwrap_or_default();
    let selected = selected_categories(&plant);

    PlantFormTemplate {
        heading: "Update Plant".to_string(),
        action: format!("/admin/plants/{}", plant.id),
        name: plant.name.clone(),
        price: plant.price.amount().to_string(),
        available: plant.available,
        options: merge_category_options(&backend_categories, &selected),
        image: plant.image.clone(),
        require_image: false,
        error: query.error,
        success: query.success,
    }
    .into_response()
}

/// Handle the edit-plant submission. A missing image keeps the existing
/// one.
#[instrument(skip(state, admin, multipart))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let id = PlantId::new(id);
    let back = format!("/admin/plants/{id}/edit");
    let submission = read_plant_form(multipart).await?;

    let fields = match validate_plant(&submission) {
        Ok(fields) => fields,
        Err(message) => return Ok(flash_error(&back, &message).into_response()),
    };

    match state
        .backend()
        .update_plant(admin.token(), &id, &fields, submission.image)
        .await
    {
        Ok(_) => {
            state.backend().invalidate_categories().await;
            Ok(
                flash_success(&format!("/plants/{id}"), "Plant updated successfully")
                    .into_response(),
            )
        }
        Err(e) => {
            tracing::warn!(error = %e, "plant update failed");
            Ok(flash_error(&back, &e.user_message("Update failed")).into_response())
        }
    }
}

// =============================================================================
// Delete plant
// =============================================================================

/// Handle plant deletion: delete upstream, then send the admin back to the
/// catalog, which refetches the page.
#[instrument(skip(state, admin))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<String>,
) -> Response {
    let id = PlantId::new(id);
    match state.backend().delete_plant(admin.token(), &id).await {
        Ok(_) => {
            state.backend().invalidate_categories().await;
            flash_success("/", "Plant deleted").into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "plant deletion failed");
            flash_error("/", &e.user_message("Failed to delete")).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecobloom_core::CategoryId;

    fn backend_category(id: &str, keyword: &str) -> Category {
        Category {
            id: CategoryId::new(id),
            keywords: vec![keyword.to_string()],
        }
    }

    #[test]
    fn merge_dedupes_by_string_value_backend_first() {
        let backend = vec![
            backend_category("66f2a90d9c3b5e0012ab34d0", "Indoor"),
            backend_category("66f2a90d9c3b5e0012ab34d1", "Bonsai"),
        ];
        let options = merge_category_options(&backend, &[]);

        // Backend ids lead, then the static keywords; "Indoor" appears both
        // as an id-backed option and as the bare keyword
        assert_eq!(options[0].value, "66f2a90d9c3b5e0012ab34d0");
        assert_eq!(options[0].label, "Indoor");
        assert_eq!(options[1].label, "Bonsai");
        assert!(options.iter().any(|o| o.value == "Indoor"));

        // No duplicate values
        let mut values: Vec<&str> = options.iter().map(|o| o.value.as_str()).collect();
        values.sort_unstable();
        values.dedup();
        assert_eq!(values.len(), options.len());
    }

    #[test]
    fn merge_keeps_unknown_selected_values() {
        let selected = vec!["66f2a90d9c3b5e0012ab34d9".to_string()];
        let options = merge_category_options(&[], &selected);
        let orphan = options
            .iter()
            .find(|o| o.value == "66f2a90d9c3b5e0012ab34d9")
            .expect("orphan selected value kept");
        assert!(orphan.selected);
    }

    #[test]
    fn validate_plant_reports_first_failure() {
        let base = PlantSubmission {
            name: "Money Plant".to_string(),
            price: "199".to_string(),
            categories: vec!["Indoor".to_string()],
            available: true,
            image: None,
        };

        assert!(validate_plant(&base).is_ok());

        let no_name = PlantSubmission {
            name: "  ".to_string(),
            ..clone_submission(&base)
        };
        assert_eq!(validate_plant(&no_name).unwrap_err(), "Name is required");

        let bad_price = PlantSubmission {
            price: "-5".to_string(),
            ..clone_submission(&base)
        };
        assert_eq!(
            validate_plant(&bad_price).unwrap_err(),
            "Enter a valid non-negative price"
        );

        let no_categories = PlantSubmission {
            categories: Vec::new(),
            ..clone_submission(&base)
        };
        assert_eq!(
            validate_plant(&no_categories).unwrap_err(),
            "Select at least one category"
        );
    }

    fn clone_submission(s: &PlantSubmission) -> PlantSubmission {
        PlantSubmission {
            name: s.name.clone(),
            price: s.price.clone(),
            categories: s.categories.clone(),
            available: s.available,
            image: None,
        }
    }
}
