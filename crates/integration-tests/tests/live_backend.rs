//! Live-backend round-trip tests.
//!
//! These tests require:
//! - A running EcoBloom backend, reachable via `ECOBLOOM_API_URL`
//! - Admin credentials in `ECOBLOOM_TEST_ADMIN_EMAIL` /
//!   `ECOBLOOM_TEST_ADMIN_PASSWORD`
//!
//! Run with: `cargo test -p ecobloom-integration-tests -- --ignored`

use ecobloom_storefront::backend::{BackendClient, ImageUpload, PlantFields, PlantQuery};
use ecobloom_storefront::config::BackendConfig;

fn live_config() -> BackendConfig {
    BackendConfig {
        base_url: std::env::var("ECOBLOOM_API_URL")
            .unwrap_or_else(|_| "http://localhost:5000/api".to_string()),
        auth_cookie: "token".to_string(),
        timeout_secs: 15,
    }
}

async fn admin_client() -> (BackendClient, ecobloom_storefront::backend::AuthToken) {
    let client = BackendClient::new(&live_config()).expect("Failed to build backend client");
    let email = std::env::var("ECOBLOOM_TEST_ADMIN_EMAIL").expect("admin email env var");
    let password = std::env::var("ECOBLOOM_TEST_ADMIN_PASSWORD").expect("admin password env var");
    let token = client
        .login(&email, &password)
        .await
        .expect("admin login against live backend");
    (client, token)
}

/// A tiny valid PNG (1x1, black) for upload tests.
fn test_image() -> ImageUpload {
    const PNG: &[u8] = &[
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48,
        0x44, 0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x02, 0x00, 0x00,
        0x00, 0x90, 0x77, 0x53, 0xDE, 0x00, 0x00, 0x00, 0x0C, 0x49, 0x44, 0x41, 0x54, 0x78,
        0x9C, 0x63, 0x60, 0x60, 0x60, 0x00, 0x00, 0x00, 0x04, 0x00, 0x01, 0x27, 0x34, 0x27,
        0x0A, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
    ];
    ImageUpload {
        filename: "test-plant.png".to_string(),
        content_type: "image/png".to_string(),
        bytes: PNG.to_vec(),
    }
}

#[tokio::test]
#[ignore = "Requires a running EcoBloom backend and admin credentials"]
async fn created_plant_appears_under_its_category_filter() {
    let (client, token) = admin_client().await;

    let name = format!(
        "Integration Test Fern {}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("clock")
            .as_secs()
    );
    let fields = PlantFields {
        name: name.clone(),
        price: ecobloom_core::Rupees::parse("199").expect("valid price"),
        categories: vec!["Indoor".to_string(), "Succulent".to_string()],
        available: true,
    };

    client
        .create_plant(&token, &fields, test_image())
        .await
        .expect("plant creation");

    // The new plant must surface on the Indoor category filter
    let page = client
        .plants(&PlantQuery {
            page: 1,
            limit: 50,
            category: Some("Indoor".to_string()),
            available: None,
            search: Some(name.clone()),
        })
        .await
        .expect("catalog fetch");

    let created = page
        .plants
        .iter()
        .find(|p| p.name == name)
        .expect("created plant listed under its category");

    // Clean up
    client
        .delete_plant(&token, &created.id)
        .await
        .expect("plant cleanup");
}

#[tokio::test]
#[ignore = "Requires a running EcoBloom backend"]
async fn identity_probe_is_stable_between_calls() {
    let (client, token) = admin_client().await;

    let first = client.me(&token).await.expect("first probe");
    let second = client.me(&token).await.expect("second probe");

    assert_eq!(first.id, second.id);
    assert_eq!(first.email, second.email);
    assert_eq!(first.is_admin, second.is_admin);
}
