//! Integration tests for the catalog: pagination clamping, filter
//! behavior, detail page, and search suggestions.

use std::sync::atomic::Ordering;

use ecobloom_integration_tests::{STUB_PLANT_COUNT, TestApp, plant_id};

#[tokio::test]
async fn catalog_renders_one_page_with_totals() {
    let app = TestApp::spawn().await;
    let client = TestApp::client();

    let body = client
        .get(app.url("/"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert!(body.contains(&format!("{STUB_PLANT_COUNT} plants found")));
    assert!(body.contains("Plant 1"));
    assert!(body.contains("Plant 12"));
    assert!(!body.contains("Plant 13"), "only one page is rendered");
    // 30 plants at 12 per page
    assert!(body.contains("Page 1 / 3"));
}

#[tokio::test]
async fn overshooting_page_redirects_to_the_clamped_page() {
    let app = TestApp::spawn().await;
    let client = TestApp::client();

    let resp = client.get(app.url("/?page=99")).send().await.unwrap();

    // 30 plants at 12 per page -> clamped to page 3
    assert_eq!(resp.url().query(), Some("page=3"));
    let body = resp.text().await.unwrap();
    assert!(body.contains("Page 3 / 3"));
    assert!(body.contains("Plant 30"));
}

#[tokio::test]
async fn filter_form_lands_on_page_one() {
    let app = TestApp::spawn().await;
    let client = TestApp::client();

    // Walk to page 2 first
    let resp = client.get(app.url("/?page=2")).send().await.unwrap();
    assert!(resp.text().await.unwrap().contains("Page 2 / 3"));

    // The filter form carries no page field, so applying a filter restarts
    // at page 1 before the fetch
    let resp = client
        .get(app.url("/?category=Indoor&available=&search="))
        .send()
        .await
        .unwrap();
    let body = resp.text().await.unwrap();
    assert!(body.contains("Page 1 /"));

    let last_query = app
        .backend
        .last_plants_query
        .lock()
        .unwrap()
        .clone()
        .unwrap();
    assert!(last_query.contains("page=1"));
    assert!(last_query.contains("category=Indoor"));
}

#[tokio::test]
async fn backend_failure_renders_inline_error_with_empty_grid() {
    let app = TestApp::spawn().await;
    let client = TestApp::client();

    // An unknown plant id: the detail page renders the backend message
    // inline rather than crashing
    let body = client
        .get(app.url(&format!("/plants/{}", plant_id(999))))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(body.contains("Plant not found"));
}

#[tokio::test]
async fn detail_page_shows_price_and_buy_handoff() {
    let app = TestApp::spawn().await;
    let client = TestApp::client();

    let body = client
        .get(app.url(&format!("/plants/{}", plant_id(1))))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert!(body.contains("Plant 1"));
    assert!(body.contains("₹101"));
    // The buy action is a GET handoff to checkout, not an order call
    assert!(body.contains("action=\"/checkout\""));
    assert_eq!(app.backend.hits.orders_create.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn search_suggestions_are_json_and_capped() {
    let app = TestApp::spawn().await;
    let client = TestApp::client();

    let suggestions: serde_json::Value = client
        .get(app.url("/api/plants/search?q=plant"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(suggestions["success"], true);
    let plants = suggestions["plants"].as_array().unwrap();
    assert_eq!(plants.len(), 8, "suggestions are capped at 8");

    // Object-id-shaped queries skip the suggestion fetch entirely
    let before = app.backend.hits.plants.load(Ordering::SeqCst);
    let suggestions: serde_json::Value = client
        .get(app.url(&format!("/api/plants/search?q={}", plant_id(1))))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(suggestions["plants"].as_array().unwrap().len(), 0);
    assert_eq!(app.backend.hits.plants.load(Ordering::SeqCst), before);
}
