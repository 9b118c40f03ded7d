//! Integration tests for the checkout handoff and order placement.

use std::sync::atomic::Ordering;

use ecobloom_integration_tests::{TestApp, USER_EMAIL, USER_PASSWORD, plant_id};

#[tokio::test]
async fn anonymous_checkout_redirects_to_login_without_touching_orders() {
    let app = TestApp::spawn().await;
    let client = TestApp::no_redirect_client();

    // Purchase handoff from a detail page, price 101 x 2, nobody logged in
    let resp = client
        .get(app.url(&format!("/checkout?plant={}&qty=2", plant_id(1))))
        .send()
        .await
        .unwrap();

    assert!(resp.status().is_redirection());
    assert_eq!(resp.headers()["location"], "/auth/login");
    assert_eq!(
        app.backend.hits.orders_create.load(Ordering::SeqCst),
        0,
        "the handoff must not call the order endpoint"
    );
}

#[tokio::test]
async fn checkout_page_snapshots_the_current_price() {
    let app = TestApp::spawn().await;
    let client = TestApp::client();
    app.login(&client, USER_EMAIL, USER_PASSWORD).await;

    let body = client
        .get(app.url(&format!("/checkout?plant={}&qty=2", plant_id(1))))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    // Unit price 101, quantity 2
    assert!(body.contains("Total: ₹202"));
    assert!(body.contains("name=\"price_at_purchase\" value=\"101\""));
}

#[tokio::test]
async fn out_of_stock_plant_bounces_back_to_its_detail_page() {
    let app = TestApp::spawn().await;
    let client = TestApp::client();
    app.login(&client, USER_EMAIL, USER_PASSWORD).await;

    // Plant 5 is out of stock in the stub catalog
    let resp = client
        .get(app.url(&format!("/checkout?plant={}&qty=1", plant_id(5))))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.url().path(), format!("/plants/{}", plant_id(5)));
    let body = resp.text().await.unwrap();
    assert!(body.contains("This plant is out of stock"));
}

#[tokio::test]
async fn missing_address_fields_block_the_order_locally() {
    let app = TestApp::spawn().await;
    let client = TestApp::client();
    app.login(&client, USER_EMAIL, USER_PASSWORD).await;

    let resp = client
        .post(app.url("/checkout"))
        .form(&[
            ("plant", plant_id(1).as_str()),
            ("quantity", "2"),
            ("price_at_purchase", "101"),
            ("street", "  "),
            ("city", "Pune"),
            ("state", "MH"),
            ("pincode", "411001"),
            ("country", "India"),
            ("payment_method", "COD"),
        ])
        .send()
        .await
        .unwrap();

    let body = resp.text().await.unwrap();
    assert!(body.contains("Please fill all required address fields"));
    assert_eq!(
        app.backend.hits.orders_create.load(Ordering::SeqCst),
        0,
        "validation failures must not produce a network call"
    );
}

#[tokio::test]
async fn placing_an_order_posts_the_snapshot_and_lands_on_order_history() {
    let app = TestApp::spawn().await;
    let client = TestApp::client();
    app.login(&client, USER_EMAIL, USER_PASSWORD).await;

    let resp = client
        .post(app.url("/checkout"))
        .form(&[
            ("plant", plant_id(1).as_str()),
            ("quantity", "2"),
            ("price_at_purchase", "101"),
            ("street", "12 Garden Lane"),
            ("city", "Pune"),
            ("state", "MH"),
            ("pincode", "411001"),
            ("country", ""),
            ("payment_method", "UPI"),
        ])
        .send()
        .await
        .unwrap();

    assert_eq!(resp.url().path(), "/account/orders");
    let body = resp.text().await.unwrap();
    assert!(body.contains("Order placed successfully!"));

    let order = app
        .backend
        .last_order_body
        .lock()
        .unwrap()
        .clone()
        .unwrap();
    assert_eq!(order["items"][0]["plant"], plant_id(1));
    assert_eq!(order["items"][0]["quantity"], 2);
    assert_eq!(order["items"][0]["priceAtPurchase"], "101");
    assert_eq!(order["paymentMethod"], "UPI");
    // Empty country falls back to India
    assert_eq!(order["address"]["country"], "India");
    assert_eq!(order["address"]["pincode"], "411001");
}
