//! Integration tests for the auth flows: login, registration validation,
//! and the two-step OTP verification.

use std::sync::atomic::Ordering;

use ecobloom_integration_tests::{
    GOOD_OTP, TestApp, USER_EMAIL, USER_PASSWORD,
};

#[tokio::test]
async fn login_failure_shows_backend_message_and_stays_logged_out() {
    let app = TestApp::spawn().await;
    let client = TestApp::client();

    let resp = client
        .post(app.url("/auth/login"))
        .form(&[("email", "a@b.com"), ("password", "wrong")])
        .send()
        .await
        .unwrap();

    // PRG lands back on the login page with the backend's message verbatim
    assert_eq!(resp.url().path(), "/auth/login");
    let body = resp.text().await.unwrap();
    assert!(body.contains("Invalid credentials"));

    // The session stayed unauthenticated: gated pages still bounce to login
    let resp = client.get(app.url("/account")).send().await.unwrap();
    assert_eq!(resp.url().path(), "/auth/login");
}

#[tokio::test]
async fn login_success_establishes_session_and_identity_probe_is_idempotent() {
    let app = TestApp::spawn().await;
    let client = TestApp::client();

    app.login(&client, USER_EMAIL, USER_PASSWORD).await;
    // Login performed exactly one identity probe
    assert_eq!(app.backend.hits.me.load(Ordering::SeqCst), 1);

    // Two profile renders, two probes, same identity both times
    let first = client
        .get(app.url("/account"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    let second = client
        .get(app.url("/account"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(first.contains(USER_EMAIL));
    assert!(second.contains(USER_EMAIL));
    assert!(first.contains("Asha"));
    assert!(second.contains("Asha"));
    assert_eq!(app.backend.hits.me.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn invalid_registration_never_reaches_the_backend() {
    let app = TestApp::spawn().await;
    let client = TestApp::client();

    let cases: &[&[(&str, &str)]] = &[
        // missing fields
        &[
            ("name", ""),
            ("email", "a@b.com"),
            ("number", "9876543210"),
            ("password", "longenough"),
        ],
        // bad email shape
        &[
            ("name", "Asha"),
            ("email", "not-an-email"),
            ("number", "9876543210"),
            ("password", "longenough"),
        ],
        // phone not exactly 10 digits
        &[
            ("name", "Asha"),
            ("email", "a@b.com"),
            ("number", "98765"),
            ("password", "longenough"),
        ],
        // password below 8 chars
        &[
            ("name", "Asha"),
            ("email", "a@b.com"),
            ("number", "9876543210"),
            ("password", "short"),
        ],
    ];

    for case in cases {
        let resp = client
            .post(app.url("/auth/register"))
            .form(case)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.url().path(), "/auth/register");
    }

    assert_eq!(
        app.backend.hits.register.load(Ordering::SeqCst),
        0,
        "client-side validation must block the request before any network call"
    );
}

#[tokio::test]
async fn valid_registration_lands_on_the_otp_page() {
    let app = TestApp::spawn().await;
    let client = TestApp::client();

    let resp = client
        .post(app.url("/auth/register"))
        .form(&[
            ("name", "Asha"),
            ("email", "new@example.com"),
            ("number", "9876543210"),
            ("password", "longenough"),
        ])
        .send()
        .await
        .unwrap();

    assert_eq!(app.backend.hits.register.load(Ordering::SeqCst), 1);
    assert_eq!(resp.url().path(), "/auth/verify-otp");
    let body = resp.text().await.unwrap();
    assert!(body.contains("new@example.com"));
    assert!(body.contains("OTP sent to your email"));
}

#[tokio::test]
async fn verify_account_two_step_flow() {
    let app = TestApp::spawn().await;
    let client = TestApp::client();

    // Step 1: request an OTP -> lands on step 2 with the email pinned
    let resp = client
        .post(app.url("/auth/verify-account/send"))
        .form(&[("email", "user@x.com")])
        .send()
        .await
        .unwrap();
    assert_eq!(app.backend.hits.resend_otp.load(Ordering::SeqCst), 1);
    assert_eq!(resp.url().path(), "/auth/verify-account");
    assert!(resp.url().query().unwrap().contains("step=2"));
    let body = resp.text().await.unwrap();
    assert!(body.contains("user@x.com"));
    assert!(body.contains("OTP sent to your email"));

    // Resending immediately is refused by the 30s cooldown, without a call
    let resp = client
        .post(app.url("/auth/verify-account/resend"))
        .form(&[("email", "user@x.com")])
        .send()
        .await
        .unwrap();
    let body = resp.text().await.unwrap();
    assert!(body.contains("before resending"));
    assert_eq!(app.backend.hits.resend_otp.load(Ordering::SeqCst), 1);

    // "Use a different email" is a plain navigation back to step 1: the OTP
    // field is gone and no backend call is made
    let resp = client
        .get(app.url("/auth/verify-account"))
        .send()
        .await
        .unwrap();
    let body = resp.text().await.unwrap();
    assert!(body.contains("Send OTP"));
    assert!(!body.contains("name=\"otp\""));
    assert_eq!(app.backend.hits.resend_otp.load(Ordering::SeqCst), 1);
    assert_eq!(app.backend.hits.verify_otp.load(Ordering::SeqCst), 0);

    // Submitting the right OTP completes the flow
    let resp = client
        .post(app.url("/auth/verify-account"))
        .form(&[("email", "user@x.com"), ("otp", GOOD_OTP)])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.url().path(), "/");
    let body = resp.text().await.unwrap();
    assert!(body.contains("Account verified"));

    // A wrong OTP surfaces the backend's message on step 2
    let resp = client
        .post(app.url("/auth/verify-account"))
        .form(&[("email", "user@x.com"), ("otp", "000000")])
        .send()
        .await
        .unwrap();
    let body = resp.text().await.unwrap();
    assert!(body.contains("Invalid OTP"));
}

#[tokio::test]
async fn forgot_password_flow_validates_before_calling() {
    let app = TestApp::spawn().await;
    let client = TestApp::client();

    // Step 1 with a bad email: no call
    let resp = client
        .post(app.url("/auth/forgot-password/send"))
        .form(&[("email", "nope")])
        .send()
        .await
        .unwrap();
    let body = resp.text().await.unwrap();
    assert!(body.contains("Please enter a valid email"));
    assert_eq!(app.backend.hits.forgot_password.load(Ordering::SeqCst), 0);

    // Step 1 with a good email moves to step 2
    let resp = client
        .post(app.url("/auth/forgot-password/send"))
        .form(&[("email", "user@x.com")])
        .send()
        .await
        .unwrap();
    assert!(resp.url().query().unwrap().contains("step=2"));
    assert_eq!(app.backend.hits.forgot_password.load(Ordering::SeqCst), 1);

    // Step 2 with a short password: refused locally
    let resp = client
        .post(app.url("/auth/forgot-password"))
        .form(&[
            ("email", "user@x.com"),
            ("otp", GOOD_OTP),
            ("new_password", "short"),
            ("confirm_password", "short"),
        ])
        .send()
        .await
        .unwrap();
    let body = resp.text().await.unwrap();
    assert!(body.contains("New password must be at least 8 characters"));
}

#[tokio::test]
async fn logout_ends_the_session() {
    let app = TestApp::spawn().await;
    let client = TestApp::client();

    app.login(&client, USER_EMAIL, USER_PASSWORD).await;

    let resp = client
        .post(app.url("/auth/logout"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.url().path(), "/auth/login");

    let resp = client.get(app.url("/account")).send().await.unwrap();
    assert_eq!(resp.url().path(), "/auth/login");
}
