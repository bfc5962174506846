use serde_json::json;

use crate::common::{ADMIN_PASSWORD, ADMIN_USER, TestApp, basic, post};

fn count_envelope() -> serde_json::Value {
    json!({"method": "store.count", "id": 1, "params": post()})
}

#[tokio::test]
async fn missing_credentials_are_401_without_body() {
    let app = TestApp::spawn_with_auth().await;

    let res = app.post_with_authorization(&count_envelope(), None).await;

    assert_eq!(res.status, 401);
    assert!(res.text.is_empty());
    assert!(res.headers.contains_key("www-authenticate"));
}

#[tokio::test]
async fn wrong_password_is_401() {
    let app = TestApp::spawn_with_auth().await;

    let res = app
        .post_with_authorization(&count_envelope(), Some(&basic(ADMIN_USER, "wrong")))
        .await;

    assert_eq!(res.status, 401);
    assert!(res.text.is_empty());
}

#[tokio::test]
async fn auth_is_checked_before_the_body() {
    let app = TestApp::spawn_with_auth().await;

    let res = app
        .client
        .post(app.endpoint())
        .header("Content-Type", "application/json")
        .body("not json")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 401);
}

#[tokio::test]
async fn valid_credentials_pass() {
    let app = TestApp::spawn_with_auth().await;

    let res = app
        .post_with_authorization(
            &count_envelope(),
            Some(&basic(ADMIN_USER, ADMIN_PASSWORD)),
        )
        .await;

    assert_eq!(res.result(), &json!(0));
}

#[tokio::test]
async fn no_configured_user_means_no_check() {
    let app = TestApp::spawn().await;

    let res = app.post_with_authorization(&count_envelope(), None).await;

    assert_eq!(res.result(), &json!(0));
}
