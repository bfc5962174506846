use serde_json::json;

use crate::common::{SECRET, TestApp};

fn record(admins: &[&str], secret: Option<&str>) -> serde_json::Value {
    json!({
        "enabled": true,
        "admins": admins,
        "email": "admin@example.com",
        "secret": secret,
    })
}

#[tokio::test]
async fn set_then_read_back_fields() {
    let app = TestApp::spawn().await;

    let res = app
        .rpc("admin.set", json!({"site": "blog", "record": record(&["a1", "a2"], None)}))
        .await;
    assert_eq!(res.result(), &json!(null));

    let res = app.rpc("admin.get", json!({"site": "blog"})).await;
    assert_eq!(res.result()["site_id"], "blog");
    assert_eq!(res.result()["enabled"], true);

    let res = app.rpc("admin.admins", json!({"site": "blog"})).await;
    assert_eq!(res.result(), &json!(["a1", "a2"]));
    let res = app.rpc("admin.email", json!({"site": "blog"})).await;
    assert_eq!(res.result(), &json!("admin@example.com"));
    let res = app.rpc("admin.enabled", json!({"site": "blog"})).await;
    assert_eq!(res.result(), &json!(true));
}

#[tokio::test]
async fn secret_only_leaves_through_key() {
    let app = TestApp::spawn().await;
    app.rpc(
        "admin.set",
        json!({"site": "blog", "record": record(&["a1"], Some("blog-secret"))}),
    )
    .await
    .result();

    let get = app.rpc("admin.get", json!({"site": "blog"})).await;
    assert!(get.result().get("secret").is_none());
    assert!(!get.text.contains("blog-secret"));

    let list = app.rpc("admin.list", json!(null)).await;
    assert_eq!(list.result().as_array().unwrap().len(), 1);
    assert!(!list.text.contains("blog-secret"));

    let key = app.rpc("admin.key", json!({"site": "blog"})).await;
    assert_eq!(key.result(), &json!("blog-secret"));
}

#[tokio::test]
async fn key_falls_back_to_process_secret() {
    let app = TestApp::spawn().await;

    let res = app.rpc("admin.key", json!({"site": "unknown"})).await;

    assert_eq!(res.result(), &json!(SECRET));
}

#[tokio::test]
async fn unknown_site_is_not_found() {
    let app = TestApp::spawn().await;

    let res = app.rpc("admin.get", json!({"site": "ghost"})).await;

    assert_eq!(res.error(), "site ghost not found");
}
