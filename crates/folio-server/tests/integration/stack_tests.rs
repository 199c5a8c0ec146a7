use axum::http::{Method, StatusCode};

use folio_core::Role;

use crate::integration::common::setup_test_app;

#[tokio::test]
async fn admin_manages_stacks() {
    let app = setup_test_app().await;
    let admin = app.create_user("root", Role::Admin).await;

    let created = app.create_stack(&admin, "Axum", "framework").await;
    assert_eq!(created["group"], "framework");
    let id = created["id"].as_i64().unwrap();

    let (status, json) = app
        .authed(
            Method::PUT,
            &format!("/api/admin/stacks/{id}"),
            &admin,
            Some(serde_json::json!({ "name": "Axum 0.8" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["name"], "Axum 0.8");
    assert_eq!(json["group"], "framework");

    let (status, _) = app
        .authed(Method::DELETE, &format!("/api/admin/stacks/{id}"), &admin, None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app
        .authed(Method::DELETE, &format!("/api/admin/stacks/{id}"), &admin, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn stack_names_are_unique() {
    let app = setup_test_app().await;
    let admin = app.create_user("root", Role::Admin).await;
    app.create_stack(&admin, "Rust", "language").await;
    let go = app.create_stack(&admin, "Go", "language").await;

    let (status, _) = app
        .authed(
            Method::POST,
            "/api/admin/stacks",
            &admin,
            Some(serde_json::json!({ "name": "Rust" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .authed(
            Method::PUT,
            &format!("/api/admin/stacks/{}", go["id"]),
            &admin,
            Some(serde_json::json!({ "name": "Rust" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn non_admin_cannot_create_stacks() {
    let app = setup_test_app().await;
    let user = app.create_user("ferris", Role::User).await;

    let (status, _) = app
        .authed(
            Method::POST,
            "/api/admin/stacks",
            &user,
            Some(serde_json::json!({ "name": "Rust" })),
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_group_is_rejected() {
    let app = setup_test_app().await;
    let admin = app.create_user("root", Role::Admin).await;

    let (status, _) = app
        .authed(
            Method::POST,
            "/api/admin/stacks",
            &admin,
            Some(serde_json::json!({ "name": "AWS", "group": "cloud" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.get("/api/stacks/group/cloud").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn listings_group_and_count_stacks() {
    let app = setup_test_app().await;
    let admin = app.create_user("root", Role::Admin).await;
    let author = app.create_user("ferris", Role::User).await;
    app.create_stack(&admin, "Rust", "language").await;
    app.create_stack(&admin, "PostgreSQL", "database").await;
    app.create_stack(&admin, "Tokio", "library").await;

    app.publish(&author, "One", &["Rust", "Tokio"]).await;
    app.publish(&author, "Two", &["Rust"]).await;

    let (status, json) = app.get("/api/stacks").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 3);

    let (_, json) = app.get("/api/stacks/group/language").await;
    assert_eq!(json[0]["name"], "Rust");

    let (_, json) = app.get("/api/stacks/grouped").await;
    let groups = json.as_object().unwrap();
    assert_eq!(groups.len(), 7);
    assert!(groups["devops"].as_array().unwrap().is_empty());
    assert_eq!(groups["language"][0]["post_count"], 2);

    let (_, json) = app.get("/api/stacks/popular").await;
    let popular = json.as_array().unwrap();
    assert_eq!(popular.len(), 2);
    assert_eq!(popular[0]["rank"], 1);
    assert_eq!(popular[0]["name"], "Rust");
    assert_eq!(popular[1]["name"], "Tokio");

    let (_, json) = app.get("/api/stacks/popular?limit=1").await;
    assert_eq!(json.as_array().unwrap().len(), 1);
}
