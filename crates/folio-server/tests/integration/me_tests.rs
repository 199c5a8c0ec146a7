use axum::http::{Method, StatusCode};

use folio_core::Role;

use crate::integration::common::{TEST_PASSWORD, setup_test_app};

#[tokio::test]
async fn update_profile_fields() {
    let app = setup_test_app().await;
    let user = app.create_user("ferris", Role::User).await;

    let (status, json) = app
        .authed(
            Method::PATCH,
            "/api/me/profile",
            &user,
            Some(serde_json::json!({
                "nickname": "ferris2",
                "position": "Backend engineer",
                "about": "Writes Rust",
            })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["nickname"], "ferris2");
    assert_eq!(json["position"], "Backend engineer");

    let (status, json) = app.get("/api/users/ferris2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["about"], "Writes Rust");
    assert!(json.get("email").is_none());
}

#[tokio::test]
async fn nickname_conflict_returns_409() {
    let app = setup_test_app().await;
    let user = app.create_user("ferris", Role::User).await;
    app.create_user("crab", Role::User).await;

    let (status, _) = app
        .authed(
            Method::PATCH,
            "/api/me/profile",
            &user,
            Some(serde_json::json!({ "nickname": "crab" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Keeping one's own nickname is not a conflict.
    let (status, _) = app
        .authed(
            Method::PATCH,
            "/api/me/profile",
            &user,
            Some(serde_json::json!({ "nickname": "ferris" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn unknown_profile_image_returns_404() {
    let app = setup_test_app().await;
    let user = app.create_user("ferris", Role::User).await;

    let (status, _) = app
        .authed(
            Method::PATCH,
            "/api/me/profile",
            &user,
            Some(serde_json::json!({ "profile_image_file_id": 9999 })),
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn change_password_rules() {
    let app = setup_test_app().await;
    let user = app.create_user("ferris", Role::User).await;

    let (status, json) = app
        .authed(
            Method::PATCH,
            "/api/me/password",
            &user,
            Some(serde_json::json!({
                "current_password": "wrong-password",
                "new_password": "brandnew123",
                "confirm_password": "brandnew123",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "Current password is incorrect");

    let (status, _) = app
        .authed(
            Method::PATCH,
            "/api/me/password",
            &user,
            Some(serde_json::json!({
                "current_password": TEST_PASSWORD,
                "new_password": "brandnew123",
                "confirm_password": "brandnew123",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let stored = app
        .db
        .user_repo()
        .find_by_id(user.id)
        .await
        .unwrap()
        .unwrap();
    assert!(folio_core::password::verify("brandnew123", &stored.password_hash));
}

#[tokio::test]
async fn unknown_public_user_returns_404() {
    let app = setup_test_app().await;

    let (status, json) = app.get("/api/users/ghost").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "not_found");
}

#[tokio::test]
async fn profile_nickname_is_checked_after_trim() {
    let app = setup_test_app().await;
    let user = app.create_user("ferris", Role::User).await;

    let (status, json) = app
        .authed(
            Method::PATCH,
            "/api/me/profile",
            &user,
            Some(serde_json::json!({ "nickname": " x " })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["errors"]["nickname"].is_string());

    let (status, json) = app.get("/api/users/ferris").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["nickname"], "ferris");
}
