use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use tower::ServiceExt;

use folio_core::Role;

use crate::integration::common::{TEST_PASSWORD, setup_test_app};

fn login_request(email: &str, password: &str) -> Request<Body> {
    Request::post("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            serde_json::to_vec(&serde_json::json!({ "email": email, "password": password }))
                .unwrap(),
        ))
        .unwrap()
}

/// `name=value` pairs from the response's Set-Cookie headers.
fn set_cookies(response: &axum::response::Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

fn cookie_pair(cookies: &[String], name: &str) -> String {
    cookies
        .iter()
        .find(|c| c.starts_with(&format!("{name}=")))
        .map(|c| c.split(';').next().unwrap().to_string())
        .unwrap_or_else(|| panic!("no {name} cookie in {cookies:?}"))
}

#[tokio::test]
async fn health_returns_200() {
    let app = setup_test_app().await;

    let (status, json) = app.get("/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["database"], "ok");
}

#[tokio::test]
async fn login_sets_http_only_cookies() {
    let app = setup_test_app().await;
    app.create_user("ferris", Role::User).await;

    let response = app
        .router
        .clone()
        .oneshot(login_request("ferris@example.com", TEST_PASSWORD))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let cookies = set_cookies(&response);
    let access = cookies
        .iter()
        .find(|c| c.starts_with("access_token="))
        .unwrap();
    assert!(access.contains("HttpOnly"));
    assert!(access.contains("Path=/"));
    let refresh = cookies
        .iter()
        .find(|c| c.starts_with("refresh_token="))
        .unwrap();
    assert!(refresh.contains("Path=/api/auth"));
}

#[tokio::test]
async fn login_with_wrong_password_returns_401() {
    let app = setup_test_app().await;
    app.create_user("ferris", Role::User).await;

    let (status, json) = app
        .send(login_request("ferris@example.com", "not-the-password"))
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["message"], "Invalid email or password");

    let (status, _) = app
        .send(login_request("nobody@example.com", TEST_PASSWORD))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn access_cookie_authenticates_requests() {
    let app = setup_test_app().await;
    app.create_user("ferris", Role::User).await;

    let response = app
        .router
        .clone()
        .oneshot(login_request("ferris@example.com", TEST_PASSWORD))
        .await
        .unwrap();
    let access = cookie_pair(&set_cookies(&response), "access_token");

    let (status, json) = app
        .send(
            Request::get("/api/me")
                .header(header::COOKIE, access)
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["nickname"], "ferris");
    assert_eq!(json["role"], "USER");
}

#[tokio::test]
async fn unauthenticated_request_returns_401() {
    let app = setup_test_app().await;

    let (status, _) = app.get("/api/me").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .send(
            Request::get("/api/me")
                .header(header::AUTHORIZATION, "Bearer not-a-jwt")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn refresh_token_is_not_an_access_token() {
    let app = setup_test_app().await;
    let user = app.create_user("ferris", Role::User).await;
    let refresh = app
        .tokens
        .issue(&user, folio_server::auth::TokenKind::Refresh)
        .unwrap();

    let (status, _) = app
        .send(
            Request::get("/api/me")
                .header(header::AUTHORIZATION, format!("Bearer {refresh}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn refresh_reissues_both_cookies() {
    let app = setup_test_app().await;
    let user = app.create_user("ferris", Role::User).await;
    let refresh = app
        .tokens
        .issue(&user, folio_server::auth::TokenKind::Refresh)
        .unwrap();

    let response = app
        .router
        .clone()
        .oneshot(
            Request::post("/api/auth/refresh")
                .header(header::COOKIE, format!("refresh_token={refresh}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let cookies = set_cookies(&response);
    assert!(cookies.iter().any(|c| c.starts_with("access_token=")));
    assert!(cookies.iter().any(|c| c.starts_with("refresh_token=")));
}

#[tokio::test]
async fn refresh_without_cookie_clears_and_returns_401() {
    let app = setup_test_app().await;

    let response = app
        .router
        .clone()
        .oneshot(
            Request::post("/api/auth/refresh")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let cookies = set_cookies(&response);
    assert!(
        cookies
            .iter()
            .any(|c| c.starts_with("access_token=") && c.contains("Max-Age=0"))
    );
}

#[tokio::test]
async fn logout_expires_cookies() {
    let app = setup_test_app().await;

    let response = app
        .router
        .clone()
        .oneshot(Request::post("/api/auth/logout").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let cookies = set_cookies(&response);
    assert_eq!(
        cookies.iter().filter(|c| c.contains("Max-Age=0")).count(),
        2
    );
}

#[tokio::test]
async fn signup_requires_admin() {
    let app = setup_test_app().await;
    let user = app.create_user("ferris", Role::User).await;
    let admin = app.create_user("root", Role::Admin).await;
    let body = serde_json::json!({
        "email": "new@example.com",
        "password": "password123",
        "nickname": "newbie",
    });

    let (status, json) = app
        .authed(Method::POST, "/api/admin/auth/signup", &user, Some(body.clone()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["error"], "forbidden");

    let (status, json) = app
        .authed(Method::POST, "/api/admin/auth/signup", &admin, Some(body.clone()))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["user"]["nickname"], "newbie");
    assert_eq!(json["user"]["role"], "USER");

    let (status, _) = app
        .authed(Method::POST, "/api/admin/auth/signup", &admin, Some(body))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn signup_validates_fields() {
    let app = setup_test_app().await;
    let admin = app.create_user("root", Role::Admin).await;

    let (status, json) = app
        .authed(
            Method::POST,
            "/api/admin/auth/signup",
            &admin,
            Some(serde_json::json!({
                "email": "not-an-email",
                "password": "short",
                "nickname": "x",
            })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "validation_error");
    assert!(json["errors"]["email"].is_string());
    assert!(json["errors"]["password"].is_string());
    assert!(json["errors"]["nickname"].is_string());
}

#[tokio::test]
async fn signup_checks_trimmed_nickname_and_email_length() {
    let app = setup_test_app().await;
    let admin = app.create_user("root", Role::Admin).await;

    let (status, json) = app
        .authed(
            Method::POST,
            "/api/admin/auth/signup",
            &admin,
            Some(serde_json::json!({
                "email": "blank@example.com",
                "password": "password123",
                "nickname": "   ",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["errors"]["nickname"].is_string());

    let long_email = format!("{}@example.com", "a".repeat(39));
    let (status, json) = app
        .authed(
            Method::POST,
            "/api/admin/auth/signup",
            &admin,
            Some(serde_json::json!({
                "email": long_email,
                "password": "password123",
                "nickname": "longmail",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["errors"]["email"].is_string());

    let (status, json) = app
        .authed(
            Method::POST,
            "/api/admin/auth/signup",
            &admin,
            Some(serde_json::json!({
                "email": "padded@example.com",
                "password": "password123",
                "nickname": "  padded  ",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["user"]["nickname"], "padded");
}
