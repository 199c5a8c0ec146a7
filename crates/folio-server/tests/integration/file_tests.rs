use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};

use folio_core::Role;
use folio_core::user::User;

use crate::integration::common::{TestApp, post_body, setup_test_app};

const BOUNDARY: &str = "folio-test-boundary";

/// A multipart body with one `file` part and an optional `purpose` part.
fn multipart_body(
    file_name: &str,
    content_type: &str,
    data: &[u8],
    purpose: Option<&str>,
) -> Vec<u8> {
    let mut body = Vec::new();
    if let Some(purpose) = purpose {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"purpose\"\r\n\r\n{purpose}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

async fn upload(
    app: &TestApp,
    user: &User,
    file_name: &str,
    content_type: &str,
    purpose: Option<&str>,
) -> (StatusCode, serde_json::Value) {
    let request = Request::post("/api/files/upload")
        .header(header::AUTHORIZATION, app.bearer(user))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(
            file_name,
            content_type,
            b"fake image bytes",
            purpose,
        )))
        .unwrap();
    app.send(request).await
}

#[tokio::test]
async fn upload_image_returns_public_url() {
    let app = setup_test_app().await;
    let user = app.create_user("ferris", Role::User).await;

    let (status, json) = upload(&app, &user, "diagram.png", "image/png", None).await;

    assert_eq!(status, StatusCode::CREATED, "{json}");
    assert_eq!(json["original_name"], "diagram.png");
    assert_eq!(json["category"], "image");
    assert_eq!(json["file_size"], 16);
    let url = json["url"].as_str().unwrap();
    assert!(url.starts_with("/files/public/images/"));
    assert!(url.ends_with(".png"));
}

#[tokio::test]
async fn profile_upload_uses_profile_prefix() {
    let app = setup_test_app().await;
    let user = app.create_user("ferris", Role::User).await;

    let (status, json) = upload(&app, &user, "me.jpg", "image/jpeg", Some("profile")).await;
    assert_eq!(status, StatusCode::CREATED, "{json}");
    assert!(
        json["url"]
            .as_str()
            .unwrap()
            .starts_with("/files/public/users/profile/")
    );

    let (status, _) = upload(&app, &user, "cv.pdf", "application/pdf", Some("profile")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn rejected_uploads() {
    let app = setup_test_app().await;
    let user = app.create_user("ferris", Role::User).await;

    let (status, _) = upload(&app, &user, "tool.exe", "application/x-msdownload", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = upload(&app, &user, "image.pdf", "image/png", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = upload(&app, &user, "a.png", "image/png", Some("banner")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn upload_requires_auth() {
    let app = setup_test_app().await;

    let (status, _) = app
        .send(
            Request::post("/api/files/upload")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                )
                .body(Body::from(multipart_body("a.png", "image/png", b"x", None)))
                .unwrap(),
        )
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn uploaded_file_becomes_thumbnail_and_profile_image() {
    let app = setup_test_app().await;
    let user = app.create_user("ferris", Role::User).await;

    let (_, file) = upload(&app, &user, "cover.webp", "image/webp", None).await;
    let file_id = file["id"].as_i64().unwrap();

    let mut body = post_body("With Cover", &[]);
    body["thumbnail_file_id"] = serde_json::json!(file_id);
    body["content"] = serde_json::json!(format!("Intro\n\n::file[id={file_id}]"));
    let (status, post) = app
        .authed(Method::POST, "/api/my/posts", &user, Some(body))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{post}");
    assert_eq!(post["thumbnail_url"], file["url"]);

    let (_, avatar) = upload(&app, &user, "me.png", "image/png", Some("profile")).await;
    let (status, me) = app
        .authed(
            Method::PATCH,
            "/api/me/profile",
            &user,
            Some(serde_json::json!({ "profile_image_file_id": avatar["id"] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["profile_image_url"], avatar["url"]);

    let (_, me) = app
        .authed(
            Method::PATCH,
            "/api/me/profile",
            &user,
            Some(serde_json::json!({ "remove_profile_image": true })),
        )
        .await;
    assert!(me["profile_image_url"].is_null());
}

#[tokio::test]
async fn post_referencing_missing_file_is_rejected() {
    let app = setup_test_app().await;
    let user = app.create_user("ferris", Role::User).await;
    let mut body = post_body("Dangling", &[]);
    body["content"] = serde_json::json!("See ::file[id=424242]");

    let (status, _) = app
        .authed(Method::POST, "/api/my/posts", &user, Some(body))
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}
