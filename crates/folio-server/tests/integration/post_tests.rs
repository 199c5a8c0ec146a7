use axum::http::{Method, StatusCode};

use folio_core::Role;

use crate::integration::common::{post_body, setup_test_app};

#[tokio::test]
async fn publish_and_read_post() {
    let app = setup_test_app().await;
    let author = app.create_user("ferris", Role::User).await;

    let created = app.publish(&author, "Hello Axum", &[]).await;
    assert_eq!(created["slug"], "hello-axum");
    assert_eq!(created["status"], "PUBLISHED");
    assert_eq!(created["tags"][0], "rust");

    let (status, json) = app.get("/api/posts/ferris/hello-axum").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["title"], "Hello Axum");
    assert_eq!(json["author"]["nickname"], "ferris");
    assert!(json["related"].is_array());
}

#[tokio::test]
async fn duplicate_title_is_rejected() {
    let app = setup_test_app().await;
    let author = app.create_user("ferris", Role::User).await;
    let other = app.create_user("crab", Role::User).await;
    app.publish(&author, "Same Title", &[]).await;

    let (status, json) = app
        .authed(
            Method::POST,
            "/api/my/posts",
            &other,
            Some(post_body("Same Title", &[])),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["errors"]["title"], "Title is already in use");
}

#[tokio::test]
async fn raw_html_in_content_is_rejected() {
    let app = setup_test_app().await;
    let author = app.create_user("ferris", Role::User).await;
    let mut body = post_body("Scripted", &[]);
    body["content"] = serde_json::json!("Hi <script>alert(1)</script>");

    let (status, _) = app
        .authed(Method::POST, "/api/my/posts", &author, Some(body))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_post_type_is_rejected() {
    let app = setup_test_app().await;
    let author = app.create_user("ferris", Role::User).await;
    let mut body = post_body("Poetry", &[]);
    body["post_type"] = serde_json::json!("poem");

    let (status, json) = app
        .authed(Method::POST, "/api/my/posts", &author, Some(body))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "bad_request");
}

#[tokio::test]
async fn update_changes_slug_with_title() {
    let app = setup_test_app().await;
    let author = app.create_user("ferris", Role::User).await;
    app.publish(&author, "First Draft", &[]).await;

    let (status, json) = app
        .authed(
            Method::PUT,
            "/api/my/posts/first-draft",
            &author,
            Some(post_body("Final Cut", &[])),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["slug"], "final-cut");

    let (status, _) = app.get("/api/posts/ferris/first-draft").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.get("/api/posts/ferris/final-cut").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn other_users_cannot_edit() {
    let app = setup_test_app().await;
    let author = app.create_user("ferris", Role::User).await;
    let other = app.create_user("crab", Role::User).await;
    app.publish(&author, "Mine", &[]).await;

    let (status, _) = app
        .authed(
            Method::PUT,
            "/api/my/posts/mine",
            &other,
            Some(post_body("Stolen", &[])),
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn soft_delete_and_restore() {
    let app = setup_test_app().await;
    let author = app.create_user("ferris", Role::User).await;
    app.publish(&author, "Temporary", &[]).await;

    let (status, _) = app
        .authed(Method::DELETE, "/api/my/posts/temporary", &author, None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.get("/api/posts/ferris/temporary").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .authed(Method::DELETE, "/api/my/posts/temporary", &author, None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, json) = app
        .authed(Method::GET, "/api/my/posts/deleted", &author, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total_elements"], 1);
    assert!(json["content"][0]["deleted_at"].is_string());

    let (status, _) = app
        .authed(
            Method::PUT,
            "/api/my/posts/temporary",
            &author,
            Some(post_body("Temporary", &[])),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, json) = app
        .authed(Method::POST, "/api/my/posts/temporary/restore", &author, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "PUBLISHED");

    let (status, _) = app
        .authed(Method::POST, "/api/my/posts/temporary/restore", &author, None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn search_filters_and_paginates() {
    let app = setup_test_app().await;
    let admin = app.create_user("root", Role::Admin).await;
    let author = app.create_user("ferris", Role::User).await;
    app.create_stack(&admin, "Rust", "language").await;

    app.publish(&author, "Async Rust", &["Rust"]).await;
    app.publish(&author, "Plain Notes", &[]).await;
    app.publish(&author, "Rust Macros", &["Rust"]).await;

    let (status, json) = app.get("/api/posts?stack=Rust").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total_elements"], 2);
    // Newest first.
    assert_eq!(json["content"][0]["title"], "Rust Macros");

    let (_, json) = app.get("/api/posts?keyword=notes").await;
    assert_eq!(json["total_elements"], 1);

    let (_, json) = app.get("/api/posts?page=1&size=2").await;
    assert_eq!(json["content"].as_array().unwrap().len(), 1);
    assert_eq!(json["has_previous"], true);
    assert_eq!(json["has_next"], false);

    let (status, _) = app.get("/api/posts?post_type=poem").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn list_by_user_requires_known_user() {
    let app = setup_test_app().await;
    let author = app.create_user("ferris", Role::User).await;
    app.publish(&author, "Visible", &[]).await;

    let (status, json) = app.get("/api/posts/user/ferris").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total_elements"], 1);

    let (status, _) = app.get("/api/posts/user/ghost").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn autocomplete_puts_title_matches_first() {
    let app = setup_test_app().await;
    let author = app.create_user("ferris", Role::User).await;
    let mut body = post_body("Tokio Internals", &[]);
    body["excerpt"] = serde_json::json!("Scheduler deep dive");
    app.authed(Method::POST, "/api/my/posts", &author, Some(body))
        .await;
    let mut body = post_body("Runtime Notes", &[]);
    body["excerpt"] = serde_json::json!("Mostly about tokio");
    app.authed(Method::POST, "/api/my/posts", &author, Some(body))
        .await;

    let (status, json) = app.get("/api/posts/autocomplete?keyword=tokio").await;
    assert_eq!(status, StatusCode::OK);
    let titles: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Tokio Internals", "Runtime Notes"]);

    let (_, json) = app.get("/api/posts/autocomplete?keyword=%20").await;
    assert_eq!(json, serde_json::json!([]));
}

#[tokio::test]
async fn related_posts_share_stacks() {
    let app = setup_test_app().await;
    let admin = app.create_user("root", Role::Admin).await;
    let author = app.create_user("ferris", Role::User).await;
    app.create_stack(&admin, "Rust", "language").await;

    app.publish(&author, "Ownership", &["Rust"]).await;
    app.publish(&author, "Borrowing", &["Rust"]).await;

    let (_, json) = app.get("/api/posts/ferris/ownership").await;
    let related: Vec<&str> = json["related"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["slug"].as_str().unwrap())
        .collect();
    assert!(related.contains(&"borrowing"));
    assert!(!related.contains(&"ownership"));
}

#[tokio::test]
async fn my_posts_lists_only_own_posts() {
    let app = setup_test_app().await;
    let author = app.create_user("ferris", Role::User).await;
    let other = app.create_user("crab", Role::User).await;
    app.publish(&author, "Mine One", &[]).await;
    app.publish(&other, "Theirs", &[]).await;

    let (status, json) = app
        .authed(Method::GET, "/api/my/posts", &author, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total_elements"], 1);
    assert_eq!(json["content"][0]["title"], "Mine One");

    let (status, json) = app
        .authed(Method::GET, "/api/my/posts/mine-one/edit", &author, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["content"].as_str().unwrap().contains("Mine One"));
}

#[tokio::test]
async fn post_titled_deleted_stays_editable() {
    let app = setup_test_app().await;
    let author = app.create_user("ferris", Role::User).await;

    let created = app.publish(&author, "Deleted", &[]).await;
    assert_eq!(created["slug"], "deleted-2");

    let (status, json) = app
        .authed(
            Method::PUT,
            "/api/my/posts/deleted-2",
            &author,
            Some(post_body("Deleted", &[])),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["slug"], "deleted-2");

    let (status, _) = app
        .authed(Method::DELETE, "/api/my/posts/deleted-2", &author, None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, json) = app
        .authed(Method::GET, "/api/my/posts/deleted", &author, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["content"][0]["slug"], "deleted-2");
}

#[tokio::test]
async fn page_number_at_the_limit_is_empty() {
    let app = setup_test_app().await;
    let author = app.create_user("ferris", Role::User).await;
    app.publish(&author, "Only Post", &[]).await;

    let (status, json) = app.get("/api/posts?page=4294967295&size=10").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["content"].as_array().unwrap().len(), 0);
    assert_eq!(json["has_next"], false);
}
