use folio_core::AppError;
use folio_core::user::{NewUser, ProfileChanges, ProfileImageChange, Role};

use crate::integration::common::{create_user, setup_test_db, upload};

#[tokio::test]
async fn create_and_find_user() {
    let (db, _container) = setup_test_db().await;
    let user = create_user(&db, "alice").await;
    let repo = db.user_repo();

    assert_eq!(user.role, Role::User);
    assert_eq!(
        repo.find_by_email("alice@example.com").await.unwrap().unwrap().id,
        user.id
    );
    assert!(repo.find_by_nickname("alice").await.unwrap().is_some());
    assert!(repo.email_exists("alice@example.com").await.unwrap());
    assert!(!repo.nickname_exists("bob").await.unwrap());
}

#[tokio::test]
async fn duplicate_email_is_a_conflict() {
    let (db, _container) = setup_test_db().await;
    create_user(&db, "alice").await;

    let err = db
        .user_repo()
        .create(&NewUser {
            email: "alice@example.com".into(),
            password_hash: "x".into(),
            name: None,
            nickname: "alice2".into(),
            role: Role::Admin,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn profile_update_applies_only_given_fields() {
    let (db, _container) = setup_test_db().await;
    let user = create_user(&db, "alice").await;
    let image = upload(&db, "public/users/profile/a.png").await;
    let repo = db.user_repo();

    let updated = repo
        .update_profile(
            user.id,
            &ProfileChanges {
                position: Some("Engineer".into()),
                ..Default::default()
            },
            &ProfileImageChange::Replace {
                file_id: image.id,
                path: "/files/public/users/profile/a.png".into(),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.nickname, "alice");
    assert_eq!(updated.position.as_deref(), Some("Engineer"));
    assert_eq!(
        updated.profile_image_path.as_deref(),
        Some("/files/public/users/profile/a.png")
    );

    let cleared = repo
        .update_profile(user.id, &ProfileChanges::default(), &ProfileImageChange::Remove)
        .await
        .unwrap();
    assert!(cleared.profile_image_path.is_none());
    assert_eq!(cleared.position.as_deref(), Some("Engineer"));
}

#[tokio::test]
async fn nickname_clash_on_update_is_a_conflict() {
    let (db, _container) = setup_test_db().await;
    let alice = create_user(&db, "alice").await;
    create_user(&db, "bob").await;

    let err = db
        .user_repo()
        .update_profile(
            alice.id,
            &ProfileChanges {
                nickname: Some("bob".into()),
                ..Default::default()
            },
            &ProfileImageChange::Keep,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn update_password_of_missing_user() {
    let (db, _container) = setup_test_db().await;
    let err = db.user_repo().update_password(42, "hash").await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}
