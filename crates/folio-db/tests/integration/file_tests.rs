use chrono::{TimeDelta, Utc};
use folio_core::AppError;
use folio_core::traits::OrphanFileStore;
use folio_core::user::{ProfileChanges, ProfileImageChange};

use crate::integration::common::{create_user, setup_test_db, upload};

#[tokio::test]
async fn ensure_exist_requires_every_id() {
    let (db, _container) = setup_test_db().await;
    let file = upload(&db, "public/images/a.png").await;
    let repo = db.file_repo();

    repo.ensure_exist(&[]).await.unwrap();
    repo.ensure_exist(&[file.id]).await.unwrap();
    let err = repo.ensure_exist(&[file.id, file.id + 100]).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn orphans_exclude_mapped_and_recent_files() {
    let (db, _container) = setup_test_db().await;
    let user = create_user(&db, "alice").await;
    let orphan = upload(&db, "public/images/orphan.png").await;
    let profile = upload(&db, "public/users/profile/p.png").await;

    db.user_repo()
        .update_profile(
            user.id,
            &ProfileChanges::default(),
            &ProfileImageChange::Replace {
                file_id: profile.id,
                path: "/files/public/users/profile/p.png".into(),
            },
        )
        .await
        .unwrap();

    let repo = db.file_repo();
    let recent = repo.orphans_before(Utc::now() - TimeDelta::hours(24)).await.unwrap();
    assert!(recent.is_empty());

    let orphans = repo.orphans_before(Utc::now() + TimeDelta::hours(1)).await.unwrap();
    assert_eq!(orphans.len(), 1);
    assert_eq!(orphans[0].id, orphan.id);

    repo.delete_record(orphan.id).await.unwrap();
    assert!(repo.find_by_id(orphan.id).await.unwrap().is_none());
}
