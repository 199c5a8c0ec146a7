use folio_core::AppError;
use folio_core::stack::StackGroup;

use crate::integration::common::{create_post, create_user, new_post, setup_test_db};

#[tokio::test]
async fn create_update_delete_stack() {
    let (db, _container) = setup_test_db().await;
    let repo = db.stack_repo();

    let stack = repo.create("Postgres", StackGroup::Database).await.unwrap();
    assert_eq!(stack.group, StackGroup::Database);

    let err = repo.create("Postgres", StackGroup::Tool).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let renamed = repo
        .update(stack.id, "PostgreSQL", StackGroup::Database)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(renamed.name, "PostgreSQL");
    assert!(repo.update(9999, "x", StackGroup::Etc).await.unwrap().is_none());

    assert!(repo.name_exists("PostgreSQL", None).await.unwrap());
    assert!(!repo.name_exists("PostgreSQL", Some(stack.id)).await.unwrap());

    assert!(repo.delete(stack.id).await.unwrap());
    assert!(!repo.delete(stack.id).await.unwrap());
}

#[tokio::test]
async fn list_by_group_is_sorted() {
    let (db, _container) = setup_test_db().await;
    let repo = db.stack_repo();
    repo.create("Rust", StackGroup::Language).await.unwrap();
    repo.create("Go", StackGroup::Language).await.unwrap();
    repo.create("Docker", StackGroup::Devops).await.unwrap();

    let languages: Vec<String> = repo
        .list_by_group(StackGroup::Language)
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.name)
        .collect();
    assert_eq!(languages, vec!["Go", "Rust"]);
    assert_eq!(repo.list_all().await.unwrap().len(), 3);
}

#[tokio::test]
async fn counts_only_published_posts() {
    let (db, _container) = setup_test_db().await;
    let alice = create_user(&db, "alice").await;
    let repo = db.stack_repo();
    repo.create("Rust", StackGroup::Language).await.unwrap();
    repo.create("Go", StackGroup::Language).await.unwrap();
    repo.create("Unused", StackGroup::Tool).await.unwrap();

    for (title, stacks) in [("A", vec!["Rust"]), ("B", vec!["Rust", "Go"]), ("C", vec!["Go"])] {
        let mut input = new_post(alice.id, title, &title.to_lowercase());
        input.stack_names = stacks.into_iter().map(String::from).collect();
        let post = create_post(&db, input).await;
        if title == "C" {
            db.post_repo().soft_delete(post.id).await.unwrap();
        }
    }

    let counts = repo.with_counts().await.unwrap();
    let go = counts.iter().find(|s| s.name == "Go").unwrap();
    assert_eq!(go.post_count, 1);
    let unused = counts.iter().find(|s| s.name == "Unused").unwrap();
    assert_eq!(unused.post_count, 0);

    let popular = repo.popular(10).await.unwrap();
    let names: Vec<&str> = popular.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Rust", "Go"]);
}
