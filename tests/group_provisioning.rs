//! Operational group creation: slug derivation and uniqueness.

mod support;

use std::sync::Arc;

use piazza::application::groups::{GroupProvisionError, provision_group};
use piazza::application::repos::GroupsRepo;
use support::MemoryStore;

fn as_repo(store: &Arc<MemoryStore>) -> Arc<dyn GroupsRepo> {
    store.clone()
}

#[tokio::test]
async fn slug_is_derived_from_the_title() {
    let store = MemoryStore::new();
    let groups = as_repo(&store);

    let group = provision_group(&groups, "Weekend Hikes & Trails", "walks")
        .await
        .expect("group created");

    assert_eq!(group.slug, "weekend-hikes-trails");
    assert_eq!(group.title, "Weekend Hikes & Trails");
    assert!(
        groups
            .find_by_slug("weekend-hikes-trails")
            .await
            .expect("lookup")
            .is_some()
    );
}

#[tokio::test]
async fn colliding_titles_get_suffixed_slugs() {
    let store = MemoryStore::new();
    let groups = as_repo(&store);

    let first = provision_group(&groups, "Book Club", "")
        .await
        .expect("first group");
    let second = provision_group(&groups, "Book Club", "")
        .await
        .expect("second group");

    assert_eq!(first.slug, "book-club");
    assert_eq!(second.slug, "book-club-2");
}

#[tokio::test]
async fn blank_titles_are_rejected() {
    let store = MemoryStore::new();
    let groups = as_repo(&store);

    let result = provision_group(&groups, "   ", "").await;
    assert!(matches!(result, Err(GroupProvisionError::Slug(_))));
    assert!(groups.list_all().await.expect("list").is_empty());
}
