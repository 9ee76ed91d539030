//! Post/comment authoring rules: authorship, validation, soft redirects.

mod support;

use piazza::application::authoring::{AuthoringError, EditAccess};
use piazza::application::forms::{CommentForm, PostForm, ValidatedPostForm};
use support::TestApp;
use uuid::Uuid;

fn valid_form(text: &str) -> ValidatedPostForm {
    PostForm {
        text: text.to_string(),
        group: String::new(),
    }
    .validate()
    .expect("valid form")
}

#[tokio::test]
async fn creating_a_post_adds_exactly_one_with_the_submitter_as_author() {
    let app = TestApp::new();
    let author = app.store.seed_user("casual_poster");

    assert_eq!(app.store.post_count(), 0);
    let post = app
        .authoring
        .create_post(author.id, valid_form("hello piazza"), None)
        .await
        .expect("post created");

    assert_eq!(app.store.post_count(), 1);
    assert_eq!(post.author_id, author.id);
    assert_eq!(post.author_username, "casual_poster");
    assert_eq!(post.text, "hello piazza");
}

#[tokio::test]
async fn creating_a_post_in_a_group_records_the_group() {
    let app = TestApp::new();
    let author = app.store.seed_user("casual_poster");
    let group = app.store.seed_group("Weekend Hikes", "weekend-hikes");

    let form = PostForm {
        text: "up the ridge".to_string(),
        group: group.id.to_string(),
    }
    .validate()
    .expect("valid form");

    let post = app
        .authoring
        .create_post(author.id, form, None)
        .await
        .expect("post created");
    assert_eq!(post.group_slug.as_deref(), Some("weekend-hikes"));
}

#[tokio::test]
async fn creating_a_post_in_an_unknown_group_persists_nothing() {
    let app = TestApp::new();
    let author = app.store.seed_user("casual_poster");

    let form = PostForm {
        text: "orphan".to_string(),
        group: Uuid::new_v4().to_string(),
    }
    .validate()
    .expect("form is structurally valid");

    let result = app.authoring.create_post(author.id, form, None).await;
    assert!(matches!(result, Err(AuthoringError::UnknownGroup)));
    assert_eq!(app.store.post_count(), 0);
}

#[tokio::test]
async fn non_author_edit_is_a_soft_redirect_and_changes_nothing() {
    let app = TestApp::new();
    let author = app.store.seed_user("author");
    let intruder = app.store.seed_user("intruder");
    let post = app.store.seed_post(&author, None, "original text");

    let outcome = app
        .authoring
        .update_post(intruder.id, post.id, valid_form("defaced"), None)
        .await
        .expect("update resolved");

    assert_eq!(outcome, EditAccess::NotAuthor { post_id: post.id });
    assert_eq!(
        app.store.post_text(post.id).as_deref(),
        Some("original text")
    );
}

#[tokio::test]
async fn author_edit_updates_the_post() {
    let app = TestApp::new();
    let author = app.store.seed_user("author");
    let post = app.store.seed_post(&author, None, "original text");

    let outcome = app
        .authoring
        .update_post(author.id, post.id, valid_form("revised text"), None)
        .await
        .expect("update resolved");

    match outcome {
        EditAccess::Editable(updated) => assert_eq!(updated.text, "revised text"),
        EditAccess::NotAuthor { .. } => panic!("author was treated as non-author"),
    }
    assert_eq!(
        app.store.post_text(post.id).as_deref(),
        Some("revised text")
    );
}

#[tokio::test]
async fn editing_a_missing_post_is_not_found() {
    let app = TestApp::new();
    let author = app.store.seed_user("author");

    let result = app
        .authoring
        .update_post(author.id, Uuid::new_v4(), valid_form("anything"), None)
        .await;
    assert!(matches!(result, Err(AuthoringError::PostNotFound)));
}

#[tokio::test]
async fn comments_attach_to_the_requester_and_post() {
    let app = TestApp::new();
    let author = app.store.seed_user("author");
    let commenter = app.store.seed_user("reader");
    let post = app.store.seed_post(&author, None, "discuss");

    let form = CommentForm {
        text: "well said".to_string(),
    }
    .validate()
    .expect("valid comment");

    let comment = app
        .authoring
        .add_comment(commenter.id, post.id, form)
        .await
        .expect("comment created");

    assert_eq!(comment.post_id, post.id);
    assert_eq!(comment.author_id, commenter.id);
    assert_eq!(app.store.comment_count(), 1);
}

#[tokio::test]
async fn commenting_on_a_missing_post_is_not_found() {
    let app = TestApp::new();
    let commenter = app.store.seed_user("reader");

    let form = CommentForm {
        text: "into the void".to_string(),
    }
    .validate()
    .expect("valid comment");

    let result = app
        .authoring
        .add_comment(commenter.id, Uuid::new_v4(), form)
        .await;
    assert!(matches!(result, Err(AuthoringError::PostNotFound)));
    assert_eq!(app.store.comment_count(), 0);
}

#[tokio::test]
async fn only_the_author_may_delete() {
    let app = TestApp::new();
    let author = app.store.seed_user("author");
    let intruder = app.store.seed_user("intruder");
    let post = app.store.seed_post(&author, None, "short lived");

    let denied = app
        .authoring
        .delete_post(intruder.id, post.id)
        .await
        .expect("delete resolved");
    assert_eq!(denied, EditAccess::NotAuthor { post_id: post.id });
    assert_eq!(app.store.post_count(), 1);

    app.authoring
        .delete_post(author.id, post.id)
        .await
        .expect("delete resolved");
    assert_eq!(app.store.post_count(), 0);
}
