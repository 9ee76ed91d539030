//! Account registration and cookie-session lifecycle.

mod support;

use std::sync::Arc;
use std::time::Duration;

use piazza::application::accounts::{AccountError, AccountService};
use piazza::application::forms::SignupForm;
use support::{MemoryStore, TestApp};

fn signup(username: &str) -> piazza::application::forms::ValidatedSignupForm {
    SignupForm {
        username: username.to_string(),
        display_name: String::new(),
        password: "correct horse".to_string(),
    }
    .validate()
    .expect("valid signup")
}

#[tokio::test]
async fn register_login_authenticate_round_trip() {
    let app = TestApp::new();

    let user = app
        .accounts
        .register(signup("casual_poster"))
        .await
        .expect("registered");
    assert_eq!(user.username, "casual_poster");

    let session = app
        .accounts
        .login("casual_poster", "correct horse")
        .await
        .expect("logged in");

    let resolved = app
        .accounts
        .authenticate(&session.token)
        .await
        .expect("authenticate")
        .expect("session resolves");
    assert_eq!(resolved.id, user.id);
}

#[tokio::test]
async fn wrong_password_and_unknown_user_are_rejected_alike() {
    let app = TestApp::new();
    app.accounts
        .register(signup("casual_poster"))
        .await
        .expect("registered");

    assert!(matches!(
        app.accounts.login("casual_poster", "wrong").await,
        Err(AccountError::InvalidCredentials)
    ));
    assert!(matches!(
        app.accounts.login("nobody", "whatever").await,
        Err(AccountError::InvalidCredentials)
    ));
}

#[tokio::test]
async fn duplicate_username_is_reported() {
    let app = TestApp::new();
    app.accounts
        .register(signup("casual_poster"))
        .await
        .expect("registered");

    let result = app.accounts.register(signup("casual_poster")).await;
    assert!(matches!(result, Err(AccountError::UsernameTaken)));
}

#[tokio::test]
async fn logout_invalidates_the_session() {
    let app = TestApp::new();
    app.accounts
        .register(signup("casual_poster"))
        .await
        .expect("registered");
    let session = app
        .accounts
        .login("casual_poster", "correct horse")
        .await
        .expect("logged in");

    app.accounts.logout(&session.token).await.expect("logout");

    let resolved = app
        .accounts
        .authenticate(&session.token)
        .await
        .expect("authenticate");
    assert!(resolved.is_none());

    // A second logout of the same token is a no-op.
    app.accounts.logout(&session.token).await.expect("logout");
}

#[tokio::test]
async fn expired_sessions_do_not_authenticate() {
    let store = MemoryStore::new();
    let accounts = AccountService::new(store.clone(), store.clone(), Duration::ZERO);
    let accounts = Arc::new(accounts);

    accounts
        .register(signup("casual_poster"))
        .await
        .expect("registered");
    let session = accounts
        .login("casual_poster", "correct horse")
        .await
        .expect("logged in");

    let resolved = accounts
        .authenticate(&session.token)
        .await
        .expect("authenticate");
    assert!(resolved.is_none());
}

#[tokio::test]
async fn unknown_tokens_resolve_to_nobody() {
    let app = TestApp::new();
    let resolved = app
        .accounts
        .authenticate("not-a-real-token")
        .await
        .expect("authenticate");
    assert!(resolved.is_none());
}
