//! Accounts and cookie sessions.
//!
//! Passwords are stored as salted SHA-256 digests and verified in constant
//! time. Logins mint a random bearer token whose digest is persisted with a
//! TTL; the raw token only ever exists in the response cookie.

use std::sync::Arc;
use std::time::Duration;

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{debug, info};
use uuid::Uuid;

use crate::application::forms::ValidatedSignupForm;
use crate::application::repos::{
    CreateSessionParams, CreateUserParams, RepoError, SessionsRepo, UsersRepo,
};
use crate::domain::entities::UserRecord;

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("username is already taken")]
    UsernameTaken,
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// A freshly minted session. The token is shown once; only its digest is
/// stored.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub expires_at: OffsetDateTime,
    pub user: UserRecord,
}

#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UsersRepo>,
    sessions: Arc<dyn SessionsRepo>,
    session_ttl: Duration,
}

impl AccountService {
    pub fn new(
        users: Arc<dyn UsersRepo>,
        sessions: Arc<dyn SessionsRepo>,
        session_ttl: Duration,
    ) -> Self {
        Self {
            users,
            sessions,
            session_ttl,
        }
    }

    pub async fn register(&self, form: ValidatedSignupForm) -> Result<UserRecord, AccountError> {
        let salt = generate_salt();
        let digest = hash_password(&form.password, &salt);

        let created = self
            .users
            .create_user(CreateUserParams {
                username: form.username,
                display_name: form.display_name,
                password_digest: digest,
                password_salt: salt,
            })
            .await;

        match created {
            Ok(user) => {
                info!(
                    target = "piazza::accounts",
                    username = %user.username,
                    "account registered"
                );
                Ok(user)
            }
            Err(RepoError::Duplicate { .. }) => Err(AccountError::UsernameTaken),
            Err(err) => Err(err.into()),
        }
    }

    /// Verify credentials and mint a session token.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<IssuedSession, AccountError> {
        let Some((user, credentials)) = self.users.find_credentials(username).await? else {
            // Burn a hash anyway so unknown usernames take as long as
            // known ones.
            let _ = hash_password(password, "missing");
            return Err(AccountError::InvalidCredentials);
        };

        let candidate = hash_password(password, &credentials.password_salt);
        if !digest_matches(&candidate, &credentials.password_digest) {
            return Err(AccountError::InvalidCredentials);
        }

        let now = OffsetDateTime::now_utc();
        let _ = self.sessions.delete_expired(now).await;

        let token = generate_token();
        let expires_at = now + self.session_ttl;
        self.sessions
            .create_session(CreateSessionParams {
                user_id: user.id,
                token_digest: digest_hex(&token),
                expires_at,
            })
            .await?;

        debug!(
            target = "piazza::accounts",
            username = %user.username,
            "session issued"
        );

        Ok(IssuedSession {
            token,
            expires_at,
            user,
        })
    }

    /// Resolve a bearer token to its user; expired or unknown tokens come
    /// back as `None`.
    pub async fn authenticate(&self, token: &str) -> Result<Option<UserRecord>, AccountError> {
        let Some(session) = self
            .sessions
            .find_by_token_digest(&digest_hex(token))
            .await?
        else {
            return Ok(None);
        };

        if session.is_expired(OffsetDateTime::now_utc()) {
            return Ok(None);
        }

        self.users
            .find_by_id(session.user_id)
            .await
            .map_err(AccountError::from)
    }

    /// Drop the session behind a token; unknown tokens are a no-op.
    pub async fn logout(&self, token: &str) -> Result<(), AccountError> {
        self.sessions
            .delete_by_token_digest(&digest_hex(token))
            .await?;
        Ok(())
    }

    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }
}

fn generate_salt() -> String {
    Uuid::new_v4().simple().to_string()
}

fn generate_token() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

fn hash_password(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

fn digest_hex(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

fn digest_matches(candidate: &str, stored: &str) -> bool {
    candidate.as_bytes().ct_eq(stored.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_depends_on_salt() {
        let a = hash_password("hunter22", "salt-a");
        let b = hash_password("hunter22", "salt-b");
        assert_ne!(a, b);
        assert_eq!(a, hash_password("hunter22", "salt-a"));
    }

    #[test]
    fn digest_comparison_detects_mismatch() {
        let stored = hash_password("correct", "salt");
        assert!(digest_matches(&hash_password("correct", "salt"), &stored));
        assert!(!digest_matches(&hash_password("wrong", "salt"), &stored));
    }

    #[test]
    fn tokens_are_unique_and_opaque() {
        let one = generate_token();
        let two = generate_token();
        assert_ne!(one, two);
        assert_eq!(one.len(), 64);
        assert_ne!(digest_hex(&one), one);
    }
}
