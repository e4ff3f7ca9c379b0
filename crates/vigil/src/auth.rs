//! Credentials and sessions
//!
//! The credential check is a trait so deployments (and tests) can inject
//! their own account source; the default is the panel's single admin
//! account. Sessions are an in-memory table keyed by random tokens: one
//! process, one table, no persistence across restarts.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use rand::distr::Alphanumeric;
use rand::Rng;
use tokio::sync::RwLock;

/// Length of the session token carried in the cookie.
const TOKEN_LEN: usize = 32;

/// A string that redacts its contents in Debug output.
///
/// Use for passwords and tokens so they cannot leak through logs.
#[derive(Clone)]
pub struct Secret(pub String);

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"***\"")
    }
}

impl From<&str> for Secret {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// An authenticated identity attached to a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub username: String,
    pub is_admin: bool,
}

/// Verifies a username/password pair and yields the identity it grants.
pub trait CredentialProvider: Send + Sync {
    fn authenticate(&self, username: &str, password: &str) -> Option<SessionUser>;
}

/// The default provider: exactly one admin account.
pub struct StaticCredentials {
    username: String,
    password: Secret,
}

impl StaticCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: Secret(password.into()),
        }
    }
}

impl CredentialProvider for StaticCredentials {
    fn authenticate(&self, username: &str, password: &str) -> Option<SessionUser> {
        if username == self.username && password == self.password.0 {
            Some(SessionUser {
                username: username.to_string(),
                is_admin: true,
            })
        } else {
            None
        }
    }
}

/// In-memory session table: token -> identity.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, SessionUser>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new session and return its token.
    pub async fn create(&self, user: SessionUser) -> String {
        let token: String = rand::rng()
            .sample_iter(Alphanumeric)
            .take(TOKEN_LEN)
            .map(char::from)
            .collect();
        self.sessions.write().await.insert(token.clone(), user);
        token
    }

    /// Look up the identity behind a token.
    pub async fn get(&self, token: &str) -> Option<SessionUser> {
        self.sessions.read().await.get(token).cloned()
    }

    /// Drop a session (logout). Unknown tokens are ignored.
    pub async fn remove(&self, token: &str) {
        self.sessions.write().await.remove(token);
    }
}

pub type SharedCredentials = Arc<dyn CredentialProvider>;
