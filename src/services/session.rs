use std::collections::HashMap;

use rand::RngCore;
use tokio::sync::RwLock;

/// Cookie carrying the admin session token. Deliberately session-scoped:
/// no Max-Age, the cookie dies with the browser.
pub const SESSION_COOKIE: &str = "admin_session";

/// In-memory admin sessions: token → raw store password.
///
/// The store is the authority on the password; it is validated once at
/// login and then simply forwarded on every mutating call. Sessions are
/// process-scoped and vanish on restart.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, String>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a session holding `password` and returns its token.
    pub async fn open(&self, password: String) -> String {
        let mut raw = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut raw);
        let token = hex::encode(raw);
        self.sessions.write().await.insert(token.clone(), password);
        token
    }

    pub async fn password_for(&self, token: &str) -> Option<String> {
        self.sessions.read().await.get(token).cloned()
    }

    /// Ends a session. Used for logout and for forced logout when the
    /// store answers Unauthorized.
    pub async fn close(&self, token: &str) {
        self.sessions.write().await.remove(token);
    }
}
