//! Authorization gate in front of cloud export.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::{pkce, AuthError, AuthProvider, AuthorizedSession};

/// Returned when an operation needs the user to log in first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthRedirect {
    /// Local route that starts the login flow.
    pub login_url: String,
}

/// Most login attempts kept in flight at once.
const MAX_PENDING_LOGINS: usize = 256;

/// Default time a user has to finish a login.
pub const DEFAULT_LOGIN_TIMEOUT: Duration = Duration::from_secs(600);

/// A login that was started but not yet completed.
struct PendingLogin {
    verifier: String,
    started: Instant,
    /// Start order, for evicting the oldest.
    seq: u64,
}

/// Tracks the current authorization and in-flight login attempts.
pub struct AuthGate {
    provider: Arc<dyn AuthProvider>,
    login_path: String,
    login_timeout: Duration,
    /// state -> PKCE verifier
    pending: RwLock<HashMap<String, PendingLogin>>,
    next_seq: AtomicU64,
    session: RwLock<Option<AuthorizedSession>>,
}

impl AuthGate {
    pub fn new(provider: Arc<dyn AuthProvider>, login_path: impl Into<String>) -> Self {
        Self {
            provider,
            login_path: login_path.into(),
            login_timeout: DEFAULT_LOGIN_TIMEOUT,
            pending: RwLock::new(HashMap::new()),
            next_seq: AtomicU64::new(0),
            session: RwLock::new(None),
        }
    }

    /// Abandon login attempts not completed within `timeout`.
    pub fn with_login_timeout(mut self, timeout: Duration) -> Self {
        self.login_timeout = timeout;
        self
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    /// True when an unexpired session is held.
    pub async fn is_authorized(&self) -> bool {
        self.session
            .read()
            .await
            .as_ref()
            .is_some_and(|s| !s.is_expired())
    }

    /// The current session, or where to send the user to get one.
    pub async fn require_authorization(&self) -> Result<AuthorizedSession, AuthRedirect> {
        match self.session.read().await.as_ref() {
            Some(session) if !session.is_expired() => Ok(session.clone()),
            _ => Err(AuthRedirect {
                login_url: self.login_path.clone(),
            }),
        }
    }

    /// Start a login attempt and return the provider's consent URL.
    pub async fn begin_login(&self) -> Result<String, AuthError> {
        let state = pkce::generate_state();
        let verifier = pkce::generate_code_verifier();
        let url = self.provider.authorization_url(&state, &verifier)?;

        let mut pending = self.pending.write().await;
        pending.retain(|_, login| login.started.elapsed() < self.login_timeout);
        if pending.len() >= MAX_PENDING_LOGINS {
            let oldest = pending
                .iter()
                .min_by_key(|(_, login)| login.seq)
                .map(|(state, _)| state.clone());
            if let Some(oldest) = oldest {
                debug!("Too many pending logins, dropping the oldest");
                pending.remove(&oldest);
            }
        }
        pending.insert(
            state,
            PendingLogin {
                verifier,
                started: Instant::now(),
                seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
            },
        );
        Ok(url)
    }

    /// Finish a login attempt from the provider callback.
    pub async fn complete_login(&self, code: &str, state: &str) -> Result<(), AuthError> {
        let verifier = self
            .pending
            .write()
            .await
            .remove(state)
            .filter(|login| login.started.elapsed() < self.login_timeout)
            .ok_or(AuthError::UnknownState)?
            .verifier;

        match self.provider.exchange_code(code, &verifier).await {
            Ok(session) => {
                *self.session.write().await = Some(session);
                info!("Storage authorization granted");
                Ok(())
            }
            Err(e) => {
                warn!("Authorization code exchange failed: {}", e);
                Err(e)
            }
        }
    }

    /// Forget the current session.
    pub async fn logout(&self) {
        *self.session.write().await = None;
        info!("Storage authorization cleared");
    }
}
