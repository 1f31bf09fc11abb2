//! SMPP session lifecycle manager
//!
//! Owns the single published session. Readers take a cheap snapshot through
//! [`SessionLifecycleManager::current`]; every bind runs under one async
//! mutex, so at most one handshake is ever in flight.
//!
//! Recovery is single-flight: a caller of `ensure_healthy` that queued behind
//! another attempt adopts that attempt's outcome instead of binding again.
//! The attempt generation is bumped only after an attempt finishes, so an
//! attempt cancelled mid-bind is not mistaken for a completed one.

use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, warn};

use errors::ServiceErrorTrait;
use smpp_link::{LinkError, SmppSession, Transport};

use crate::config::BindCredentials;
use crate::error::{GatewayError, Result};

/// Bound on the unbind sent during shutdown
const SHUTDOWN_UNBIND_TIMEOUT: Duration = Duration::from_secs(5);

/// Session state as seen by the manager
///
/// A bind in progress is not a state; it is the establish lock being held.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Bound,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Disconnected => write!(f, "DISCONNECTED"),
            SessionState::Bound => write!(f, "BOUND"),
        }
    }
}

/// Owner of the gateway's single SMPP session
pub struct SessionLifecycleManager {
    credentials: BindCredentials,
    transport: Arc<dyn Transport>,
    /// Published session; `None` means delivery is unavailable
    current: RwLock<Option<Arc<dyn SmppSession>>>,
    /// Serializes every bind
    establish_lock: AsyncMutex<()>,
    /// Count of completed attempts, bumped after `last_outcome` is stored
    generation: AtomicU64,
    last_outcome: Mutex<Option<Result<Arc<dyn SmppSession>>>>,
}

impl SessionLifecycleManager {
    pub fn new(credentials: BindCredentials, transport: Arc<dyn Transport>) -> Self {
        Self {
            credentials,
            transport,
            current: RwLock::new(None),
            establish_lock: AsyncMutex::new(()),
            generation: AtomicU64::new(0),
            last_outcome: Mutex::new(None),
        }
    }

    pub fn credentials(&self) -> &BindCredentials {
        &self.credentials
    }

    /// The published session, if any; no I/O, no locking beyond a read guard
    pub fn current(&self) -> Option<Arc<dyn SmppSession>> {
        self.current.read().clone()
    }

    pub fn state(&self) -> SessionState {
        if self.is_healthy() {
            SessionState::Bound
        } else {
            SessionState::Disconnected
        }
    }

    fn is_healthy(&self) -> bool {
        self.current.read().as_ref().is_some_and(|s| s.is_bound())
    }

    /// Open a connection, bind, and publish the new session
    ///
    /// Waits for any bind already in flight. On failure the published
    /// session is left exactly as it was.
    pub async fn establish(&self) -> Result<Arc<dyn SmppSession>> {
        let _guard = self.establish_lock.lock().await;
        self.establish_locked().await
    }

    /// Recover the session if it is missing or no longer bound
    ///
    /// Makes no transport call while the current session is bound. Failures
    /// are logged, never returned; the session stays absent until the next
    /// call.
    pub async fn ensure_healthy(&self) -> SessionState {
        if self.is_healthy() {
            debug!("SMPP session healthy");
            return SessionState::Bound;
        }

        let observed = self.generation.load(Ordering::Acquire);
        let _guard = self.establish_lock.lock().await;

        if self.generation.load(Ordering::Acquire) != observed {
            // Someone finished an attempt while we queued; share its result
            let outcome = self.last_outcome.lock().clone();
            if let Some(Err(e)) = outcome {
                debug!("Joined recovery attempt that failed: {}", e);
            }
            return self.state();
        }

        if self.is_healthy() {
            return SessionState::Bound;
        }

        self.discard_stale();

        info!(endpoint = %self.credentials.endpoint(), "Recovering SMPP session");
        match self.establish_locked().await {
            Ok(_) => SessionState::Bound,
            Err(e) => {
                warn!(
                    endpoint = %self.credentials.endpoint(),
                    code = e.error_code(),
                    "SMPP session recovery failed, will retry on next check: {}",
                    e
                );
                SessionState::Disconnected
            },
        }
    }

    /// Withdraw the session and unbind it (best effort)
    pub async fn shutdown(&self) {
        let session = self.current.write().take();
        let Some(session) = session else {
            debug!("No SMPP session to unbind");
            return;
        };
        if !session.is_bound() {
            return;
        }

        match tokio::time::timeout(SHUTDOWN_UNBIND_TIMEOUT, session.unbind()).await {
            Ok(Ok(())) => info!(peer = session.peer(), "SMPP session unbound"),
            Ok(Err(e)) => warn!(peer = session.peer(), "Unbind failed: {}", e),
            Err(_) => warn!(peer = session.peer(), "Unbind timed out"),
        }
    }

    /// Caller holds `establish_lock`
    async fn establish_locked(&self) -> Result<Arc<dyn SmppSession>> {
        let outcome = self.bind_new_session().await;

        if let Ok(session) = &outcome {
            self.publish(Arc::clone(session));
        }
        *self.last_outcome.lock() = Some(outcome.clone());
        self.generation.fetch_add(1, Ordering::Release);

        outcome
    }

    async fn bind_new_session(&self) -> Result<Arc<dyn SmppSession>> {
        let creds = &self.credentials;
        debug!(
            endpoint = %creds.endpoint(),
            system_id = %creds.system_id,
            system_type = %creds.system_type,
            "Binding SMPP transmitter"
        );

        let session = self
            .transport
            .open(&creds.host, creds.port)
            .await
            .map_err(link_failure)?;

        let response = session
            .bind_transmitter(creds.bind_request())
            .await
            .map_err(link_failure)?;

        if !response.is_ok() {
            // Dropping the unbound session closes its connection
            return Err(GatewayError::Bind {
                status: response.status,
            });
        }

        info!(
            endpoint = %creds.endpoint(),
            system_id = %creds.system_id,
            smsc = %response.system_id,
            "SMPP session bound"
        );
        Ok(session)
    }

    fn publish(&self, session: Arc<dyn SmppSession>) {
        let previous = self.current.write().replace(session);
        if previous.is_some() {
            debug!("Replaced previous SMPP session");
        }
    }

    /// Clear a published session that reports itself unbound
    fn discard_stale(&self) {
        let mut current = self.current.write();
        if current.as_ref().is_some_and(|s| !s.is_bound()) {
            if let Some(stale) = current.take() {
                warn!(peer = stale.peer(), "Discarding stale SMPP session");
            }
        }
    }
}

/// Link failures during open/bind are transport errors unless the peer spoke
/// garbage
fn link_failure(err: LinkError) -> GatewayError {
    match err {
        LinkError::Protocol(_) | LinkError::InvalidData(_) => GatewayError::from(err),
        other => GatewayError::Transport(other.to_string()),
    }
}
