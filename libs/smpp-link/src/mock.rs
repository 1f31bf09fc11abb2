//! Scripted in-memory transport
//!
//! Each `open` pops the next [`OpenBehavior`] (falling back to a default) so
//! tests can describe sequences like "fail twice, then bind".

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::constants::ESME_ROK;
use crate::error::{LinkError, Result};
use crate::pdu::{BindTransmitter, SubmitSm};
use crate::traits::{BindResponse, SmppSession, SubmitResponse, Transport};

/// What the next `open` does
#[derive(Debug, Clone)]
pub enum OpenBehavior {
    /// `open` fails with this error
    Fail(LinkError),
    /// `open` succeeds; the bind answers with this status
    Bind(u32),
    /// `open` succeeds; the bind never completes
    HangOnBind,
}

/// Transport double that records every open
pub struct ScriptedTransport {
    script: Mutex<VecDeque<OpenBehavior>>,
    fallback: OpenBehavior,
    open_delay: Duration,
    opens: AtomicUsize,
    sessions: Mutex<Vec<Arc<MockSession>>>,
    endpoints: Mutex<Vec<(String, u16)>>,
}

impl ScriptedTransport {
    /// Every open binds with status 0
    pub fn new() -> Self {
        Self::with_script(Vec::new())
    }

    /// Play `script` in order, then bind with status 0
    pub fn with_script(script: Vec<OpenBehavior>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback: OpenBehavior::Bind(ESME_ROK),
            open_delay: Duration::ZERO,
            opens: AtomicUsize::new(0),
            sessions: Mutex::new(Vec::new()),
            endpoints: Mutex::new(Vec::new()),
        }
    }

    /// Behaviour once the script is exhausted
    pub fn fallback(mut self, behavior: OpenBehavior) -> Self {
        self.fallback = behavior;
        self
    }

    /// Sleep this long inside every `open`
    pub fn open_delay(mut self, delay: Duration) -> Self {
        self.open_delay = delay;
        self
    }

    pub fn push(&self, behavior: OpenBehavior) {
        self.script.lock().push_back(behavior);
    }

    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    /// Sessions handed out so far, oldest first
    pub fn sessions(&self) -> Vec<Arc<MockSession>> {
        self.sessions.lock().clone()
    }

    pub fn last_session(&self) -> Option<Arc<MockSession>> {
        self.sessions.lock().last().cloned()
    }

    /// `(host, port)` of every open
    pub fn endpoints(&self) -> Vec<(String, u16)> {
        self.endpoints.lock().clone()
    }
}

impl Default for ScriptedTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn open(&self, host: &str, port: u16) -> Result<Arc<dyn SmppSession>> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        self.endpoints.lock().push((host.to_string(), port));
        if !self.open_delay.is_zero() {
            tokio::time::sleep(self.open_delay).await;
        }

        let behavior = self
            .script
            .lock()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());

        let session = match behavior {
            OpenBehavior::Fail(e) => return Err(e),
            OpenBehavior::Bind(status) => MockSession::new(format!("{host}:{port}"), status, false),
            OpenBehavior::HangOnBind => MockSession::new(format!("{host}:{port}"), ESME_ROK, true),
        };
        let session = Arc::new(session);
        self.sessions.lock().push(Arc::clone(&session));
        Ok(session as Arc<dyn SmppSession>)
    }
}

/// Session double
pub struct MockSession {
    peer: String,
    bind_status: u32,
    hang_on_bind: bool,
    bound: AtomicBool,
    submit_status: AtomicU32,
    binds: Mutex<Vec<BindTransmitter>>,
    submits: Mutex<Vec<SubmitSm>>,
    unbinds: AtomicUsize,
}

impl MockSession {
    pub fn new(peer: impl Into<String>, bind_status: u32, hang_on_bind: bool) -> Self {
        Self {
            peer: peer.into(),
            bind_status,
            hang_on_bind,
            bound: AtomicBool::new(false),
            submit_status: AtomicU32::new(ESME_ROK),
            binds: Mutex::new(Vec::new()),
            submits: Mutex::new(Vec::new()),
            unbinds: AtomicUsize::new(0),
        }
    }

    /// Simulate the link dropping underneath a bound session
    pub fn drop_link(&self) {
        self.bound.store(false, Ordering::SeqCst);
    }

    /// Status returned by later submits
    pub fn set_submit_status(&self, status: u32) {
        self.submit_status.store(status, Ordering::SeqCst);
    }

    pub fn binds(&self) -> Vec<BindTransmitter> {
        self.binds.lock().clone()
    }

    pub fn submits(&self) -> Vec<SubmitSm> {
        self.submits.lock().clone()
    }

    pub fn unbind_count(&self) -> usize {
        self.unbinds.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SmppSession for MockSession {
    async fn bind_transmitter(&self, request: BindTransmitter) -> Result<BindResponse> {
        self.binds.lock().push(request);
        if self.hang_on_bind {
            std::future::pending::<()>().await;
        }
        if self.bind_status == ESME_ROK {
            self.bound.store(true, Ordering::SeqCst);
        }
        Ok(BindResponse {
            status: self.bind_status,
            system_id: "MOCKSMSC".to_string(),
        })
    }

    fn is_bound(&self) -> bool {
        self.bound.load(Ordering::SeqCst)
    }

    async fn submit(&self, message: SubmitSm) -> Result<SubmitResponse> {
        if !self.is_bound() {
            return Err(LinkError::NotBound);
        }
        let mut submits = self.submits.lock();
        submits.push(message);
        Ok(SubmitResponse {
            status: self.submit_status.load(Ordering::SeqCst),
            message_id: format!("msg-{}", submits.len()),
        })
    }

    async fn enquire_link(&self) -> Result<()> {
        if self.is_bound() {
            Ok(())
        } else {
            Err(LinkError::Closed)
        }
    }

    async fn unbind(&self) -> Result<()> {
        self.unbinds.fetch_add(1, Ordering::SeqCst);
        self.bound.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn peer(&self) -> &str {
        &self.peer
    }
}
