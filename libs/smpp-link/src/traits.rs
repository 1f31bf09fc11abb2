//! Core Link Traits
//!
//! [`Transport`] opens connections, [`SmppSession`] is the handle the
//! session manager binds, health-checks and hands out to senders.

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Result;
use crate::pdu::{BindTransmitter, SubmitSm};

/// Outcome of a bind handshake
///
/// A non-zero `status` is a gateway rejection, not a link failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindResponse {
    pub status: u32,
    pub system_id: String,
}

impl BindResponse {
    #[inline]
    pub fn is_ok(&self) -> bool {
        self.status == crate::constants::ESME_ROK
    }
}

/// Outcome of a submit_sm
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitResponse {
    pub status: u32,
    pub message_id: String,
}

/// Opens raw connections to a message center
#[async_trait]
pub trait Transport: Send + Sync {
    /// Connect to `host:port`; the returned session is not yet bound
    async fn open(&self, host: &str, port: u16) -> Result<Arc<dyn SmppSession>>;
}

/// A connection to a message center
///
/// All methods take `&self` so one bound session can be shared by every
/// sender.
#[async_trait]
pub trait SmppSession: Send + Sync {
    /// Perform the bind handshake
    async fn bind_transmitter(&self, request: BindTransmitter) -> Result<BindResponse>;

    /// Whether the session is still bound; a local check, no I/O
    fn is_bound(&self) -> bool;

    /// Submit a short message
    async fn submit(&self, message: SubmitSm) -> Result<SubmitResponse>;

    /// Round-trip an enquire_link
    async fn enquire_link(&self) -> Result<()>;

    /// Unbind and close the connection
    async fn unbind(&self) -> Result<()>;

    /// Remote endpoint, for logs
    fn peer(&self) -> &str;
}
