//! Message dispatch over the current session
//!
//! Senders never wait for a bind: with no bound session the send fails at
//! once with [`GatewayError::DeliveryUnavailable`].

use std::sync::Arc;
use tracing::{debug, info, warn};

use smpp_link::{status_description, SubmitSm, ESME_ROK};

use crate::error::{GatewayError, Result};
use crate::session::SessionLifecycleManager;

/// Sends one-time-password SMS through the managed session
#[derive(Clone)]
pub struct SmsDispatcher {
    manager: Arc<SessionLifecycleManager>,
}

impl SmsDispatcher {
    pub fn new(manager: Arc<SessionLifecycleManager>) -> Self {
        Self { manager }
    }

    /// Submit `text` to `destination`, returning the gateway message id
    pub async fn send(&self, destination: &str, text: &str) -> Result<String> {
        let Some(session) = self.manager.current() else {
            debug!("No SMPP session, rejecting send");
            return Err(GatewayError::unavailable("no SMPP session"));
        };
        if !session.is_bound() {
            return Err(GatewayError::unavailable("SMPP session not bound"));
        }

        let source = &self.manager.credentials().source_addr;
        let message = SubmitSm::text(source, destination, text)?;

        let response = session.submit(message).await.map_err(|e| {
            if e.needs_reconnect() {
                GatewayError::unavailable(format!("SMPP session lost: {e}"))
            } else {
                GatewayError::from(e)
            }
        })?;

        if response.status != ESME_ROK {
            warn!(
                destination = %mask(destination),
                "submit_sm rejected: 0x{:08X} ({})",
                response.status,
                status_description(response.status)
            );
            return Err(GatewayError::SubmitRejected {
                status: response.status,
            });
        }

        info!(
            destination = %mask(destination),
            message_id = %response.message_id,
            "OTP message submitted"
        );
        Ok(response.message_id)
    }
}

/// Keep only the last four characters of a phone number for logs
fn mask(number: &str) -> String {
    let visible = number.len().saturating_sub(4);
    match number.get(visible..) {
        Some(tail) if visible > 0 => format!("{}{}", "*".repeat(visible), tail),
        _ => number.to_string(),
    }
}
