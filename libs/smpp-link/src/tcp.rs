//! TCP transport and session
//!
//! One request is in flight per session: the framed stream sits behind an
//! async mutex and each request reads until the matching response arrives.
//! Gateway-initiated `enquire_link` and `unbind` seen while waiting are
//! answered inline.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;
use tokio::time::{timeout, timeout_at, Instant};
use tokio_util::codec::Framed;
use tracing::{debug, error, info, trace, warn};

use crate::codec::PduCodec;
use crate::constants::*;
use crate::error::{LinkError, Result};
use crate::pdu::{BindTransmitter, Pdu, PduBody, SubmitSm};
use crate::traits::{BindResponse, SmppSession, SubmitResponse, Transport};

/// Tunables for [`TcpTransport`]
#[derive(Debug, Clone)]
pub struct TransportOptions {
    /// Bound on `TcpStream::connect`
    pub connect_timeout: Duration,
    /// Bound on waiting for each response PDU
    pub response_timeout: Duration,
    /// Send enquire_link at this interval once bound; `None` disables
    pub enquire_link_interval: Option<Duration>,
    /// Largest inbound PDU accepted
    pub max_pdu_len: usize,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            response_timeout: Duration::from_secs(10),
            enquire_link_interval: None,
            max_pdu_len: DEFAULT_MAX_PDU_LEN,
        }
    }
}

/// Plain TCP transport
#[derive(Debug, Clone, Default)]
pub struct TcpTransport {
    options: TransportOptions,
}

impl TcpTransport {
    pub fn new(options: TransportOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &TransportOptions {
        &self.options
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn open(&self, host: &str, port: u16) -> Result<Arc<dyn SmppSession>> {
        let addr = format!("{host}:{port}");
        debug!("TCP connecting: {}", addr);

        let stream = match timeout(self.options.connect_timeout, TcpStream::connect(&addr)).await
        {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                error!("TCP err: {} - {}", addr, e);
                return Err(LinkError::Connection(format!(
                    "Failed to connect to {addr}: {e}"
                )));
            },
            Err(_) => {
                warn!("TCP timeout: {}", addr);
                return Err(LinkError::Timeout(format!("Connection to {addr} timed out")));
            },
        };

        if let Err(e) = stream.set_nodelay(true) {
            debug!("TCP_NODELAY: {}", e);
        }
        info!("TCP connected: {}", addr);

        let framed = Framed::new(stream, PduCodec::new(self.options.max_pdu_len));
        let session: Arc<dyn SmppSession> = Arc::new(TcpSession::new(addr, framed, &self.options));
        Ok(session)
    }
}

struct SessionInner {
    peer: String,
    framed: AsyncMutex<Framed<TcpStream, PduCodec>>,
    bound: AtomicBool,
    closed: AtomicBool,
    sequence: AtomicU32,
    response_timeout: Duration,
}

impl SessionInner {
    /// Sequence numbers run 1..=0x7FFFFFFF and wrap
    fn next_sequence(&self) -> u32 {
        let prev = self
            .sequence
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |seq| {
                Some(if seq >= 0x7FFF_FFFF { 1 } else { seq + 1 })
            })
            .unwrap_or(0);
        if prev >= 0x7FFF_FFFF {
            1
        } else {
            prev + 1
        }
    }

    fn mark_closed(&self) {
        let was_bound = self.bound.swap(false, Ordering::AcqRel);
        self.closed.store(true, Ordering::Release);
        if was_bound {
            warn!(peer = %self.peer, "SMPP session no longer bound");
        }
    }

    /// Send a request and wait for its response
    ///
    /// Any link failure, EOF or timeout closes the session.
    async fn request(&self, body: PduBody) -> Result<Pdu> {
        if self.closed.load(Ordering::Acquire) {
            return Err(LinkError::Closed);
        }

        let command_id = body.command_id();
        let expected = command_id | RESPONSE_MASK;
        let seq = self.next_sequence();

        let mut framed = self.framed.lock().await;
        if let Err(e) = framed.send(Pdu::new(seq, body)).await {
            // Encoding problems leave the stream intact
            if !matches!(e, LinkError::InvalidData(_)) {
                self.mark_closed();
            }
            return Err(e);
        }
        trace!("Sent {} seq={}", command_name(command_id), seq);

        let deadline = Instant::now() + self.response_timeout;
        loop {
            let pdu = match timeout_at(deadline, framed.next()).await {
                Err(_) => {
                    self.mark_closed();
                    return Err(LinkError::Timeout(format!(
                        "No {} from {} within {:?}",
                        command_name(expected),
                        self.peer,
                        self.response_timeout
                    )));
                },
                Ok(None) => {
                    self.mark_closed();
                    return Err(LinkError::Closed);
                },
                Ok(Some(Err(e))) => {
                    self.mark_closed();
                    return Err(e);
                },
                Ok(Some(Ok(pdu))) => pdu,
            };

            if pdu.sequence_number == seq
                && (pdu.command_id() == expected || pdu.command_id() == GENERIC_NACK)
            {
                return Ok(pdu);
            }

            self.handle_unsolicited(&mut framed, pdu).await?;
        }
    }

    async fn handle_unsolicited(
        &self,
        framed: &mut Framed<TcpStream, PduCodec>,
        pdu: Pdu,
    ) -> Result<()> {
        let seq = pdu.sequence_number;
        let reply = match pdu.body {
            PduBody::EnquireLink => Some(Pdu::new(seq, PduBody::EnquireLinkResp)),
            PduBody::Unbind => {
                info!(peer = %self.peer, "Gateway requested unbind");
                let result = framed.send(Pdu::new(seq, PduBody::UnbindResp)).await;
                self.mark_closed();
                result?;
                return Err(LinkError::Closed);
            },
            ref body if !pdu.is_response() => {
                debug!(
                    "Rejecting unexpected {} seq={}",
                    command_name(body.command_id()),
                    seq
                );
                Some(Pdu::response(seq, ESME_RINVCMDID, PduBody::GenericNack))
            },
            ref body => {
                debug!(
                    "Dropping stray {} seq={}",
                    command_name(body.command_id()),
                    seq
                );
                None
            },
        };

        if let Some(reply) = reply {
            if let Err(e) = framed.send(reply).await {
                self.mark_closed();
                return Err(e);
            }
        }
        Ok(())
    }
}

/// A TCP SMPP session
pub struct TcpSession {
    inner: Arc<SessionInner>,
    enquire_link_interval: Option<Duration>,
    keepalive: Mutex<Option<JoinHandle<()>>>,
}

impl TcpSession {
    fn new(
        peer: String,
        framed: Framed<TcpStream, PduCodec>,
        options: &TransportOptions,
    ) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                peer,
                framed: AsyncMutex::new(framed),
                bound: AtomicBool::new(false),
                closed: AtomicBool::new(false),
                sequence: AtomicU32::new(0),
                response_timeout: options.response_timeout,
            }),
            enquire_link_interval: options.enquire_link_interval.filter(|d| !d.is_zero()),
            keepalive: Mutex::new(None),
        }
    }

    fn start_keepalive(&self, interval: Duration) {
        let weak: Weak<SessionInner> = Arc::downgrade(&self.inner);
        let handle = tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                if !inner.bound.load(Ordering::Acquire) {
                    break;
                }
                match inner.request(PduBody::EnquireLink).await {
                    Ok(_) => trace!(peer = %inner.peer, "enquire_link ok"),
                    Err(e) => {
                        warn!(peer = %inner.peer, "enquire_link failed: {}", e);
                        break;
                    },
                }
            }
        });
        if let Some(old) = self.keepalive.lock().replace(handle) {
            old.abort();
        }
    }
}

impl Drop for TcpSession {
    fn drop(&mut self) {
        if let Some(handle) = self.keepalive.lock().take() {
            handle.abort();
        }
    }
}

#[async_trait]
impl SmppSession for TcpSession {
    async fn bind_transmitter(&self, request: BindTransmitter) -> Result<BindResponse> {
        if self.inner.bound.load(Ordering::Acquire) {
            return Ok(BindResponse {
                status: ESME_RALYBND,
                system_id: String::new(),
            });
        }

        let system_id = request.system_id.clone();
        let resp = self
            .inner
            .request(PduBody::BindTransmitter(request))
            .await?;

        let gateway_id = match resp.body {
            PduBody::BindTransmitterResp { system_id } => system_id,
            _ => String::new(),
        };

        if resp.command_status == ESME_ROK {
            self.inner.bound.store(true, Ordering::Release);
            info!(
                peer = %self.inner.peer,
                system_id = %system_id,
                smsc = %gateway_id,
                "bind_transmitter accepted"
            );
            if let Some(interval) = self.enquire_link_interval {
                self.start_keepalive(interval);
            }
        } else {
            warn!(
                peer = %self.inner.peer,
                system_id = %system_id,
                "bind_transmitter rejected: 0x{:08X} ({})",
                resp.command_status,
                status_description(resp.command_status)
            );
        }

        Ok(BindResponse {
            status: resp.command_status,
            system_id: gateway_id,
        })
    }

    fn is_bound(&self) -> bool {
        self.inner.bound.load(Ordering::Acquire)
    }

    async fn submit(&self, message: SubmitSm) -> Result<SubmitResponse> {
        if !self.is_bound() {
            return Err(LinkError::NotBound);
        }

        let resp = self
            .inner
            .request(PduBody::SubmitSm(Box::new(message)))
            .await?;

        let message_id = match resp.body {
            PduBody::SubmitSmResp { message_id } => message_id,
            _ => String::new(),
        };
        Ok(SubmitResponse {
            status: resp.command_status,
            message_id,
        })
    }

    async fn enquire_link(&self) -> Result<()> {
        let resp = self.inner.request(PduBody::EnquireLink).await?;
        if resp.command_status != ESME_ROK {
            return Err(LinkError::protocol(format!(
                "enquire_link answered with 0x{:08X}",
                resp.command_status
            )));
        }
        Ok(())
    }

    async fn unbind(&self) -> Result<()> {
        if self.inner.closed.load(Ordering::Acquire) {
            return Ok(());
        }
        if let Some(handle) = self.keepalive.lock().take() {
            handle.abort();
        }

        let result = self.inner.request(PduBody::Unbind).await.map(|_| ());
        self.inner.bound.store(false, Ordering::Release);
        self.inner.closed.store(true, Ordering::Release);

        let mut framed = self.inner.framed.lock().await;
        if let Err(e) = SinkExt::<Pdu>::close(&mut *framed).await {
            debug!("Close after unbind: {}", e);
        }
        info!(peer = %self.inner.peer, "SMPP session unbound");
        result
    }

    fn peer(&self) -> &str {
        &self.inner.peer
    }
}
