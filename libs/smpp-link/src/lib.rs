//! SMPP Link Library
//!
//! Link layer for the OTP gateway's outbound SMPP v3.4 session.
//!
//! # Architecture
//!
//! This library provides:
//! - **PDU model**: header plus typed bodies for bind_transmitter, submit_sm,
//!   enquire_link, unbind and generic_nack
//! - **Codec**: length-prefixed framing for `tokio_util::codec::Framed`
//! - **Core Traits**: `Transport` and `SmppSession`, the seam the session
//!   manager is written against
//! - **TCP implementation**: `TcpTransport` / `TcpSession`
//!
//! # Features
//!
//! - `test-utils` - scripted in-memory transport (`mock` module)

pub mod codec;
pub mod constants;
pub mod error;
pub mod pdu;
pub mod tcp;
pub mod traits;

#[cfg(feature = "test-utils")]
pub mod mock;

// Re-export core types
pub use codec::PduCodec;
pub use constants::{status_description, ESME_ROK, INTERFACE_VERSION_34};
pub use error::{LinkError, Result};
pub use pdu::{BindTransmitter, Pdu, PduBody, SubmitSm};
pub use tcp::{TcpSession, TcpTransport, TransportOptions};
pub use traits::{BindResponse, SmppSession, SubmitResponse, Transport};
