//! Length-prefixed SMPP framing for `tokio_util::codec::Framed`

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::constants::{DEFAULT_MAX_PDU_LEN, HEADER_LEN};
use crate::error::LinkError;
use crate::pdu::Pdu;

/// SMPP PDU codec
#[derive(Debug, Clone)]
pub struct PduCodec {
    max_pdu_len: usize,
}

impl PduCodec {
    pub fn new(max_pdu_len: usize) -> Self {
        Self {
            max_pdu_len: max_pdu_len.max(HEADER_LEN),
        }
    }
}

impl Default for PduCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PDU_LEN)
    }
}

impl Decoder for PduCodec {
    type Item = Pdu;
    type Error = LinkError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < 4 {
            return Ok(None);
        }

        let command_length = u32::from_be_bytes([src[0], src[1], src[2], src[3]]) as usize;
        if command_length < HEADER_LEN {
            return Err(LinkError::protocol(format!(
                "command_length {} shorter than header",
                command_length
            )));
        }
        if command_length > self.max_pdu_len {
            return Err(LinkError::protocol(format!(
                "command_length {} exceeds limit {}",
                command_length, self.max_pdu_len
            )));
        }

        if src.len() < command_length {
            src.reserve(command_length - src.len());
            return Ok(None);
        }

        let frame = src.split_to(command_length).freeze();
        Pdu::decode(frame).map(Some)
    }
}

impl Encoder<Pdu> for PduCodec {
    type Error = LinkError;

    fn encode(&mut self, item: Pdu, dst: &mut BytesMut) -> Result<(), Self::Error> {
        item.encode(dst)
    }
}
