//! SMPP PDU model
//!
//! A [`Pdu`] is the header fields plus a typed [`PduBody`]. `command_length`
//! is computed on encode and validated by the codec on decode.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tracing::trace;

use crate::constants::*;
use crate::error::{LinkError, Result};

/// bind_transmitter request body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindTransmitter {
    pub system_id: String,
    pub password: String,
    pub system_type: String,
    pub interface_version: u8,
    pub addr_ton: u8,
    pub addr_npi: u8,
    pub address_range: String,
}

impl BindTransmitter {
    /// Bind request for interface version 3.4 with unknown TON/NPI
    pub fn new(
        system_id: impl Into<String>,
        password: impl Into<String>,
        system_type: impl Into<String>,
        address_range: impl Into<String>,
    ) -> Self {
        Self {
            system_id: system_id.into(),
            password: password.into(),
            system_type: system_type.into(),
            interface_version: INTERFACE_VERSION_34,
            addr_ton: TON_UNKNOWN,
            addr_npi: NPI_UNKNOWN,
            address_range: address_range.into(),
        }
    }
}

/// submit_sm request body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitSm {
    pub service_type: String,
    pub source_addr_ton: u8,
    pub source_addr_npi: u8,
    pub source_addr: String,
    pub dest_addr_ton: u8,
    pub dest_addr_npi: u8,
    pub destination_addr: String,
    pub esm_class: u8,
    pub protocol_id: u8,
    pub priority_flag: u8,
    pub schedule_delivery_time: String,
    pub validity_period: String,
    pub registered_delivery: u8,
    pub replace_if_present_flag: u8,
    pub data_coding: u8,
    pub sm_default_msg_id: u8,
    pub short_message: Bytes,
}

impl SubmitSm {
    /// Build a single-part text message
    ///
    /// ASCII text goes out with the SMSC default alphabet, anything else as
    /// UCS-2. Numeric source addresses use international/ISDN, others are
    /// sent as alphanumeric sender ids.
    pub fn text(source_addr: &str, destination_addr: &str, text: &str) -> Result<Self> {
        let (data_coding, short_message) = if text.is_ascii() {
            (DATA_CODING_DEFAULT, Bytes::copy_from_slice(text.as_bytes()))
        } else {
            let mut buf = BytesMut::with_capacity(text.len() * 2);
            for unit in text.encode_utf16() {
                buf.put_u16(unit);
            }
            (DATA_CODING_UCS2, buf.freeze())
        };

        if short_message.len() > MAX_SHORT_MESSAGE_LEN {
            return Err(LinkError::invalid_data(format!(
                "short_message too long: {} octets (max {})",
                short_message.len(),
                MAX_SHORT_MESSAGE_LEN
            )));
        }

        let (source_addr_ton, source_addr_npi, source_addr) = classify_address(source_addr);
        let (dest_addr_ton, dest_addr_npi, destination_addr) = classify_address(destination_addr);

        Ok(Self {
            service_type: String::new(),
            source_addr_ton,
            source_addr_npi,
            source_addr,
            dest_addr_ton,
            dest_addr_npi,
            destination_addr,
            esm_class: 0,
            protocol_id: 0,
            priority_flag: 0,
            schedule_delivery_time: String::new(),
            validity_period: String::new(),
            registered_delivery: 0,
            replace_if_present_flag: 0,
            data_coding,
            sm_default_msg_id: 0,
            short_message,
        })
    }
}

fn classify_address(addr: &str) -> (u8, u8, String) {
    let digits = addr.strip_prefix('+').unwrap_or(addr);
    if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        (TON_INTERNATIONAL, NPI_ISDN, digits.to_string())
    } else {
        (TON_ALPHANUMERIC, NPI_UNKNOWN, addr.to_string())
    }
}

/// Typed PDU body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PduBody {
    BindTransmitter(BindTransmitter),
    BindTransmitterResp { system_id: String },
    SubmitSm(Box<SubmitSm>),
    SubmitSmResp { message_id: String },
    EnquireLink,
    EnquireLinkResp,
    Unbind,
    UnbindResp,
    GenericNack,
    /// Any command this link does not model; body is kept raw
    Unknown { command_id: u32, body: Bytes },
}

impl PduBody {
    pub fn command_id(&self) -> u32 {
        match self {
            PduBody::BindTransmitter(_) => BIND_TRANSMITTER,
            PduBody::BindTransmitterResp { .. } => BIND_TRANSMITTER_RESP,
            PduBody::SubmitSm(_) => SUBMIT_SM,
            PduBody::SubmitSmResp { .. } => SUBMIT_SM_RESP,
            PduBody::EnquireLink => ENQUIRE_LINK,
            PduBody::EnquireLinkResp => ENQUIRE_LINK_RESP,
            PduBody::Unbind => UNBIND,
            PduBody::UnbindResp => UNBIND_RESP,
            PduBody::GenericNack => GENERIC_NACK,
            PduBody::Unknown { command_id, .. } => *command_id,
        }
    }
}

/// A complete SMPP PDU
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pdu {
    pub command_status: u32,
    pub sequence_number: u32,
    pub body: PduBody,
}

impl Pdu {
    /// Request (or OK response) PDU
    pub fn new(sequence_number: u32, body: PduBody) -> Self {
        Self {
            command_status: ESME_ROK,
            sequence_number,
            body,
        }
    }

    /// Response PDU carrying a command status
    pub fn response(sequence_number: u32, command_status: u32, body: PduBody) -> Self {
        Self {
            command_status,
            sequence_number,
            body,
        }
    }

    #[inline]
    pub fn command_id(&self) -> u32 {
        self.body.command_id()
    }

    #[inline]
    pub fn is_response(&self) -> bool {
        self.command_id() & RESPONSE_MASK != 0
    }

    /// Encode header and body into `dst`
    pub fn encode(&self, dst: &mut BytesMut) -> Result<()> {
        let mut body = BytesMut::new();
        match &self.body {
            PduBody::BindTransmitter(bind) => {
                put_cstring(&mut body, "system_id", &bind.system_id, SYSTEM_ID_MAX)?;
                put_cstring(&mut body, "password", &bind.password, PASSWORD_MAX)?;
                put_cstring(&mut body, "system_type", &bind.system_type, SYSTEM_TYPE_MAX)?;
                body.put_u8(bind.interface_version);
                body.put_u8(bind.addr_ton);
                body.put_u8(bind.addr_npi);
                put_cstring(&mut body, "address_range", &bind.address_range, ADDRESS_RANGE_MAX)?;
            },
            PduBody::BindTransmitterResp { system_id } => {
                put_cstring(&mut body, "system_id", system_id, SYSTEM_ID_MAX)?;
            },
            PduBody::SubmitSm(sm) => {
                put_cstring(&mut body, "service_type", &sm.service_type, SERVICE_TYPE_MAX)?;
                body.put_u8(sm.source_addr_ton);
                body.put_u8(sm.source_addr_npi);
                put_cstring(&mut body, "source_addr", &sm.source_addr, ADDR_MAX)?;
                body.put_u8(sm.dest_addr_ton);
                body.put_u8(sm.dest_addr_npi);
                put_cstring(&mut body, "destination_addr", &sm.destination_addr, ADDR_MAX)?;
                body.put_u8(sm.esm_class);
                body.put_u8(sm.protocol_id);
                body.put_u8(sm.priority_flag);
                put_cstring(
                    &mut body,
                    "schedule_delivery_time",
                    &sm.schedule_delivery_time,
                    TIME_MAX,
                )?;
                put_cstring(&mut body, "validity_period", &sm.validity_period, TIME_MAX)?;
                body.put_u8(sm.registered_delivery);
                body.put_u8(sm.replace_if_present_flag);
                body.put_u8(sm.data_coding);
                body.put_u8(sm.sm_default_msg_id);
                if sm.short_message.len() > MAX_SHORT_MESSAGE_LEN {
                    return Err(LinkError::invalid_data("short_message too long"));
                }
                body.put_u8(sm.short_message.len() as u8);
                body.put_slice(&sm.short_message);
            },
            PduBody::SubmitSmResp { message_id } => {
                put_cstring(&mut body, "message_id", message_id, MESSAGE_ID_MAX)?;
            },
            PduBody::Unknown { body: raw, .. } => body.put_slice(raw),
            PduBody::EnquireLink
            | PduBody::EnquireLinkResp
            | PduBody::Unbind
            | PduBody::UnbindResp
            | PduBody::GenericNack => {},
        }

        let command_length = HEADER_LEN + body.len();
        dst.reserve(command_length);
        dst.put_u32(command_length as u32);
        dst.put_u32(self.command_id());
        dst.put_u32(self.command_status);
        dst.put_u32(self.sequence_number);
        dst.put_slice(&body);

        trace!(
            "Encoded {} seq={} len={}",
            command_name(self.command_id()),
            self.sequence_number,
            command_length
        );
        Ok(())
    }

    /// Decode one complete frame (header included)
    pub fn decode(mut frame: Bytes) -> Result<Self> {
        if frame.len() < HEADER_LEN {
            return Err(LinkError::protocol(format!(
                "PDU too short: {} bytes",
                frame.len()
            )));
        }

        let command_length = frame.get_u32() as usize;
        if command_length != frame.len() + 4 {
            return Err(LinkError::protocol(format!(
                "command_length {} does not match frame size {}",
                command_length,
                frame.len() + 4
            )));
        }
        let command_id = frame.get_u32();
        let command_status = frame.get_u32();
        let sequence_number = frame.get_u32();

        let body = match command_id {
            BIND_TRANSMITTER => PduBody::BindTransmitter(BindTransmitter {
                system_id: get_cstring(&mut frame, "system_id")?,
                password: get_cstring(&mut frame, "password")?,
                system_type: get_cstring(&mut frame, "system_type")?,
                interface_version: get_u8(&mut frame, "interface_version")?,
                addr_ton: get_u8(&mut frame, "addr_ton")?,
                addr_npi: get_u8(&mut frame, "addr_npi")?,
                address_range: get_cstring(&mut frame, "address_range")?,
            }),
            // Error responses may omit the body entirely; trailing TLVs are ignored
            BIND_TRANSMITTER_RESP => PduBody::BindTransmitterResp {
                system_id: get_cstring_opt(&mut frame, "system_id")?,
            },
            SUBMIT_SM => {
                let service_type = get_cstring(&mut frame, "service_type")?;
                let source_addr_ton = get_u8(&mut frame, "source_addr_ton")?;
                let source_addr_npi = get_u8(&mut frame, "source_addr_npi")?;
                let source_addr = get_cstring(&mut frame, "source_addr")?;
                let dest_addr_ton = get_u8(&mut frame, "dest_addr_ton")?;
                let dest_addr_npi = get_u8(&mut frame, "dest_addr_npi")?;
                let destination_addr = get_cstring(&mut frame, "destination_addr")?;
                let esm_class = get_u8(&mut frame, "esm_class")?;
                let protocol_id = get_u8(&mut frame, "protocol_id")?;
                let priority_flag = get_u8(&mut frame, "priority_flag")?;
                let schedule_delivery_time = get_cstring(&mut frame, "schedule_delivery_time")?;
                let validity_period = get_cstring(&mut frame, "validity_period")?;
                let registered_delivery = get_u8(&mut frame, "registered_delivery")?;
                let replace_if_present_flag = get_u8(&mut frame, "replace_if_present_flag")?;
                let data_coding = get_u8(&mut frame, "data_coding")?;
                let sm_default_msg_id = get_u8(&mut frame, "sm_default_msg_id")?;
                let sm_length = get_u8(&mut frame, "sm_length")? as usize;
                if frame.remaining() < sm_length {
                    return Err(LinkError::protocol("short_message truncated"));
                }
                let short_message = frame.split_to(sm_length);
                PduBody::SubmitSm(Box::new(SubmitSm {
                    service_type,
                    source_addr_ton,
                    source_addr_npi,
                    source_addr,
                    dest_addr_ton,
                    dest_addr_npi,
                    destination_addr,
                    esm_class,
                    protocol_id,
                    priority_flag,
                    schedule_delivery_time,
                    validity_period,
                    registered_delivery,
                    replace_if_present_flag,
                    data_coding,
                    sm_default_msg_id,
                    short_message,
                }))
            },
            SUBMIT_SM_RESP => PduBody::SubmitSmResp {
                message_id: get_cstring_opt(&mut frame, "message_id")?,
            },
            ENQUIRE_LINK => PduBody::EnquireLink,
            ENQUIRE_LINK_RESP => PduBody::EnquireLinkResp,
            UNBIND => PduBody::Unbind,
            UNBIND_RESP => PduBody::UnbindResp,
            GENERIC_NACK => PduBody::GenericNack,
            other => PduBody::Unknown {
                command_id: other,
                body: frame,
            },
        };

        trace!(
            "Decoded {} seq={} status=0x{:08X}",
            command_name(command_id),
            sequence_number,
            command_status
        );

        Ok(Self {
            command_status,
            sequence_number,
            body,
        })
    }
}

fn put_cstring(dst: &mut BytesMut, field: &str, value: &str, max_with_nul: usize) -> Result<()> {
    if value.len() + 1 > max_with_nul {
        return Err(LinkError::invalid_data(format!(
            "{} too long: {} octets (max {})",
            field,
            value.len(),
            max_with_nul - 1
        )));
    }
    if value.as_bytes().contains(&0) {
        return Err(LinkError::invalid_data(format!("{} contains NUL", field)));
    }
    dst.put_slice(value.as_bytes());
    dst.put_u8(0);
    Ok(())
}

fn get_cstring(src: &mut Bytes, field: &str) -> Result<String> {
    let Some(end) = src.iter().position(|&b| b == 0) else {
        return Err(LinkError::protocol(format!("{} is not NUL-terminated", field)));
    };
    let raw = src.split_to(end);
    src.advance(1);
    String::from_utf8(raw.to_vec())
        .map_err(|_| LinkError::protocol(format!("{} is not valid text", field)))
}

fn get_cstring_opt(src: &mut Bytes, field: &str) -> Result<String> {
    if src.is_empty() {
        Ok(String::new())
    } else {
        get_cstring(src, field)
    }
}

fn get_u8(src: &mut Bytes, field: &str) -> Result<u8> {
    if !src.has_remaining() {
        return Err(LinkError::protocol(format!("missing {}", field)));
    }
    Ok(src.get_u8())
}
