//! SMPP v3.4 protocol constants
//!
//! Values from SMPP v3.4 (issue 1.2).

// ============================================================================
// Frame Size Constants
// ============================================================================

/// PDU header length: command_length(4) + command_id(4) + command_status(4) + sequence_number(4)
pub const HEADER_LEN: usize = 16;

/// Default upper bound accepted for `command_length` on inbound PDUs
pub const DEFAULT_MAX_PDU_LEN: usize = 64 * 1024;

/// SMPP interface version 3.4
pub const INTERFACE_VERSION_34: u8 = 0x34;

/// Maximum `short_message` length in octets
pub const MAX_SHORT_MESSAGE_LEN: usize = 254;

// ============================================================================
// Command IDs
// ============================================================================

pub const GENERIC_NACK: u32 = 0x8000_0000;
pub const BIND_RECEIVER: u32 = 0x0000_0001;
pub const BIND_TRANSMITTER: u32 = 0x0000_0002;
pub const BIND_TRANSMITTER_RESP: u32 = 0x8000_0002;
pub const SUBMIT_SM: u32 = 0x0000_0004;
pub const SUBMIT_SM_RESP: u32 = 0x8000_0004;
pub const DELIVER_SM: u32 = 0x0000_0005;
pub const UNBIND: u32 = 0x0000_0006;
pub const UNBIND_RESP: u32 = 0x8000_0006;
pub const ENQUIRE_LINK: u32 = 0x0000_0015;
pub const ENQUIRE_LINK_RESP: u32 = 0x8000_0015;

/// High bit marks a response command id
pub const RESPONSE_MASK: u32 = 0x8000_0000;

// ============================================================================
// C-Octet String Limits (including the terminating NUL)
// ============================================================================

pub const SYSTEM_ID_MAX: usize = 16;
pub const PASSWORD_MAX: usize = 9;
pub const SYSTEM_TYPE_MAX: usize = 13;
pub const ADDRESS_RANGE_MAX: usize = 41;
pub const SERVICE_TYPE_MAX: usize = 6;
pub const ADDR_MAX: usize = 21;
pub const TIME_MAX: usize = 17;
pub const MESSAGE_ID_MAX: usize = 65;

// ============================================================================
// Address TON / NPI
// ============================================================================

pub const TON_UNKNOWN: u8 = 0x00;
pub const TON_INTERNATIONAL: u8 = 0x01;
pub const TON_ALPHANUMERIC: u8 = 0x05;
pub const NPI_UNKNOWN: u8 = 0x00;
pub const NPI_ISDN: u8 = 0x01;

// ============================================================================
// Data Coding
// ============================================================================

pub const DATA_CODING_DEFAULT: u8 = 0x00;
pub const DATA_CODING_UCS2: u8 = 0x08;

// ============================================================================
// Command Status Codes
// ============================================================================

pub const ESME_ROK: u32 = 0x0000_0000;
pub const ESME_RINVMSGLEN: u32 = 0x0000_0001;
pub const ESME_RINVCMDLEN: u32 = 0x0000_0002;
pub const ESME_RINVCMDID: u32 = 0x0000_0003;
pub const ESME_RINVBNDSTS: u32 = 0x0000_0004;
pub const ESME_RALYBND: u32 = 0x0000_0005;
pub const ESME_RSYSERR: u32 = 0x0000_0008;
pub const ESME_RINVSRCADR: u32 = 0x0000_000A;
pub const ESME_RINVDSTADR: u32 = 0x0000_000B;
pub const ESME_RBINDFAIL: u32 = 0x0000_000D;
pub const ESME_RINVPASWD: u32 = 0x0000_000E;
pub const ESME_RINVSYSID: u32 = 0x0000_000F;
pub const ESME_RMSGQFUL: u32 = 0x0000_0014;
pub const ESME_RINVSYSTYP: u32 = 0x0000_0053;
pub const ESME_RTHROTTLED: u32 = 0x0000_0058;

/// Human-readable description of a command status, for logs
pub fn status_description(status: u32) -> &'static str {
    match status {
        ESME_ROK => "OK",
        ESME_RINVMSGLEN => "Message length is invalid",
        ESME_RINVCMDLEN => "Command length is invalid",
        ESME_RINVCMDID => "Invalid command ID",
        ESME_RINVBNDSTS => "Incorrect bind status for given command",
        ESME_RALYBND => "ESME already in bound state",
        ESME_RSYSERR => "System error",
        ESME_RINVSRCADR => "Invalid source address",
        ESME_RINVDSTADR => "Invalid destination address",
        ESME_RBINDFAIL => "Bind failed",
        ESME_RINVPASWD => "Invalid password",
        ESME_RINVSYSID => "Invalid system ID",
        ESME_RMSGQFUL => "Message queue full",
        ESME_RINVSYSTYP => "Invalid system type",
        ESME_RTHROTTLED => "Throttling error",
        _ => "Unknown status",
    }
}

/// Human-readable command name, for logs
pub fn command_name(command_id: u32) -> &'static str {
    match command_id {
        GENERIC_NACK => "generic_nack",
        BIND_RECEIVER => "bind_receiver",
        BIND_TRANSMITTER => "bind_transmitter",
        BIND_TRANSMITTER_RESP => "bind_transmitter_resp",
        SUBMIT_SM => "submit_sm",
        SUBMIT_SM_RESP => "submit_sm_resp",
        DELIVER_SM => "deliver_sm",
        UNBIND => "unbind",
        UNBIND_RESP => "unbind_resp",
        ENQUIRE_LINK => "enquire_link",
        ENQUIRE_LINK_RESP => "enquire_link_resp",
        _ => "unknown",
    }
}
