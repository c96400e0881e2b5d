use std::time::{SystemTime, UNIX_EPOCH};

use meshsync_serde::{ByteReader, ByteWriter, ConstByteLength, Serde, SerdeErr};

use crate::{
    constants::{INVALID_ID, PROTOCOL_VERSION},
    messages::error::ProtocolError,
};

/// Nanoseconds since the unix epoch
pub fn now_ticks() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos() as u64)
        .unwrap_or(0)
}

/// Envelope carried in front of every message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageHeader {
    pub protocol_version: i32,
    pub session_id: i32,
    pub message_id: i32,
    pub timestamp_send: u64,
}

impl MessageHeader {
    pub fn new(session_id: i32, message_id: i32) -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION,
            session_id,
            message_id,
            timestamp_send: now_ticks(),
        }
    }

    /// Reads the envelope, rejecting a foreign protocol version before
    /// anything else is decoded.
    pub fn read_checked(reader: &mut ByteReader) -> Result<Self, ProtocolError> {
        let protocol_version = i32::de(reader)?;
        if protocol_version != PROTOCOL_VERSION {
            return Err(ProtocolError::VersionMismatch {
                expected: PROTOCOL_VERSION,
                actual: protocol_version,
            });
        }
        Ok(Self {
            protocol_version,
            session_id: i32::de(reader)?,
            message_id: i32::de(reader)?,
            timestamp_send: u64::de(reader)?,
        })
    }
}

impl Default for MessageHeader {
    fn default() -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION,
            session_id: INVALID_ID,
            message_id: 0,
            timestamp_send: 0,
        }
    }
}

impl Serde for MessageHeader {
    fn ser(&self, writer: &mut ByteWriter) {
        self.protocol_version.ser(writer);
        self.session_id.ser(writer);
        self.message_id.ser(writer);
        self.timestamp_send.ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            protocol_version: i32::de(reader)?,
            session_id: i32::de(reader)?,
            message_id: i32::de(reader)?,
            timestamp_send: u64::de(reader)?,
        })
    }

    fn byte_length(&self) -> usize {
        Self::BYTE_LENGTH
    }
}

impl ConstByteLength for MessageHeader {
    const BYTE_LENGTH: usize = 20;
}
