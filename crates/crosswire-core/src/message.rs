//! Wire message protocol — binary header framing and validation.
//!
//! All multi-byte integers are big-endian. A serialized message is a
//! variable-size header (20-byte fixed prefix plus two length-prefixed UTF-8
//! peer names) followed by raw payload bytes. Messages are self-delimiting
//! once extracted via the embedded payload length, but carry no outer
//! framing — stream transports add their own (see [`crate::framing`]).

use crate::error::{MessageError, ValidationError};
use crate::peer_id::PeerId;
use crate::PROTOCOL_VERSION;
use std::ops::{BitOr, BitOrAssign};

/// Message type codes carried in the header's type byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageType {
    /// Peer presence announcement.
    Announce = 0x01,
    /// Capability query.
    Query = 0x02,
    /// Query response.
    QueryResponse = 0x03,
    /// Capability invocation request.
    Invoke = 0x04,
    /// Invocation response.
    InvokeResponse = 0x05,
    /// Notification/event.
    Notify = 0x06,
    /// Error response.
    Error = 0x07,
    /// Keepalive ping.
    Ping = 0x08,
    /// Keepalive response.
    Pong = 0x09,
    /// Trust verification request (hook, not implemented).
    TrustVerify = 0x0A,
    /// Trust verification response (hook, not implemented).
    TrustVerifyResponse = 0x0B,
}

impl MessageType {
    /// Decode a type byte. Unrecognized values are a hard parse failure.
    pub fn from_u8(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(Self::Announce),
            0x02 => Some(Self::Query),
            0x03 => Some(Self::QueryResponse),
            0x04 => Some(Self::Invoke),
            0x05 => Some(Self::InvokeResponse),
            0x06 => Some(Self::Notify),
            0x07 => Some(Self::Error),
            0x08 => Some(Self::Ping),
            0x09 => Some(Self::Pong),
            0x0A => Some(Self::TrustVerify),
            0x0B => Some(Self::TrustVerifyResponse),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Announce => "ANNOUNCE",
            Self::Query => "QUERY",
            Self::QueryResponse => "QUERY_RESPONSE",
            Self::Invoke => "INVOKE",
            Self::InvokeResponse => "INVOKE_RESPONSE",
            Self::Notify => "NOTIFY",
            Self::Error => "ERROR",
            Self::Ping => "PING",
            Self::Pong => "PONG",
            Self::TrustVerify => "TRUST_VERIFY",
            Self::TrustVerifyResponse => "TRUST_VERIFY_RESPONSE",
        }
    }
}

/// Message behavior flags — a 16-bit set in the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MessageFlags(u16);

impl MessageFlags {
    pub const NONE: MessageFlags = MessageFlags(0);
    /// Message requires acknowledgment.
    pub const REQUIRES_ACK: MessageFlags = MessageFlags(1 << 0);
    /// Message is encrypted.
    pub const ENCRYPTED: MessageFlags = MessageFlags(1 << 1);
    /// Message is compressed.
    pub const COMPRESSED: MessageFlags = MessageFlags(1 << 2);
    /// Message is a broadcast.
    pub const BROADCAST: MessageFlags = MessageFlags(1 << 3);
    /// Message is urgent/high priority.
    pub const URGENT: MessageFlags = MessageFlags(1 << 4);
    /// Message is a response.
    pub const RESPONSE: MessageFlags = MessageFlags(1 << 5);
    /// Message is part of a stream.
    pub const STREAMING: MessageFlags = MessageFlags(1 << 6);
    /// Final message in a stream.
    pub const FINAL: MessageFlags = MessageFlags(1 << 7);

    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    pub const fn contains(self, other: MessageFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: MessageFlags) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: MessageFlags) {
        self.0 &= !other.0;
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for MessageFlags {
    type Output = MessageFlags;

    fn bitor(self, rhs: MessageFlags) -> MessageFlags {
        MessageFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for MessageFlags {
    fn bitor_assign(&mut self, rhs: MessageFlags) {
        self.0 |= rhs.0;
    }
}

/// Message header.
///
/// Binary layout (big-endian): version(1) + type(1) + flags(2) + sequence(4)
/// + timestamp(8) + payload length(4), then the sender and recipient names,
/// each as a 1-byte length followed by UTF-8 bytes (max 63 each).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageHeader {
    /// Protocol version.
    pub version: u8,
    /// Message type.
    pub message_type: MessageType,
    /// Behavior flags.
    pub flags: MessageFlags,
    /// Sender's peer ID.
    pub sender: PeerId,
    /// Recipient's peer ID, or broadcast (empty name).
    pub recipient: PeerId,
    /// Per-sender monotonic counter, wraps on overflow.
    pub sequence_number: u32,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    /// Payload length in bytes.
    pub payload_length: u32,
}

impl MessageHeader {
    /// Size of the fixed-field prefix:
    /// version(1) + type(1) + flags(2) + seq(4) + timestamp(8) + payloadLen(4).
    pub const FIXED_SIZE: usize = 20;

    /// Maximum serialized header size (both peer names at the byte cap).
    pub const MAX_SIZE: usize = Self::FIXED_SIZE + 2 + 63 + 63;

    /// Maximum peer name length in UTF-8 bytes.
    pub const MAX_PEER_NAME_BYTES: usize = 63;

    /// Serialize the header to bytes.
    ///
    /// Fails (never silently truncates) if either peer name exceeds
    /// [`MAX_PEER_NAME_BYTES`](Self::MAX_PEER_NAME_BYTES) UTF-8 bytes.
    pub fn serialize(&self) -> Result<Vec<u8>, MessageError> {
        let sender = self.sender.name().as_bytes();
        let recipient = self.recipient.name().as_bytes();
        if sender.len() > Self::MAX_PEER_NAME_BYTES {
            return Err(MessageError::PeerNameTooLong(sender.len()));
        }
        if recipient.len() > Self::MAX_PEER_NAME_BYTES {
            return Err(MessageError::PeerNameTooLong(recipient.len()));
        }

        let mut buf = Vec::with_capacity(Self::FIXED_SIZE + 2 + sender.len() + recipient.len());
        buf.push(self.version);
        buf.push(self.message_type as u8);
        buf.extend_from_slice(&self.flags.bits().to_be_bytes());
        buf.extend_from_slice(&self.sequence_number.to_be_bytes());
        buf.extend_from_slice(&self.timestamp.to_be_bytes());
        buf.extend_from_slice(&self.payload_length.to_be_bytes());
        buf.push(sender.len() as u8);
        buf.extend_from_slice(sender);
        buf.push(recipient.len() as u8);
        buf.extend_from_slice(recipient);
        Ok(buf)
    }

    /// Deserialize a header from the front of a byte buffer.
    pub fn deserialize(data: &[u8]) -> Result<Self, MessageError> {
        // Fixed fields plus the two name-length bytes at minimum.
        if data.len() < Self::FIXED_SIZE + 2 {
            return Err(MessageError::InsufficientData);
        }

        let version = data[0];
        let type_byte = data[1];
        let message_type =
            MessageType::from_u8(type_byte).ok_or(MessageError::InvalidMessageType(type_byte))?;
        let flags = MessageFlags::from_bits(u16::from_be_bytes([data[2], data[3]]));
        let sequence_number = u32::from_be_bytes([data[4], data[5], data[6], data[7]]);
        let timestamp = u64::from_be_bytes([
            data[8], data[9], data[10], data[11], data[12], data[13], data[14], data[15],
        ]);
        let payload_length = u32::from_be_bytes([data[16], data[17], data[18], data[19]]);

        let mut offset = Self::FIXED_SIZE;
        let sender_len = data[offset] as usize;
        offset += 1;
        if offset + sender_len > data.len() {
            return Err(MessageError::InsufficientData);
        }
        let sender = std::str::from_utf8(&data[offset..offset + sender_len]).unwrap_or("");
        offset += sender_len;

        if offset >= data.len() {
            return Err(MessageError::InsufficientData);
        }
        let recipient_len = data[offset] as usize;
        offset += 1;
        if offset + recipient_len > data.len() {
            return Err(MessageError::InsufficientData);
        }
        let recipient = std::str::from_utf8(&data[offset..offset + recipient_len]).unwrap_or("");

        Ok(Self {
            version,
            message_type,
            flags,
            sender: PeerId::new(sender),
            recipient: PeerId::new(recipient),
            sequence_number,
            timestamp,
            payload_length,
        })
    }

    /// Serialized size of this header in bytes.
    pub fn serialized_size(&self) -> usize {
        Self::FIXED_SIZE + 2 + self.sender.name().len() + self.recipient.name().len()
    }
}

/// A complete wire message: header plus raw payload bytes.
///
/// Messages are constructed per send, serialized, deserialized and validated
/// by the receiver, then discarded — there is no persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub header: MessageHeader,
    pub payload: Vec<u8>,
}

impl Message {
    /// Maximum payload size: 1 MiB.
    pub const MAX_PAYLOAD_SIZE: usize = 1024 * 1024;

    /// Create a message, stamping the current wall-clock timestamp.
    pub fn new(
        message_type: MessageType,
        flags: MessageFlags,
        sender: PeerId,
        recipient: PeerId,
        sequence_number: u32,
        payload: Vec<u8>,
    ) -> Self {
        let header = MessageHeader {
            version: PROTOCOL_VERSION,
            message_type,
            flags,
            sender,
            recipient,
            sequence_number,
            timestamp: chrono::Utc::now().timestamp_millis() as u64,
            payload_length: payload.len() as u32,
        };
        Self { header, payload }
    }

    /// Create a broadcast message (recipient empty, broadcast flag set).
    pub fn broadcast(
        message_type: MessageType,
        sender: PeerId,
        sequence_number: u32,
        payload: Vec<u8>,
    ) -> Self {
        Self::new(
            message_type,
            MessageFlags::BROADCAST,
            sender,
            PeerId::broadcast(),
            sequence_number,
            payload,
        )
    }

    /// Validate the message.
    ///
    /// Checks, in order: protocol version, payload length field against the
    /// actual payload size, and the 1 MiB payload cap. Returns a result
    /// value; the caller decides whether to drop or reject.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.header.version != PROTOCOL_VERSION {
            return Err(ValidationError::UnsupportedVersion(self.header.version));
        }
        if self.header.payload_length as usize != self.payload.len() {
            return Err(ValidationError::PayloadLengthMismatch);
        }
        if self.payload.len() > Self::MAX_PAYLOAD_SIZE {
            return Err(ValidationError::PayloadTooLarge);
        }
        Ok(())
    }

    /// Serialize header and payload to bytes.
    pub fn serialize(&self) -> Result<Vec<u8>, MessageError> {
        let mut data = self.header.serialize()?;
        data.extend_from_slice(&self.payload);
        Ok(data)
    }

    /// Deserialize a message from a byte buffer.
    ///
    /// Consumes exactly `header + payload_length` bytes; trailing bytes are
    /// left untouched (outer framing is the caller's responsibility).
    pub fn deserialize(data: &[u8]) -> Result<Self, MessageError> {
        let header = MessageHeader::deserialize(data)?;
        let payload_start = header.serialized_size();
        let payload_end = payload_start + header.payload_length as usize;
        if data.len() < payload_end {
            return Err(MessageError::InsufficientData);
        }
        let payload = data[payload_start..payload_end].to_vec();
        Ok(Self { header, payload })
    }

    /// Total serialized size in bytes.
    pub fn total_size(&self) -> usize {
        self.header.serialized_size() + self.payload.len()
    }
}
