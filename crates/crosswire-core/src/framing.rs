//! Length-prefixed framing for stream transports.
//!
//! Wire messages are self-describing but not self-delimiting on a byte
//! stream, so stream transports wrap each serialized message in a 4-byte
//! big-endian length prefix.

use crate::error::TransportError;
use crate::message::{Message, MessageHeader};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Largest frame we accept: maximum header plus maximum payload.
pub const MAX_FRAME_SIZE: usize = MessageHeader::MAX_SIZE + Message::MAX_PAYLOAD_SIZE;

/// Write one message as a length-prefixed frame.
pub async fn write_frame<W>(writer: &mut W, message: &Message) -> Result<(), TransportError>
where
    W: AsyncWrite + Unpin,
{
    let data = message
        .serialize()
        .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;
    let len = data.len() as u32;
    writer
        .write_all(&len.to_be_bytes())
        .await
        .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;
    writer
        .write_all(&data)
        .await
        .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;
    writer
        .flush()
        .await
        .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;
    Ok(())
}

/// Read one length-prefixed frame and decode the message inside.
///
/// Returns `Ok(None)` on clean end-of-stream at a frame boundary. A frame
/// larger than [`MAX_FRAME_SIZE`] is rejected without reading its body.
pub async fn read_frame<R>(reader: &mut R) -> Result<Option<Message>, TransportError>
where
    R: AsyncRead + Unpin,
{
    let mut len_bytes = [0u8; 4];
    match reader.read_exact(&mut len_bytes).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(TransportError::ConnectionFailed(e.to_string())),
    }
    let len = u32::from_be_bytes(len_bytes) as usize;
    if len > MAX_FRAME_SIZE {
        return Err(TransportError::InvalidData);
    }

    let mut data = vec![0u8; len];
    reader
        .read_exact(&mut data)
        .await
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::UnexpectedEof => TransportError::ConnectionClosed,
            _ => TransportError::ConnectionFailed(e.to_string()),
        })?;

    let message = Message::deserialize(&data).map_err(|_| TransportError::InvalidData)?;
    Ok(Some(message))
}
