//! Frame codec: the two distinct wire framings used in a slimproto session.
//!
//! Client->server frames are read with [`read_client_frame`]: a 4-byte ASCII
//! tag, a 4-byte big-endian length, then `length` payload bytes.
//!
//! Server->client frames are written with [`write_server_frame`]: a 2-byte
//! big-endian length *equal to `len(payload) + 4`*, then the 4-byte tag, then
//! the payload. This is not the same framing as the inbound side; real
//! clients will not parse a server frame written with the inbound framing.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::FrameError;
use crate::protocol_constants::MAX_FRAME_PAYLOAD;

/// A decoded client->server frame: a 4-byte ASCII tag plus its payload.
#[derive(Debug, Clone)]
pub struct ClientFrame {
    /// The 4-byte ASCII tag, e.g. `HELO`, `STAT`, `BYE!`.
    pub tag: [u8; 4],
    /// The frame payload.
    pub payload: Vec<u8>,
}

impl ClientFrame {
    /// Returns the tag as a `&str` if it is valid ASCII, else the raw bytes
    /// escaped for logging.
    #[must_use]
    pub fn tag_str(&self) -> String {
        std::str::from_utf8(&self.tag)
            .map(str::to_string)
            .unwrap_or_else(|_| format!("{:?}", self.tag))
    }
}

/// Reads one client->server frame from `reader`.
///
/// Retries partial reads until the declared length is satisfied. Fails with
/// [`FrameError::FrameTooLarge`] if the declared length exceeds
/// [`MAX_FRAME_PAYLOAD`], or [`FrameError::IncompleteRead`] on EOF mid-frame.
pub async fn read_client_frame<R>(reader: &mut R) -> Result<ClientFrame, FrameError>
where
    R: AsyncRead + Unpin,
{
    let mut tag = [0u8; 4];
    reader.read_exact(&mut tag).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            FrameError::IncompleteRead {
                expected: 4,
                actual: 0,
            }
        } else {
            FrameError::Io(e)
        }
    })?;

    let mut len_buf = [0u8; 4];
    read_exact_or_incomplete(reader, &mut len_buf, 4).await?;
    let length = u32::from_be_bytes(len_buf);

    if length > MAX_FRAME_PAYLOAD {
        return Err(FrameError::FrameTooLarge(length));
    }

    let mut payload = vec![0u8; length as usize];
    read_exact_or_incomplete(reader, &mut payload, length as usize).await?;

    Ok(ClientFrame { tag, payload })
}

async fn read_exact_or_incomplete<R>(
    reader: &mut R,
    buf: &mut [u8],
    expected: usize,
) -> Result<(), FrameError>
where
    R: AsyncRead + Unpin,
{
    match reader.read_exact(buf).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            Err(FrameError::IncompleteRead {
                expected,
                actual: 0,
            })
        }
        Err(e) => Err(FrameError::Io(e)),
    }
}

/// Writes one server->client frame to `writer`.
///
/// `tag` must be exactly 4 bytes; this is enforced by every caller in this
/// crate constructing tags from `&'static [u8; 4]` literals, so it is not a
/// recoverable error path here.
pub async fn write_server_frame<W>(
    writer: &mut W,
    tag: &[u8; 4],
    payload: &[u8],
) -> Result<(), FrameError>
where
    W: AsyncWrite + Unpin,
{
    let length = (payload.len() + 4) as u16;
    let mut frame = Vec::with_capacity(2 + 4 + payload.len());
    frame.extend_from_slice(&length.to_be_bytes());
    frame.extend_from_slice(tag);
    frame.extend_from_slice(payload);
    writer.write_all(&frame).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[tokio::test]
    async fn reads_a_well_formed_frame() {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"HELO");
        buf.extend_from_slice(&8u32.to_be_bytes());
        buf.extend_from_slice(&[0x0C, 0x01, 0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]);
        let mut cursor = Cursor::new(buf);

        let frame = read_client_frame(&mut cursor).await.unwrap();
        assert_eq!(&frame.tag, b"HELO");
        assert_eq!(frame.payload.len(), 8);
    }

    #[tokio::test]
    async fn rejects_oversize_length() {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"STAT");
        buf.extend_from_slice(&1_048_576u32.to_be_bytes());
        let mut cursor = Cursor::new(buf);

        let err = read_client_frame(&mut cursor).await.unwrap_err();
        assert!(matches!(err, FrameError::FrameTooLarge(1_048_576)));
    }

    #[tokio::test]
    async fn accepts_exactly_max_payload_length() {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"BODY");
        buf.extend_from_slice(&MAX_FRAME_PAYLOAD.to_be_bytes());
        buf.extend(std::iter::repeat(0u8).take(MAX_FRAME_PAYLOAD as usize));
        let mut cursor = Cursor::new(buf);

        let frame = read_client_frame(&mut cursor).await.unwrap();
        assert_eq!(frame.payload.len(), MAX_FRAME_PAYLOAD as usize);
    }

    #[tokio::test]
    async fn incomplete_header_is_incomplete_read() {
        let buf = b"HE".to_vec();
        let mut cursor = Cursor::new(buf);
        let err = read_client_frame(&mut cursor).await.unwrap_err();
        assert!(matches!(err, FrameError::IncompleteRead { .. }));
    }

    #[tokio::test]
    async fn writes_server_framing_with_length_including_tag() {
        let mut out = Vec::new();
        write_server_frame(&mut out, b"vers", b"8.5.0").await.unwrap();

        let declared_len = u16::from_be_bytes([out[0], out[1]]);
        assert_eq!(declared_len as usize, 4 + 5);
        assert_eq!(&out[2..6], b"vers");
        assert_eq!(&out[6..], b"8.5.0");
    }
}
