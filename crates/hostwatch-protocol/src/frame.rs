//! Frame layer of the message channel.
//!
//! The agent exchanges discrete frames over one byte stream per client.
//! Wire format: a 1-byte kind tag, a big-endian u32 payload length, then
//! the payload. Three kinds exist: text (UTF-8, carries all protocol
//! traffic), binary (tolerated but never interpreted), and close (empty
//! payload, ends the session). TLS termination happens in front of this
//! layer and is not its concern.

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

/// Maximum payload size accepted or produced (1 MiB).
pub const MAX_FRAME_SIZE: usize = 1_048_576;

const HEADER_LEN: usize = 5;

const KIND_TEXT: u8 = 0;
const KIND_BINARY: u8 = 1;
const KIND_CLOSE: u8 = 2;

/// One frame on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Binary(Vec<u8>),
    Close,
}

impl Frame {
    /// Convenience constructor for text frames.
    pub fn text(payload: impl Into<String>) -> Self {
        Frame::Text(payload.into())
    }
}

/// Errors produced while encoding or decoding frames.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("frame of {size} bytes exceeds the limit of {max}")]
    TooLarge { size: usize, max: usize },

    #[error("unknown frame kind: {0}")]
    UnknownKind(u8),

    #[error("text frame payload is not valid UTF-8")]
    InvalidUtf8,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Length-prefixed frame codec for use with `tokio_util::codec::Framed`.
#[derive(Debug, Clone)]
pub struct FrameCodec {
    max_frame_size: usize,
}

impl FrameCodec {
    pub fn new() -> Self {
        Self {
            max_frame_size: MAX_FRAME_SIZE,
        }
    }

    /// Codec with a custom payload limit (mainly for tests).
    pub fn with_limit(max_frame_size: usize) -> Self {
        Self { max_frame_size }
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for FrameCodec {
    type Item = Frame;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>, FrameError> {
        if src.len() < HEADER_LEN {
            return Ok(None);
        }

        let header = &src[..HEADER_LEN];
        let kind = header[0];
        let len = u32::from_be_bytes([header[1], header[2], header[3], header[4]]) as usize;

        if len > self.max_frame_size {
            return Err(FrameError::TooLarge {
                size: len,
                max: self.max_frame_size,
            });
        }

        if src.len() < HEADER_LEN + len {
            // Wait for the rest of the payload.
            src.reserve(HEADER_LEN + len - src.len());
            return Ok(None);
        }

        src.advance(HEADER_LEN);
        let payload = src.split_to(len);

        match kind {
            KIND_TEXT => String::from_utf8(payload.to_vec())
                .map(|text| Some(Frame::Text(text)))
                .map_err(|_| FrameError::InvalidUtf8),
            KIND_BINARY => Ok(Some(Frame::Binary(payload.to_vec()))),
            KIND_CLOSE => Ok(Some(Frame::Close)),
            other => Err(FrameError::UnknownKind(other)),
        }
    }
}

impl Encoder<Frame> for FrameCodec {
    type Error = FrameError;

    fn encode(&mut self, frame: Frame, dst: &mut BytesMut) -> Result<(), FrameError> {
        let (kind, payload): (u8, &[u8]) = match &frame {
            Frame::Text(text) => (KIND_TEXT, text.as_bytes()),
            Frame::Binary(bytes) => (KIND_BINARY, bytes),
            Frame::Close => (KIND_CLOSE, &[]),
        };

        if payload.len() > self.max_frame_size {
            return Err(FrameError::TooLarge {
                size: payload.len(),
                max: self.max_frame_size,
            });
        }

        dst.reserve(HEADER_LEN + payload.len());
        dst.put_u8(kind);
        dst.put_u32(payload.len() as u32);
        dst.put_slice(payload);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(frame: Frame) -> Frame {
        let mut codec = FrameCodec::new();
        let mut buf = BytesMut::new();
        codec.encode(frame, &mut buf).unwrap();
        codec.decode(&mut buf).unwrap().unwrap()
    }

    #[test]
    fn test_text_roundtrip() {
        assert_eq!(
            roundtrip(Frame::text("[\"auth\",\"success\"]")),
            Frame::Text("[\"auth\",\"success\"]".to_string())
        );
    }

    #[test]
    fn test_binary_roundtrip() {
        assert_eq!(
            roundtrip(Frame::Binary(vec![0, 159, 146, 150])),
            Frame::Binary(vec![0, 159, 146, 150])
        );
    }

    #[test]
    fn test_close_roundtrip() {
        assert_eq!(roundtrip(Frame::Close), Frame::Close);
    }

    #[test]
    fn test_partial_header_yields_none() {
        let mut codec = FrameCodec::new();
        let mut buf = BytesMut::from(&[KIND_TEXT, 0, 0][..]);
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn test_partial_payload_yields_none() {
        let mut codec = FrameCodec::new();
        let mut buf = BytesMut::new();
        codec.encode(Frame::text("hello"), &mut buf).unwrap();
        let _tail = buf.split_off(buf.len() - 2);
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn test_two_frames_in_one_buffer() {
        let mut codec = FrameCodec::new();
        let mut buf = BytesMut::new();
        codec.encode(Frame::text("one"), &mut buf).unwrap();
        codec.encode(Frame::Close, &mut buf).unwrap();

        assert_eq!(codec.decode(&mut buf).unwrap(), Some(Frame::text("one")));
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(Frame::Close));
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
    }

    #[test]
    fn test_oversized_frame_rejected_on_decode() {
        let mut codec = FrameCodec::with_limit(16);
        let mut buf = BytesMut::new();
        buf.put_u8(KIND_TEXT);
        buf.put_u32(17);
        buf.put_slice(&[b'x'; 17]);

        assert!(matches!(
            codec.decode(&mut buf),
            Err(FrameError::TooLarge { size: 17, max: 16 })
        ));
    }

    #[test]
    fn test_oversized_frame_rejected_on_encode() {
        let mut codec = FrameCodec::with_limit(4);
        let mut buf = BytesMut::new();
        assert!(matches!(
            codec.encode(Frame::text("12345"), &mut buf),
            Err(FrameError::TooLarge { .. })
        ));
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let mut codec = FrameCodec::new();
        let mut buf = BytesMut::new();
        buf.put_u8(9);
        buf.put_u32(0);

        assert!(matches!(codec.decode(&mut buf), Err(FrameError::UnknownKind(9))));
    }

    #[test]
    fn test_invalid_utf8_text_rejected() {
        let mut codec = FrameCodec::new();
        let mut buf = BytesMut::new();
        buf.put_u8(KIND_TEXT);
        buf.put_u32(2);
        buf.put_slice(&[0xff, 0xfe]);

        assert!(matches!(codec.decode(&mut buf), Err(FrameError::InvalidUtf8)));
    }
}
