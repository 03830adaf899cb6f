//! Length-prefixed framing.
//!
//! Each frame is a 4-byte big-endian body length followed by the body:
//!
//! ```text
//! +----------------+------------------------+
//! | len: u32 (BE)  | body: len bytes        |
//! +----------------+------------------------+
//! ```
//!
//! The length field comes from the peer, so it is checked against a limit
//! before anything is allocated from it.

use crate::ProtocolError;

/// Size of the length header in bytes.
pub const HEADER_LEN: usize = 4;

/// Default maximum frame body length.
pub const DEFAULT_MAX_FRAME_LEN: usize = 65_535;

/// Prefixes `body` with its length.
///
/// # Errors
/// Returns [`ProtocolError::FrameTooLarge`] if `body` is longer than `max_len`.
pub fn encode_frame(body: &[u8], max_len: usize) -> Result<Vec<u8>, ProtocolError> {
    if body.len() > max_len {
        return Err(ProtocolError::FrameTooLarge {
            len: body.len(),
            max: max_len,
        });
    }

    let mut frame = Vec::with_capacity(HEADER_LEN + body.len());
    frame.extend_from_slice(&(body.len() as u32).to_be_bytes());
    frame.extend_from_slice(body);
    Ok(frame)
}

/// Reassembles frames from a byte stream that may arrive in any chunking.
#[derive(Debug)]
pub struct FrameDecoder {
    buf: Vec<u8>,
    max_len: usize,
}

impl FrameDecoder {
    /// Creates a decoder that rejects bodies longer than `max_len`.
    pub fn new(max_len: usize) -> Self {
        Self {
            buf: Vec::new(),
            max_len,
        }
    }

    /// Appends received bytes.
    pub fn extend(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Removes and returns the next complete frame body, if one is buffered.
    ///
    /// # Errors
    /// Returns [`ProtocolError::FrameTooLarge`] as soon as a header announces
    /// a body over the limit. The stream can't be resynchronized after that,
    /// so the caller should drop the connection.
    pub fn next_frame(&mut self) -> Result<Option<Vec<u8>>, ProtocolError> {
        let Some(header) = self.buf.first_chunk::<HEADER_LEN>() else {
            return Ok(None);
        };

        let len = u32::from_be_bytes(*header) as usize;
        if len > self.max_len {
            return Err(ProtocolError::FrameTooLarge {
                len,
                max: self.max_len,
            });
        }

        if self.buf.len() < HEADER_LEN + len {
            return Ok(None);
        }

        let body = self.buf[HEADER_LEN..HEADER_LEN + len].to_vec();
        self.buf.drain(..HEADER_LEN + len);
        Ok(Some(body))
    }

    /// Number of buffered bytes not yet returned as frames.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Discards everything buffered.
    pub fn clear(&mut self) {
        self.buf.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_frame_prefixes_big_endian_length() {
        let frame = encode_frame(b"abc", 16).unwrap();
        assert_eq!(frame, vec![0, 0, 0, 3, b'a', b'b', b'c']);
    }

    #[test]
    fn test_encode_frame_over_limit_is_rejected() {
        let result = encode_frame(&[0u8; 17], 16);
        assert!(matches!(
            result,
            Err(ProtocolError::FrameTooLarge { len: 17, max: 16 })
        ));
    }

    #[test]
    fn test_next_frame_waits_for_full_header_and_body() {
        let frame = encode_frame(b"hello", 64).unwrap();
        let mut decoder = FrameDecoder::new(64);

        for byte in &frame[..frame.len() - 1] {
            decoder.extend(std::slice::from_ref(byte));
            assert_eq!(decoder.next_frame().unwrap(), None);
        }
        decoder.extend(&frame[frame.len() - 1..]);

        assert_eq!(decoder.next_frame().unwrap(), Some(b"hello".to_vec()));
        assert_eq!(decoder.buffered(), 0);
    }

    #[test]
    fn test_next_frame_splits_back_to_back_frames() {
        let mut bytes = encode_frame(b"one", 64).unwrap();
        bytes.extend(encode_frame(b"", 64).unwrap());
        bytes.extend(encode_frame(b"three", 64).unwrap());
        let mut decoder = FrameDecoder::new(64);
        decoder.extend(&bytes);

        assert_eq!(decoder.next_frame().unwrap(), Some(b"one".to_vec()));
        assert_eq!(decoder.next_frame().unwrap(), Some(Vec::new()));
        assert_eq!(decoder.next_frame().unwrap(), Some(b"three".to_vec()));
        assert_eq!(decoder.next_frame().unwrap(), None);
    }

    #[test]
    fn test_next_frame_oversized_header_fails_without_body() {
        let mut decoder = FrameDecoder::new(1024);
        decoder.extend(&u32::MAX.to_be_bytes());

        let result = decoder.next_frame();

        assert!(matches!(
            result,
            Err(ProtocolError::FrameTooLarge { max: 1024, .. })
        ));
    }

    #[test]
    fn test_clear_discards_partial_frame() {
        let mut decoder = FrameDecoder::new(64);
        decoder.extend(&[0, 0, 0, 9, 1, 2]);

        decoder.clear();

        assert_eq!(decoder.buffered(), 0);
        assert_eq!(decoder.next_frame().unwrap(), None);
    }
}
