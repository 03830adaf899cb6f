//! Accumulates raw input bytes and hands out complete lines.

use std::io::Read;

use crate::ReactorError;

/// The delimiter that terminates a line.
const DELIMITER: u8 = b'\n';

/// A capacity-bounded buffer of input bytes not yet resolved into lines.
///
/// Reads append at most the remaining capacity, so the buffer can never grow
/// past `capacity`. A line is only complete once its `\n` has arrived: a
/// buffer without a delimiter is a pending partial line, no matter how many
/// reads it took to get there.
///
/// ## The `live` flag
///
/// `live` is set by every read that produced data and cleared once the
/// buffer holds no further complete line. Extraction is skipped while it is
/// clear, so the buffer is only scanned after new bytes arrive.
///
/// ## Overlong lines
///
/// When the buffer fills without a delimiter the partial line is dropped
/// and the buffer enters a discarding state. Incoming bytes are then thrown
/// away up to and including the next `\n`, so no tail of an overlong line
/// is ever returned as a line of its own.
#[derive(Debug)]
pub struct LineBuffer {
    buf: Vec<u8>,
    capacity: usize,
    live: bool,
    discarding: bool,
}

impl LineBuffer {
    /// Creates an empty buffer holding at most `capacity` bytes.
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
            capacity,
            live: false,
            discarding: false,
        }
    }

    /// Performs one bounded read from `reader`, appending to the buffer.
    ///
    /// Returns the number of bytes read; `Ok(0)` means end of input.
    ///
    /// # Errors
    /// - [`ReactorError::Read`] if the read fails. The buffer is unchanged.
    /// - [`ReactorError::Overflow`] if the buffer is now full and still holds
    ///   no delimiter. The partial line is dropped, and so is everything up
    ///   to its eventual delimiter.
    pub fn fill_from<R: Read>(
        &mut self,
        reader: &mut R,
    ) -> Result<usize, ReactorError> {
        let start = self.buf.len();
        if start >= self.capacity {
            return Err(self.overflow());
        }

        self.buf.resize(self.capacity, 0);
        let read = match reader.read(&mut self.buf[start..]) {
            Ok(n) => n,
            Err(e) => {
                self.buf.truncate(start);
                return Err(ReactorError::Read(e));
            }
        };
        self.buf.truncate(start + read);

        if read == 0 {
            return Ok(0);
        }

        self.live = true;

        if self.discarding {
            // Only the bytes just read can be here: the buffer was cleared
            // when discarding started.
            match self.buf.iter().position(|b| *b == DELIMITER) {
                Some(pos) => {
                    self.buf.drain(..=pos);
                    self.discarding = false;
                    tracing::debug!("end of overlong line, resuming input");
                }
                None => {
                    self.buf.clear();
                    self.live = false;
                    return Ok(read);
                }
            }
        }

        if self.buf.len() == self.capacity && !self.has_line() {
            return Err(self.overflow());
        }

        Ok(read)
    }

    fn overflow(&mut self) -> ReactorError {
        tracing::warn!(
            capacity = self.capacity,
            "input line too long, discarding"
        );
        self.buf.clear();
        self.live = false;
        self.discarding = true;
        ReactorError::Overflow {
            capacity: self.capacity,
        }
    }

    /// Removes and returns the next complete line, without its delimiter.
    ///
    /// A trailing `\r` is stripped as well. Returns `None` when the buffer
    /// holds only a partial line (or nothing), and clears the `live` flag.
    pub fn next_line(&mut self) -> Option<String> {
        if !self.live {
            return None;
        }

        let Some(pos) = self.buf.iter().position(|b| *b == DELIMITER) else {
            self.live = false;
            return None;
        };

        let mut line: Vec<u8> = self.buf.drain(..=pos).collect();
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }

        Some(String::from_utf8_lossy(&line).into_owned())
    }

    /// Returns `true` if the buffered bytes contain a complete line.
    pub fn has_line(&self) -> bool {
        self.buf.contains(&DELIMITER)
    }

    /// Returns `true` if the last read produced data not yet fully consumed.
    pub fn is_live(&self) -> bool {
        self.live
    }

    /// Returns `true` while the rest of an overlong line is being dropped.
    pub fn is_discarding(&self) -> bool {
        self.discarding
    }

    /// Number of buffered bytes.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns `true` if nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Maximum number of bytes the buffer will hold.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;

    /// Feeds `chunks` one read at a time and collects every line produced.
    fn feed(buf: &mut LineBuffer, chunks: &[&[u8]]) -> Vec<String> {
        let mut lines = Vec::new();
        for chunk in chunks {
            let mut reader: &[u8] = chunk;
            buf.fill_from(&mut reader).expect("fill should succeed");
            while let Some(line) = buf.next_line() {
                lines.push(line);
            }
        }
        lines
    }

    #[test]
    fn test_next_line_single_complete_line() {
        let mut buf = LineBuffer::new(64);

        let lines = feed(&mut buf, &[b"help\n"]);

        assert_eq!(lines, vec!["help"]);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_next_line_every_chunking_yields_one_line() {
        let input = b"chjoin lobby\n";

        // Every split into up to three chunks.
        for i in 0..=input.len() {
            for j in i..=input.len() {
                let mut buf = LineBuffer::new(64);
                let chunks: Vec<&[u8]> = [
                    &input[..i],
                    &input[i..j],
                    &input[j..],
                ]
                .into_iter()
                .filter(|c| !c.is_empty())
                .collect();

                let lines = feed(&mut buf, &chunks);

                assert_eq!(lines, vec!["chjoin lobby"], "split at {i}/{j}");
            }
        }
    }

    #[test]
    fn test_next_line_byte_at_a_time() {
        let mut buf = LineBuffer::new(64);
        let input = b"login alice secret\n";
        let chunks: Vec<&[u8]> = input.chunks(1).collect();

        let lines = feed(&mut buf, &chunks);

        assert_eq!(lines, vec!["login alice secret"]);
    }

    #[test]
    fn test_next_line_without_delimiter_is_never_dispatched() {
        let mut buf = LineBuffer::new(64);

        let lines = feed(&mut buf, &[b"partial", b" line", b" still"]);

        assert!(lines.is_empty());
        assert_eq!(buf.len(), "partial line still".len());
        assert!(!buf.is_live());
    }

    #[test]
    fn test_next_line_partial_tail_is_kept() {
        let mut buf = LineBuffer::new(64);

        let lines = feed(&mut buf, &[b"one\ntw"]);
        assert_eq!(lines, vec!["one"]);
        assert_eq!(buf.len(), 2);

        let lines = feed(&mut buf, &[b"o\n"]);
        assert_eq!(lines, vec!["two"]);
    }

    #[test]
    fn test_next_line_multiple_lines_in_one_read() {
        let mut buf = LineBuffer::new(64);

        let lines = feed(&mut buf, &[b"a\nb\n\nc\n"]);

        assert_eq!(lines, vec!["a", "b", "", "c"]);
    }

    #[test]
    fn test_next_line_strips_carriage_return() {
        let mut buf = LineBuffer::new(64);

        let lines = feed(&mut buf, &[b"quit\r\n"]);

        assert_eq!(lines, vec!["quit"]);
    }

    #[test]
    fn test_next_line_requires_live_data() {
        let mut buf = LineBuffer::new(64);
        assert_eq!(buf.next_line(), None);
    }

    #[test]
    fn test_fill_from_full_without_delimiter_overflows() {
        let mut buf = LineBuffer::new(8);
        let mut reader: &[u8] = b"12345678";

        let result = buf.fill_from(&mut reader);

        assert!(matches!(
            result,
            Err(ReactorError::Overflow { capacity: 8 })
        ));
        assert!(buf.is_empty(), "partial line should be discarded");
        assert_eq!(buf.next_line(), None);
    }

    #[test]
    fn test_fill_from_overflow_across_reads() {
        let mut buf = LineBuffer::new(8);

        let mut first: &[u8] = b"1234";
        buf.fill_from(&mut first).unwrap();
        assert_eq!(buf.next_line(), None);

        let mut second: &[u8] = b"56789abc";
        let result = buf.fill_from(&mut second);

        assert!(matches!(result, Err(ReactorError::Overflow { .. })));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_fill_from_exactly_full_with_delimiter_is_accepted() {
        let mut buf = LineBuffer::new(8);
        let mut reader: &[u8] = b"1234567\n";

        buf.fill_from(&mut reader).expect("a full line fits");

        assert_eq!(buf.next_line().as_deref(), Some("1234567"));
    }

    #[test]
    fn test_fill_from_reads_at_most_remaining_capacity() {
        let mut buf = LineBuffer::new(4);
        let mut reader: &[u8] = b"a\nbcdef";

        let n = buf.fill_from(&mut reader).unwrap();

        assert_eq!(n, 4);
        assert_eq!(buf.len(), 4);
    }

    #[test]
    fn test_fill_from_recovers_after_overflow() {
        let mut buf = LineBuffer::new(4);
        let mut long: &[u8] = b"abcd";
        assert!(buf.fill_from(&mut long).is_err());
        assert!(buf.is_discarding());

        let lines = feed(&mut buf, &[b"ef", b"gh\n", b"ok\n"]);

        assert_eq!(lines, vec!["ok"]);
        assert!(!buf.is_discarding());
    }

    #[test]
    fn test_fill_from_tail_of_overlong_line_is_not_a_line() {
        let mut buf = LineBuffer::new(8);
        let mut reader: &[u8] = b"abcdefghquit
";

        assert!(matches!(
            buf.fill_from(&mut reader),
            Err(ReactorError::Overflow { capacity: 8 })
        ));
        assert_eq!(buf.fill_from(&mut reader).unwrap(), 5);
        assert_eq!(buf.next_line(), None);
        assert!(buf.is_empty());

        let lines = feed(&mut buf, &[b"help
"]);
        assert_eq!(lines, vec!["help"]);
    }

    #[test]
    fn test_fill_from_discarding_spans_many_reads() {
        let mut buf = LineBuffer::new(4);
        let mut long: &[u8] = b"wxyz";
        assert!(buf.fill_from(&mut long).is_err());

        // Full-capacity reads while discarding are not new overflows.
        let lines = feed(&mut buf, &[b"1234", b"5678", b"9
ab", b"c
"]);

        assert_eq!(lines, vec!["abc"]);
    }

    #[test]
    fn test_fill_from_eof_returns_zero() {
        let mut buf = LineBuffer::new(16);
        let mut reader: &[u8] = b"";

        assert_eq!(buf.fill_from(&mut reader).unwrap(), 0);
        assert!(!buf.is_live());
    }

    #[test]
    fn test_fill_from_read_error_leaves_buffer_unchanged() {
        struct Failing;
        impl Read for Failing {
            fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::other("boom"))
            }
        }

        let mut buf = LineBuffer::new(16);
        let mut first: &[u8] = b"ab";
        buf.fill_from(&mut first).unwrap();

        let result = buf.fill_from(&mut Failing);

        assert!(matches!(result, Err(ReactorError::Read(_))));
        assert_eq!(buf.len(), 2);
    }
}
