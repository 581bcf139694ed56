//! Newline framing for chunked model output.

/// Accumulates raw transport chunks into complete newline-terminated records.
///
/// Framing happens on bytes, so a multi-byte character split across two
/// chunks is only decoded once its record is complete.
#[derive(Debug, Default)]
pub struct LineBuffer {
    /// Bytes received after the last delimiter.
    pending: Vec<u8>,
}

impl LineBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return every record it completes, in order.
    ///
    /// The trailing unterminated segment stays buffered for the next call.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        if chunk.is_empty() {
            return Vec::new();
        }

        // Only the new bytes can hold a delimiter; pending never does.
        let scan_from = self.pending.len();
        self.pending.extend_from_slice(chunk);

        let mut records = Vec::new();
        let mut start = 0;
        let mut cursor = scan_from;
        while let Some(offset) = self.pending[cursor..].iter().position(|&b| b == b'\n') {
            let end = cursor + offset;
            records.push(decode_record(&self.pending[start..end]));
            start = end + 1;
            cursor = start;
        }

        if start > 0 {
            self.pending.drain(..start);
        }

        records
    }

    /// Surface the final unterminated record, if any. Call once at end-of-stream.
    pub fn flush(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.pending);
        Some(decode_record(&rest))
    }

    /// Number of buffered bytes not yet emitted.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

fn decode_record(bytes: &[u8]) -> String {
    let line = String::from_utf8_lossy(bytes);
    line.strip_suffix('\r').unwrap_or(&line).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_record_waits_for_delimiter() {
        let mut buffer = LineBuffer::new();
        assert!(buffer.feed(b"{\"response\":\"He").is_empty());
        assert_eq!(buffer.pending_len(), 15);

        let records = buffer.feed(b"llo\"}\n");
        assert_eq!(records, vec![r#"{"response":"Hello"}"#]);
        assert_eq!(buffer.pending_len(), 0);
    }

    #[test]
    fn test_multiple_records_in_one_chunk() {
        let mut buffer = LineBuffer::new();
        let records = buffer.feed(b"a\nb\nc");
        assert_eq!(records, vec!["a", "b"]);
        assert_eq!(buffer.flush().as_deref(), Some("c"));
    }

    #[test]
    fn test_empty_chunk_is_noop() {
        let mut buffer = LineBuffer::new();
        buffer.feed(b"abc");
        assert!(buffer.feed(b"").is_empty());
        assert_eq!(buffer.pending_len(), 3);
    }

    #[test]
    fn test_consecutive_delimiters_yield_empty_records() {
        let mut buffer = LineBuffer::new();
        assert_eq!(buffer.feed(b"x\n\n\ny\n"), vec!["x", "", "", "y"]);
    }

    #[test]
    fn test_flush_without_trailing_record() {
        let mut buffer = LineBuffer::new();
        buffer.feed(b"done\n");
        assert_eq!(buffer.flush(), None);
    }

    #[test]
    fn test_flush_is_single_shot() {
        let mut buffer = LineBuffer::new();
        buffer.feed(b"tail");
        assert_eq!(buffer.flush().as_deref(), Some("tail"));
        assert_eq!(buffer.flush(), None);
    }

    #[test]
    fn test_multibyte_char_split_across_chunks() {
        let text = "héllo\n".as_bytes();
        // 'é' is two bytes; split between them.
        let mut buffer = LineBuffer::new();
        assert!(buffer.feed(&text[..2]).is_empty());
        assert_eq!(buffer.feed(&text[2..]), vec!["héllo"]);
    }

    #[test]
    fn test_crlf_delimiters() {
        let mut buffer = LineBuffer::new();
        assert_eq!(buffer.feed(b"one\r\ntwo\r\n"), vec!["one", "two"]);
    }
}
