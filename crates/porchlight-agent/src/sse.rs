//! Incremental decoder for the Server-Sent-Events wire format.
//!
//! The agent reads the push channel as a raw byte stream, so frames can
//! arrive split across chunks or batched together. [`SseFrameDecoder`]
//! buffers bytes, reassembles lines, and yields one payload string per
//! completed event. Comment lines (the server's keepalives) and fields
//! other than `data:` are skipped.

/// Incremental SSE frame decoder.
///
/// Feed it raw chunks as they arrive; it returns the `data` payloads of
/// any events completed by that chunk. Multi-line `data:` fields are
/// joined with newlines per the SSE specification, and both `\n` and
/// `\r\n` line endings are accepted.
#[derive(Debug, Default)]
pub struct SseFrameDecoder {
    buffer: Vec<u8>,
    data_lines: Vec<String>,
}

impl SseFrameDecoder {
    /// Create an empty decoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of bytes, returning completed event payloads.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut payloads = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw);
            let line = line.trim_end_matches(['\n', '\r']);

            if line.is_empty() {
                // Blank line: dispatch the accumulated event, if any.
                if !self.data_lines.is_empty() {
                    payloads.push(self.data_lines.join("\n"));
                    self.data_lines.clear();
                }
            } else if line.starts_with(':') {
                // Comment line -- the keepalive. Nothing to do.
            } else if let Some(value) = line.strip_prefix("data:") {
                let value = value.strip_prefix(' ').unwrap_or(value);
                self.data_lines.push(value.to_owned());
            }
            // Other fields (event:, id:, retry:) are not used by the
            // counter protocol and are skipped.
        }

        payloads
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn decodes_a_single_event() {
        let mut decoder = SseFrameDecoder::new();
        let payloads = decoder.feed(b"data: {\"currentCount\":3}\n\n");
        assert_eq!(payloads, vec![String::from("{\"currentCount\":3}")]);
    }

    #[test]
    fn reassembles_events_split_across_chunks() {
        let mut decoder = SseFrameDecoder::new();
        assert!(decoder.feed(b"data: {\"currentC").is_empty());
        assert!(decoder.feed(b"ount\":7}\n").is_empty());
        let payloads = decoder.feed(b"\n");
        assert_eq!(payloads, vec![String::from("{\"currentCount\":7}")]);
    }

    #[test]
    fn decodes_batched_events_in_order() {
        let mut decoder = SseFrameDecoder::new();
        let payloads = decoder.feed(b"data: 1\n\ndata: 2\n\n");
        assert_eq!(payloads, vec![String::from("1"), String::from("2")]);
    }

    #[test]
    fn keepalive_comments_yield_nothing() {
        let mut decoder = SseFrameDecoder::new();
        assert!(decoder.feed(b":ping\n\n").is_empty());
        assert!(decoder.feed(b": ping\n\n").is_empty());
    }

    #[test]
    fn keepalive_between_events_does_not_split_them() {
        let mut decoder = SseFrameDecoder::new();
        let payloads = decoder.feed(b"data: a\n:ping\ndata: b\n\n");
        assert_eq!(payloads, vec![String::from("a\nb")]);
    }

    #[test]
    fn tolerates_crlf_line_endings() {
        let mut decoder = SseFrameDecoder::new();
        let payloads = decoder.feed(b"data: x\r\n\r\n");
        assert_eq!(payloads, vec![String::from("x")]);
    }

    #[test]
    fn data_without_space_after_colon() {
        let mut decoder = SseFrameDecoder::new();
        let payloads = decoder.feed(b"data:y\n\n");
        assert_eq!(payloads, vec![String::from("y")]);
    }

    #[test]
    fn unknown_fields_are_skipped() {
        let mut decoder = SseFrameDecoder::new();
        let payloads = decoder.feed(b"event: update\nid: 9\ndata: z\n\n");
        assert_eq!(payloads, vec![String::from("z")]);
    }
}
