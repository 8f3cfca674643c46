//! Incremental decoder for `text/event-stream` bodies.
//!
//! Bytes arrive in arbitrary chunks; an event is complete at a blank line.
//! Only `data:` fields matter for the streaming generation endpoint, so
//! each completed event yields its joined data lines.
//!
//! Lines are buffered as bytes and decoded only once complete, so a
//! multi-byte character split across chunks survives intact.

#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and return the data of every event it completed.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(newline) = self.buffer.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=newline).collect();
            let line = String::from_utf8_lossy(&raw);
            let line = line.trim_end_matches(['\n', '\r']);

            if line.is_empty() {
                if !self.data.is_empty() {
                    events.push(self.data.join("\n"));
                    self.data.clear();
                }
            } else if let Some(value) = line.strip_prefix("data:") {
                self.data.push(value.strip_prefix(' ').unwrap_or(value).to_string());
            }
        }
        events
    }

    /// Flush an event left open when the stream ended without a blank line.
    pub fn finish(&mut self) -> Option<String> {
        let tail = String::from_utf8_lossy(&self.buffer).into_owned();
        if let Some(value) = tail.trim_end().strip_prefix("data:") {
            self.data.push(value.trim_start().to_string());
        }
        self.buffer.clear();

        if self.data.is_empty() {
            None
        } else {
            let event = self.data.join("\n");
            self.data.clear();
            Some(event)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_split_across_chunks() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(b"data: {\"a\":").is_empty());
        assert_eq!(
            decoder.feed(b"1}\n\ndata: {\"b\":2}\r\n\r\n"),
            vec!["{\"a\":1}", "{\"b\":2}"]
        );
        assert!(decoder.finish().is_none());
    }

    #[test]
    fn test_ignores_comments_and_other_fields() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed(b": keep-alive\nevent: message\nid: 7\ndata: x\n\n");
        assert_eq!(events, vec!["x"]);
    }

    #[test]
    fn test_multiline_data_and_unterminated_tail() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(b"data: one\ndata: two\n").is_empty());
        assert!(decoder.feed(b"data: three").is_empty());
        assert_eq!(decoder.finish().as_deref(), Some("one\ntwo\nthree"));
    }

    #[test]
    fn test_multibyte_character_split_across_chunks() {
        let bytes = "data: Chiefs \u{2014} Raiders\n\n".as_bytes();
        let dash = bytes
            .iter()
            .position(|b| *b == 0xE2)
            .expect("em dash lead byte");

        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(&bytes[..=dash]).is_empty());
        assert_eq!(decoder.feed(&bytes[dash + 1..]), vec!["Chiefs \u{2014} Raiders"]);
    }

    #[test]
    fn test_unterminated_tail_with_split_character() {
        let bytes = "data: Jos\u{e9}".as_bytes();
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(&bytes[..bytes.len() - 1]).is_empty());
        assert!(decoder.feed(&bytes[bytes.len() - 1..]).is_empty());
        assert_eq!(decoder.finish().as_deref(), Some("Jos\u{e9}"));
    }
}
