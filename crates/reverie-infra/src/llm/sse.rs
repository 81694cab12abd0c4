//! Incremental decoder for `text/event-stream` response bodies.
//!
//! Both provider adapters receive raw byte chunks from reqwest and feed
//! them through this decoder. Only `data:` lines matter; event names,
//! comments, and blank lines are ignored. Chunk boundaries can fall
//! anywhere, including mid-line, so a partial trailing line stays buffered
//! until its newline arrives.

/// Accumulates body bytes and yields complete `data:` payloads.
#[derive(Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one body chunk; returns the data payloads completed by it.
    ///
    /// Payloads are trimmed; empty payloads are dropped. Sentinel handling
    /// (`[DONE]`) is the caller's concern.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut payloads = Vec::new();
        while let Some(newline) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline).collect();
            let line = String::from_utf8_lossy(&line);
            let line = line.trim_end_matches(['\n', '\r']);
            let Some(payload) = line.strip_prefix("data:") else {
                continue;
            };
            let payload = payload.trim();
            if !payload.is_empty() {
                payloads.push(payload.to_string());
            }
        }
        payloads
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_complete_data_lines() {
        let mut decoder = SseDecoder::new();
        let payloads = decoder.feed(b"data: {\"a\":1}\n\ndata: {\"b\":2}\n");
        assert_eq!(payloads, vec!["{\"a\":1}", "{\"b\":2}"]);
    }

    #[test]
    fn buffers_partial_lines_across_chunks() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(b"data: {\"text\":\"hel").is_empty());
        let payloads = decoder.feed(b"lo\"}\n");
        assert_eq!(payloads, vec!["{\"text\":\"hello\"}"]);
    }

    #[test]
    fn ignores_non_data_lines() {
        let mut decoder = SseDecoder::new();
        let payloads = decoder.feed(b"event: ping\n: comment\nretry: 100\ndata: x\n");
        assert_eq!(payloads, vec!["x"]);
    }

    #[test]
    fn skips_empty_data_payloads() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(b"data:\ndata:   \n").is_empty());
    }

    #[test]
    fn strips_carriage_returns() {
        let mut decoder = SseDecoder::new();
        let payloads = decoder.feed(b"data: done\r\n");
        assert_eq!(payloads, vec!["done"]);
    }

    #[test]
    fn passes_done_sentinel_through() {
        let mut decoder = SseDecoder::new();
        let payloads = decoder.feed(b"data: [DONE]\n");
        assert_eq!(payloads, vec!["[DONE]"]);
    }
}
