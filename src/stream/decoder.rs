//! Event-stream record decoder
//!
//! The translation stream arrives as raw bytes in arbitrarily sized
//! fragments. Records are delimited by a blank line (`\n\n`, or `\n\r\n`
//! from CRLF-framing backends); within a record an `event:` line names the
//! type and one or more `data:` lines carry the payload. The decoder buffers incomplete
//! trailing fragments across reads and only emits complete records — one
//! read is never assumed to be one event, and a multi-byte UTF-8 sequence
//! split across fragments survives because splitting happens on newline
//! bytes only.

/// One complete, still-unparsed event record.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEvent {
    /// Event type from the `event:` field; `message` when absent.
    pub event: String,
    /// Payload from the `data:` field(s), multiple lines joined with `\n`.
    pub data: String,
}

/// Buffering decoder for blank-line-delimited event records.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buf: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one transport fragment, returning every record it completes.
    pub fn push(&mut self, fragment: &[u8]) -> Vec<RawEvent> {
        self.buf.extend_from_slice(fragment);

        let mut events = Vec::new();
        while let Some((end, delim_len)) = find_record_end(&self.buf) {
            let record: Vec<u8> = self.buf.drain(..end + delim_len).collect();
            if let Some(event) = parse_record(&record[..end]) {
                events.push(event);
            }
        }
        events
    }

    /// Flush a trailing record that was never terminated by a blank line
    /// (stream ended mid-record). Used at end of stream.
    pub fn finish(&mut self) -> Option<RawEvent> {
        let rest = std::mem::take(&mut self.buf);
        parse_record(&rest)
    }
}

/// Offset and length of the first record delimiter: an empty line, either
/// `\n\n` or the CRLF-framed `\n\r\n`. A trailing `\n\r` is left buffered —
/// the closing `\n` may still be in flight.
fn find_record_end(buf: &[u8]) -> Option<(usize, usize)> {
    for (i, &byte) in buf.iter().enumerate() {
        if byte != b'\n' {
            continue;
        }
        match buf.get(i + 1) {
            Some(b'\n') => return Some((i, 2)),
            Some(b'\r') if buf.get(i + 2) == Some(&b'\n') => return Some((i, 3)),
            _ => {}
        }
    }
    None
}

/// Parse the field lines of one record. Returns None for empty records and
/// comment-only records (lines starting with `:` are keep-alives).
fn parse_record(record: &[u8]) -> Option<RawEvent> {
    let text = String::from_utf8_lossy(record);

    let mut event: Option<String> = None;
    let mut data_lines: Vec<&str> = Vec::new();

    for line in text.lines() {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.is_empty() || line.starts_with(':') {
            continue;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "event" => event = Some(value.to_string()),
            "data" => data_lines.push(value),
            // Unknown fields (id, retry) are ignored.
            _ => {}
        }
    }

    if event.is_none() && data_lines.is_empty() {
        return None;
    }
    Some(RawEvent {
        event: event.unwrap_or_else(|| "message".to_string()),
        data: data_lines.join("\n"),
    })
}
