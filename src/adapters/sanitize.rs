//! Log sanitization for patient answers and credentials.
//!
//! Formatted log lines pass through [`SanitizingMakeWriter`] before reaching
//! the sink. It redacts:
//! - Patient field values keyed by their wire or Rust names
//!   (`"ap_hi":142`, `weight=70`, `systolic_pressure: 150.0`)
//! - Bearer tokens
//! - E-mail addresses
//!
//! Prefer not logging records at all; this catches what slips through
//! `Debug` output of requests and records.
//!
//! Input is capped at `CARDIORISK_SANITIZE_MAX_BYTES` (16 KiB default) per
//! call.

use regex::Regex;
use std::sync::OnceLock;
use tracing_subscriber::fmt::MakeWriter;

use crate::domain::Field;

static PATTERNS: OnceLock<Vec<Redaction>> = OnceLock::new();

const DEFAULT_SANITIZE_MAX_BYTES: usize = 16 * 1024;

struct Redaction {
    regex: Regex,
    replacement: &'static str,
}

fn truncate_to_char_boundary(input: &str, max_bytes: usize) -> (&str, bool) {
    if input.len() <= max_bytes {
        return (input, false);
    }

    let mut end = max_bytes.min(input.len());
    while end > 0 && !input.is_char_boundary(end) {
        end -= 1;
    }
    (&input[..end], true)
}

fn max_sanitize_bytes() -> usize {
    std::env::var("CARDIORISK_SANITIZE_MAX_BYTES")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|&v| v > 0)
        .unwrap_or(DEFAULT_SANITIZE_MAX_BYTES)
}

/// Field names as they can appear in logs: wire names and Rust field names.
fn field_name_alternation() -> String {
    let mut names: Vec<&'static str> = Field::ALL.iter().map(|f| f.wire_name()).collect();
    names.extend([
        "systolic_pressure",
        "diastolic_pressure",
        "glucose",
        "smoker",
        "alcohol_use",
        "physically_active",
    ]);
    names.join("|")
}

fn patterns() -> &'static [Redaction] {
    PATTERNS.get_or_init(|| {
        let names = field_name_alternation();
        vec![
            Redaction {
                // Keep the key and separator, drop the number.
                regex: Regex::new(&format!(
                    r#"(?P<key>"?\b(?:{names})\b"?\s*[:=]\s*)-?\d+(?:\.\d+)?"#
                ))
                .expect("Valid regex"),
                replacement: "${key}[REDACTED]",
            },
            Redaction {
                regex: Regex::new(r"(?i)\bbearer\s+[A-Za-z0-9._~+/=-]{8,}").expect("Valid regex"),
                replacement: "Bearer [REDACTED-TOKEN]",
            },
            Redaction {
                regex: Regex::new(
                    r"(?i)\b[a-z0-9](?:[a-z0-9._%+-]{0,62}[a-z0-9])?@(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,}\b",
                )
                .expect("Valid regex"),
                replacement: "[REDACTED-EMAIL]",
            },
        ]
    })
}

/// Sanitize a string by redacting patient values and credentials.
#[must_use]
pub fn sanitize(input: &str) -> String {
    sanitize_with_limit(input, max_sanitize_bytes())
}

fn sanitize_with_limit(input: &str, max_bytes: usize) -> String {
    let (prefix, truncated) = truncate_to_char_boundary(input, max_bytes);

    let mut result = prefix.to_string();
    for pattern in patterns() {
        if pattern.regex.is_match(&result) {
            result = pattern
                .regex
                .replace_all(&result, pattern.replacement)
                .into_owned();
        }
    }

    if truncated {
        result.push_str(" [TRUNCATED]");
    }
    result
}

/// A `tracing_subscriber` writer wrapper that sanitizes formatted log output
/// line by line before it is written to the underlying sink.
#[derive(Debug)]
pub struct SanitizingMakeWriter<M> {
    inner: M,
}

impl<M> SanitizingMakeWriter<M> {
    #[must_use]
    pub fn new(inner: M) -> Self {
        Self { inner }
    }
}

impl<M> Clone for SanitizingMakeWriter<M>
where
    M: Clone,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

pub struct SanitizingWriter<W> {
    inner: W,
    buffer: Vec<u8>,
}

impl<W> SanitizingWriter<W>
where
    W: std::io::Write,
{
    fn new(inner: W) -> Self {
        Self {
            inner,
            buffer: Vec::new(),
        }
    }

    fn flush_lines(&mut self) -> std::io::Result<()> {
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let sanitized = sanitize(&String::from_utf8_lossy(&line));
            self.inner.write_all(sanitized.as_bytes())?;
        }
        Ok(())
    }
}

impl<W> std::io::Write for SanitizingWriter<W>
where
    W: std::io::Write,
{
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.extend_from_slice(buf);

        // A huge line without newlines is flushed early rather than buffered forever.
        let hard_cap = max_sanitize_bytes().saturating_mul(2);
        if self.buffer.len() > hard_cap {
            let sanitized = sanitize(&String::from_utf8_lossy(&self.buffer));
            self.inner.write_all(sanitized.as_bytes())?;
            self.inner.write_all(b"\n")?;
            self.buffer.clear();
            return Ok(buf.len());
        }

        self.flush_lines()?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_lines()?;

        if !self.buffer.is_empty() {
            let sanitized = sanitize(&String::from_utf8_lossy(&self.buffer));
            self.inner.write_all(sanitized.as_bytes())?;
            self.buffer.clear();
        }

        self.inner.flush()
    }
}

impl<'a, M> MakeWriter<'a> for SanitizingMakeWriter<M>
where
    M: MakeWriter<'a>,
{
    type Writer = SanitizingWriter<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        SanitizingWriter::new(self.inner.make_writer())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_sanitize_json_record() {
        let input = r#"body={"age":54,"ap_hi":142,"weight":81.5,"smoke":1}"#;
        let sanitized = sanitize(input);
        assert_eq!(
            sanitized,
            r#"body={"age":[REDACTED],"ap_hi":[REDACTED],"weight":[REDACTED],"smoke":[REDACTED]}"#
        );
    }

    #[test]
    fn test_sanitize_debug_record() {
        let input = "PatientRecord { age: 54.0, systolic_pressure: 150.0, physically_active: 1.0 }";
        let sanitized = sanitize(input);
        assert!(!sanitized.contains("150"));
        assert!(!sanitized.contains("54.0"));
        assert!(sanitized.contains("systolic_pressure: [REDACTED]"));
    }

    #[test]
    fn test_leaves_ordinary_text_alone() {
        let input = "Simulation request S3#12 issued after 500 ms";
        assert_eq!(sanitize(input), input);
    }

    #[test]
    fn test_sanitize_bearer_and_email() {
        let sanitized = sanitize("Authorization: Bearer abcdef0123456789 from ops@example.com");
        assert!(sanitized.contains("Bearer [REDACTED-TOKEN]"));
        assert!(sanitized.contains("[REDACTED-EMAIL]"));
        assert!(!sanitized.contains("abcdef0123456789"));
    }

    #[test]
    fn test_sanitize_truncates_large_inputs() {
        let input = "weight=70 and a long tail of text";
        let sanitized = sanitize_with_limit(input, 12);
        assert!(sanitized.ends_with("[TRUNCATED]"));
        assert!(!sanitized.contains("70"));
    }

    #[test]
    fn test_writer_sanitizes_per_line() {
        let mut sink = Vec::new();
        {
            let mut writer = SanitizingWriter::new(&mut sink);
            writer.write_all(b"first ap_lo=85\nsecond ").expect("write");
            writer.write_all(b"gluc: 2\n").expect("write");
            writer.flush().expect("flush");
        }
        let out = String::from_utf8(sink).expect("utf8");
        assert_eq!(out, "first ap_lo=[REDACTED]\nsecond gluc: [REDACTED]\n");
    }

    #[test]
    fn test_writer_flush_drains_partial_line() {
        let mut sink = Vec::new();
        let mut writer = SanitizingWriter::new(&mut sink);
        writer.write_all(b"tail height=172").expect("Should buffer the write");
        writer.flush().expect("Should flush the partial line");
        drop(writer);

        let out = String::from_utf8(sink).expect("Should be valid UTF-8");
        assert_eq!(out, "tail height=[REDACTED]");
    }
}
