//! Log sanitization for patient data and secrets.
//!
//! Two layers:
//! - [`Redacted<T>`]: a wrapper whose `Debug`/`Display` never print the inner
//!   value. Use it for anything that carries patient measurements.
//! - [`SanitizingMakeWriter`]: a `tracing_subscriber` writer that scrubs each
//!   formatted line before it reaches the sink, catching what slipped through.
//!
//! The regex set is small and linear-time; input is capped at
//! `HEARTCHECK_SANITIZE_MAX_BYTES` (default 16 KiB) per line.

use std::fmt;
use std::sync::OnceLock;

use regex::{Regex, RegexSet};
use tracing_subscriber::fmt::MakeWriter;

const DEFAULT_SANITIZE_MAX_BYTES: usize = 16 * 1024;

static RULES: OnceLock<Rules> = OnceLock::new();

struct Rules {
    set: RegexSet,
    patterns: Vec<(Regex, &'static str)>,
}

const RULE_TABLE: &[(&str, &str)] = &[
    // Clinical measurements with units, e.g. "weight=82.5kg", "cholesterol 240 mg/dL"
    (
        r"(?i)\b\d{1,3}(?:\.\d+)?\s?(?:kg|cm|mg/dl)\b",
        "[REDACTED-MEASUREMENT]",
    ),
    // Email addresses
    (
        r"(?i)\b[a-z0-9](?:[a-z0-9._%+-]{0,62}[a-z0-9])?@(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,}\b",
        "[REDACTED-EMAIL]",
    ),
    // Phone numbers, international or local
    (
        r"\+?\d{1,3}[-.\s]?\(?\d{2,4}\)?[-.\s]?\d{3,4}[-.\s]?\d{3,4}\b",
        "[REDACTED-PHONE]",
    ),
    // key=value secrets
    (
        r"(?i)\b(?:api[_-]?key|secret|password|token|seed|private[_-]?key)\b\s*[:=]\s*[A-Za-z0-9+/_-]{16,}={0,2}",
        "[REDACTED-SECRET]",
    ),
    // Bare base64 blobs long enough to be a 32-byte key or signature
    (r"\b[A-Za-z0-9+/]{43,}={0,2}", "[REDACTED-KEY]"),
];

fn rules() -> &'static Rules {
    RULES.get_or_init(|| {
        let set = RegexSet::new(RULE_TABLE.iter().map(|(p, _)| *p)).expect("valid regex set");
        let patterns = RULE_TABLE
            .iter()
            .map(|(p, r)| (Regex::new(p).expect("valid regex"), *r))
            .collect();
        Rules { set, patterns }
    })
}

fn max_sanitize_bytes() -> usize {
    std::env::var("HEARTCHECK_SANITIZE_MAX_BYTES")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|&v| v > 0)
        .unwrap_or(DEFAULT_SANITIZE_MAX_BYTES)
}

fn truncate_to_char_boundary(input: &str, max_bytes: usize) -> (&str, bool) {
    if input.len() <= max_bytes {
        return (input, false);
    }
    let mut end = max_bytes;
    while end > 0 && !input.is_char_boundary(end) {
        end -= 1;
    }
    (&input[..end], true)
}

/// Replace every sensitive match in `input`.
#[must_use]
pub fn sanitize(input: &str) -> String {
    sanitize_with_limit(input, max_sanitize_bytes())
}

fn sanitize_with_limit(input: &str, max_bytes: usize) -> String {
    let rules = rules();
    let (prefix, truncated) = truncate_to_char_boundary(input, max_bytes);

    let mut out = prefix.to_string();
    for idx in rules.set.matches(prefix).iter() {
        let (regex, replacement) = &rules.patterns[idx];
        out = regex.replace_all(&out, *replacement).into_owned();
    }
    if truncated {
        out.push_str(" [TRUNCATED]");
        if input.ends_with('\n') {
            out.push('\n');
        }
    }
    out
}

#[must_use]
pub fn contains_sensitive(input: &str) -> bool {
    let (prefix, _) = truncate_to_char_boundary(input, max_sanitize_bytes());
    rules().set.is_match(prefix)
}

/// Wrapper that hides its value from `Debug` and `Display`.
#[derive(Clone, Copy, PartialEq)]
pub struct Redacted<T>(pub T);

impl<T> Redacted<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Debug for Redacted<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl<T> fmt::Display for Redacted<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// `MakeWriter` that sanitizes formatted log output line by line.
#[derive(Debug, Clone)]
pub struct SanitizingMakeWriter<M> {
    inner: M,
}

impl<M> SanitizingMakeWriter<M> {
    #[must_use]
    pub fn new(inner: M) -> Self {
        Self { inner }
    }
}

pub struct SanitizingWriter<W> {
    inner: W,
    buffer: Vec<u8>,
}

impl<W: std::io::Write> SanitizingWriter<W> {
    fn write_sanitized(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        let text = String::from_utf8_lossy(bytes);
        self.inner.write_all(sanitize(&text).as_bytes())
    }

    fn flush_lines(&mut self) -> std::io::Result<()> {
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            self.write_sanitized(&line)?;
        }
        Ok(())
    }
}

impl<W: std::io::Write> std::io::Write for SanitizingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.extend_from_slice(buf);

        // A line with no newline cannot grow without bound.
        if self.buffer.len() > max_sanitize_bytes().saturating_mul(2) {
            let pending = std::mem::take(&mut self.buffer);
            self.write_sanitized(&pending)?;
            self.inner.write_all(b"\n")?;
            return Ok(buf.len());
        }

        self.flush_lines()?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_lines()?;
        if !self.buffer.is_empty() {
            let pending = std::mem::take(&mut self.buffer);
            self.write_sanitized(&pending)?;
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
        SanitizingWriter {
            inner: self.inner.make_writer(),
            buffer: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_sanitize_measurements() {
        let out = sanitize("patient weight 82.5 kg, cholesterol 240mg/dL");
        assert!(!out.contains("82.5"));
        assert!(!out.contains("240"));
        assert_eq!(out.matches("[REDACTED-MEASUREMENT]").count(), 2);
    }

    #[test]
    fn test_sanitize_email() {
        let out = sanitize("contact: patient@clinic.example.org");
        assert!(out.contains("[REDACTED-EMAIL]"));
    }

    #[test]
    fn test_sanitize_secret() {
        let out = sanitize("seed=QWxhZGRpbjpvcGVuIHNlc2FtZSB3aXRo");
        assert!(out.contains("[REDACTED-SECRET]"));
    }

    #[test]
    fn test_sanitize_public_key_blob() {
        let blob = format!("3q2+7w{}=", "A".repeat(37));
        let out = sanitize(&format!("pubkey {blob} loaded"));
        assert!(out.contains("[REDACTED-KEY]"));
    }

    #[test]
    fn test_plain_text_untouched() {
        let line = "Loaded random_forest model (schema=metabolic, n_features=13)";
        assert!(!contains_sensitive(line));
        assert_eq!(sanitize(line), line);
    }

    #[test]
    fn test_truncation() {
        let out = sanitize_with_limit("abcdefghijklmnop", 4);
        assert_eq!(out, "abcd [TRUNCATED]");
    }

    #[test]
    fn test_truncation_keeps_line_break() {
        let line = "a ".repeat(9000) + "\n";
        let out = sanitize_with_limit(&line, 16 * 1024);
        assert!(out.ends_with(" [TRUNCATED]\n"));
        assert_eq!(out.matches('\n').count(), 1);
    }

    #[test]
    fn test_redacted_hides_value() {
        let secret = Redacted(123.4_f64);
        assert_eq!(format!("{secret:?}"), "[REDACTED]");
        assert_eq!(format!("{secret}"), "[REDACTED]");
        assert!((secret.into_inner() - 123.4).abs() < f64::EPSILON);
    }

    #[test]
    fn test_writer_sanitizes_per_line() {
        let mut sink = Vec::new();
        {
            let mut writer = SanitizingWriter {
                inner: &mut sink,
                buffer: Vec::new(),
            };
            writer.write_all(b"waist 104 cm\npartial").expect("write");
            writer.flush().expect("flush");
        }
        let text = String::from_utf8(sink).expect("utf8");
        assert_eq!(text, "waist [REDACTED-MEASUREMENT]\npartial");
    }
}
