//! Device Log Parser
//!
//! The acquisition side logs one JSON-ish fragment per reading. Packets can
//! arrive interleaved or truncated, so the log is scanned line by line for the
//! reading token rather than parsed as a document.

use crate::error::IngestError;
use crate::sanitizer::Sanitizer;
use crate::signal::Signal;
use std::io::BufRead;
use tracing::{debug, info};

/// Marker preceding each reading in a device log
pub const ANALOG_VALUE_TOKEN: &str = "analog_value\":";

/// Result of parsing a device log
#[derive(Debug, Clone)]
pub struct RawLogParse {
    /// Sanitized signal with synthesized timestamps
    pub signal: Signal,
    /// Readings replaced by the sanitizer
    pub substituted: usize,
    /// Lines carrying the token but no parseable number
    pub skipped: usize,
}

/// Parse a device log into a sanitized signal.
///
/// Timestamps are synthesized as `0, interval_ms, 2 * interval_ms, ...` since
/// the log carries no reliable clock.
pub fn parse_raw_log<R: BufRead>(
    reader: R,
    interval_ms: i64,
    sanitizer: &Sanitizer,
) -> Result<RawLogParse, IngestError> {
    let mut readings = Vec::new();
    let mut skipped = 0;

    for line in reader.lines() {
        let line = line?;
        let Some((_, rest)) = line.split_once(ANALOG_VALUE_TOKEN) else {
            continue;
        };
        match leading_number(rest) {
            Some(value) => readings.push(value),
            None => {
                skipped += 1;
                debug!("Skipping unparseable reading: {}", line.trim());
            }
        }
    }

    let sanitized = sanitizer.sanitize(&readings);
    let signal = Signal::from_values(&sanitized.values, interval_ms)?;

    info!(
        "Parsed {} readings ({} substituted, {} skipped)",
        signal.len(),
        sanitized.substituted,
        skipped
    );

    Ok(RawLogParse {
        signal,
        substituted: sanitized.substituted,
        skipped,
    })
}

/// First decimal number in `text`, ignoring leading spaces and quotes
fn leading_number(text: &str) -> Option<f64> {
    let trimmed = text.trim_start_matches(|c: char| c.is_whitespace() || c == '"');
    let end = trimmed
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || c == '.' || (i == 0 && (c == '-' || c == '+'))))
        .map(|(i, _)| i)
        .unwrap_or(trimmed.len());
    trimmed[..end].parse().ok()
}
