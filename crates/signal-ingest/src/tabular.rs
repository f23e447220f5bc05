//! Signal CSV Interchange

use crate::error::IngestError;
use crate::signal::{RawSample, Signal};
use std::io::{BufRead, Write};

/// Header of a time-domain signal table
pub const SIGNAL_CSV_HEADER: &str = "timestamp,analog_value";

/// Read `timestamp,analog_value` rows into a signal.
///
/// A header row is optional; blank lines are ignored. Extra columns (such as
/// a label column written by older tooling) are ignored.
pub fn read_signal_csv<R: BufRead>(reader: R) -> Result<Signal, IngestError> {
    let mut samples = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if index == 0 && line.starts_with("timestamp") {
            continue;
        }

        let mut columns = line.split(',');
        let (Some(ts), Some(value)) = (columns.next(), columns.next()) else {
            return Err(IngestError::InvalidRow {
                line: index + 1,
                reason: "expected timestamp and analog_value columns".to_string(),
            });
        };

        let timestamp_ms = parse_timestamp(ts.trim()).ok_or_else(|| IngestError::InvalidRow {
            line: index + 1,
            reason: format!("bad timestamp '{}'", ts),
        })?;
        let value: f64 = value.trim().parse().map_err(|_| IngestError::InvalidRow {
            line: index + 1,
            reason: format!("bad analog_value '{}'", value),
        })?;

        samples.push(RawSample::new(timestamp_ms, value));
    }

    Signal::new(samples)
}

/// Write a signal as `timestamp,analog_value` rows with a header
pub fn write_signal_csv<W: Write>(signal: &Signal, mut writer: W) -> Result<(), IngestError> {
    writeln!(writer, "{}", SIGNAL_CSV_HEADER)?;
    for sample in signal.samples() {
        writeln!(writer, "{},{}", sample.timestamp_ms, sample.value)?;
    }
    writer.flush()?;
    Ok(())
}

/// Integer milliseconds; tolerates a float rendering such as `28.0`
fn parse_timestamp(text: &str) -> Option<i64> {
    text.parse::<i64>().ok().or_else(|| {
        let value: f64 = text.parse().ok()?;
        (value.fract() == 0.0 && value.is_finite()).then_some(value as i64)
    })
}
