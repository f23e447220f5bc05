//! Spectrum CSV Interchange
//!
//! Rows of `frame_id,frequency,magnitude`, grouped by frame.

use crate::error::FeatureError;
use crate::fft::{Spectrum, SpectrumPoint};
use signal_ingest::SourceUnit;
use std::io::{BufRead, Write};

/// Header of a spectrum table
pub const SPECTRUM_CSV_HEADER: &str = "frame_id,frequency,magnitude";

/// Write spectra as one row per bin
pub fn write_spectrum_csv<W: Write>(spectra: &[Spectrum], mut writer: W) -> Result<(), FeatureError> {
    writeln!(writer, "{}", SPECTRUM_CSV_HEADER)?;
    for spectrum in spectra {
        for point in &spectrum.points {
            writeln!(writer, "{},{},{}", spectrum.frame_id, point.frequency, point.magnitude)?;
        }
    }
    writer.flush()?;
    Ok(())
}

/// Read a spectrum table back into per-frame spectra of one unit.
///
/// Rows of one frame must be contiguous; frames keep file order.
pub fn read_spectrum_csv<R: BufRead>(reader: R, unit: &SourceUnit) -> Result<Vec<Spectrum>, FeatureError> {
    let mut spectra: Vec<Spectrum> = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || (index == 0 && line.starts_with("frame_id")) {
            continue;
        }

        let row = index + 1;
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        let [frame_id, frequency, magnitude] = fields.as_slice() else {
            return Err(FeatureError::InvalidRow {
                line: row,
                reason: format!("expected 3 columns, got {}", fields.len()),
            });
        };

        let frame_id: u64 = parse_field(frame_id, "frame_id", row)?;
        let point = SpectrumPoint {
            frequency: parse_field(frequency, "frequency", row)?,
            magnitude: parse_field(magnitude, "magnitude", row)?,
        };
        if !(point.magnitude >= 0.0) {
            return Err(FeatureError::InvalidRow {
                line: row,
                reason: format!("negative magnitude {}", point.magnitude),
            });
        }

        match spectra.last_mut() {
            Some(current) if current.frame_id == frame_id => current.points.push(point),
            _ => {
                if spectra.iter().any(|s| s.frame_id == frame_id) {
                    return Err(FeatureError::InvalidRow {
                        line: row,
                        reason: format!("frame {} is not contiguous", frame_id),
                    });
                }
                spectra.push(Spectrum {
                    frame_id,
                    source_unit: unit.clone(),
                    points: vec![point],
                });
            }
        }
    }

    Ok(spectra)
}

fn parse_field<T: std::str::FromStr>(text: &str, name: &str, line: usize) -> Result<T, FeatureError> {
    text.parse().map_err(|_| FeatureError::InvalidRow {
        line,
        reason: format!("bad {} '{}'", name, text),
    })
}
