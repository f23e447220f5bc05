//! Range Sanitizer for Analog Readings

use crate::signal::Signal;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Band of plausible ADC readings: `lower < value <= upper`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidRange {
    /// Exclusive lower bound
    pub lower: f64,
    /// Inclusive upper bound
    pub upper: f64,
}

impl Default for ValidRange {
    fn default() -> Self {
        Self::for_adc_bits(12, 1000.0)
    }
}

impl ValidRange {
    pub fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    /// Range whose ceiling is the full scale of an ADC with the given resolution
    pub fn for_adc_bits(bits: u32, lower: f64) -> Self {
        Self {
            lower,
            upper: 2f64.powi(bits as i32),
        }
    }

    /// Whether a reading falls inside the band
    pub fn contains(&self, value: f64) -> bool {
        value > self.lower && value <= self.upper
    }
}

/// Output of sanitizing a sequence
#[derive(Debug, Clone, PartialEq)]
pub struct Sanitized {
    /// Accepted values, same length as the input
    pub values: Vec<f64>,
    /// Number of readings replaced
    pub substituted: usize,
}

/// Replaces out-of-band readings with the last accepted value
#[derive(Debug, Clone, Copy, Default)]
pub struct Sanitizer {
    range: ValidRange,
}

impl Sanitizer {
    pub fn new(range: ValidRange) -> Self {
        Self { range }
    }

    /// Configured band
    pub fn range(&self) -> ValidRange {
        self.range
    }

    /// Accept a single reading given the previously accepted one.
    ///
    /// Out-of-band readings (including NaN) become `previous`, or 0.0 when
    /// there is none. Never fails.
    pub fn accept(&self, value: f64, previous: Option<f64>) -> f64 {
        if self.range.contains(value) {
            value
        } else {
            previous.unwrap_or(0.0)
        }
    }

    /// Sanitize a whole sequence in order
    pub fn sanitize(&self, values: &[f64]) -> Sanitized {
        let mut accepted = Vec::with_capacity(values.len());
        let mut substituted = 0;
        let mut previous = None;

        for &value in values {
            if !self.range.contains(value) {
                substituted += 1;
            }
            let out = self.accept(value, previous);
            accepted.push(out);
            previous = Some(out);
        }

        if substituted > 0 {
            debug!(
                "Sanitizer replaced {} of {} readings outside ({}, {}]",
                substituted,
                values.len(),
                self.range.lower,
                self.range.upper
            );
        }

        Sanitized {
            values: accepted,
            substituted,
        }
    }

    /// Sanitize a signal's values, keeping its timestamps
    pub fn sanitize_signal(&self, signal: &Signal) -> (Signal, usize) {
        let values: Vec<f64> = signal.values().collect();
        let sanitized = self.sanitize(&values);
        (signal.with_values(&sanitized.values), sanitized.substituted)
    }
}
