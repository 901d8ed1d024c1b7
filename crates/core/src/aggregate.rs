//! Rolling statistics derived from a window snapshot.
//!
//! Everything here is a pure function of the readings it is handed; nothing
//! is cached between calls.

use serde::Serialize;

use crate::state::Reading;

/// Statistics over one window. Every field is `None` for an empty window.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Aggregates {
    pub current: Option<f64>,
    pub min:     Option<f64>,
    pub max:     Option<f64>,
    pub average: Option<f64>,
}

impl Aggregates {
    pub fn compute(window: &[Reading]) -> Self {
        Self {
            current: current(window),
            min:     min(window),
            max:     max(window),
            average: average(window),
        }
    }
}

/// Value of the newest reading.
pub fn current(window: &[Reading]) -> Option<f64> {
    window.first().map(Reading::value)
}

pub fn min(window: &[Reading]) -> Option<f64> {
    window.iter().map(Reading::value).reduce(f64::min)
}

pub fn max(window: &[Reading]) -> Option<f64> {
    window.iter().map(Reading::value).reduce(f64::max)
}

/// Arithmetic mean. The window is small, so plain summation is enough.
pub fn average(window: &[Reading]) -> Option<f64> {
    if window.is_empty() {
        return None;
    }
    let sum: f64 = window.iter().map(Reading::value).sum();
    Some(sum / window.len() as f64)
}
