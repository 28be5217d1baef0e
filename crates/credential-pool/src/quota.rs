//! Capacity detection for generation errors
//!
//! The remote capability only hands back a human-readable description, so
//! capacity exhaustion is detected by substring: a rate-limit "429" or an
//! overload "503" anywhere in the description. This is the single place that
//! decides rotate-vs-stop; swap it for a structured status check if the
//! capability ever exposes one.

use provider::ErrorClassification;

/// Markers of capacity exhaustion in an error description.
const CAPACITY_MARKERS: &[&str] = &["429", "503"];

/// Classify an error description as a capacity failure or a fatal one.
pub fn classify_error(description: &str) -> ErrorClassification {
    if CAPACITY_MARKERS
        .iter()
        .any(|marker| description.contains(marker))
    {
        ErrorClassification::Capacity
    } else {
        ErrorClassification::Fatal
    }
}
