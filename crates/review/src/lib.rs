//! Code review pipeline
//!
//! Builds an audit prompt for a code snippet, runs it through the resilient
//! generator and recovers a typed `ReviewResult` from the model's text. The
//! model is asked for bare JSON but often wraps it in a fenced block or adds
//! prose, so extraction tolerates both; it defends syntax only and trusts the
//! model for content.

pub mod error;
pub mod extract;
pub mod prompt;
pub mod reviewer;
pub mod types;

pub use error::{ExtractionError, ReviewError};
pub use extract::{clean_response, extract};
pub use prompt::{DEFAULT_LANGUAGE, build_review_prompt};
pub use reviewer::Reviewer;
pub use types::ReviewResult;
