//! Common types for the code review service

mod error;
mod secret;

pub use error::{Error, Result};
pub use secret::{Secret, read_secret_file};
