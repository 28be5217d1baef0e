//! Secret wrapper for API keys and other sensitive values

use std::fmt;
use std::path::Path;
use zeroize::Zeroize;

use crate::error::{Error, Result};

/// Sensitive value - redacted in Debug/Display/logs, zeroed on drop
pub struct Secret<T: Zeroize>(T);

impl<T: Zeroize> Secret<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    /// Expose the inner value (use sparingly)
    pub fn expose(&self) -> &T {
        &self.0
    }
}

impl<T: Zeroize> fmt::Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl<T: Zeroize> fmt::Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl<T: Zeroize> Drop for Secret<T> {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl<T: Zeroize + Clone> Clone for Secret<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

/// Read a single secret from a file, trimming surrounding whitespace.
///
/// Returns `Ok(None)` when the file holds only whitespace, so callers can
/// treat blank secret files the same as unset environment variables.
pub fn read_secret_file(path: &Path) -> Result<Option<Secret<String>>> {
    let mut raw = std::fs::read_to_string(path).map_err(|source| Error::SecretFile {
        path: path.display().to_string(),
        source,
    })?;
    let trimmed = raw.trim().to_owned();
    raw.zeroize();
    if trimmed.is_empty() {
        return Ok(None);
    }
    Ok(Some(Secret::new(trimmed)))
}
