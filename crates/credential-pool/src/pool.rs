//! Credential rotator: ordered key pool and shared rotation cursor
//!
//! The pool is fixed at construction. The cursor is process-wide: every
//! in-flight request sees the same "current" credential, and a rotation made
//! by one request is visible to all others. The cursor sits behind a mutex so
//! the read-then-advance pair in `rotate` can never produce an out-of-range
//! index under concurrent use.

use std::sync::{Mutex, MutexGuard};

use common::Secret;
use tracing::{debug, info};

use crate::error::{Error, Result};

/// One API key plus a non-secret label for logs.
#[derive(Debug, Clone)]
pub struct Credential {
    pub label: String,
    pub key: Secret<String>,
}

impl Credential {
    pub fn new(label: impl Into<String>, key: Secret<String>) -> Self {
        Self {
            label: label.into(),
            key,
        }
    }
}

/// Ordered, non-empty credential pool with a wrapping cursor.
///
/// Shared via `Arc` between the generator and anything that reports on it
/// (health endpoint). Tests build isolated instances.
#[derive(Debug)]
pub struct CredentialRotator {
    credentials: Vec<Credential>,
    cursor: Mutex<usize>,
}

impl CredentialRotator {
    /// Build a rotator over `credentials`, cursor at the first entry.
    ///
    /// Fails with `NoCredentialsConfigured` if the list is empty; callers treat
    /// that as fatal at startup.
    pub fn new(credentials: Vec<Credential>) -> Result<Self> {
        if credentials.is_empty() {
            return Err(Error::NoCredentialsConfigured);
        }
        info!(credentials = credentials.len(), "credential pool initialized");
        Ok(Self {
            credentials,
            cursor: Mutex::new(0),
        })
    }

    /// Number of credentials in the pool.
    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }

    /// Current cursor position.
    pub fn position(&self) -> usize {
        *self.lock_cursor()
    }

    /// Labels in pool order, for health reporting.
    pub fn labels(&self) -> Vec<&str> {
        self.credentials.iter().map(|c| c.label.as_str()).collect()
    }

    /// The credential at the cursor. No side effects.
    pub fn current(&self) -> Result<Credential> {
        let cursor = self.lock_cursor();
        self.credentials
            .get(*cursor)
            .cloned()
            .ok_or(Error::EmptyPool)
    }

    /// Advance the cursor by one (wrapping) and return the new current credential.
    pub fn rotate(&self) -> Result<Credential> {
        let n = self.credentials.len();
        if n == 0 {
            return Err(Error::EmptyPool);
        }
        let mut cursor = self.lock_cursor();
        let from = *cursor;
        *cursor = (from + 1) % n;
        let next = &self.credentials[*cursor];
        debug!(
            from = self.credentials[from].label.as_str(),
            to = next.label.as_str(),
            "rotated credential"
        );
        Ok(next.clone())
    }

    /// A poisoned cursor still holds a valid index (it is only ever written
    /// with a value reduced modulo the pool length), so recover the guard.
    fn lock_cursor(&self) -> MutexGuard<'_, usize> {
        self.cursor
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
