//! Credential pool for the remote generation capability
//!
//! Holds an ordered, immutable pool of API keys behind a shared rotation cursor
//! and runs generation attempts against it. Capacity failures (rate limit or
//! overload) rotate to the next key and retry immediately; any other failure
//! stops the call.
//!
//! Request lifecycle:
//! 1. `ResilientGenerator::generate` reads the rotator's current key
//! 2. The prompt is submitted through the `TextGenerator` with a per-attempt timeout
//! 3. Text → return it
//! 4. Error carrying "429"/"503" → `rotate()` and try the next key
//! 5. Any other error → return it unchanged, cursor untouched
//! 6. One full cycle of capacity failures → `AllCredentialsExhausted`

pub mod error;
pub mod generate;
pub mod pool;
pub mod quota;

pub use error::{Error, GenerationError, Result};
pub use generate::ResilientGenerator;
pub use pool::{Credential, CredentialRotator};
pub use quota::classify_error;
