//! Result type alias for harness operations

use crate::error::ParityError;

/// Standard Result type for harness operations
pub type Result<T> = std::result::Result<T, ParityError>;
