pub mod error;
pub mod rates;
pub mod regulations;
pub mod simulation;
pub mod tables;
pub mod types;

#[cfg(feature = "comparison")]
pub mod comparison;

#[cfg(feature = "withdrawal")]
pub mod withdrawal;

pub use error::ProvidentError;
pub use types::*;

/// Standard result type for all engine operations
pub type ProvidentResult<T> = Result<T, ProvidentError>;
