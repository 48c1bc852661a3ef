pub mod access;
pub mod error;
pub mod interest;
pub mod models;
pub mod status;
pub mod types;

#[cfg(feature = "portfolio")]
pub mod portfolio;

#[cfg(feature = "reports")]
pub mod reports;

pub use error::LendingError;
pub use types::*;

/// Standard result type for all lending operations
pub type LendingResult<T> = Result<T, LendingError>;
