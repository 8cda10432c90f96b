//! Foundation types shared across the domain.
//!
//! Value objects with no billing-specific behavior: identifiers, timestamps,
//! and the error vocabulary used by every layer above.

mod errors;
mod ids;
mod timestamp;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{EarningId, PromoCodeId, UserId};
pub use timestamp::Timestamp;
