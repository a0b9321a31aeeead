pub mod booking;
pub mod repositories;

// Re-export commonly used types
pub use booking::{
    Booking, BookingCandidate, BookingId, BookingRepository, ConflictFilter, RejectionReason,
    Stay, Verdict,
};
pub use repositories::{DomainResult, RepositoryProvider};

// Re-export DomainError from shared for convenience
pub use crate::shared::errors::DomainError;
