//! Booking aggregate
//!
//! Contains the Booking entity, the stay interval it occupies, and the
//! repository interface.

pub mod model;
pub mod repository;
pub mod stay;

pub use model::{
    Booking, BookingCandidate, BookingId, ConflictFilter, RejectionReason, Verdict,
};
pub use repository::BookingRepository;
pub use stay::Stay;
