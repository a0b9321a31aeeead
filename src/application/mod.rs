pub mod booking;

// Re-export key types for convenience
pub use booking::{BookingService, BookingValidator, Clock, FixedClock, SystemClock};
