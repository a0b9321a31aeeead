//! Booking module: create, extend and look up unit bookings

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
