//! Booking admission: validation rules and the create/extend use cases

pub mod clock;
pub mod service;
pub mod validator;

pub use clock::{Clock, FixedClock, SystemClock};
pub use service::BookingService;
pub use validator::BookingValidator;
