//! In-process storage implementations

mod memory;

pub use memory::{InMemoryBookingRepository, InMemoryRepositoryProvider};
