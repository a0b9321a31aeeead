//! # Unit Booking Service
//!
//! Books rental units for guests while guaranteeing that a unit never hosts
//! two overlapping stays and a guest never holds two overlapping stays.
//!
//! ## Architecture
//!
//! - **domain**: stays, bookings, rejection reasons and the repository port
//! - **application**: admission rules (`BookingValidator`) and the use cases
//!   that serialize validation with persistence (`BookingService`)
//! - **infrastructure**: SeaORM/SQLite storage and an in-memory store
//! - **interfaces**: REST API with Swagger documentation
//! - **shared**: error types and graceful shutdown

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod shared;

pub use config::{default_config_path, AppConfig};

pub use application::{BookingService, BookingValidator, Clock, FixedClock, SystemClock};
pub use domain::{DomainError, DomainResult, RepositoryProvider};
pub use infrastructure::{
    init_database, DatabaseConfig, InMemoryRepositoryProvider, SeaOrmRepositoryProvider,
};
pub use interfaces::http::create_api_router;
