//! HTTP REST API
//!
//! - `common`: response envelope and validated JSON extractor
//! - `modules`: booking, health, metrics and request-id handlers
//! - `router`: API router with Swagger documentation

pub mod common;
pub mod modules;
pub mod router;

pub use router::{booking_routes, create_api_router, ApiDoc};
