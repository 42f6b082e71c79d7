//! # API Shared
//!
//! Shared definitions for the lipid explainer HTTP APIs.
//!
//! Contains:
//! - Request and response types with OpenAPI schemas (`dto` module)
//! - Shared services like `HealthService`
//!
//! Used by `api-rest` and the root binary.

pub mod dto;
pub mod health;

pub use dto::*;
pub use health::HealthService;
