//! service-core: shared infrastructure for the platform services.
pub mod config;
pub mod error;
pub mod observability;

pub use axum;
pub use mongodb;
pub use tracing;
pub use validator;
