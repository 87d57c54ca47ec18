//! Gateway HTTP API module.
pub mod enforce;
pub mod error;
pub mod openapi;
pub mod system;
pub mod templates;
pub mod types;
