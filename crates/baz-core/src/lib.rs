//! baz-core: Shared types, errors, events, and configuration
//!
//! This crate provides the foundational types used across the BAZ workspace.

pub mod config;
pub mod errors;
pub mod events;
pub mod types;

pub use config::*;
pub use errors::*;
pub use events::*;
pub use types::*;
