//! Shared types used across the product sync pipeline.

pub mod types;

pub use types::ProductId;
