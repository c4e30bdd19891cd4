// Climate workload - Concurrent inserts, a count and an update against ClimateData

// Infrastructure - Store implementations and the worker pool
pub mod infrastructure;

// Row types and random record generation
pub mod models;

// Task definitions and the run loop
pub mod workload;
pub mod summary;

// Common utilities
pub mod app_state;
pub mod config;
pub mod error;

// Re-exports for convenience
pub use error::{AppError, AppResult};
