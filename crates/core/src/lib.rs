//! Core types and shared functionality for listafeed.
//!
//! This crate provides:
//! - Namespaced TTL cache store
//! - Single-flight request coalescing
//! - Layered application configuration

pub mod cache;
pub mod config;
pub mod singleflight;

pub use cache::{CacheError, CacheStore};
pub use config::{AppConfig, ConfigError};
pub use singleflight::SingleFlight;
