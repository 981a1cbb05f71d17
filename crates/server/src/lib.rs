//! Ingestion service composition for listafeed.
//!
//! This crate wires the transport, parser, cache, and coalescer into the
//! two runtime paths:
//! - the scheduled refresh cycle (`ingest` + `scheduler`)
//! - the on-demand read path used by request handlers (`service`)

pub mod error;
pub mod ingest;
pub mod scheduler;
pub mod service;

#[cfg(test)]
pub(crate) mod testing;

pub use error::RefreshError;
pub use ingest::Ingestor;
pub use scheduler::{IngestionScheduler, RefreshOutcome, ScheduleState};
pub use service::PropertyService;
