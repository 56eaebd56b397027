//! Data models.

pub mod config;
pub mod record;

pub use config::OrdexConfig;
pub use record::{CandidateRecord, Record};
