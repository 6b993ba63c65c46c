//! Data models: configuration and the extraction result schema.

pub mod config;
pub mod report;
