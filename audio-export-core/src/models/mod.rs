pub mod config;
pub mod counters;
pub mod error;
pub mod record;
pub mod report;
