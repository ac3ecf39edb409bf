//! Emotion-recognition results pipeline.
//!
//! Label files are turned into simulated model results, written to a CSV
//! result file, loaded into a staging table, and summarized by a read-only
//! dashboard over the warehouse star schema.

pub mod annotations;
pub mod app;
pub mod config;
pub mod dashboard;
pub mod db;
pub mod emotion;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod results;
pub mod simulate;
pub mod ui;
pub mod warehouse;

pub use error::{PipelineError, Result};
