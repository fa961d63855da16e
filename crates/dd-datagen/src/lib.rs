//! Synthetic analytics-event archive generator.
//!
//! A [`model::CategoryModel`] describes weighted apps, event types, OSes and
//! versions. [`partition::plan`] splits a run into per-archive tasks and
//! [`runner`] writes each task's gzip archive of JSON records in parallel.

#[macro_use]
mod log_macros;

pub mod error;
pub mod inspect;
pub mod model;
pub mod output;
pub mod partition;
pub mod runner;
pub mod sampler;
pub mod synth;
pub mod tracing_init;
