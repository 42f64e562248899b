#![deny(missing_docs)]

//! Core library for the `minutes` transcript summarizer.

/// Batch orchestration: transcript discovery, per-document runs, and writers.
pub mod batch;
/// Command-line interface definitions and command entry points.
pub mod cli;
/// Environment-driven configuration management.
pub mod config;
/// Generation capability abstraction and the Ollama adapter.
pub mod generation;
/// Structured logging and tracing setup.
pub mod logging;
/// Batch counters and snapshots.
pub mod metrics;
/// The summarization pipeline: segment, summarize, combine, extract.
pub mod pipeline;
/// Structured progress events and sinks.
pub mod progress;
