//! Typed HTTP accessor for the container-security telemetry backend.
//!
//! One async method per backend endpoint; this crate is the dashboard's
//! sole I/O boundary. It owns request construction (paths, query
//! parameters) and response decoding, and reports failures as either a
//! transport error (the call never completed) or an API error (the
//! backend answered with a non-success status).

pub mod client;

pub use client::{TelemetryClient, TelemetryError, DEFAULT_LIMIT};
