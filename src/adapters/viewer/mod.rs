//! Viewer client: subscribes to the hub and keeps a dashboard model current.

mod client;

pub use client::{TelemetryViewer, ViewerError};
