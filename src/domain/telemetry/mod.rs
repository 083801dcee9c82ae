//! Telemetry payloads and the viewer-side rolling history.

mod history;
mod message;
mod viewer_state;

pub use history::{ChartSample, TelemetryHistory, DEFAULT_HISTORY_CAPACITY};
pub use message::{TelemetryMessage, HUMIDITY_FIELD, TEMPERATURE_FIELD};
pub use viewer_state::ViewerState;
