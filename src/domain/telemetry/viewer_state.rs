//! What a dashboard shows: latest reading, last update, link status and the chart.

use crate::domain::foundation::Timestamp;

use super::{ChartSample, TelemetryHistory, TelemetryMessage};

/// Viewer-side model fed by incoming broadcast frames.
#[derive(Debug, Clone)]
pub struct ViewerState {
    current_temperature: f64,
    current_humidity: f64,
    last_update: Option<Timestamp>,
    connected: bool,
    history: TelemetryHistory,
}

impl ViewerState {
    pub fn new(history_capacity: usize) -> Self {
        Self {
            current_temperature: 0.0,
            current_humidity: 0.0,
            last_update: None,
            connected: false,
            history: TelemetryHistory::new(history_capacity),
        }
    }

    /// Apply one text frame.
    ///
    /// Frames that are not JSON objects return the parse error. Valid objects
    /// without numeric `temperature` and `humidity` are ignored (`Ok(None)`).
    pub fn apply_frame(&mut self, text: &str) -> Result<Option<ChartSample>, serde_json::Error> {
        let message = TelemetryMessage::parse(text.as_bytes())?;
        Ok(self.apply_message(&message, Timestamp::now()))
    }

    pub fn apply_message(&mut self, message: &TelemetryMessage, at: Timestamp) -> Option<ChartSample> {
        let (temperature, humidity) = match (message.temperature(), message.humidity()) {
            (Some(t), Some(h)) => (t, h),
            _ => return None,
        };

        self.current_temperature = temperature;
        self.current_humidity = humidity;
        self.last_update = Some(at);

        let sample = ChartSample::new(temperature, humidity, at);
        self.history.push(sample);
        Some(sample)
    }

    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Label for the connection indicator.
    pub fn status_label(&self) -> &'static str {
        if self.connected {
            "Connected"
        } else {
            "Disconnected"
        }
    }

    pub fn current_temperature(&self) -> f64 {
        self.current_temperature
    }

    pub fn current_humidity(&self) -> f64 {
        self.current_humidity
    }

    pub fn last_update(&self) -> Option<Timestamp> {
        self.last_update
    }

    pub fn history(&self) -> &TelemetryHistory {
        &self.history
    }
}

impl Default for ViewerState {
    fn default() -> Self {
        Self::new(super::DEFAULT_HISTORY_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_disconnected_with_zeroed_readings() {
        let state = ViewerState::default();
        assert!(!state.is_connected());
        assert_eq!(state.status_label(), "Disconnected");
        assert_eq!(state.current_temperature(), 0.0);
        assert!(state.last_update().is_none());
        assert!(state.history().is_empty());
    }

    #[test]
    fn valid_reading_updates_current_and_history() {
        let mut state = ViewerState::default();
        let sample = state
            .apply_frame(r#"{"temperature":21.5,"humidity":40.2}"#)
            .unwrap()
            .unwrap();

        assert_eq!(sample.temperature, 21.5);
        assert_eq!(state.current_temperature(), 21.5);
        assert_eq!(state.current_humidity(), 40.2);
        assert!(state.last_update().is_some());
        assert_eq!(state.history().len(), 1);
    }

    #[test]
    fn frame_missing_humidity_is_ignored() {
        let mut state = ViewerState::default();
        assert!(state.apply_frame(r#"{"temperature":21.5}"#).unwrap().is_none());
        assert!(state.history().is_empty());
        assert!(state.last_update().is_none());
    }

    #[test]
    fn frame_with_non_numeric_temperature_is_ignored() {
        let mut state = ViewerState::default();
        let applied = state
            .apply_frame(r#"{"temperature":"hot","humidity":40}"#)
            .unwrap();
        assert!(applied.is_none());
        assert_eq!(state.current_temperature(), 0.0);
    }

    #[test]
    fn malformed_frame_returns_error_and_keeps_state() {
        let mut state = ViewerState::default();
        state.apply_frame(r#"{"temperature":1,"humidity":2}"#).unwrap();

        assert!(state.apply_frame("not json at all").is_err());
        assert_eq!(state.current_temperature(), 1.0);
        assert_eq!(state.history().len(), 1);
    }

    #[test]
    fn history_is_bounded_by_configured_capacity() {
        let mut state = ViewerState::new(3);
        for i in 0..10 {
            state
                .apply_frame(&format!(r#"{{"temperature":{},"humidity":50}}"#, i))
                .unwrap();
        }
        assert_eq!(state.history().len(), 3);
        assert_eq!(state.current_temperature(), 9.0);
    }

    #[test]
    fn connection_indicator_follows_set_connected() {
        let mut state = ViewerState::default();
        state.set_connected(true);
        assert_eq!(state.status_label(), "Connected");
        state.set_connected(false);
        assert_eq!(state.status_label(), "Disconnected");
    }
}
