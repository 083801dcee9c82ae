//! Schema-flexible telemetry message.
//!
//! A message is any JSON object. The relay only names the two fields it
//! knows about; everything else is carried through untouched so publishers
//! can attach device ids, units or sequence numbers without a schema change.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const TEMPERATURE_FIELD: &str = "temperature";
pub const HUMIDITY_FIELD: &str = "humidity";

/// One parsed telemetry reading.
///
/// Field order and number text are preserved on re-serialization, so a
/// broadcast frame is byte-for-byte the object the publisher sent (modulo
/// whitespace).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TelemetryMessage(Map<String, Value>);

impl TelemetryMessage {
    /// Parse a raw frame payload. Anything other than a JSON object fails.
    pub fn parse(raw: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(raw)
    }

    pub fn from_fields(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Numeric temperature, if present and a finite `f64`.
    pub fn temperature(&self) -> Option<f64> {
        self.numeric(TEMPERATURE_FIELD)
    }

    /// Numeric relative humidity, if present and a finite `f64`.
    pub fn humidity(&self) -> Option<f64> {
        self.numeric(HUMIDITY_FIELD)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Serialize back to a compact JSON text frame.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.0)
    }

    fn numeric(&self, field: &str) -> Option<f64> {
        self.0.get(field).and_then(Value::as_f64)
    }
}
