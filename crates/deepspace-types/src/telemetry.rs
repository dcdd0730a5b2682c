//! Dashboard telemetry abstraction.
//!
//! Control code never writes to a dashboard directly.  After each cycle the
//! control loop asks every [`Telemetered`] component to report into a
//! [`TelemetrySink`]; what happens to the values is the sink's business.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A single scalar or string telemetry value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TelemetryValue {
    Number(f64),
    Flag(bool),
    Text(String),
}

impl From<f64> for TelemetryValue {
    fn from(v: f64) -> Self {
        TelemetryValue::Number(v)
    }
}

impl From<bool> for TelemetryValue {
    fn from(v: bool) -> Self {
        TelemetryValue::Flag(v)
    }
}

impl From<&str> for TelemetryValue {
    fn from(v: &str) -> Self {
        TelemetryValue::Text(v.to_string())
    }
}

impl From<String> for TelemetryValue {
    fn from(v: String) -> Self {
        TelemetryValue::Text(v)
    }
}

/// Key/value consumer for per-cycle diagnostics.
pub trait TelemetrySink {
    fn record(&mut self, key: &str, value: TelemetryValue);
}

/// A component that can describe its latest decisions to a sink.
pub trait Telemetered {
    fn report(&self, sink: &mut dyn TelemetrySink);
}

/// Keeps the most recent value per key.  Serves as a dashboard snapshot and
/// as the assertion surface in tests.
#[derive(Debug, Default, Clone, Serialize)]
pub struct MemorySink {
    values: BTreeMap<String, TelemetryValue>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&TelemetryValue> {
        self.values.get(key)
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        match self.values.get(key) {
            Some(TelemetryValue::Number(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn flag(&self, key: &str) -> Option<bool> {
        match self.values.get(key) {
            Some(TelemetryValue::Flag(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        match self.values.get(key) {
            Some(TelemetryValue::Text(v)) => Some(v.as_str()),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl TelemetrySink for MemorySink {
    fn record(&mut self, key: &str, value: TelemetryValue) {
        self.values.insert(key.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sink_keeps_latest_value() {
        let mut sink = MemorySink::new();
        sink.record("leadscrew/inches", 3.0.into());
        sink.record("leadscrew/inches", 4.5.into());
        sink.record("robot/state", "DEFAULT".into());
        sink.record("leadscrew/in_range", true.into());

        assert_eq!(sink.len(), 3);
        assert_eq!(sink.number("leadscrew/inches"), Some(4.5));
        assert_eq!(sink.text("robot/state"), Some("DEFAULT"));
        assert_eq!(sink.flag("leadscrew/in_range"), Some(true));
        assert_eq!(sink.number("robot/state"), None);
    }
}
