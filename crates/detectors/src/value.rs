//! Open metric record model
//!
//! Each detector contributes a small map of named values; the merged
//! per-frame record is a string-keyed open map so new detectors can
//! be added without touching the aggregation layer. Keys ending in
//! [`ALERT_SUFFIX`] are boolean alerts by convention, which drives
//! both thumbnail selection and aggregation semantics.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Reserved key suffix marking a boolean alert field.
pub const ALERT_SUFFIX: &str = "_alert";

/// A flat per-frame metric record, ordered for deterministic output.
pub type MetricRecord = BTreeMap<String, MetricValue>;

/// A single metric value: detectors emit numbers, booleans, arrays,
/// nested records, or an explicit null when a measurement is missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Array(Vec<f64>),
    Map(MetricRecord),
    Null,
}

impl MetricValue {
    pub fn is_null(&self) -> bool {
        matches!(self, MetricValue::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            MetricValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            MetricValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric view covering both ints and floats.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetricValue::Int(i) => Some(*i as f64),
            MetricValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Wrap an optional measurement, mapping a gap to `Null`.
    pub fn from_opt_f32(value: Option<f32>) -> Self {
        match value {
            Some(v) => MetricValue::Float(v as f64),
            None => MetricValue::Null,
        }
    }
}

impl From<bool> for MetricValue {
    fn from(v: bool) -> Self {
        MetricValue::Bool(v)
    }
}

impl From<f64> for MetricValue {
    fn from(v: f64) -> Self {
        MetricValue::Float(v)
    }
}

impl From<f32> for MetricValue {
    fn from(v: f32) -> Self {
        MetricValue::Float(v as f64)
    }
}

impl From<i64> for MetricValue {
    fn from(v: i64) -> Self {
        MetricValue::Int(v)
    }
}

/// True when any `_alert`-suffixed key holds a boolean `true`.
pub fn has_active_alert(record: &MetricRecord) -> bool {
    record
        .iter()
        .any(|(key, value)| key.ends_with(ALERT_SUFFIX) && value.as_bool() == Some(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untagged_serialization() {
        let mut record = MetricRecord::new();
        record.insert("ear".into(), MetricValue::Float(0.25));
        record.insert("eye_closed_alert".into(), MetricValue::Bool(false));
        record.insert("yawn_count".into(), MetricValue::Int(3));
        record.insert("mar".into(), MetricValue::Null);

        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(
            json,
            r#"{"ear":0.25,"eye_closed_alert":false,"mar":null,"yawn_count":3}"#
        );
    }

    #[test]
    fn test_has_active_alert() {
        let mut record = MetricRecord::new();
        record.insert("perclos_alert".into(), MetricValue::Bool(false));
        assert!(!has_active_alert(&record));

        record.insert("gaze_alert".into(), MetricValue::Bool(true));
        assert!(has_active_alert(&record));
    }

    #[test]
    fn test_alert_suffix_requires_bool() {
        let mut record = MetricRecord::new();
        // Named like an alert but not boolean: does not count.
        record.insert("volume_alert".into(), MetricValue::Float(1.0));
        assert!(!has_active_alert(&record));
    }

    #[test]
    fn test_numeric_views() {
        assert_eq!(MetricValue::Int(4).as_f64(), Some(4.0));
        assert_eq!(MetricValue::Float(0.5).as_f64(), Some(0.5));
        assert_eq!(MetricValue::Bool(true).as_f64(), None);
        assert_eq!(MetricValue::Int(4).as_int(), Some(4));
        assert_eq!(MetricValue::Float(4.0).as_int(), None);
    }
}
