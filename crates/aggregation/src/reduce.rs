//! Generic metric-record reduction
//!
//! Folds N per-frame records into one, key by key, using type-driven
//! rules. Alert-suffixed keys get any-true semantics before anything
//! else; integers take the max (counters), numerics average, arrays
//! average element-wise, nested records recurse, and anything mixed
//! falls back to the last value in frame order.

use detectors::{MetricRecord, MetricValue, ALERT_SUFFIX};
use std::collections::BTreeSet;

/// Reduce an ordered sequence of records into one merged record.
/// Null values are skipped per key; a key null in every record stays
/// null in the output.
pub fn reduce_records(records: &[MetricRecord]) -> MetricRecord {
    let keys: BTreeSet<&String> = records.iter().flat_map(|r| r.keys()).collect();

    let mut merged = MetricRecord::new();
    for key in keys {
        let present: Vec<&MetricValue> = records
            .iter()
            .filter_map(|r| r.get(key))
            .filter(|v| !v.is_null())
            .collect();
        merged.insert(key.clone(), reduce_key(key, &present));
    }
    merged
}

fn reduce_key(key: &str, present: &[&MetricValue]) -> MetricValue {
    let Some(last) = present.last() else {
        return MetricValue::Null;
    };

    // Alert keys prefer any-true over latest-frame bias. A key merely
    // named like an alert but not boolean falls through to last-value.
    if key.ends_with(ALERT_SUFFIX) {
        let bools: Vec<bool> = present.iter().filter_map(|v| v.as_bool()).collect();
        if !bools.is_empty() {
            return MetricValue::Bool(bools.into_iter().any(|b| b));
        }
        return (*last).clone();
    }

    if present.iter().all(|v| matches!(v, MetricValue::Int(_))) {
        let max = present.iter().filter_map(|v| v.as_int()).max();
        if let Some(max) = max {
            return MetricValue::Int(max);
        }
    }

    if present.iter().all(|v| v.as_f64().is_some()) {
        let sum: f64 = present.iter().filter_map(|v| v.as_f64()).sum();
        return MetricValue::Float(sum / present.len() as f64);
    }

    if present.iter().all(|v| matches!(v, MetricValue::Bool(_))) {
        return MetricValue::Bool(present.iter().any(|v| v.as_bool() == Some(true)));
    }

    if present.iter().all(|v| matches!(v, MetricValue::Array(_))) {
        return reduce_arrays(present);
    }

    if present.iter().all(|v| matches!(v, MetricValue::Map(_))) {
        let maps: Vec<MetricRecord> = present
            .iter()
            .filter_map(|v| match v {
                MetricValue::Map(m) => Some(m.clone()),
                _ => None,
            })
            .collect();
        return MetricValue::Map(reduce_records(&maps));
    }

    (*last).clone()
}

/// Element-wise mean over arrays matching the first array's length;
/// mismatched-length arrays are ignored for the key, never an error.
fn reduce_arrays(present: &[&MetricValue]) -> MetricValue {
    let arrays: Vec<&Vec<f64>> = present
        .iter()
        .filter_map(|v| match v {
            MetricValue::Array(a) => Some(a),
            _ => None,
        })
        .collect();
    let Some(first) = arrays.first() else {
        return MetricValue::Null;
    };
    let matching: Vec<&Vec<f64>> = arrays
        .iter()
        .filter(|a| a.len() == first.len())
        .copied()
        .collect();

    let n = matching.len() as f64;
    let mut mean = vec![0.0f64; first.len()];
    for array in &matching {
        for (acc, v) in mean.iter_mut().zip(array.iter()) {
            *acc += v;
        }
    }
    for acc in &mut mean {
        *acc /= n;
    }
    MetricValue::Array(mean)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn record(pairs: &[(&str, MetricValue)]) -> MetricRecord {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_alert_any_true_wins() {
        let records = vec![
            record(&[("x_alert", MetricValue::Bool(true))]),
            record(&[("x_alert", MetricValue::Bool(false))]),
        ];
        let merged = reduce_records(&records);
        assert_eq!(merged["x_alert"], MetricValue::Bool(true));
    }

    #[test]
    fn test_alert_named_but_not_bool_takes_last() {
        let records = vec![
            record(&[("volume_alert", MetricValue::Float(1.0))]),
            record(&[("volume_alert", MetricValue::Float(3.0))]),
        ];
        let merged = reduce_records(&records);
        assert_eq!(merged["volume_alert"], MetricValue::Float(3.0));
    }

    #[test]
    fn test_integers_take_max() {
        let records = vec![
            record(&[("yawn_count", MetricValue::Int(2))]),
            record(&[("yawn_count", MetricValue::Int(5))]),
            record(&[("yawn_count", MetricValue::Int(3))]),
        ];
        let merged = reduce_records(&records);
        assert_eq!(merged["yawn_count"], MetricValue::Int(5));
    }

    #[test]
    fn test_numerics_average() {
        let records = vec![
            record(&[("n", MetricValue::Int(2))]),
            record(&[("n", MetricValue::Float(4.0))]),
        ];
        let merged = reduce_records(&records);
        assert_eq!(merged["n"], MetricValue::Float(3.0));
    }

    #[test]
    fn test_nulls_skipped_per_key() {
        let records = vec![
            record(&[("ear", MetricValue::Null)]),
            record(&[("ear", MetricValue::Float(0.3))]),
            record(&[("ear", MetricValue::Null)]),
        ];
        let merged = reduce_records(&records);
        assert_eq!(merged["ear"], MetricValue::Float(0.3));
    }

    #[test]
    fn test_all_null_stays_null() {
        let records = vec![
            record(&[("ear", MetricValue::Null)]),
            record(&[("ear", MetricValue::Null)]),
        ];
        let merged = reduce_records(&records);
        assert!(merged["ear"].is_null());
    }

    #[test]
    fn test_mismatched_array_ignored() {
        let records = vec![
            record(&[("lm", MetricValue::Array(vec![1.0, 3.0]))]),
            record(&[("lm", MetricValue::Array(vec![9.0, 9.0, 9.0]))]),
            record(&[("lm", MetricValue::Array(vec![3.0, 5.0]))]),
        ];
        let merged = reduce_records(&records);
        assert_eq!(merged["lm"], MetricValue::Array(vec![2.0, 4.0]));
    }

    #[test]
    fn test_nested_records_recurse() {
        let inner_a = record(&[
            ("a_alert", MetricValue::Bool(false)),
            ("v", MetricValue::Float(1.0)),
        ]);
        let inner_b = record(&[
            ("a_alert", MetricValue::Bool(true)),
            ("v", MetricValue::Float(3.0)),
        ]);
        let records = vec![
            record(&[("nested", MetricValue::Map(inner_a))]),
            record(&[("nested", MetricValue::Map(inner_b))]),
        ];
        let merged = reduce_records(&records);
        let MetricValue::Map(nested) = &merged["nested"] else {
            panic!("expected nested map");
        };
        assert_eq!(nested["a_alert"], MetricValue::Bool(true));
        assert_eq!(nested["v"], MetricValue::Float(2.0));
    }

    #[test]
    fn test_mixed_types_take_last() {
        let records = vec![
            record(&[("status", MetricValue::Bool(true))]),
            record(&[("status", MetricValue::Float(2.0))]),
        ];
        let merged = reduce_records(&records);
        assert_eq!(merged["status"], MetricValue::Float(2.0));
    }

    #[test]
    fn test_key_union() {
        let records = vec![
            record(&[("a", MetricValue::Float(1.0))]),
            record(&[("b", MetricValue::Float(2.0))]),
        ];
        let merged = reduce_records(&records);
        assert_eq!(merged.len(), 2);
    }

    proptest! {
        #[test]
        fn prop_single_record_is_identity_modulo_floats(
            values in proptest::collection::btree_map(
                "[a-z]{1,8}",
                (-1000i64..1000).prop_map(MetricValue::Int),
                1..10,
            )
        ) {
            // A lone integer record reduces to itself: max of one
            // value is that value.
            let merged = reduce_records(std::slice::from_ref(&values));
            prop_assert_eq!(merged, values);
        }
    }
}
