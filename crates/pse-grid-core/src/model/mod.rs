// ── Domain model ──
//
// A poll yields one untyped JSON document. Fields are resolved lazily
// through the helpers below so a missing key fails the read that needs
// it, not the poll that delivered it.

pub mod grid;
pub mod interconnection;

pub use grid::{GridSnapshot, GridState, SummaryField};
pub use interconnection::{Interconnection, LINK_COUNTRIES};

use serde_json::Value;

use crate::error::CoreError;

/// Walk `path` from `root`, failing with a schema error naming the full path.
pub(crate) fn lookup<'a>(root: &'a Value, path: &[&str]) -> Result<&'a Value, CoreError> {
    path.iter()
        .try_fold(root, |node, key| node.get(key))
        .ok_or_else(|| CoreError::missing(path.join(".")))
}

/// Interpret a JSON value as a power reading in whole megawatts.
///
/// Integers pass through, floats are rounded, numeric strings are parsed.
/// Anything else is a schema error.
#[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
pub(crate) fn megawatts(value: &Value, path: &str) -> Result<i64, CoreError> {
    let invalid = |reason: String| CoreError::Schema {
        path: path.to_owned(),
        reason,
    };

    let float = match value {
        Value::Number(n) => {
            if let Some(whole) = n.as_i64() {
                return Ok(whole);
            }
            n.as_f64()
                .ok_or_else(|| invalid(format!("number {n} out of range")))?
        }
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| invalid(format!("expected a number, got {s:?}")))?,
        other => return Err(invalid(format!("expected a number, got {other}"))),
    };

    if !float.is_finite() || float.abs() >= 9.0e15 {
        return Err(invalid(format!("number {float} out of range")));
    }
    Ok(float.round() as i64)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn lookup_walks_nested_objects() {
        let doc = json!({ "data": { "podsumowanie": { "generacja": 5 } } });
        let v = lookup(&doc, &["data", "podsumowanie", "generacja"]).unwrap();
        assert_eq!(v, &json!(5));
    }

    #[test]
    fn lookup_reports_full_path_on_miss() {
        let doc = json!({ "data": {} });
        let err = lookup(&doc, &["data", "podsumowanie", "generacja"]).unwrap_err();
        match err {
            CoreError::Schema { path, .. } => assert_eq!(path, "data.podsumowanie.generacja"),
            other => panic!("expected Schema, got {other:?}"),
        }
    }

    #[test]
    fn megawatts_accepts_integers_floats_and_strings() {
        assert_eq!(megawatts(&json!(4800), "x").unwrap(), 4800);
        assert_eq!(megawatts(&json!(-300), "x").unwrap(), -300);
        assert_eq!(megawatts(&json!(120.6), "x").unwrap(), 121);
        assert_eq!(megawatts(&json!(" 5000 "), "x").unwrap(), 5000);
    }

    #[test]
    fn megawatts_rejects_non_numeric_values() {
        assert!(matches!(
            megawatts(&json!(null), "x"),
            Err(CoreError::Schema { .. })
        ));
        assert!(matches!(
            megawatts(&json!("n/a"), "x"),
            Err(CoreError::Schema { .. })
        ));
        assert!(matches!(
            megawatts(&json!([1]), "x"),
            Err(CoreError::Schema { .. })
        ));
    }
}
