//! Lenient scalar coercion for wizard payload fields.
//!
//! The wizard front ends send numbers as numbers, numeric strings, or not
//! at all; these helpers absorb that at the typed boundary.

use serde_json::Value;

/// Coerce a payload scalar to an integer.
///
/// Accepts integers, floats (truncated), and numeric strings including
/// decimal strings ("3.5" coerces to 3). Returns None for anything else.
pub(crate) fn coerce_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => {
            let trimmed = s.trim();
            trimmed
                .parse::<i64>()
                .ok()
                .or_else(|| trimmed.parse::<f64>().ok().map(|f| f as i64))
        }
        _ => None,
    }
}

/// Coerce a payload scalar to a string. Numbers are rendered; anything
/// non-scalar is rejected.
pub(crate) fn coerce_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Whether a field is present with a usable value. JSON null counts as
/// absent.
pub(crate) fn is_present(value: Option<&Value>) -> bool {
    matches!(value, Some(v) if !v.is_null())
}

/// Sanitize a policy-type value to a number: numbers pass through, strings
/// are stripped to their digits before parsing.
pub(crate) fn sanitize_numeric(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => {
            let digits: String = s.chars().filter(|c| c.is_ascii_digit()).collect();
            digits.parse::<i64>().ok()
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coerce_int_accepts_numbers_and_numeric_strings() {
        assert_eq!(coerce_int(&json!(3)), Some(3));
        assert_eq!(coerce_int(&json!("3")), Some(3));
        assert_eq!(coerce_int(&json!(" 42 ")), Some(42));
        assert_eq!(coerce_int(&json!(3.9)), Some(3));
        assert_eq!(coerce_int(&json!("3.9")), Some(3));
    }

    #[test]
    fn test_coerce_int_rejects_non_numeric() {
        assert_eq!(coerce_int(&json!("three")), None);
        assert_eq!(coerce_int(&json!(null)), None);
        assert_eq!(coerce_int(&json!([1])), None);
    }

    #[test]
    fn test_sanitize_numeric_strips_noise_from_strings() {
        assert_eq!(sanitize_numeric(&json!("1")), Some(1));
        assert_eq!(sanitize_numeric(&json!(" 2 ")), Some(2));
        assert_eq!(sanitize_numeric(&json!("type-3")), Some(3));
        assert_eq!(sanitize_numeric(&json!(4)), Some(4));
        assert_eq!(sanitize_numeric(&json!("none")), None);
    }

    #[test]
    fn test_is_present_treats_null_as_absent() {
        assert!(!is_present(None));
        assert!(!is_present(Some(&json!(null))));
        assert!(is_present(Some(&json!(0))));
        assert!(is_present(Some(&json!(""))));
    }
}
