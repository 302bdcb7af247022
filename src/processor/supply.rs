//! Scalar extraction for circulating-supply values.
//!
//! The provider sends supply either as a bare number (single-peg assets) or
//! as a map from peg currency to amount, e.g. `{"peggedUSD": 100, "peggedEUR": 5}`.
//! [`SupplyValue`] resolves that shape once so everything downstream works on
//! plain `f64`.

use serde_json::Value;

use super::diagnostics::DiagnosticKind;

/// A supply figure as it appeared at the ingestion boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum SupplyValue {
    Scalar(f64),
    /// Numeric entries of a peg map, in provider order.
    PegMap(Vec<(String, f64)>),
    Missing,
}

impl SupplyValue {
    /// Resolves a raw JSON value, returning any data-quality issues found.
    ///
    /// Never fails: unrecognized shapes resolve to [`SupplyValue::Missing`]
    /// together with a `MalformedField` issue. Negative amounts are clamped
    /// to zero.
    pub fn classify(raw: Option<&Value>) -> (Self, Vec<DiagnosticKind>) {
        let mut issues = Vec::new();

        let value = match raw {
            None | Some(Value::Null) => {
                issues.push(DiagnosticKind::MissingField);
                SupplyValue::Missing
            },
            Some(Value::Number(n)) => match n.as_f64() {
                Some(v) => SupplyValue::Scalar(non_negative(v, &mut issues)),
                None => {
                    issues.push(DiagnosticKind::MalformedField);
                    SupplyValue::Missing
                },
            },
            Some(Value::Object(map)) => {
                let mut entries = Vec::with_capacity(map.len());
                let mut ignored = Vec::new();

                for (currency, amount) in map {
                    match amount.as_f64() {
                        Some(v) => entries.push((currency.clone(), non_negative(v, &mut issues))),
                        None => ignored.push(currency.clone()),
                    }
                }

                if !ignored.is_empty() {
                    issues.push(DiagnosticKind::IgnoredPegEntries { keys: ignored });
                }
                SupplyValue::PegMap(entries)
            },
            Some(_) => {
                issues.push(DiagnosticKind::MalformedField);
                SupplyValue::Missing
            },
        };

        (value, issues)
    }

    /// Single scalar for this value: the number itself, the sum of a peg
    /// map, or zero when missing.
    pub fn total(&self) -> f64 {
        match self {
            SupplyValue::Scalar(v) => *v,
            SupplyValue::PegMap(entries) => entries.iter().map(|(_, v)| v).sum(),
            SupplyValue::Missing => 0.0,
        }
    }
}

/// Flatten a raw supply value into a single non-negative scalar.
pub fn extract_scalar(raw: Option<&Value>) -> f64 {
    SupplyValue::classify(raw).0.total()
}

fn non_negative(value: f64, issues: &mut Vec<DiagnosticKind>) -> f64 {
    if value < 0.0 {
        issues.push(DiagnosticKind::NegativeSupply { value });
        0.0
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bare_number_is_returned_as_is() {
        assert_eq!(extract_scalar(Some(&json!(42))), 42.0);
        assert_eq!(extract_scalar(Some(&json!(1234.5))), 1234.5);
        assert_eq!(extract_scalar(Some(&json!(0))), 0.0);
    }

    #[test]
    fn test_peg_map_is_summed() {
        let raw = json!({"USD": 100.0, "EUR": 25.5});
        assert_eq!(extract_scalar(Some(&raw)), 125.5);
    }

    #[test]
    fn test_missing_and_empty_yield_zero() {
        assert_eq!(extract_scalar(None), 0.0);
        assert_eq!(extract_scalar(Some(&Value::Null)), 0.0);
        assert_eq!(extract_scalar(Some(&json!({}))), 0.0);
    }

    #[test]
    fn test_non_numeric_peg_entries_are_ignored() {
        let raw = json!({"peggedUSD": 10, "note": "bridged", "nested": {"x": 1}});
        let (value, issues) = SupplyValue::classify(Some(&raw));

        assert_eq!(value.total(), 10.0);
        assert_eq!(
            issues,
            vec![DiagnosticKind::IgnoredPegEntries {
                keys: vec!["note".to_string(), "nested".to_string()]
            }]
        );
    }

    #[test]
    fn test_unrecognized_shape_defaults_to_zero() {
        for raw in [json!("100"), json!([1, 2]), json!(true)] {
            let (value, issues) = SupplyValue::classify(Some(&raw));
            assert_eq!(value, SupplyValue::Missing);
            assert_eq!(value.total(), 0.0);
            assert_eq!(issues, vec![DiagnosticKind::MalformedField]);
        }
    }

    #[test]
    fn test_negative_supply_is_clamped() {
        let (value, issues) = SupplyValue::classify(Some(&json!(-5)));
        assert_eq!(value.total(), 0.0);
        assert_eq!(issues, vec![DiagnosticKind::NegativeSupply { value: -5.0 }]);

        let (value, _) = SupplyValue::classify(Some(&json!({"USD": 10, "EUR": -3})));
        assert_eq!(value.total(), 10.0);
    }

    #[test]
    fn test_missing_is_reported() {
        let (_, issues) = SupplyValue::classify(None);
        assert_eq!(issues, vec![DiagnosticKind::MissingField]);
    }
}
