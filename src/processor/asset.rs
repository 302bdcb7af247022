//! Asset-level normalization: one raw `peggedAssets` entry becomes one
//! flat [`AssetRecord`].

use serde::Serialize;
use serde_json::{Map, Value};

use super::diagnostics::{DiagnosticKind, Diagnostics, Scope};
use super::keys;
use super::supply::SupplyValue;

/// Price assumed for assets the provider does not price (unit peg).
pub const DEFAULT_PRICE: f64 = 1.0;

/// Flat per-stablecoin record for a single fetch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetRecord {
    // Identity
    pub id: Option<String>,
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub gecko_id: Option<String>,

    // Descriptive
    pub peg_type: Option<String>,
    pub peg_mechanism: Option<String>,
    pub price_source: Option<String>,
    pub price: f64,

    // Supply snapshots
    pub circulating_current: f64,
    pub circulating_prev_day: f64,
    pub circulating_prev_week: f64,
    pub circulating_prev_month: f64,

    /// Chains in provider order; same set as the asset's chain records.
    pub chains: Vec<String>,
}

/// Normalize one raw asset entry.
///
/// Returns `None` (and records a `SkippedRecord` diagnostic) when the entry
/// is not a mapping. Missing or malformed fields are defaulted and reported.
pub fn normalize_asset(
    index: usize,
    raw: &Value,
    diagnostics: &mut Diagnostics,
) -> Option<AssetRecord> {
    let Some(map) = raw.as_object() else {
        diagnostics.push(Scope::asset(index, None).report(None, DiagnosticKind::SkippedRecord));
        return None;
    };

    let (id, id_issue) = read_text(map, keys::ID);
    let scope = Scope::asset(index, id.as_deref());

    if let Some(kind) = id_issue {
        diagnostics.push(scope.report(Some(keys::ID), kind));
    }

    let mut text = |key: &str, required: bool| {
        let (value, issue) = read_text(map, key);
        match issue {
            Some(DiagnosticKind::MissingField) if !required => {},
            Some(kind) => diagnostics.push(scope.report(Some(key), kind)),
            None => {},
        }
        value
    };

    let name = text(keys::NAME, true);
    let symbol = text(keys::SYMBOL, true);
    let gecko_id = text(keys::GECKO_ID, false);
    let peg_type = text(keys::PEG_TYPE, false);
    let peg_mechanism = text(keys::PEG_MECHANISM, false);
    let price_source = text(keys::PRICE_SOURCE, false);

    let price = match map.get(keys::PRICE) {
        None | Some(Value::Null) => DEFAULT_PRICE,
        Some(v) => v.as_f64().unwrap_or_else(|| {
            diagnostics.push(scope.report(Some(keys::PRICE), DiagnosticKind::MalformedField));
            DEFAULT_PRICE
        }),
    };

    let mut supply = |key: &str| supply_field(map, key, &scope, diagnostics);

    let circulating_current = supply(keys::CIRCULATING);
    let circulating_prev_day = supply(keys::PREV_DAY);
    let circulating_prev_week = supply(keys::PREV_WEEK);
    let circulating_prev_month = supply(keys::PREV_MONTH);

    let chains = match map.get(keys::CHAIN_CIRCULATING) {
        Some(Value::Object(chains)) => chains.keys().cloned().collect(),
        _ => Vec::new(),
    };

    Some(AssetRecord {
        id,
        name,
        symbol,
        gecko_id,
        peg_type,
        peg_mechanism,
        price_source,
        price,
        circulating_current,
        circulating_prev_day,
        circulating_prev_week,
        circulating_prev_month,
        chains,
    })
}

/// Read an optional text field. Numbers are rendered as their decimal form
/// so numeric ids survive.
pub(crate) fn read_text(map: &Map<String, Value>, key: &str) -> (Option<String>, Option<DiagnosticKind>) {
    match map.get(key) {
        None | Some(Value::Null) => (None, Some(DiagnosticKind::MissingField)),
        Some(Value::String(s)) => (Some(s.clone()), None),
        Some(Value::Number(n)) => (Some(n.to_string()), None),
        Some(_) => (None, Some(DiagnosticKind::MalformedField)),
    }
}

/// Extract one supply field, forwarding issues as diagnostics.
pub(crate) fn supply_field(
    map: &Map<String, Value>,
    key: &str,
    scope: &Scope<'_>,
    diagnostics: &mut Diagnostics,
) -> f64 {
    let (value, issues) = SupplyValue::classify(map.get(key));
    for kind in issues {
        diagnostics.push(scope.report(Some(key), kind));
    }
    value.total()
}
