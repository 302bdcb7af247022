use log::{debug, warn};
use serde::Serialize;
use serde_json::Value;

use crate::error::{ProcessError, Result};

use super::asset::normalize_asset;
use super::chain::explode_chains;
use super::diagnostics::{DiagnosticKind, Diagnostics, Scope};
use super::keys;
use super::metrics::{compute_changes, AssetRow, ChainRow};
use super::rank::{rank, Ranking};

/// Relative gap between an asset's supply and the sum of its chain
/// supplies above which a `SupplyMismatch` is reported.
pub const SUPPLY_MISMATCH_TOLERANCE: f64 = 1e-4;

/// Output of one pipeline run over one provider response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub assets: Vec<AssetRow>,
    pub chains: Vec<ChainRow>,
    pub diagnostics: Diagnostics,
}

/// Locate the asset list in a provider response.
///
/// Accepts `{"peggedAssets": [...]}` or a bare array of asset entries.
/// Anything else is a structural error for the whole batch.
pub fn asset_entries(response: &Value) -> Result<&[Value]> {
    match response {
        Value::Object(map) => match map.get(keys::PEGGED_ASSETS) {
            Some(Value::Array(entries)) => Ok(entries.as_slice()),
            Some(other) => Err(ProcessError::Structural(format!(
                "`{}` is {}, expected an array",
                keys::PEGGED_ASSETS,
                kind_of(other)
            ))),
            None => Err(ProcessError::Structural(format!(
                "missing `{}`",
                keys::PEGGED_ASSETS
            ))),
        },
        Value::Array(entries) => Ok(entries.as_slice()),
        other => Err(ProcessError::Structural(format!(
            "top-level value is {}, expected an object or array",
            kind_of(other)
        ))),
    }
}

/// Normalize, explode, compute change metrics and rank.
///
/// Both output tables are ordered by `ranking`.
pub fn process(response: &Value, ranking: Ranking) -> Result<Snapshot> {
    let entries = asset_entries(response)?;

    let mut diagnostics = Diagnostics::new();
    let mut assets = Vec::with_capacity(entries.len());
    let mut chains = Vec::new();

    for (index, entry) in entries.iter().enumerate() {
        let Some(asset) = normalize_asset(index, entry, &mut diagnostics) else {
            continue;
        };
        let asset_chains = explode_chains(index, entry, &mut diagnostics);

        if !asset_chains.is_empty() {
            let chain_total: f64 = asset_chains.iter().map(|c| c.current).sum();
            if is_mismatch(asset.circulating_current, chain_total) {
                let scope = Scope::asset(index, asset.id.as_deref());
                diagnostics.push(scope.report(
                    Some(keys::CIRCULATING),
                    DiagnosticKind::SupplyMismatch {
                        asset: asset.circulating_current,
                        chains: chain_total,
                    },
                ));
            }
        }

        assets.push(asset);
        chains.extend(asset_chains);
    }

    let skipped = diagnostics.count_where(|k| *k == DiagnosticKind::SkippedRecord);
    if skipped > 0 {
        warn!("Skipped {} of {} asset entries", skipped, entries.len());
    }
    debug!(
        "Normalized {} assets into {} chain rows ({} diagnostics)",
        assets.len(),
        chains.len(),
        diagnostics.len()
    );

    let mut assets = compute_changes(assets);
    let mut chains = compute_changes(chains);
    rank(&mut assets, ranking);
    rank(&mut chains, ranking);

    Ok(Snapshot {
        assets,
        chains,
        diagnostics,
    })
}

fn is_mismatch(asset: f64, chains: f64) -> bool {
    let scale = asset.abs().max(chains.abs());
    scale > 0.0 && (asset - chains).abs() / scale > SUPPLY_MISMATCH_TOLERANCE
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::metrics::Percentage;
    use crate::processor::rank::{Direction, SortKey};
    use serde_json::json;

    fn scenario() -> Value {
        json!({"peggedAssets": [{
            "id": "1",
            "name": "X",
            "symbol": "X",
            "circulating": {"peggedUSD": 100},
            "circulatingPrevDay": {"peggedUSD": 80},
            "chainCirculating": {
                "Ethereum": {"current": {"peggedUSD": 60}, "circulatingPrevDay": {"peggedUSD": 50}},
                "Polygon": {"current": {"peggedUSD": 40}, "circulatingPrevDay": {"peggedUSD": 30}}
            }
        }]})
    }

    #[test]
    fn test_end_to_end() {
        let snapshot = process(&scenario(), Ranking::default()).unwrap();

        assert_eq!(snapshot.assets.len(), 1);
        let asset = &snapshot.assets[0];
        assert_eq!(asset.record.circulating_current, 100.0);
        assert_eq!(asset.changes.delta_day, 20.0);
        assert_eq!(asset.changes.pct_day, Percentage::Defined(25.0));
        assert_eq!(asset.changes.pct_week, Percentage::Undefined);
        assert_eq!(asset.record.chains, vec!["Ethereum", "Polygon"]);

        assert_eq!(snapshot.chains.len(), 2);
        let eth = snapshot
            .chains
            .iter()
            .find(|c| c.record.chain == "Ethereum")
            .unwrap();
        assert_eq!(eth.changes.delta_day, 10.0);
        assert_eq!(eth.changes.pct_day, Percentage::Defined(20.0));

        let polygon = snapshot
            .chains
            .iter()
            .find(|c| c.record.chain == "Polygon")
            .unwrap();
        assert_eq!(polygon.changes.delta_day, 10.0);
        assert_eq!(polygon.changes.pct_day, Percentage::Defined(33.33));

        // pct_day ascending: Ethereum (20%) before Polygon (33.33%)
        assert_eq!(snapshot.chains[0].record.chain, "Ethereum");

        assert!(!snapshot
            .diagnostics
            .iter()
            .any(|d| matches!(d.kind, DiagnosticKind::SupplyMismatch { .. })));
    }

    #[test]
    fn test_structural_errors() {
        for bad in [
            json!(42),
            json!("peggedAssets"),
            json!(null),
            json!({"data": []}),
            json!({"peggedAssets": {"id": "1"}}),
        ] {
            assert!(matches!(
                process(&bad, Ranking::default()),
                Err(ProcessError::Structural(_))
            ));
        }
    }

    #[test]
    fn test_empty_input_is_not_an_error() {
        let snapshot = process(&json!({"peggedAssets": []}), Ranking::default()).unwrap();
        assert!(snapshot.assets.is_empty());
        assert!(snapshot.chains.is_empty());
        assert!(snapshot.diagnostics.is_empty());
    }

    #[test]
    fn test_bare_array_is_accepted() {
        let response = json!([{"id": "1", "circulating": 5, "circulatingPrevDay": 4}]);
        let snapshot = process(&response, Ranking::default()).unwrap();
        assert_eq!(snapshot.assets.len(), 1);
        assert_eq!(snapshot.assets[0].changes.pct_day, Percentage::Defined(25.0));
    }

    #[test]
    fn test_bad_entries_are_skipped_not_fatal() {
        let response = json!({"peggedAssets": [
            "not a record",
            {"id": "2", "circulating": 10, "circulatingPrevDay": 5},
            17
        ]});

        let snapshot = process(&response, Ranking::default()).unwrap();
        assert_eq!(snapshot.assets.len(), 1);
        assert_eq!(snapshot.assets[0].record.id.as_deref(), Some("2"));
        assert_eq!(
            snapshot
                .diagnostics
                .count_where(|k| *k == DiagnosticKind::SkippedRecord),
            2
        );
    }

    #[test]
    fn test_supply_mismatch_is_surfaced() {
        let response = json!({"peggedAssets": [{
            "id": "3",
            "circulating": 100,
            "chainCirculating": {"Ethereum": {"current": 70}, "Tron": {"current": 20}}
        }]});

        let snapshot = process(&response, Ranking::default()).unwrap();
        let mismatch: Vec<_> = snapshot
            .diagnostics
            .iter()
            .filter(|d| matches!(d.kind, DiagnosticKind::SupplyMismatch { .. }))
            .collect();

        assert_eq!(mismatch.len(), 1);
        assert_eq!(
            mismatch[0].kind,
            DiagnosticKind::SupplyMismatch {
                asset: 100.0,
                chains: 90.0
            }
        );
        // surfaced only; the asset keeps its own figure
        assert_eq!(snapshot.assets[0].record.circulating_current, 100.0);
    }

    #[test]
    fn test_undefined_rows_rank_last() {
        let response = json!({"peggedAssets": [
            {"id": "new", "circulating": 50, "circulatingPrevWeek": 0},
            {"id": "old", "circulating": 120, "circulatingPrevWeek": 100},
            {"id": "shrinking", "circulating": 80, "circulatingPrevWeek": 100}
        ]});

        for direction in [Direction::Ascending, Direction::Descending] {
            let snapshot =
                process(&response, Ranking::new(SortKey::PctWeek, direction)).unwrap();
            let last = snapshot.assets.last().unwrap();
            assert_eq!(last.record.id.as_deref(), Some("new"));
            assert_eq!(last.changes.pct_week, Percentage::Undefined);
        }
    }

    #[test]
    fn test_output_is_reproducible() {
        let first = process(&scenario(), Ranking::default()).unwrap();
        let second = process(&scenario(), Ranking::default()).unwrap();
        assert_eq!(first, second);
    }
}
