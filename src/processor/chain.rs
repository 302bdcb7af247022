//! Per-chain explosion of a raw asset entry's `chainCirculating` map.

use serde::Serialize;
use serde_json::Value;

use super::asset::{read_text, supply_field};
use super::diagnostics::{DiagnosticKind, Diagnostics, Scope};
use super::keys;

/// Flat per-stablecoin, per-chain record for a single fetch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChainRecord {
    // Owning asset
    pub asset_id: Option<String>,
    pub asset_name: Option<String>,
    pub asset_symbol: Option<String>,

    pub chain: String,

    // Supply snapshots on this chain
    pub current: f64,
    pub prev_day: f64,
    pub prev_week: f64,
    pub prev_month: f64,
}

/// Explode one raw asset entry into one record per chain, in provider order.
///
/// An absent or empty chain map yields no records. A chain entry missing a
/// snapshot gets `0.0` for it; a chain entry that is not a mapping keeps the
/// chain with all snapshots at `0.0`.
pub fn explode_chains(index: usize, raw: &Value, diagnostics: &mut Diagnostics) -> Vec<ChainRecord> {
    let Some(map) = raw.as_object() else {
        return Vec::new();
    };

    let asset_id = read_text(map, keys::ID).0;
    let asset_name = read_text(map, keys::NAME).0;
    let asset_symbol = read_text(map, keys::SYMBOL).0;
    let scope = Scope::asset(index, asset_id.as_deref());

    let chains = match map.get(keys::CHAIN_CIRCULATING) {
        None | Some(Value::Null) => return Vec::new(),
        Some(Value::Object(chains)) => chains,
        Some(_) => {
            diagnostics.push(scope.report(
                Some(keys::CHAIN_CIRCULATING),
                DiagnosticKind::MalformedField,
            ));
            return Vec::new();
        },
    };

    let mut records = Vec::with_capacity(chains.len());

    for (chain, entry) in chains {
        let chain_scope = scope.with_chain(chain);

        let (current, prev_day, prev_week, prev_month) = match entry.as_object() {
            Some(entry) => (
                supply_field(entry, keys::CHAIN_CURRENT, &chain_scope, diagnostics),
                supply_field(entry, keys::PREV_DAY, &chain_scope, diagnostics),
                supply_field(entry, keys::PREV_WEEK, &chain_scope, diagnostics),
                supply_field(entry, keys::PREV_MONTH, &chain_scope, diagnostics),
            ),
            None => {
                diagnostics.push(chain_scope.report(None, DiagnosticKind::MalformedChainEntry));
                (0.0, 0.0, 0.0, 0.0)
            },
        };

        records.push(ChainRecord {
            asset_id: asset_id.clone(),
            asset_name: asset_name.clone(),
            asset_symbol: asset_symbol.clone(),
            chain: chain.clone(),
            current,
            prev_day,
            prev_week,
            prev_month,
        });
    }

    records
}
