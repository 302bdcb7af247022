//! Per-chain supply history from a single `stablecoin/{id}` detail response.
//!
//! The detail response carries `chainBalances.{chain}.tokens[]`, one point
//! per day with `date` in epoch seconds and supply values in the same
//! scalar-or-peg-map shape as the listing endpoint.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use super::asset::{read_text, supply_field};
use super::diagnostics::{DiagnosticKind, Diagnostics, Scope};
use super::keys;
use super::supply::extract_scalar;

/// One dated supply observation on one chain.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChainBalancePoint {
    pub chain: String,
    pub date: DateTime<Utc>,
    pub circulating: f64,
    pub minted: f64,
}

/// Flatten every chain's balance series, chains in provider order and
/// points in series order.
///
/// Points without a usable `date` are dropped and reported; the diagnostic
/// index is the point's position within its chain series.
pub fn explode_chain_balances(detail: &Value, diagnostics: &mut Diagnostics) -> Vec<ChainBalancePoint> {
    let Some(map) = detail.as_object() else {
        return Vec::new();
    };
    let Some(Value::Object(balances)) = map.get(keys::CHAIN_BALANCES) else {
        return Vec::new();
    };

    let asset_id = read_text(map, keys::ID).0;
    let mut points = Vec::new();

    for (chain, balance) in balances {
        let series = match balance.get(keys::TOKENS) {
            Some(Value::Array(series)) => series,
            _ => continue,
        };

        for (i, point) in series.iter().enumerate() {
            let scope = Scope::asset(i, asset_id.as_deref()).with_chain(chain);

            let Some(point) = point.as_object() else {
                diagnostics.push(scope.report(None, DiagnosticKind::SkippedRecord));
                continue;
            };

            let Some(date) = point.get(keys::DATE).and_then(parse_epoch_seconds) else {
                diagnostics.push(scope.report(Some(keys::DATE), DiagnosticKind::MalformedField));
                continue;
            };

            points.push(ChainBalancePoint {
                chain: chain.clone(),
                date,
                circulating: supply_field(point, keys::CIRCULATING, &scope, diagnostics),
                minted: extract_scalar(point.get(keys::MINTED)),
            });
        }
    }

    points
}

fn parse_epoch_seconds(raw: &Value) -> Option<DateTime<Utc>> {
    let secs = match raw {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?,
        Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    DateTime::<Utc>::from_timestamp(secs, 0)
}
