//! Change metrics over the day / week / month horizons.
//!
//! For each horizon `h`:
//! ```text
//! delta_h = current - prev_h
//! pct_h   = round2(delta_h / prev_h * 100)     (Undefined when prev_h == 0)
//! ```
//! Percentages are rounded here, once, so every consumer reads the same value.

use serde::{Deserialize, Serialize, Serializer};

use super::asset::AssetRecord;
use super::chain::ChainRecord;

/// Decimal places kept on percentage changes.
pub const PCT_DECIMALS: i32 = 2;

/// Comparison interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Horizon {
    Day,
    Week,
    Month,
}

impl Horizon {
    pub const ALL: [Horizon; 3] = [Horizon::Day, Horizon::Week, Horizon::Month];
}

/// Uniform access to the four supply snapshots of a flat record.
pub trait SupplySnapshots {
    fn current(&self) -> f64;
    fn previous(&self, horizon: Horizon) -> f64;
}

impl SupplySnapshots for AssetRecord {
    fn current(&self) -> f64 {
        self.circulating_current
    }

    fn previous(&self, horizon: Horizon) -> f64 {
        match horizon {
            Horizon::Day => self.circulating_prev_day,
            Horizon::Week => self.circulating_prev_week,
            Horizon::Month => self.circulating_prev_month,
        }
    }
}

impl SupplySnapshots for ChainRecord {
    fn current(&self) -> f64 {
        self.current
    }

    fn previous(&self, horizon: Horizon) -> f64 {
        match horizon {
            Horizon::Day => self.prev_day,
            Horizon::Week => self.prev_week,
            Horizon::Month => self.prev_month,
        }
    }
}

/// Percentage change, or `Undefined` when the previous value was zero.
///
/// Serializes as a number or `null`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Percentage {
    Defined(f64),
    Undefined,
}

impl Percentage {
    pub fn of(delta: f64, previous: f64) -> Self {
        if previous == 0.0 {
            return Percentage::Undefined;
        }
        let pct = delta / previous * 100.0;
        if pct.is_finite() {
            Percentage::Defined(round_to(pct, PCT_DECIMALS))
        } else {
            Percentage::Undefined
        }
    }

    pub fn value(self) -> Option<f64> {
        match self {
            Percentage::Defined(v) => Some(v),
            Percentage::Undefined => None,
        }
    }

    pub fn is_defined(self) -> bool {
        matches!(self, Percentage::Defined(_))
    }
}

impl Serialize for Percentage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Percentage::Defined(v) => serializer.serialize_f64(*v),
            Percentage::Undefined => serializer.serialize_none(),
        }
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Derived change fields attached to a record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChangeMetrics {
    pub delta_day: f64,
    pub pct_day: Percentage,
    pub delta_week: f64,
    pub pct_week: Percentage,
    pub delta_month: f64,
    pub pct_month: Percentage,
}

impl ChangeMetrics {
    pub fn compute<T: SupplySnapshots>(record: &T) -> Self {
        let current = record.current();
        let change = |horizon| {
            let previous = record.previous(horizon);
            let delta = current - previous;
            (delta, Percentage::of(delta, previous))
        };

        let (delta_day, pct_day) = change(Horizon::Day);
        let (delta_week, pct_week) = change(Horizon::Week);
        let (delta_month, pct_month) = change(Horizon::Month);

        Self {
            delta_day,
            pct_day,
            delta_week,
            pct_week,
            delta_month,
            pct_month,
        }
    }

    pub fn delta(&self, horizon: Horizon) -> f64 {
        match horizon {
            Horizon::Day => self.delta_day,
            Horizon::Week => self.delta_week,
            Horizon::Month => self.delta_month,
        }
    }

    pub fn pct(&self, horizon: Horizon) -> Percentage {
        match horizon {
            Horizon::Day => self.pct_day,
            Horizon::Week => self.pct_week,
            Horizon::Month => self.pct_month,
        }
    }
}

/// A record augmented with its change metrics. Serializes flat.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WithChanges<T> {
    #[serde(flatten)]
    pub record: T,
    #[serde(flatten)]
    pub changes: ChangeMetrics,
}

pub type AssetRow = WithChanges<AssetRecord>;
pub type ChainRow = WithChanges<ChainRecord>;

/// Attach change metrics to every record, keeping order.
pub fn compute_changes<T: SupplySnapshots>(records: Vec<T>) -> Vec<WithChanges<T>> {
    records
        .into_iter()
        .map(|record| WithChanges {
            changes: ChangeMetrics::compute(&record),
            record,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(current: f64, prev_day: f64, prev_week: f64, prev_month: f64) -> ChainRecord {
        ChainRecord {
            asset_id: Some("1".to_string()),
            asset_name: Some("X".to_string()),
            asset_symbol: Some("X".to_string()),
            chain: "Ethereum".to_string(),
            current,
            prev_day,
            prev_week,
            prev_month,
        }
    }

    #[test]
    fn test_delta_and_pct() {
        let metrics = ChangeMetrics::compute(&chain(120.0, 100.0, 150.0, 120.0));

        assert_eq!(metrics.delta_day, 20.0);
        assert_eq!(metrics.pct_day, Percentage::Defined(20.0));
        assert_eq!(metrics.delta_week, -30.0);
        assert_eq!(metrics.pct_week, Percentage::Defined(-20.0));
        assert_eq!(metrics.delta_month, 0.0);
        assert_eq!(metrics.pct_month, Percentage::Defined(0.0));
    }

    #[test]
    fn test_pct_is_rounded_to_two_decimals() {
        let metrics = ChangeMetrics::compute(&chain(40.0, 30.0, 70.0, 3.0));

        assert_eq!(metrics.pct_day, Percentage::Defined(33.33));
        assert_eq!(metrics.pct_week, Percentage::Defined(-42.86));
        assert_eq!(metrics.pct_month, Percentage::Defined(1233.33));
    }

    #[test]
    fn test_zero_previous_is_undefined() {
        let metrics = ChangeMetrics::compute(&chain(50.0, 50.0, 0.0, 0.0));

        assert_eq!(metrics.delta_week, 50.0);
        assert_eq!(metrics.pct_week, Percentage::Undefined);
        assert_ne!(metrics.pct_week, Percentage::Defined(0.0));
        assert_eq!(metrics.pct_day, Percentage::Defined(0.0));

        let both_zero = ChangeMetrics::compute(&chain(0.0, 0.0, 0.0, 0.0));
        assert_eq!(both_zero.delta_day, 0.0);
        assert_eq!(both_zero.pct_day, Percentage::Undefined);
    }

    #[test]
    fn test_rows_keep_every_key() {
        let rows = compute_changes(vec![chain(50.0, 40.0, 0.0, 25.0)]);
        let json = serde_json::to_value(&rows[0]).unwrap();
        let obj = json.as_object().unwrap();

        for key in [
            "asset_id", "chain", "current", "prev_day", "delta_day", "pct_day", "delta_week",
            "pct_week", "delta_month", "pct_month",
        ] {
            assert!(obj.contains_key(key), "missing {}", key);
        }
        assert_eq!(obj["pct_day"], serde_json::json!(25.0));
        assert!(obj["pct_week"].is_null());
        assert_eq!(obj["pct_month"], serde_json::json!(100.0));
    }

    #[test]
    fn test_compute_changes_keeps_order() {
        let rows = compute_changes(vec![chain(1.0, 1.0, 1.0, 1.0), chain(2.0, 1.0, 1.0, 1.0)]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].record.current, 1.0);
        assert_eq!(rows[1].record.current, 2.0);
        assert_eq!(rows[1].changes.pct(Horizon::Day), Percentage::Defined(100.0));
        assert_eq!(rows[1].changes.delta(Horizon::Month), 1.0);
    }
}
