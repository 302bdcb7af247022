//! Presentation ordering of change-metric rows.
//!
//! Rows are ordered by the chosen key in the chosen direction, ties broken
//! by current supply ascending. Rows whose key is an undefined percentage
//! always go last, whatever the direction.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::metrics::{Horizon, SupplySnapshots, WithChanges};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Current,
    PrevDay,
    PrevWeek,
    PrevMonth,
    DeltaDay,
    DeltaWeek,
    DeltaMonth,
    PctDay,
    PctWeek,
    PctMonth,
}

impl SortKey {
    /// Key value for a row; `None` when the key is an undefined percentage.
    pub fn value<T: SupplySnapshots>(self, row: &WithChanges<T>) -> Option<f64> {
        let record = &row.record;
        let changes = &row.changes;
        match self {
            SortKey::Current => Some(record.current()),
            SortKey::PrevDay => Some(record.previous(Horizon::Day)),
            SortKey::PrevWeek => Some(record.previous(Horizon::Week)),
            SortKey::PrevMonth => Some(record.previous(Horizon::Month)),
            SortKey::DeltaDay => Some(changes.delta_day),
            SortKey::DeltaWeek => Some(changes.delta_week),
            SortKey::DeltaMonth => Some(changes.delta_month),
            SortKey::PctDay => changes.pct_day.value(),
            SortKey::PctWeek => changes.pct_week.value(),
            SortKey::PctMonth => changes.pct_month.value(),
        }
    }

    pub fn pct(horizon: Horizon) -> Self {
        match horizon {
            Horizon::Day => SortKey::PctDay,
            Horizon::Week => SortKey::PctWeek,
            Horizon::Month => SortKey::PctMonth,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Ascending,
    Descending,
}

/// Sort key plus direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ranking {
    pub key: SortKey,
    pub direction: Direction,
}

impl Default for Ranking {
    fn default() -> Self {
        Self {
            key: SortKey::PctDay,
            direction: Direction::Ascending,
        }
    }
}

impl Ranking {
    pub fn new(key: SortKey, direction: Direction) -> Self {
        Self { key, direction }
    }

    pub fn compare<T: SupplySnapshots>(&self, a: &WithChanges<T>, b: &WithChanges<T>) -> Ordering {
        let by_key = match (self.key.value(a), self.key.value(b)) {
            (Some(x), Some(y)) => match self.direction {
                Direction::Ascending => x.total_cmp(&y),
                Direction::Descending => y.total_cmp(&x),
            },
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };

        by_key.then_with(|| a.record.current().total_cmp(&b.record.current()))
    }
}

/// Reorder rows in place.
pub fn rank<T: SupplySnapshots>(rows: &mut [WithChanges<T>], ranking: Ranking) {
    rows.sort_by(|a, b| ranking.compare(a, b));
}

/// The `n` rows with the largest defined percentage change over `horizon`.
pub fn top_movers<T: SupplySnapshots>(
    rows: &[WithChanges<T>],
    horizon: Horizon,
    n: usize,
) -> Vec<&WithChanges<T>> {
    let ranking = Ranking::new(SortKey::pct(horizon), Direction::Descending);

    let mut movers: Vec<&WithChanges<T>> = rows
        .iter()
        .filter(|row| row.changes.pct(horizon).is_defined())
        .collect();
    movers.sort_by(|a, b| ranking.compare(*a, *b));
    movers.truncate(n);
    movers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::chain::ChainRecord;
    use crate::processor::metrics::{compute_changes, ChainRow};

    fn rows(values: &[(&str, f64, f64, f64)]) -> Vec<ChainRow> {
        compute_changes(
            values
                .iter()
                .map(|(chain, current, prev_day, prev_week)| ChainRecord {
                    asset_id: Some("1".to_string()),
                    asset_name: None,
                    asset_symbol: None,
                    chain: chain.to_string(),
                    current: *current,
                    prev_day: *prev_day,
                    prev_week: *prev_week,
                    prev_month: 0.0,
                })
                .collect(),
        )
    }

    fn chains(rows: &[ChainRow]) -> Vec<&str> {
        rows.iter().map(|r| r.record.chain.as_str()).collect()
    }

    #[test]
    fn test_rank_by_pct_ascending_and_descending() {
        // pct_day: A=+10%, B=-50%, C=+100%
        let mut data = rows(&[("A", 110.0, 100.0, 1.0), ("B", 50.0, 100.0, 1.0), ("C", 20.0, 10.0, 1.0)]);

        rank(&mut data, Ranking::new(SortKey::PctDay, Direction::Ascending));
        assert_eq!(chains(&data), vec!["B", "A", "C"]);

        rank(&mut data, Ranking::new(SortKey::PctDay, Direction::Descending));
        assert_eq!(chains(&data), vec!["C", "A", "B"]);
    }

    #[test]
    fn test_undefined_sorts_last_in_both_directions() {
        // pct_week undefined for Z (prev_week = 0)
        let mut data = rows(&[("Z", 50.0, 1.0, 0.0), ("A", 10.0, 1.0, 5.0), ("B", 30.0, 1.0, 10.0)]);

        rank(&mut data, Ranking::new(SortKey::PctWeek, Direction::Ascending));
        assert_eq!(chains(&data), vec!["A", "B", "Z"]);

        rank(&mut data, Ranking::new(SortKey::PctWeek, Direction::Descending));
        assert_eq!(chains(&data), vec!["B", "A", "Z"]);
    }

    #[test]
    fn test_ties_break_on_current_ascending() {
        // Both +100% day change, different current
        let mut data = rows(&[("big", 200.0, 100.0, 1.0), ("small", 20.0, 10.0, 1.0)]);

        for _ in 0..3 {
            rank(&mut data, Ranking::new(SortKey::PctDay, Direction::Descending));
            assert_eq!(chains(&data), vec!["small", "big"]);
            rank(&mut data, Ranking::new(SortKey::PctDay, Direction::Ascending));
            assert_eq!(chains(&data), vec!["small", "big"]);
        }
    }

    #[test]
    fn test_undefined_rows_ordered_by_current() {
        let mut data = rows(&[("c", 30.0, 1.0, 0.0), ("a", 10.0, 1.0, 0.0), ("b", 20.0, 1.0, 0.0)]);
        rank(&mut data, Ranking::new(SortKey::PctWeek, Direction::Descending));
        assert_eq!(chains(&data), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_rank_by_snapshot_field() {
        let mut data = rows(&[("x", 5.0, 1.0, 1.0), ("y", 15.0, 1.0, 1.0), ("z", 10.0, 1.0, 1.0)]);
        rank(&mut data, Ranking::new(SortKey::Current, Direction::Descending));
        assert_eq!(chains(&data), vec!["y", "z", "x"]);
    }

    #[test]
    fn test_top_movers_skip_undefined() {
        let data = rows(&[("flat", 10.0, 10.0, 0.0), ("up", 30.0, 10.0, 0.0), ("new", 5.0, 0.0, 0.0)]);

        let movers = top_movers(&data, Horizon::Day, 5);
        assert_eq!(
            movers.iter().map(|r| r.record.chain.as_str()).collect::<Vec<_>>(),
            vec!["up", "flat"]
        );
        assert_eq!(top_movers(&data, Horizon::Day, 1).len(), 1);
        assert!(top_movers(&data, Horizon::Week, 5).is_empty());
    }
}
