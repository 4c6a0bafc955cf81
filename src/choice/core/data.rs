//! Choice data — validated choice sets built from long rows.
//!
//! Purpose
//! -------
//! Hold the long-format table in the shape the rest of the crate relies on:
//! choice sets with exactly `A` alternatives in position order and exactly one
//! chosen alternative. Construction is the only place those invariants are
//! checked; everything downstream trusts [`ChoiceData`].
//!
//! Key behaviors
//! -------------
//! - [`ChoiceData::from_long_rows`] groups rows by `choice_set_id`, drops any
//!   choice set with a missing (NaN) numeric attribute or demographic, then
//!   validates the survivors.
//! - Dropping is whole-set only; surviving sets keep their ids and their
//!   alternative order.
//!
//! Invariants & assumptions
//! ------------------------
//! - `ChoiceSet::alternatives[j]` is the alternative at 1-based position
//!   `j + 1`; `ChoiceSet::chosen` is a 0-based index into that vector.
//! - Categorical strings are already normalized by the reshaper; this module
//!   does not touch them.
//!
//! Conventions
//! -----------
//! - Choice sets are ordered by ascending `choice_set_id`.
//! - Missing numerics are encoded as `f64::NAN` in [`LongRow`].
//!
//! Testing notes
//! -------------
//! - Unit tests cover grouping and ordering, whole-set dropping, and each hard
//!   validation failure.
use crate::choice::{
    core::options::ReshapeOptions,
    errors::{ChoiceError, ChoiceResult},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// Attributes of one alternative as offered to a decision maker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alternative {
    /// Vehicle body type, e.g. `"suv"`.
    #[serde(rename = "type")]
    pub vehicle_type: String,
    pub fuel: String,
    pub price: f64,
    pub speed: f64,
    pub pollution: f64,
    pub size: f64,
}

impl Alternative {
    pub fn new(
        vehicle_type: &str, fuel: &str, price: f64, speed: f64, pollution: f64, size: f64,
    ) -> Self {
        Alternative {
            vehicle_type: vehicle_type.to_string(),
            fuel: fuel.to_string(),
            price,
            speed,
            pollution,
            size,
        }
    }

    fn has_missing_numeric(&self) -> bool {
        [self.price, self.speed, self.pollution, self.size].iter().any(|v| !v.is_finite())
    }
}

/// Decision-maker covariates, shared by every alternative of a choice set.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Demographics {
    #[serde(default)]
    pub college: f64,
    #[serde(default)]
    pub hsg2: f64,
    #[serde(default)]
    pub coml5: f64,
}

impl Demographics {
    pub fn new(college: f64, hsg2: f64, coml5: f64) -> Self {
        Demographics { college, hsg2, coml5 }
    }

    fn has_missing(&self) -> bool {
        [self.college, self.hsg2, self.coml5].iter().any(|v| !v.is_finite())
    }
}

/// One alternative of one choice set (long format).
#[derive(Debug, Clone, PartialEq)]
pub struct LongRow {
    pub choice_set_id: usize,
    /// 1-based position within the choice set.
    pub alternative_id: usize,
    pub chosen: bool,
    pub alternative: Alternative,
    pub demographics: Demographics,
}

/// A validated decision instance.
#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceSet {
    pub id: usize,
    pub alternatives: Vec<Alternative>,
    pub chosen: usize,
    pub demographics: Demographics,
}

/// Validated choice sets with a common number of alternatives.
#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceData {
    sets: Vec<ChoiceSet>,
    n_alternatives: usize,
    n_dropped: usize,
}

impl ChoiceData {
    /// Group, clean, and validate long rows.
    ///
    /// Errors
    /// ------
    /// - `EmptyData` if no choice set survives cleaning.
    /// - `WrongAlternativeCount`, `DuplicateAlternative`, `InvalidAlternativeId`,
    ///   `ChosenCountMismatch` for a surviving set that breaks the shape rules.
    pub fn from_long_rows(rows: Vec<LongRow>, opts: &ReshapeOptions) -> ChoiceResult<Self> {
        let n_alternatives = opts.n_alternatives;
        let mut groups: BTreeMap<usize, Vec<LongRow>> = BTreeMap::new();
        for row in rows {
            groups.entry(row.choice_set_id).or_default().push(row);
        }

        let n_groups = groups.len();
        groups.retain(|_, rows| {
            !rows.iter().any(|r| r.alternative.has_missing_numeric() || r.demographics.has_missing())
        });
        let n_dropped = n_groups - groups.len();
        if n_dropped > 0 {
            warn!(dropped = n_dropped, "dropping choice sets with missing numeric attributes");
        }

        let sets = groups
            .into_iter()
            .map(|(id, rows)| build_choice_set(id, rows, n_alternatives))
            .collect::<ChoiceResult<Vec<_>>>()?;
        if sets.is_empty() {
            return Err(ChoiceError::EmptyData);
        }
        Ok(ChoiceData { sets, n_alternatives, n_dropped })
    }

    /// Reassemble from sets that already passed validation (used by the
    /// splitter).
    pub(crate) fn from_validated_sets(sets: Vec<ChoiceSet>, n_alternatives: usize) -> Self {
        ChoiceData { sets, n_alternatives, n_dropped: 0 }
    }

    pub fn sets(&self) -> &[ChoiceSet] {
        &self.sets
    }

    pub fn into_sets(self) -> Vec<ChoiceSet> {
        self.sets
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    pub fn n_alternatives(&self) -> usize {
        self.n_alternatives
    }

    /// Choice sets removed for missing numerics during construction.
    pub fn n_dropped(&self) -> usize {
        self.n_dropped
    }
}

fn build_choice_set(id: usize, mut rows: Vec<LongRow>, n_alternatives: usize) -> ChoiceResult<ChoiceSet> {
    if rows.len() != n_alternatives {
        return Err(ChoiceError::WrongAlternativeCount {
            choice_set_id: id,
            expected: n_alternatives,
            found: rows.len(),
        });
    }
    rows.sort_by_key(|r| r.alternative_id);
    for (pos, row) in rows.iter().enumerate() {
        if row.alternative_id < 1 || row.alternative_id > n_alternatives {
            return Err(ChoiceError::InvalidAlternativeId {
                choice_set_id: id,
                alternative_id: row.alternative_id,
                n_alternatives,
            });
        }
        if pos > 0 && rows[pos - 1].alternative_id == row.alternative_id {
            return Err(ChoiceError::DuplicateAlternative {
                choice_set_id: id,
                alternative_id: row.alternative_id,
            });
        }
    }
    let n_chosen = rows.iter().filter(|r| r.chosen).count();
    if n_chosen != 1 {
        return Err(ChoiceError::ChosenCountMismatch { choice_set_id: id, found: n_chosen });
    }
    let chosen = rows.iter().position(|r| r.chosen).unwrap_or_default();
    let demographics = rows[0].demographics;
    let alternatives = rows.into_iter().map(|r| r.alternative).collect();
    Ok(ChoiceSet { id, alternatives, chosen, demographics })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Long rows for one choice set; `chosen` is 1-based, `prices[j]` feeds
    /// alternative `j + 1`.
    pub(crate) fn set_rows(id: usize, chosen: usize, prices: &[f64]) -> Vec<LongRow> {
        prices
            .iter()
            .enumerate()
            .map(|(j, &price)| LongRow {
                choice_set_id: id,
                alternative_id: j + 1,
                chosen: j + 1 == chosen,
                alternative: Alternative::new("sedan", "gasoline", price, 100.0, 0.5, 3.0),
                demographics: Demographics::default(),
            })
            .collect()
    }

    #[test]
    // Purpose
    // -------
    // Rows arriving out of order are grouped by set id and sorted by
    // position.
    //
    // Given
    // -----
    // - Two 3-alternative sets, rows reversed and interleaved.
    //
    // Expect
    // ------
    // - Sets ordered `[4, 9]`; alternatives ordered by position; `chosen`
    //   points at position 2 of set 9 (index 1).
    fn from_long_rows_groups_and_orders_alternatives() {
        let mut rows = set_rows(9, 2, &[10.0, 20.0, 30.0]);
        rows.extend(set_rows(4, 1, &[1.0, 2.0, 3.0]));
        rows.reverse();
        let opts = ReshapeOptions::new(3).unwrap();

        let data = ChoiceData::from_long_rows(rows, &opts).unwrap();

        assert_eq!(data.len(), 2);
        assert_eq!(data.sets()[0].id, 4);
        assert_eq!(data.sets()[1].id, 9);
        let prices: Vec<f64> = data.sets()[1].alternatives.iter().map(|a| a.price).collect();
        assert_eq!(prices, vec![10.0, 20.0, 30.0]);
        assert_eq!(data.sets()[1].chosen, 1);
    }

    #[test]
    // Purpose
    // -------
    // A NaN numeric drops its whole choice set and leaves the others
    // untouched.
    //
    // Given
    // -----
    // - Three sets; the middle one has a NaN price in one alternative.
    //
    // Expect
    // ------
    // - Sets `[0, 2]` survive with their original attribute order;
    //   `n_dropped == 1`.
    fn from_long_rows_drops_set_with_missing_numeric() {
        let mut rows = set_rows(0, 1, &[1.0, 2.0, 3.0]);
        rows.extend(set_rows(1, 1, &[1.0, f64::NAN, 3.0]));
        rows.extend(set_rows(2, 3, &[7.0, 8.0, 9.0]));
        let opts = ReshapeOptions::new(3).unwrap();

        let data = ChoiceData::from_long_rows(rows, &opts).unwrap();

        assert_eq!(data.n_dropped(), 1);
        let ids: Vec<usize> = data.sets().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![0, 2]);
        let prices: Vec<f64> = data.sets()[1].alternatives.iter().map(|a| a.price).collect();
        assert_eq!(prices, vec![7.0, 8.0, 9.0]);
        assert_eq!(data.sets()[1].chosen, 2);
    }

    #[test]
    // Purpose
    // -------
    // Shape violations are hard failures.
    //
    // Given
    // -----
    // - A set with two alternatives when three are expected.
    // - A set with no chosen alternative.
    // - A set with a repeated position.
    //
    // Expect
    // ------
    // - `WrongAlternativeCount`, `ChosenCountMismatch { found: 0 }`,
    //   `DuplicateAlternative`.
    fn from_long_rows_rejects_malformed_sets() {
        let opts = ReshapeOptions::new(3).unwrap();

        let short = set_rows(0, 1, &[1.0, 2.0]);
        assert_eq!(
            ChoiceData::from_long_rows(short, &opts),
            Err(ChoiceError::WrongAlternativeCount { choice_set_id: 0, expected: 3, found: 2 })
        );

        let unchosen = set_rows(5, 0, &[1.0, 2.0, 3.0]);
        assert_eq!(
            ChoiceData::from_long_rows(unchosen, &opts),
            Err(ChoiceError::ChosenCountMismatch { choice_set_id: 5, found: 0 })
        );

        let mut dup = set_rows(3, 1, &[1.0, 2.0, 3.0]);
        dup[2].alternative_id = 2;
        assert_eq!(
            ChoiceData::from_long_rows(dup, &opts),
            Err(ChoiceError::DuplicateAlternative { choice_set_id: 3, alternative_id: 2 })
        );
    }

    #[test]
    // Purpose
    // -------
    // Dropping every set is reported as empty data, not as success.
    //
    // Given
    // -----
    // - A single set with an infinite demographic value.
    //
    // Expect
    // ------
    // - `EmptyData`.
    fn from_long_rows_all_dropped_is_empty_data() {
        let mut rows = set_rows(0, 1, &[1.0, 2.0, 3.0]);
        for r in rows.iter_mut() {
            r.demographics.hsg2 = f64::NAN;
        }
        let opts = ReshapeOptions::new(3).unwrap();

        assert_eq!(ChoiceData::from_long_rows(rows, &opts), Err(ChoiceError::EmptyData));
    }
}
