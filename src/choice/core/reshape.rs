//! Wide-to-long reshaping of survey rows.
//!
//! A wide record holds one choice task: per-alternative columns suffixed
//! `1..=A` (`type1`, `price3`, ...), a `choice` token naming the chosen
//! position, and optional demographic columns. [`reshape_wide`] emits one
//! [`LongRow`] per alternative; [`reshape_to_choice_data`] additionally runs
//! the cleaning and validation of [`ChoiceData::from_long_rows`].
use crate::choice::{
    core::{
        data::{Alternative, ChoiceData, Demographics, LongRow},
        options::{ReshapeOptions, normalize_category},
    },
    errors::{ChoiceError, ChoiceResult},
};
use std::collections::HashMap;
use tracing::warn;

/// One raw data row: column name → raw cell text.
pub type WideRecord = HashMap<String, String>;

/// Per-alternative column stems, in file order.
pub const ALTERNATIVE_STEMS: [&str; 6] = ["type", "fuel", "price", "speed", "pollution", "size"];

pub const CHOICE_COLUMN: &str = "choice";

pub const DEMOGRAPHIC_COLUMNS: [&str; 3] = ["college", "hsg2", "coml5"];

/// Parse a chosen-alternative token: `"choice3"` (prefix in any case) or a
/// bare integer such as `"3"` or `"3.0"`. Returns `None` when neither form
/// applies.
pub fn parse_choice_token(raw: &str) -> Option<usize> {
    let token = raw.trim();
    let digits = match token.get(..CHOICE_COLUMN.len()) {
        Some(prefix) if prefix.eq_ignore_ascii_case(CHOICE_COLUMN) => {
            token[CHOICE_COLUMN.len()..].trim()
        }
        _ => token,
    };
    if let Ok(n) = digits.parse::<usize>() {
        return Some(n);
    }
    // Integer columns with gaps often round-trip through floats.
    match digits.parse::<f64>() {
        Ok(x) if x.is_finite() && x >= 0.0 && x.fract() == 0.0 => Some(x as usize),
        _ => None,
    }
}

/// Coerce a numeric cell; anything unparseable becomes `NaN`.
pub fn parse_numeric(raw: &str) -> f64 {
    raw.trim().parse::<f64>().unwrap_or(f64::NAN)
}

/// Reshape wide records into long rows.
///
/// The choice-set id of a record is its position in `records`. An
/// unparseable choice token falls back to alternative 1 with a warning; a
/// parsed index outside `1..=A` is kept as-is and fails validation later
/// because no alternative ends up chosen.
///
/// # Errors
/// `MissingColumn` if a record lacks any `{stem}{j}` column or `choice`.
pub fn reshape_wide(records: &[WideRecord], opts: &ReshapeOptions) -> ChoiceResult<Vec<LongRow>> {
    let n_alternatives = opts.n_alternatives;
    let mut rows = Vec::with_capacity(records.len() * n_alternatives);
    for (row_idx, record) in records.iter().enumerate() {
        let token = required(record, CHOICE_COLUMN)?;
        let chosen = parse_choice_token(token).unwrap_or_else(|| {
            warn!(row = row_idx, token = %token, "could not parse choice token, defaulting to 1");
            1
        });
        let demographics = Demographics::new(
            optional_numeric(record, DEMOGRAPHIC_COLUMNS[0]),
            optional_numeric(record, DEMOGRAPHIC_COLUMNS[1]),
            optional_numeric(record, DEMOGRAPHIC_COLUMNS[2]),
        );
        for j in 1..=n_alternatives {
            let cell = |stem: &str| required(record, &format!("{stem}{j}"));
            let alternative = Alternative {
                vehicle_type: normalize_category(cell("type")?),
                fuel: normalize_category(cell("fuel")?),
                price: parse_numeric(cell("price")?),
                speed: parse_numeric(cell("speed")?),
                pollution: parse_numeric(cell("pollution")?),
                size: parse_numeric(cell("size")?),
            };
            rows.push(LongRow {
                choice_set_id: row_idx,
                alternative_id: j,
                chosen: j == chosen,
                alternative,
                demographics,
            });
        }
    }
    Ok(rows)
}

/// [`reshape_wide`] followed by cleaning and validation.
pub fn reshape_to_choice_data(
    records: &[WideRecord], opts: &ReshapeOptions,
) -> ChoiceResult<ChoiceData> {
    ChoiceData::from_long_rows(reshape_wide(records, opts)?, opts)
}

fn required<'r>(record: &'r WideRecord, column: &str) -> ChoiceResult<&'r str> {
    record
        .get(column)
        .map(String::as_str)
        .ok_or_else(|| ChoiceError::MissingColumn { column: column.to_string() })
}

fn optional_numeric(record: &WideRecord, column: &str) -> f64 {
    record.get(column).map_or(0.0, |raw| parse_numeric(raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wide(choice: &str, extra: &[(&str, &str)]) -> WideRecord {
        let mut rec = WideRecord::new();
        rec.insert("choice".into(), choice.into());
        for j in 1..=3 {
            rec.insert(format!("type{j}"), " SUV ".into());
            rec.insert(format!("fuel{j}"), "Hybrid".into());
            rec.insert(format!("price{j}"), format!("{}", 10 * j));
            rec.insert(format!("speed{j}"), "95".into());
            rec.insert(format!("pollution{j}"), "0.4".into());
            rec.insert(format!("size{j}"), "2".into());
        }
        for (k, v) in extra {
            rec.insert((*k).into(), (*v).into());
        }
        rec
    }

    #[test]
    // Purpose
    // -------
    // Both token forms parse; garbage does not.
    //
    // Given
    // -----
    // - `"choice3"`, `" Choice 2 "`, `"4"`, `"5.0"`, `"first"`, `""`.
    //
    // Expect
    // ------
    // - `3`, `2`, `4`, `5`, `None`, `None`.
    fn parse_choice_token_accepts_prefixed_and_bare_forms() {
        assert_eq!(parse_choice_token("choice3"), Some(3));
        assert_eq!(parse_choice_token(" Choice 2 "), Some(2));
        assert_eq!(parse_choice_token("4"), Some(4));
        assert_eq!(parse_choice_token("5.0"), Some(5));
        assert_eq!(parse_choice_token("first"), None);
        assert_eq!(parse_choice_token(""), None);
    }

    #[test]
    // Purpose
    // -------
    // One wide record becomes `A` normalized long rows.
    //
    // Given
    // -----
    // - `choice = "choice2"`, `college = 1`, no `hsg2`/`coml5` columns.
    //
    // Expect
    // ------
    // - Three rows, positions 1..=3, only position 2 chosen; categories
    //   lowercased and trimmed; missing demographics default to 0.
    fn reshape_wide_emits_normalized_long_rows() {
        let opts = ReshapeOptions::new(3).unwrap();

        let rows = reshape_wide(&[wide("choice2", &[("college", "1")])], &opts).unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows.iter().map(|r| r.alternative_id).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(rows.iter().filter(|r| r.chosen).count(), 1);
        assert!(rows[1].chosen);
        assert_eq!(rows[0].alternative.vehicle_type, "suv");
        assert_eq!(rows[0].alternative.fuel, "hybrid");
        assert_eq!(rows[2].alternative.price, 30.0);
        assert_eq!(rows[0].demographics, Demographics::new(1.0, 0.0, 0.0));
    }

    #[test]
    // Purpose
    // -------
    // An unparseable choice token defaults to alternative 1.
    //
    // Given
    // -----
    // - `choice = "n/a"`.
    //
    // Expect
    // ------
    // - Position 1 is the chosen row.
    fn reshape_wide_defaults_unparseable_choice_to_first() {
        let opts = ReshapeOptions::new(3).unwrap();

        let rows = reshape_wide(&[wide("n/a", &[])], &opts).unwrap();

        assert!(rows[0].chosen);
        assert!(!rows[1].chosen && !rows[2].chosen);
    }

    #[test]
    // Purpose
    // -------
    // Non-numeric cells become NaN and the whole set is dropped downstream.
    //
    // Given
    // -----
    // - Two records; the first has `speed2 = "fast"`.
    //
    // Expect
    // ------
    // - `reshape_to_choice_data` keeps only choice set 1.
    fn non_numeric_cell_drops_its_choice_set() {
        let opts = ReshapeOptions::new(3).unwrap();
        let bad = wide("choice1", &[("speed2", "fast")]);
        let good = wide("choice3", &[]);

        let data = reshape_to_choice_data(&[bad, good], &opts).unwrap();

        assert_eq!(data.len(), 1);
        assert_eq!(data.sets()[0].id, 1);
        assert_eq!(data.sets()[0].chosen, 2);
    }

    #[test]
    // Purpose
    // -------
    // A chosen index outside `1..=A` leaves no chosen row and fails
    // validation.
    //
    // Given
    // -----
    // - `choice = "choice7"` with `A = 3`.
    //
    // Expect
    // ------
    // - `ChosenCountMismatch { found: 0 }`.
    fn out_of_range_choice_fails_validation() {
        let opts = ReshapeOptions::new(3).unwrap();

        let err = reshape_to_choice_data(&[wide("choice7", &[])], &opts).unwrap_err();

        assert_eq!(err, ChoiceError::ChosenCountMismatch { choice_set_id: 0, found: 0 });
    }

    #[test]
    // Purpose
    // -------
    // A missing per-alternative column is a hard error.
    //
    // Given
    // -----
    // - A record without `pollution3`.
    //
    // Expect
    // ------
    // - `MissingColumn { column: "pollution3" }`.
    fn missing_alternative_column_is_reported() {
        let opts = ReshapeOptions::new(3).unwrap();
        let mut rec = wide("1", &[]);
        rec.remove("pollution3");

        let err = reshape_wide(&[rec], &opts).unwrap_err();

        assert_eq!(err, ChoiceError::MissingColumn { column: "pollution3".to_string() });
    }
}
