//! CSV input for wide survey files.
use crate::choice::{
    core::{
        options::ReshapeOptions,
        reshape::{ALTERNATIVE_STEMS, CHOICE_COLUMN, WideRecord},
    },
    errors::{ChoiceError, ChoiceResult},
};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::{io::Read, path::Path};
use tracing::info;

/// Read a wide CSV file from disk. See [`read_wide_records`].
pub fn read_wide_csv<P: AsRef<Path>>(
    path: P, opts: &ReshapeOptions,
) -> ChoiceResult<Vec<WideRecord>> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)?;
    let records = read_wide_records(file, opts)?;
    info!(path = %path.display(), rows = records.len(), "loaded wide choice data");
    Ok(records)
}

/// Read wide records from any CSV source with a header row.
///
/// The header must contain `choice` and every `{stem}{j}` column for
/// `j = 1..=A`; other columns are carried along untouched. Cells are
/// whitespace-trimmed.
///
/// # Errors
/// - `MissingColumn` for the first required header that is absent.
/// - `Read` for malformed CSV or I/O failures.
pub fn read_wide_records<R: Read>(
    source: R, opts: &ReshapeOptions,
) -> ChoiceResult<Vec<WideRecord>> {
    let mut reader = ReaderBuilder::new().has_headers(true).trim(Trim::All).from_reader(source);
    let headers = reader.headers()?.clone();
    check_required_columns(&headers, opts)?;

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let record: WideRecord =
            headers.iter().zip(row.iter()).map(|(h, v)| (h.to_string(), v.to_string())).collect();
        records.push(record);
    }
    Ok(records)
}

fn check_required_columns(headers: &StringRecord, opts: &ReshapeOptions) -> ChoiceResult<()> {
    let has = |name: &str| headers.iter().any(|h| h == name);
    if !has(CHOICE_COLUMN) {
        return Err(ChoiceError::MissingColumn { column: CHOICE_COLUMN.to_string() });
    }
    for j in 1..=opts.n_alternatives {
        for stem in ALTERNATIVE_STEMS {
            let column = format!("{stem}{j}");
            if !has(&column) {
                return Err(ChoiceError::MissingColumn { column });
            }
        }
    }
    Ok(())
}
