//! Stateless helpers shared by the grid assembler and the aggregator.

use std::sync::LazyLock;

use regex::Regex;

use crate::spec::{EnumCellValue, PalletError, Result, RowRecord, SpecPalletPolicy};

static RE_DIGIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("[0-9]").expect("digit pattern compiles"));

////////////////////////////////////////////////////////////////////////////////
// #region FieldParsing

/// Extract slot numbers from a record value.
///
/// Numeric values yield themselves (truncated); text yields every decimal
/// digit as its own number, so `"1,3"` and `"13"` both give `[1, 3]`.
pub fn find_numbers_in_text(field: &str, value: &EnumCellValue) -> Result<Vec<i64>> {
    match value {
        EnumCellValue::None => Ok(vec![]),
        EnumCellValue::Number(n) => {
            if !n.is_finite() {
                return Err(PalletError::InvalidField {
                    field: field.to_string(),
                    value: n.to_string(),
                });
            }
            Ok(vec![n.trunc() as i64])
        }
        EnumCellValue::String(s) => Ok(RE_DIGIT
            .find_iter(s)
            .filter_map(|m| m.as_str().parse::<i64>().ok())
            .collect()),
    }
}

/// Parse a count field; missing or blank values count as zero.
pub fn parse_count(field: &str, value: &EnumCellValue) -> Result<u64> {
    let err_invalid = || PalletError::InvalidField {
        field: field.to_string(),
        value: value.to_text(),
    };
    match value {
        _ if value.is_blank() => Ok(0),
        EnumCellValue::Number(n) => {
            if !n.is_finite() || *n < 0.0 {
                return Err(err_invalid());
            }
            Ok(n.trunc() as u64)
        }
        EnumCellValue::String(s) => {
            let c_text = s.trim();
            if let Ok(n) = c_text.parse::<u64>() {
                return Ok(n);
            }
            match c_text.parse::<f64>() {
                Ok(n) if n.is_finite() && n >= 0.0 => Ok(n.trunc() as u64),
                _ => Err(err_invalid()),
            }
        }
        EnumCellValue::None => Ok(0),
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SlotAddressing

/// Convert a 1-based slot value into a vector length, rejecting `<= 0`.
pub(crate) fn cast_index_1based(value: i64) -> Option<usize> {
    usize::try_from(value).ok().filter(|n| *n >= 1)
}

/// Pad `items` with defaults until `idx_1based` exists and return that entry.
///
/// `idx_1based` must be `>= 1`.
pub(crate) fn extend_to_1based<T: Default>(items: &mut Vec<T>, idx_1based: usize) -> &mut T {
    debug_assert!(idx_1based >= 1, "slot indices are 1-based");
    if items.len() < idx_1based {
        items.resize_with(idx_1based, T::default);
    }
    &mut items[idx_1based - 1]
}

/// Validate one side value of `row`.
pub(crate) fn validate_side(row: &RowRecord, side: i64) -> Result<usize> {
    cast_index_1based(side).ok_or_else(|| PalletError::NonPositiveSide {
        side,
        baby_zppk: row.baby_zppk.clone(),
    })
}

/// Validate that `row` targets at least one side and one column.
pub(crate) fn validate_row_targets(row: &RowRecord) -> Result<()> {
    if row.sides.is_empty() {
        return Err(PalletError::EmptySides {
            baby_zppk: row.baby_zppk.clone(),
        });
    }
    if row.columns.is_empty() {
        return Err(PalletError::EmptyColumns {
            baby_zppk: row.baby_zppk.clone(),
        });
    }
    Ok(())
}

/// Whether the row's first column is the "every column" sentinel.
pub(crate) fn is_sentinel_row(row: &RowRecord, policy: &SpecPalletPolicy) -> bool {
    row.columns.first() == Some(&policy.column_sentinel)
}

/// Resolve the columns a row fills on `side`.
///
/// Repeat mode yields the full run for the side parity; otherwise the row's
/// own columns are used after validation.
pub(crate) fn derive_effective_columns(
    row: &RowRecord,
    side: i64,
    if_repeat_columns: bool,
    policy: &SpecPalletPolicy,
) -> Result<Vec<usize>> {
    if if_repeat_columns || is_sentinel_row(row, policy) {
        let n_run = if side % 2 == 0 {
            policy.columns_even_side
        } else {
            policy.columns_odd_side
        };
        return Ok((1..=n_run).filter_map(cast_index_1based).collect());
    }

    row.columns
        .iter()
        .map(|column| {
            cast_index_1based(*column).ok_or_else(|| PalletError::NonPositiveColumn {
                side,
                column: *column,
                baby_zppk: row.baby_zppk.clone(),
            })
        })
        .collect()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region DesignKeys

/// Build the catalog lookup key of a slot from the row that opened it.
pub fn derive_design_key(row: &RowRecord, len_logo_prefix: usize) -> String {
    let c_logo_prefix: String = row.logo_description.chars().take(len_logo_prefix).collect();
    let c_color = row.color_description.replace(',', "");
    [c_logo_prefix.as_str(), c_color.as_str(), row.team_key.as_str()].join(" ")
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Workers

/// Clamp the requested worker count to `[1, available_parallelism]`.
pub(crate) fn calculate_worker_limit(num_workers_max: Option<usize>) -> usize {
    let n_cpu = std::thread::available_parallelism()
        .map(|v| v.get())
        .unwrap_or(1);

    match num_workers_max {
        Some(n) => n.clamp(1, n_cpu),
        None => n_cpu.clamp(1, 8),
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
