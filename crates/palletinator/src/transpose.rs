//! Column-major slot lists <-> header-labeled table rows.

use crate::spec::{PalletError, Result};

/// Pivot slot lists into one row per header.
///
/// Row `i` is `[headers[i], columns[0][i], columns[1][i], ...]`. Every column
/// must hold exactly one entry per header.
pub fn flip_pallet_sides<S: AsRef<str>>(
    columns: &[Vec<String>],
    headers: &[S],
) -> Result<Vec<Vec<String>>> {
    for (idx_column, column) in columns.iter().enumerate() {
        if column.len() != headers.len() {
            return Err(PalletError::ColumnLengthMismatch {
                idx_column,
                expected: headers.len(),
                actual: column.len(),
            });
        }
    }

    Ok(headers
        .iter()
        .enumerate()
        .map(|(idx_row, header)| {
            let mut row = Vec::with_capacity(columns.len() + 1);
            row.push(header.as_ref().to_string());
            row.extend(columns.iter().map(|column| column[idx_row].clone()));
            row
        })
        .collect())
}

/// Undo [`flip_pallet_sides`]: strip header labels and regroup by column.
pub fn restore_pallet_columns<S: AsRef<str>>(
    rows: &[Vec<String>],
    headers: &[S],
) -> Result<Vec<Vec<String>>> {
    if rows.len() != headers.len() {
        return Err(PalletError::RowCountMismatch {
            expected: headers.len(),
            actual: rows.len(),
        });
    }

    let n_columns = rows.first().map_or(0, |row| row.len().saturating_sub(1));
    for (idx_row, (row, header)) in rows.iter().zip(headers).enumerate() {
        let Some((label, _)) = row.split_first() else {
            return Err(PalletError::MalformedRow {
                idx_row,
                message: "missing header label".to_string(),
            });
        };
        if label != header.as_ref() {
            return Err(PalletError::MalformedRow {
                idx_row,
                message: format!("label {label:?} != header {:?}", header.as_ref()),
            });
        }
        if row.len() - 1 != n_columns {
            return Err(PalletError::MalformedRow {
                idx_row,
                message: format!("{} values; expected {n_columns}", row.len() - 1),
            });
        }
    }

    Ok((1..=n_columns)
        .map(|idx_col| rows.iter().map(|row| row[idx_col].clone()).collect())
        .collect())
}
