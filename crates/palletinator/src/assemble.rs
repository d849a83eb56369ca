//! Grid assembly: rows -> dense diagram [`Pallet`].

use std::collections::BTreeMap;

use crate::conf::C_METADATA_DESIGN_KEY;
use crate::grid::{Pallet, PalletCell};
use crate::spec::{Result, RowRecord, SpecPalletPolicy};
use crate::util::{derive_effective_columns, validate_row_targets, validate_side};

/// Assemble a diagram grid from ordered rows.
///
/// Every (side, column) a row targets receives one cell carrying the row's
/// `baby_zppk`. Sides and columns are padded so every lower index exists.
/// With `if_repeat_columns` (or a sentinel first column) the row fills the
/// full column run of each side instead of its own columns.
///
/// Cells carry `design_key` = [`SpecPalletPolicy::design_key_deferred`]; this
/// representation is not wired to a design resolver.
///
/// Returns [`crate::PalletError`] on empty or non-positive side/column values;
/// the partially built grid is discarded.
pub fn parse_pallet(
    rows: &[RowRecord],
    if_repeat_columns: bool,
    policy: &SpecPalletPolicy,
) -> Result<Pallet> {
    let mut pallet = Pallet::default();
    for row in rows {
        validate_row_targets(row)?;
        for side in &row.sides {
            let n_side = validate_side(row, *side)?;
            let l_columns = derive_effective_columns(row, *side, if_repeat_columns, policy)?;

            let pallet_side = pallet.side_mut(n_side);
            for n_column in l_columns {
                pallet_side.column_mut(n_column).cells.push(PalletCell {
                    display_text: row.baby_zppk.clone(),
                    metadata: BTreeMap::from([(
                        C_METADATA_DESIGN_KEY.to_string(),
                        policy.design_key_deferred.clone(),
                    )]),
                });
            }
        }
    }
    Ok(pallet)
}
