//! Dense, 1-based pallet grid used for diagram rendering.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::util::extend_to_1based;

/// A cell of a pallet column.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PalletCell {
    /// Text printed in the cell.
    pub display_text: String,
    /// Free-form cell metadata.
    pub metadata: BTreeMap<String, String>,
}

/// A column of a pallet side; cells are stacked in row processing order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PalletColumn {
    pub cells: Vec<PalletCell>,
}

/// A side of a pallet.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PalletSide {
    pub columns: Vec<PalletColumn>,
}

impl PalletSide {
    /// Column at 1-based `column`, if present.
    pub fn column(&self, column: usize) -> Option<&PalletColumn> {
        column.checked_sub(1).and_then(|idx| self.columns.get(idx))
    }

    /// Column at 1-based `column`, padding lower columns with empty ones.
    pub fn column_mut(&mut self, column: usize) -> &mut PalletColumn {
        extend_to_1based(&mut self.columns, column)
    }
}

/// A pallet: ordered sides plus pallet-level metadata.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Pallet {
    pub metadata: BTreeMap<String, String>,
    pub sides: Vec<PalletSide>,
}

impl Pallet {
    /// Side at 1-based `side`, if present.
    pub fn side(&self, side: usize) -> Option<&PalletSide> {
        side.checked_sub(1).and_then(|idx| self.sides.get(idx))
    }

    /// Side at 1-based `side`, padding lower sides with empty ones.
    pub fn side_mut(&mut self, side: usize) -> &mut PalletSide {
        extend_to_1based(&mut self.sides, side)
    }

    /// Cells of the slot at 1-based (`side`, `column`); empty when absent.
    pub fn cells(&self, side: usize, column: usize) -> &[PalletCell] {
        self.side(side)
            .and_then(|s| s.column(column))
            .map(|c| c.cells.as_slice())
            .unwrap_or(&[])
    }

    /// Total number of cells across the grid.
    pub fn cell_count(&self) -> usize {
        self.sides
            .iter()
            .flat_map(|s| s.columns.iter())
            .map(|c| c.cells.len())
            .sum()
    }
}
