//! Pallet specification models, policies and top-level error types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::conf::{
    C_DESIGN_KEY_DEFERRED, N_COLUMN_SENTINEL, N_COLUMNS_EVEN_SIDE, N_COLUMNS_ODD_SIDE,
    N_LEN_LOGO_KEY_PREFIX, N_SLOT_CAPACITY_MAX, TUP_DESIGN_IMAGE_SIZE_MAX, TUP_SIDE_HEADERS,
};
use crate::report::ReportSides;

/// Result alias for pallet operations.
pub type Result<T> = std::result::Result<T, PalletError>;

////////////////////////////////////////////////////////////////////////////////
// #region RowModels

/// Raw value of one parsed record field.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum EnumCellValue {
    /// Missing/blank value.
    #[default]
    None,
    /// Text value.
    String(String),
    /// Numeric value.
    Number(f64),
}

impl EnumCellValue {
    /// Text form of the value; blank for `None`.
    pub fn to_text(&self) -> String {
        match self {
            Self::None => String::new(),
            Self::String(s) => s.clone(),
            Self::Number(n) if n.fract() == 0.0 && n.is_finite() => (*n as i64).to_string(),
            Self::Number(n) => n.to_string(),
        }
    }

    /// Whether the value is missing or blank text.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::None => true,
            Self::String(s) => s.trim().is_empty(),
            Self::Number(_) => false,
        }
    }
}

/// Record keys holding each logical row field.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SpecColumnNames {
    /// Callout flag column; callout is always blank when unset.
    pub callout: Option<String>,
    /// Parent (group) identifier column.
    pub parent_zppk: String,
    /// Item identifier column.
    pub baby_zppk: String,
    /// Team key column.
    pub team_key: String,
    /// Team display name column.
    pub team_name: String,
    /// Requested pallet count column.
    pub requested_pallet_count: String,
    /// DC target date column; blank target when unset.
    pub date_column: Option<String>,
    /// Color description column.
    pub color_description: String,
    /// Logo description column.
    pub logo_description: String,
    /// Side column; every row lands on side 1 when unset or blank.
    pub side: Option<String>,
    /// Column (slot) column.
    pub column: String,
    /// Row column.
    pub row: String,
}

/// One order line of a pallet program sheet.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RowRecord {
    /// Callout text (blank when not flagged).
    pub callout: String,
    /// Group identifier.
    pub parent_zppk: String,
    /// Item identifier.
    pub baby_zppk: String,
    /// Team key.
    pub team_key: String,
    /// Team display name.
    pub team_name: String,
    /// Nonzero only on the last row of a pallet group.
    pub requested_pallet_count: u64,
    /// Distribution-center target.
    pub dc_target: String,
    /// Color descriptor.
    pub color_description: String,
    /// Logo descriptor.
    pub logo_description: String,
    /// 1-based sides this row lands on.
    pub sides: Vec<i64>,
    /// 1-based columns this row lands on.
    pub columns: Vec<i64>,
    /// Physical rows this row lands on.
    pub rows: Vec<i64>,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region PalletConfigModels

/// Type of pallet build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PalletType {
    /// Full pallet.
    Full,
    /// Half pallet.
    Half,
    /// Tower display.
    Tower,
}

/// Printable configuration of one pallet build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PalletConfig {
    /// Parent identifier of the group.
    pub zppk: String,
    /// Team key.
    pub team_key: String,
    /// Team display name.
    pub team_name: String,
    /// Callout text.
    pub callout: String,
    /// Distribution-center target.
    pub dc_target: String,
    /// Pallet type.
    pub pallet_type: PalletType,
    /// Number of pallets to build.
    pub required_count: u64,
    /// Header-labeled rows (`[header, slot_1, slot_2, ...]`).
    pub sides: Vec<Vec<String>>,
}

/// Consecutive rows split into pallet groups.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecRowGroups {
    /// Complete groups; each ends with its terminating row.
    pub groups: Vec<Vec<RowRecord>>,
    /// Trailing rows not closed by a terminating row.
    pub rows_ungrouped: Vec<RowRecord>,
}

/// Ordered per-slot item lists produced by one aggregation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecSidesAggregate {
    /// One list per (side, column), ascending; last element is the image value.
    pub columns: Vec<Vec<String>>,
    /// Design resolution report of this run.
    pub report: ReportSides,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Policies

/// Layout policy shared by grid assembly, aggregation and transposition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecPalletPolicy {
    /// Column value that expands into a full column run.
    pub column_sentinel: i64,
    /// Run length on even sides.
    pub columns_even_side: i64,
    /// Run length on odd sides.
    pub columns_odd_side: i64,
    /// Items kept per slot; overflow is dropped from the front.
    pub slot_capacity_max: usize,
    /// Logo characters used in design lookup keys.
    pub len_logo_key_prefix: usize,
    /// Thumbnail bounding box requested from the resolver.
    pub image_size_max: (u32, u32),
    /// Transposed table row labels.
    pub side_headers: Vec<String>,
    /// Placeholder stored as diagram cell design key.
    pub design_key_deferred: String,
}

impl Default for SpecPalletPolicy {
    fn default() -> Self {
        Self {
            column_sentinel: N_COLUMN_SENTINEL,
            columns_even_side: N_COLUMNS_EVEN_SIDE,
            columns_odd_side: N_COLUMNS_ODD_SIDE,
            slot_capacity_max: N_SLOT_CAPACITY_MAX,
            len_logo_key_prefix: N_LEN_LOGO_KEY_PREFIX,
            image_size_max: TUP_DESIGN_IMAGE_SIZE_MAX,
            side_headers: TUP_SIDE_HEADERS.iter().map(ToString::to_string).collect(),
            design_key_deferred: C_DESIGN_KEY_DEFERRED.to_string(),
        }
    }
}

/// Options of a whole-sheet program build.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecPalletProgramOptions {
    /// Layout policy.
    pub policy: SpecPalletPolicy,
    /// Maximum worker threads used to build groups; serial when `<= 1`.
    pub num_workers_max: Option<usize>,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Errors

/// Contract violations that abort the operation in progress.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PalletError {
    /// Side values are 1-based.
    #[error("side must be >= 1, got {side} (row {baby_zppk:?})")]
    NonPositiveSide {
        /// Offending side value.
        side: i64,
        /// Row identifier.
        baby_zppk: String,
    },
    /// Column values are 1-based.
    #[error("column must be >= 1, got {column} on side {side} (row {baby_zppk:?})")]
    NonPositiveColumn {
        /// Side being filled.
        side: i64,
        /// Offending column value.
        column: i64,
        /// Row identifier.
        baby_zppk: String,
    },
    /// A row must target at least one side.
    #[error("row {baby_zppk:?} has no sides")]
    EmptySides {
        /// Row identifier.
        baby_zppk: String,
    },
    /// A row must target at least one column.
    #[error("row {baby_zppk:?} has no columns")]
    EmptyColumns {
        /// Row identifier.
        baby_zppk: String,
    },
    /// A pallet group needs item rows plus the trailing metadata row.
    #[error("pallet group must have >= 2 rows, got {n_rows}")]
    GroupTooSmall {
        /// Number of rows supplied.
        n_rows: usize,
    },
    /// Transposer input column does not match the header count.
    #[error("column {idx_column} has {actual} entries; expected {expected} (one per header)")]
    ColumnLengthMismatch {
        /// Zero-based column index.
        idx_column: usize,
        /// Header count.
        expected: usize,
        /// Entries found.
        actual: usize,
    },
    /// Transposed table does not have one row per header.
    #[error("table has {actual} rows; expected {expected} (one per header)")]
    RowCountMismatch {
        /// Header count.
        expected: usize,
        /// Rows found.
        actual: usize,
    },
    /// Transposed row is ragged or carries the wrong label.
    #[error("table row {idx_row} is malformed: {message}")]
    MalformedRow {
        /// Zero-based row index.
        idx_row: usize,
        /// What is wrong with it.
        message: String,
    },
    /// Record field could not be converted.
    #[error("invalid value for field `{field}`: {value:?}")]
    InvalidField {
        /// Logical field name.
        field: String,
        /// Raw value text.
        value: String,
    },
}

/// Failure of a resolver's image fetch step.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DesignFetchError {
    /// Catalog or image service could not be reached.
    #[error("design image unavailable: {0}")]
    Unavailable(String),
    /// Bytes were fetched but could not be decoded.
    #[error("design image could not be decoded: {0}")]
    Decode(String),
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
