//! `palletinator` v1:
//! Rust-side pallet layout kernel.
//!
//! Modules:
//! - `conf`      : layout constants and default presets
//! - `spec`      : row/config models, policies, errors
//! - `grid`      : dense 1-based diagram grid
//! - `assemble`  : rows -> diagram grid
//! - `resolve`   : design catalog seam and image cache
//! - `aggregate` : rows -> per-slot item lists with design images
//! - `transpose` : slot lists <-> header-labeled rows
//! - `program`   : row groups -> pallet configs
//! - `row`       : parsed records -> rows
//! - `report`    : run-time report models
//! - `util`      : shared helper functions
pub mod aggregate;
pub mod assemble;
pub mod conf;
pub mod grid;
pub mod program;
pub mod report;
pub mod resolve;
pub mod row;
pub mod spec;
pub mod transpose;
pub mod util;

pub use aggregate::parse_sides;
pub use assemble::parse_pallet;
pub use conf::{
    C_DESIGN_KEY_DEFERRED, N_COLUMN_SENTINEL, N_SLOT_CAPACITY_MAX, TUP_DESIGN_IMAGE_SIZE_MAX,
    TUP_SIDE_HEADERS,
};
pub use grid::{Pallet, PalletCell, PalletColumn, PalletSide};
pub use program::{build_pallet_config, build_pallet_program, group_rows_by_pallet};
pub use report::{ReportPalletProgram, ReportSides, ReportSidesBuilder};
pub use resolve::{DesignId, DesignResolver, encode_design_image, format_design_fallback};
pub use spec::{
    DesignFetchError, EnumCellValue, PalletConfig, PalletError, PalletType, Result, RowRecord,
    SpecColumnNames, SpecPalletPolicy, SpecPalletProgramOptions, SpecRowGroups,
    SpecSidesAggregate,
};
pub use transpose::{flip_pallet_sides, restore_pallet_columns};
pub use util::{derive_design_key, find_numbers_in_text};
