//! Pallet layout constants and default preset factories.

use crate::spec::{SpecPalletPolicy, SpecPalletProgramOptions};

/// Column value meaning "every column on this side".
pub const N_COLUMN_SENTINEL: i64 = 5;
/// Column run length used on even-numbered sides in repeat-columns mode.
pub const N_COLUMNS_EVEN_SIDE: i64 = 2;
/// Column run length used on odd-numbered sides in repeat-columns mode.
pub const N_COLUMNS_ODD_SIDE: i64 = 3;
/// Maximum number of items one physical slot holds.
pub const N_SLOT_CAPACITY_MAX: usize = 4;
/// Number of logo description characters used in a design lookup key.
pub const N_LEN_LOGO_KEY_PREFIX: usize = 7;
/// Bounding box requested for design thumbnails.
pub const TUP_DESIGN_IMAGE_SIZE_MAX: (u32, u32) = (70, 70);
/// Row labels of a transposed pick-sheet table (slot capacity + image row).
pub const TUP_SIDE_HEADERS: [&str; 5] = ["XS (13) / S (13)", "M (30)", "L (32)", "XL (20)", "IMAGE"];
/// Metadata key carrying a cell's design reference.
pub const C_METADATA_DESIGN_KEY: &str = "design_key";
/// Design key stored on diagram cells until they are wired to a resolver.
pub const C_DESIGN_KEY_DEFERRED: &str = "[FIXME]";
/// Callout text printed when a row is flagged for the creative corrugate.
pub const C_CALLOUT_TEXT: &str = "CLC CREATIVE CORRUGATE";
/// Record value that switches the callout flag on.
pub const C_CALLOUT_FLAG_VALUE: &str = "Yes";
/// Side value assumed when a record has no side field.
pub const C_SIDE_DEFAULT: &str = "1";

/// Build default pallet policy.
pub fn derive_default_pallet_policy() -> SpecPalletPolicy {
    SpecPalletPolicy::default()
}

/// Build default program options.
pub fn derive_default_program_options() -> SpecPalletProgramOptions {
    SpecPalletProgramOptions::default()
}
