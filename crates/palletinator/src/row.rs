//! Mapping parsed sheet records onto [`RowRecord`].

use std::collections::BTreeMap;

use crate::conf::{C_CALLOUT_FLAG_VALUE, C_CALLOUT_TEXT, C_SIDE_DEFAULT};
use crate::spec::{EnumCellValue, Result, RowRecord, SpecColumnNames};
use crate::util::{find_numbers_in_text, parse_count};

fn get_value<'a>(record: &'a BTreeMap<String, EnumCellValue>, key: &str) -> &'a EnumCellValue {
    static VALUE_NONE: EnumCellValue = EnumCellValue::None;
    record.get(key).unwrap_or(&VALUE_NONE)
}

fn get_text(record: &BTreeMap<String, EnumCellValue>, key: &str) -> String {
    get_value(record, key).to_text()
}

impl RowRecord {
    /// Build a row from one parsed record.
    ///
    /// Missing keys read as blank. A blank side lands the row on side 1.
    pub fn build_from(
        record: &BTreeMap<String, EnumCellValue>,
        column_names: &SpecColumnNames,
    ) -> Result<Self> {
        let callout = match &column_names.callout {
            Some(key) if get_text(record, key) == C_CALLOUT_FLAG_VALUE => C_CALLOUT_TEXT.to_string(),
            _ => String::new(),
        };
        let dc_target = column_names
            .date_column
            .as_deref()
            .map(|key| get_text(record, key))
            .unwrap_or_default();

        let value_side = match column_names.side.as_deref().map(|key| get_value(record, key)) {
            Some(value) if !value.is_blank() => value.clone(),
            _ => EnumCellValue::String(C_SIDE_DEFAULT.to_string()),
        };

        Ok(Self {
            callout,
            parent_zppk: get_text(record, &column_names.parent_zppk),
            baby_zppk: get_text(record, &column_names.baby_zppk),
            team_key: get_text(record, &column_names.team_key),
            team_name: get_text(record, &column_names.team_name),
            requested_pallet_count: parse_count(
                "requested_pallet_count",
                get_value(record, &column_names.requested_pallet_count),
            )?,
            dc_target,
            color_description: get_text(record, &column_names.color_description),
            logo_description: get_text(record, &column_names.logo_description),
            sides: find_numbers_in_text("side", &value_side)?,
            columns: find_numbers_in_text("column", get_value(record, &column_names.column))?,
            rows: find_numbers_in_text("row", get_value(record, &column_names.row))?,
        })
    }
}
