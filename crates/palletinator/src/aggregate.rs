//! Side/column aggregation for printable pick-sheet tables.

use std::collections::BTreeMap;

use tracing::debug;

use crate::report::ReportSidesBuilder;
use crate::resolve::{DesignImageCache, DesignResolver};
use crate::spec::{Result, RowRecord, SpecPalletPolicy, SpecSidesAggregate};
use crate::util::{
    derive_design_key, derive_effective_columns, is_sentinel_row, validate_row_targets,
    validate_side,
};

#[derive(Debug)]
struct SpecSlot {
    design_key: String,
    l_items: Vec<String>,
}

/// Mutable state of one aggregation run.
#[derive(Debug, Default)]
struct SpecSidesAccumulator {
    if_repeat_columns: bool,
    dict_slots: BTreeMap<usize, BTreeMap<usize, SpecSlot>>,
}

impl SpecSidesAccumulator {
    fn push_row(&mut self, row: &RowRecord, policy: &SpecPalletPolicy) -> Result<()> {
        validate_row_targets(row)?;
        for side in &row.sides {
            let n_side = validate_side(row, *side)?;
            if !self.if_repeat_columns && is_sentinel_row(row, policy) {
                debug!(baby_zppk = %row.baby_zppk, side, "sentinel column found; repeat-columns mode on");
                self.if_repeat_columns = true;
            }

            let l_columns = derive_effective_columns(row, *side, self.if_repeat_columns, policy)?;
            let dict_columns = self.dict_slots.entry(n_side).or_default();
            for n_column in l_columns {
                dict_columns
                    .entry(n_column)
                    .or_insert_with(|| SpecSlot {
                        design_key: derive_design_key(row, policy.len_logo_key_prefix),
                        l_items: Vec::new(),
                    })
                    .l_items
                    .push(row.baby_zppk.clone());
            }
        }
        Ok(())
    }
}

/// Aggregate rows into one item list per (side, column).
///
/// Lists come out sides-then-columns in ascending order. Each keeps at most
/// [`SpecPalletPolicy::slot_capacity_max`] items (the latest ones) followed by
/// the slot's image value: the base64 design image, or a fallback text when
/// the design is unknown or its image cannot be fetched.
///
/// A sentinel first column switches the run into repeat-columns mode for the
/// rest of the rows. The design key of a slot is taken from the first row
/// landing in it.
pub fn parse_sides<R: DesignResolver + ?Sized>(
    rows: &[RowRecord],
    if_repeat_columns: bool,
    resolver: &R,
    policy: &SpecPalletPolicy,
) -> Result<SpecSidesAggregate> {
    let mut acc = SpecSidesAccumulator {
        if_repeat_columns,
        ..Default::default()
    };
    for row in rows {
        acc.push_row(row, policy)?;
    }

    let mut builder_report = ReportSidesBuilder::default();
    let mut cache_design = DesignImageCache::new(resolver, policy.image_size_max);
    let mut l_columns_out = Vec::new();
    for dict_columns in acc.dict_slots.into_values() {
        for slot in dict_columns.into_values() {
            builder_report.add_slot();
            let mut l_items = slot.l_items;
            if l_items.len() > policy.slot_capacity_max {
                builder_report.add_trimmed();
                l_items.drain(..l_items.len() - policy.slot_capacity_max);
            }

            l_items.push(cache_design.resolve(&slot.design_key, &mut builder_report));
            l_columns_out.push(l_items);
        }
    }

    Ok(SpecSidesAggregate {
        columns: l_columns_out,
        report: builder_report.build(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::encode_design_image;
    use crate::resolve::testing::SpecInstrumentedResolver;
    use crate::spec::PalletError;

    fn make_row(baby_zppk: &str, sides: Vec<i64>, columns: Vec<i64>) -> RowRecord {
        RowRecord {
            baby_zppk: baby_zppk.to_string(),
            team_key: "NYY".to_string(),
            logo_description: "PRIMARY LOGO".to_string(),
            color_description: "NAVY, WHITE".to_string(),
            sides,
            columns,
            ..Default::default()
        }
    }

    fn items(column: &[String]) -> Vec<&str> {
        column[..column.len() - 1].iter().map(String::as_str).collect()
    }

    #[test]
    fn slots_are_emitted_in_ascending_side_column_order() {
        let rows = vec![
            make_row("A", vec![2], vec![3]),
            make_row("B", vec![1], vec![2]),
            make_row("C", vec![2], vec![1]),
            make_row("D", vec![1], vec![1]),
        ];
        let resolver = SpecInstrumentedResolver::default();
        let aggregate =
            parse_sides(&rows, false, &resolver, &SpecPalletPolicy::default()).unwrap();

        let l_firsts: Vec<&str> = aggregate.columns.iter().map(|c| c[0].as_str()).collect();
        assert_eq!(l_firsts, vec!["D", "B", "C", "A"]);
    }

    #[test]
    fn overflowing_slot_keeps_last_four_items() {
        let rows: Vec<RowRecord> = ["A", "B", "C", "D", "E", "F"]
            .iter()
            .map(|id| make_row(id, vec![1], vec![1]))
            .collect();
        let resolver = SpecInstrumentedResolver::default();
        let aggregate =
            parse_sides(&rows, false, &resolver, &SpecPalletPolicy::default()).unwrap();

        assert_eq!(aggregate.columns.len(), 1);
        assert_eq!(items(&aggregate.columns[0]), vec!["C", "D", "E", "F"]);
        assert_eq!(aggregate.columns[0].len(), 5);
        assert_eq!(aggregate.report.cnt_trimmed, 1);
    }

    #[test]
    fn short_slot_is_kept_whole() {
        let rows = vec![make_row("A", vec![1], vec![1]), make_row("B", vec![1], vec![1])];
        let resolver = SpecInstrumentedResolver::default();
        let aggregate =
            parse_sides(&rows, false, &resolver, &SpecPalletPolicy::default()).unwrap();

        assert_eq!(items(&aggregate.columns[0]), vec!["A", "B"]);
        assert_eq!(aggregate.report.cnt_trimmed, 0);
    }

    #[test]
    fn sentinel_latches_repeat_mode_for_later_rows() {
        let rows = vec![
            make_row("A", vec![1], vec![2]),
            make_row("B", vec![2], vec![5]),
            make_row("C", vec![1], vec![4]),
        ];
        let resolver = SpecInstrumentedResolver::default();
        let aggregate =
            parse_sides(&rows, false, &resolver, &SpecPalletPolicy::default()).unwrap();

        // side 1: col 1 (C), col 2 (A, C), col 3 (C); side 2: cols 1..=2 (B)
        let l_items: Vec<Vec<&str>> = aggregate.columns.iter().map(|c| items(c)).collect();
        assert_eq!(
            l_items,
            vec![
                vec!["C"],
                vec!["A", "C"],
                vec!["C"],
                vec!["B"],
                vec!["B"],
            ]
        );
    }

    #[test]
    fn repeat_mode_does_not_leak_into_next_run() {
        let resolver = SpecInstrumentedResolver::default();
        let policy = SpecPalletPolicy::default();
        parse_sides(&[make_row("A", vec![1], vec![5])], false, &resolver, &policy).unwrap();

        let aggregate =
            parse_sides(&[make_row("B", vec![1], vec![2])], false, &resolver, &policy).unwrap();
        assert_eq!(aggregate.columns.len(), 1);
    }

    #[test]
    fn design_key_comes_from_first_row_in_slot() {
        let mut row_b = make_row("B", vec![1], vec![1]);
        row_b.team_key = "BOS".to_string();
        let rows = vec![make_row("A", vec![1], vec![1]), row_b];
        let resolver = SpecInstrumentedResolver::default();
        parse_sides(&rows, false, &resolver, &SpecPalletPolicy::default()).unwrap();

        assert_eq!(
            *resolver.lookups.lock().unwrap(),
            vec!["PRIMARY NAVY WHITE NYY".to_string()]
        );
    }

    #[test]
    fn adjacent_slots_with_same_design_share_one_fetch() {
        let rows = vec![
            make_row("A", vec![1], vec![1]),
            make_row("B", vec![1], vec![2]),
            make_row("C", vec![2], vec![1]),
        ];
        let resolver = SpecInstrumentedResolver::default().with_design(
            "Primary Navy White NYY 2025",
            42,
            b"\x89PNG",
        );
        let aggregate =
            parse_sides(&rows, false, &resolver, &SpecPalletPolicy::default()).unwrap();

        let c_image = encode_design_image(b"\x89PNG");
        assert!(aggregate.columns.iter().all(|c| c.last() == Some(&c_image)));
        assert_eq!(resolver.fetch_count(), 1);
        assert_eq!(aggregate.report.cnt_reused, 2);
    }

    #[test]
    fn unresolved_design_degrades_to_fallback_text() {
        let rows = vec![make_row("A", vec![1], vec![1])];
        let resolver = SpecInstrumentedResolver::default();
        let aggregate =
            parse_sides(&rows, false, &resolver, &SpecPalletPolicy::default()).unwrap();

        assert_eq!(
            aggregate.columns[0],
            vec![
                "A".to_string(),
                "key_='PRIMARY NAVY WHITE NYY' design_number=None".to_string()
            ]
        );
        assert_eq!(aggregate.report.cnt_misses, 1);
        assert_eq!(resolver.fetch_count(), 0);
    }

    #[test]
    fn non_positive_side_aborts_run() {
        let rows = vec![make_row("A", vec![-1], vec![1])];
        let resolver = SpecInstrumentedResolver::default();
        let err = parse_sides(&rows, false, &resolver, &SpecPalletPolicy::default()).unwrap_err();

        assert!(matches!(err, PalletError::NonPositiveSide { side: -1, .. }));
        assert!(resolver.lookups.lock().unwrap().is_empty());
    }
}
