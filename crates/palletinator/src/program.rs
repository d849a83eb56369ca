//! Pallet program: row groups -> [`PalletConfig`] tables.

use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::aggregate::parse_sides;
use crate::report::{ReportPalletProgram, ReportSides, ReportSidesBuilder};
use crate::resolve::DesignResolver;
use crate::spec::{
    PalletConfig, PalletError, PalletType, Result, RowRecord, SpecPalletPolicy,
    SpecPalletProgramOptions, SpecRowGroups,
};
use crate::transpose::flip_pallet_sides;
use crate::util::calculate_worker_limit;

impl PalletConfig {
    /// Build one pallet's configuration from its group of rows.
    ///
    /// The last row is removed and supplies `callout`, `dc_target` and
    /// `required_count`; the remaining rows are aggregated into the `sides`
    /// table, and the last of them supplies `zppk` and team fields.
    pub fn build_from<R: DesignResolver + ?Sized>(
        rows: Vec<RowRecord>,
        resolver: &R,
        policy: &SpecPalletPolicy,
    ) -> Result<Self> {
        build_pallet_config(rows, resolver, policy).map(|(config, _)| config)
    }
}

/// Same as [`PalletConfig::build_from`], also returning the design report.
pub fn build_pallet_config<R: DesignResolver + ?Sized>(
    mut rows: Vec<RowRecord>,
    resolver: &R,
    policy: &SpecPalletPolicy,
) -> Result<(PalletConfig, ReportSides)> {
    let n_rows = rows.len();
    let (Some(row_last), Some(row_item_last)) = (rows.pop(), rows.last().cloned()) else {
        return Err(PalletError::GroupTooSmall { n_rows });
    };

    let aggregate = parse_sides(&rows, false, resolver, policy)?;
    let sides = flip_pallet_sides(&aggregate.columns, &policy.side_headers)?;
    debug!(zppk = %row_item_last.parent_zppk, report = %aggregate.report, "pallet sides built");

    let config = PalletConfig {
        zppk: row_item_last.parent_zppk,
        team_key: row_item_last.team_key,
        team_name: row_item_last.team_name,
        callout: row_last.callout,
        dc_target: row_last.dc_target,
        pallet_type: PalletType::Tower,
        required_count: row_last.requested_pallet_count,
        sides,
    };
    Ok((config, aggregate.report))
}

/// Split rows into pallet groups, closing a group at each row with a nonzero
/// requested pallet count.
pub fn group_rows_by_pallet(rows: Vec<RowRecord>) -> SpecRowGroups {
    let mut row_groups = SpecRowGroups::default();
    let mut l_group = Vec::new();
    for row in rows {
        let if_closes_group = row.requested_pallet_count != 0;
        l_group.push(row);
        if if_closes_group {
            row_groups.groups.push(std::mem::take(&mut l_group));
        }
    }
    row_groups.rows_ungrouped = l_group;
    row_groups
}

/// Build every pallet of a sheet.
///
/// Groups are built independently (each with its own aggregation state) on
/// up to `options.num_workers_max` threads; configs keep input order. The
/// first contract violation aborts the program.
pub fn build_pallet_program<R: DesignResolver + Sync + ?Sized>(
    rows: Vec<RowRecord>,
    resolver: &R,
    options: &SpecPalletProgramOptions,
) -> Result<ReportPalletProgram> {
    let SpecRowGroups {
        groups,
        rows_ungrouped,
    } = group_rows_by_pallet(rows);

    let mut report = ReportPalletProgram {
        cnt_rows_grouped: groups.iter().map(|g| g.len() as u64).sum(),
        cnt_rows_ungrouped: rows_ungrouped.len() as u64,
        ..Default::default()
    };
    if !rows_ungrouped.is_empty() {
        let c_msg = format!(
            "{} trailing row(s) have no terminating pallet count and were dropped.",
            rows_ungrouped.len()
        );
        warn!("{c_msg}");
        report.warnings.push(c_msg);
    }

    let policy = &options.policy;
    let build_serial = |groups: Vec<Vec<RowRecord>>| {
        groups
            .into_iter()
            .map(|group| build_pallet_config(group, resolver, policy))
            .collect::<Result<Vec<_>>>()
    };

    let n_workers_max = calculate_worker_limit(options.num_workers_max);
    let l_results = if n_workers_max <= 1 || groups.len() <= 1 {
        build_serial(groups)?
    } else {
        match ThreadPoolBuilder::new().num_threads(n_workers_max).build() {
            Ok(thread_pool) => thread_pool.install(|| {
                groups
                    .into_par_iter()
                    .map(|group| build_pallet_config(group, resolver, policy))
                    .collect::<Result<Vec<_>>>()
            })?,
            Err(err) => {
                let c_msg = format!(
                    "Failed to initialize thread pool (workers={n_workers_max}): {err}; fallback to serial build."
                );
                warn!("{c_msg}");
                report.warnings.push(c_msg);
                build_serial(groups)?
            }
        }
    };

    let mut builder_sides = ReportSidesBuilder::default();
    for (config, report_sides) in l_results {
        builder_sides.merge(&report_sides);
        report.configs.push(config);
    }
    report.sides = builder_sides.build();

    info!("{report}");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::encode_design_image;
    use crate::resolve::testing::SpecInstrumentedResolver;

    fn make_item(baby_zppk: &str, side: i64, column: i64) -> RowRecord {
        RowRecord {
            parent_zppk: "ZPPK-P1".to_string(),
            baby_zppk: baby_zppk.to_string(),
            team_key: "NYY".to_string(),
            team_name: "Yankees".to_string(),
            logo_description: "PRIMARY LOGO".to_string(),
            color_description: "NAVY".to_string(),
            sides: vec![side],
            columns: vec![column],
            ..Default::default()
        }
    }

    fn make_terminator(count: u64) -> RowRecord {
        RowRecord {
            parent_zppk: "ZPPK-TOTAL".to_string(),
            team_key: "TOTAL".to_string(),
            callout: "CLC CREATIVE CORRUGATE".to_string(),
            dc_target: "2025-03-01".to_string(),
            requested_pallet_count: count,
            sides: vec![1],
            columns: vec![1],
            ..Default::default()
        }
    }

    fn make_group(prefix: &str, count: u64) -> Vec<RowRecord> {
        let mut rows: Vec<RowRecord> = (1..=4)
            .map(|i| make_item(&format!("{prefix}-{i}"), 1, 1))
            .collect();
        rows.extend((1..=4).map(|i| make_item(&format!("{prefix}-{}", i + 4), 1, 2)));
        rows.push(make_terminator(count));
        rows
    }

    #[test]
    fn build_from_uses_last_row_as_metadata() {
        let resolver = SpecInstrumentedResolver::default().with_design("PRIMARY NAVY NYY", 3, b"i");
        let config =
            PalletConfig::build_from(make_group("A", 2), &resolver, &SpecPalletPolicy::default())
                .unwrap();

        assert_eq!(config.zppk, "ZPPK-P1");
        assert_eq!(config.team_key, "NYY");
        assert_eq!(config.team_name, "Yankees");
        assert_eq!(config.callout, "CLC CREATIVE CORRUGATE");
        assert_eq!(config.dc_target, "2025-03-01");
        assert_eq!(config.required_count, 2);
        assert_eq!(config.pallet_type, PalletType::Tower);

        let c_image = encode_design_image(b"i");
        assert_eq!(config.sides.len(), 5);
        assert_eq!(config.sides[0], vec!["XS (13) / S (13)", "A-1", "A-5"]);
        assert_eq!(config.sides[3], vec!["XL (20)", "A-4", "A-8"]);
        assert_eq!(config.sides[4], vec!["IMAGE".to_string(), c_image.clone(), c_image]);
        assert_eq!(resolver.fetch_count(), 1);
    }

    #[test]
    fn build_from_rejects_single_row() {
        let resolver = SpecInstrumentedResolver::default();
        let err = PalletConfig::build_from(
            vec![make_terminator(1)],
            &resolver,
            &SpecPalletPolicy::default(),
        )
        .unwrap_err();
        assert_eq!(err, PalletError::GroupTooSmall { n_rows: 1 });

        let err = PalletConfig::build_from(vec![], &resolver, &SpecPalletPolicy::default())
            .unwrap_err();
        assert_eq!(err, PalletError::GroupTooSmall { n_rows: 0 });
    }

    #[test]
    fn build_from_rejects_partially_filled_slot() {
        let resolver = SpecInstrumentedResolver::default();
        let rows = vec![make_item("A-1", 1, 1), make_terminator(1)];
        let err =
            PalletConfig::build_from(rows, &resolver, &SpecPalletPolicy::default()).unwrap_err();

        assert_eq!(
            err,
            PalletError::ColumnLengthMismatch {
                idx_column: 0,
                expected: 5,
                actual: 2
            }
        );
    }

    #[test]
    fn group_rows_splits_on_nonzero_count() {
        let mut rows = make_group("A", 1);
        rows.extend(make_group("B", 3));
        rows.push(make_item("C-1", 1, 1));

        let row_groups = group_rows_by_pallet(rows);
        assert_eq!(row_groups.groups.len(), 2);
        assert_eq!(row_groups.groups[0].len(), 9);
        assert_eq!(row_groups.groups[1].last().unwrap().requested_pallet_count, 3);
        assert_eq!(row_groups.rows_ungrouped.len(), 1);
    }

    #[test]
    fn program_builds_groups_in_order_across_workers() {
        let mut rows = Vec::new();
        for (idx, prefix) in ["A", "B", "C", "D"].iter().enumerate() {
            rows.extend(make_group(prefix, idx as u64 + 1));
        }
        rows.push(make_item("E-1", 1, 1));

        let resolver = SpecInstrumentedResolver::default().with_design("PRIMARY NAVY NYY", 3, b"i");
        let options = SpecPalletProgramOptions {
            num_workers_max: Some(4),
            ..Default::default()
        };
        let report = build_pallet_program(rows, &resolver, &options).unwrap();

        let l_counts: Vec<u64> = report.configs.iter().map(|c| c.required_count).collect();
        assert_eq!(l_counts, vec![1, 2, 3, 4]);
        assert_eq!(report.configs[2].sides[0][1], "C-1");
        assert_eq!(report.cnt_rows_grouped, 36);
        assert_eq!(report.cnt_rows_ungrouped, 1);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.sides.cnt_slots, 8);
        // adjacency cache is per group: one fetch per pallet
        assert_eq!(resolver.fetch_count(), 4);
    }

    #[test]
    fn program_serial_matches_parallel() {
        let mut rows = make_group("A", 1);
        rows.extend(make_group("B", 2));
        let resolver = SpecInstrumentedResolver::default();

        let report_serial = build_pallet_program(
            rows.clone(),
            &resolver,
            &SpecPalletProgramOptions {
                num_workers_max: Some(1),
                ..Default::default()
            },
        )
        .unwrap();
        let report_parallel = build_pallet_program(
            rows,
            &resolver,
            &SpecPalletProgramOptions {
                num_workers_max: Some(2),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(report_serial.configs, report_parallel.configs);
        assert_eq!(report_serial.sides.cnt_misses, 4);
    }

    #[test]
    fn program_propagates_first_violation() {
        let mut rows = make_group("A", 1);
        rows.push(make_terminator(1));
        let resolver = SpecInstrumentedResolver::default();

        let err = build_pallet_program(rows, &resolver, &SpecPalletProgramOptions::default())
            .unwrap_err();
        assert_eq!(err, PalletError::GroupTooSmall { n_rows: 1 });
    }

    #[test]
    fn config_serializes_for_templates() {
        let resolver = SpecInstrumentedResolver::default();
        let config =
            PalletConfig::build_from(make_group("A", 1), &resolver, &SpecPalletPolicy::default())
                .unwrap();
        let value = serde_json::to_value(&config).unwrap();

        assert_eq!(value["pallet_type"], "TOWER");
        assert_eq!(value["zppk"], "ZPPK-P1");
        assert_eq!(value["sides"][4][0], "IMAGE");
    }
}
