//! Aggregation/program report models and mutable report builder.

use std::collections::BTreeMap;
use std::fmt;

use crate::spec::PalletConfig;

/// Design resolution counters and diagnostics for one aggregation run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReportSides {
    /// Number of (side, column) slots emitted.
    pub cnt_slots: u64,
    /// Number of slots whose item list exceeded capacity.
    pub cnt_trimmed: u64,
    /// Number of resolver lookups.
    pub cnt_lookups: u64,
    /// Number of successful image fetches.
    pub cnt_fetched: u64,
    /// Number of slots reusing the previous slot's image.
    pub cnt_reused: u64,
    /// Number of lookups without a matching design.
    pub cnt_misses: u64,
    /// Number of failed image fetches.
    pub cnt_fetch_failures: u64,
    /// Fallback texts emitted, one per miss/failure.
    pub warnings: Vec<String>,
}

impl ReportSides {
    /// Number of slots rendered with fallback text.
    pub fn fallback_count(&self) -> u64 {
        self.cnt_misses + self.cnt_fetch_failures
    }

    /// Number of collected warnings.
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("cnt_slots".to_string(), self.cnt_slots);
        dict_counts.insert("cnt_trimmed".to_string(), self.cnt_trimmed);
        dict_counts.insert("cnt_lookups".to_string(), self.cnt_lookups);
        dict_counts.insert("cnt_fetched".to_string(), self.cnt_fetched);
        dict_counts.insert("cnt_reused".to_string(), self.cnt_reused);
        dict_counts.insert("cnt_misses".to_string(), self.cnt_misses);
        dict_counts.insert("cnt_fetch_failures".to_string(), self.cnt_fetch_failures);
        dict_counts.insert("cnt_warnings".to_string(), self.warning_count() as u64);
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        format!(
            "{prefix} slots={} trimmed={} lookups={} fetched={} reused={} misses={} fetch_failures={}",
            self.cnt_slots,
            self.cnt_trimmed,
            self.cnt_lookups,
            self.cnt_fetched,
            self.cnt_reused,
            self.cnt_misses,
            self.cnt_fetch_failures
        )
    }
}

impl fmt::Display for ReportSides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[SIDES]"))
    }
}

/// Mutable accumulator for aggregation statistics.
#[derive(Debug, Default, Clone)]
pub struct ReportSidesBuilder {
    inner: ReportSides,
}

impl ReportSidesBuilder {
    /// Increment slot count by one.
    pub fn add_slot(&mut self) {
        self.inner.cnt_slots += 1;
    }

    /// Increment trimmed-slot count by one.
    pub fn add_trimmed(&mut self) {
        self.inner.cnt_trimmed += 1;
    }

    /// Increment lookup count by one.
    pub fn add_lookup(&mut self) {
        self.inner.cnt_lookups += 1;
    }

    /// Increment fetched count by one.
    pub fn add_fetched(&mut self) {
        self.inner.cnt_fetched += 1;
    }

    /// Increment reused count by one.
    pub fn add_reused(&mut self) {
        self.inner.cnt_reused += 1;
    }

    /// Record a lookup miss with its fallback text.
    pub fn add_miss(&mut self, warning: String) {
        self.inner.cnt_misses += 1;
        self.inner.warnings.push(warning);
    }

    /// Record a fetch failure with its fallback text.
    pub fn add_fetch_failure(&mut self, warning: String) {
        self.inner.cnt_fetch_failures += 1;
        self.inner.warnings.push(warning);
    }

    /// Fold another finished report into this one.
    pub fn merge(&mut self, other: &ReportSides) {
        self.inner.cnt_slots += other.cnt_slots;
        self.inner.cnt_trimmed += other.cnt_trimmed;
        self.inner.cnt_lookups += other.cnt_lookups;
        self.inner.cnt_fetched += other.cnt_fetched;
        self.inner.cnt_reused += other.cnt_reused;
        self.inner.cnt_misses += other.cnt_misses;
        self.inner.cnt_fetch_failures += other.cnt_fetch_failures;
        self.inner.warnings.extend(other.warnings.iter().cloned());
    }

    /// Finalize builder into immutable report.
    pub fn build(self) -> ReportSides {
        self.inner
    }
}

/// Result of building every pallet of one sheet.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReportPalletProgram {
    /// One config per complete group, in input order.
    pub configs: Vec<PalletConfig>,
    /// Number of rows consumed into groups.
    pub cnt_rows_grouped: u64,
    /// Trailing rows dropped for lack of a terminating row.
    pub cnt_rows_ungrouped: u64,
    /// Design resolution totals across all groups.
    pub sides: ReportSides,
    /// Non-fatal program-level warnings.
    pub warnings: Vec<String>,
}

impl ReportPalletProgram {
    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        format!(
            "{prefix} pallets={} rows_grouped={} rows_ungrouped={} fallbacks={} warnings={}",
            self.configs.len(),
            self.cnt_rows_grouped,
            self.cnt_rows_ungrouped,
            self.sides.fallback_count(),
            self.warnings.len()
        )
    }
}

impl fmt::Display for ReportPalletProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[PROGRAM]"))
    }
}

#[cfg(test)]
mod tests {
    use super::{ReportSides, ReportSidesBuilder};

    #[test]
    fn report_sides_to_dict_and_format() {
        let report = ReportSides {
            cnt_slots: 5,
            cnt_trimmed: 1,
            cnt_lookups: 5,
            cnt_fetched: 2,
            cnt_reused: 2,
            cnt_misses: 1,
            cnt_fetch_failures: 0,
            warnings: vec!["w".to_string()],
        };

        let dict_counts = report.to_dict();
        assert_eq!(dict_counts["cnt_slots"], 5);
        assert_eq!(dict_counts["cnt_reused"], 2);
        assert_eq!(dict_counts["cnt_warnings"], 1);
        assert_eq!(report.fallback_count(), 1);

        let txt = report.format("[SIDES]");
        assert_eq!(
            txt,
            "[SIDES] slots=5 trimmed=1 lookups=5 fetched=2 reused=2 misses=1 fetch_failures=0"
        );
        assert_eq!(report.to_string(), txt);
    }

    #[test]
    fn builder_merge_sums_counters_and_warnings() {
        let mut builder_a = ReportSidesBuilder::default();
        builder_a.add_slot();
        builder_a.add_lookup();
        builder_a.add_miss("a".to_string());

        let mut builder_b = ReportSidesBuilder::default();
        builder_b.add_slot();
        builder_b.add_lookup();
        builder_b.add_fetch_failure("b".to_string());
        builder_b.merge(&builder_a.build());

        let report = builder_b.build();
        assert_eq!(report.cnt_slots, 2);
        assert_eq!(report.cnt_lookups, 2);
        assert_eq!(report.fallback_count(), 2);
        assert_eq!(report.warnings, vec!["b".to_string(), "a".to_string()]);
    }
}
