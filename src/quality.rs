use std::collections::BTreeMap;

use crate::record::SalesRecord;

/// A data-quality issue category.
///
/// The enum order is the order issue sheets appear in the workbook.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub enum IssueKind {
    Missing,
    Duplicates,
    Outliers,
}

impl IssueKind {
    /// The category name used in sheet names (`Issues_<name>`).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            IssueKind::Missing => "missing",
            IssueKind::Duplicates => "duplicates",
            IssueKind::Outliers => "outliers",
        }
    }
}

/// Mean and spread of revenue across the record set.
///
/// Uses the sample standard deviation (n − 1 denominator), matching the usual
/// spreadsheet/statistics default. Only records that have a revenue value
/// contribute.
#[derive(Clone, Copy, Debug)]
pub struct RevenueStats {
    pub mean: f64,
    pub std_dev: f64,
}

impl RevenueStats {
    /// The literal highlight threshold: mean + 3 standard deviations.
    #[must_use]
    pub fn upper_threshold(&self) -> f64 {
        self.mean + 3.0 * self.std_dev
    }

    /// Reports whether `revenue` lies more than 3 standard deviations from
    /// the mean in either direction.
    #[must_use]
    pub fn is_outlier(&self, revenue: f64) -> bool {
        (revenue - self.mean).abs() > 3.0 * self.std_dev
    }
}

/// Computes revenue statistics over `records`.
///
/// Returns `None` when fewer than two records carry a revenue value, or when
/// the revenue has zero variance; in both cases outlier detection is
/// meaningless and no record is flagged. This is the division-by-zero guard:
/// a flat revenue column must not make every record match.
#[must_use]
pub fn revenue_stats(records: &[SalesRecord]) -> Option<RevenueStats> {
    let revenues: Vec<f64> = records
        .iter()
        .filter_map(|r| r.revenue)
        .map(|r| r.as_dollars())
        .collect();
    if revenues.len() < 2 {
        return None;
    }
    let n = revenues.len() as f64;
    let mean = revenues.iter().sum::<f64>() / n;
    let variance = revenues.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let std_dev = variance.sqrt();
    if std_dev == 0.0 {
        return None;
    }
    Some(RevenueStats { mean, std_dev })
}

/// The quality issues found in a record sequence: a mapping from category to
/// the indices of the matching records, in original order.
///
/// Built once by [`IssueSet::inspect`] and read-only thereafter. Categories
/// with no matching records are omitted entirely.
#[derive(Debug, Default)]
pub struct IssueSet {
    by_kind: BTreeMap<IssueKind, Vec<usize>>,
}

impl IssueSet {
    /// Inspects `records` for all three issue categories.
    ///
    /// Policies:
    /// * `missing` — any record with an absent source or derived field.
    /// * `duplicates` — **all** occurrences are flagged: a record is a
    ///   duplicate iff some other record is identical to it across every
    ///   field, first occurrence included.
    /// * `outliers` — revenue more than 3 sample standard deviations from the
    ///   mean; skipped entirely when the variance is zero.
    #[must_use]
    pub fn inspect(records: &[SalesRecord]) -> Self {
        let mut by_kind = BTreeMap::new();

        let missing: Vec<usize> = records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.has_missing_field())
            .map(|(i, _)| i)
            .collect();
        if !missing.is_empty() {
            by_kind.insert(IssueKind::Missing, missing);
        }

        let duplicates: Vec<usize> = records
            .iter()
            .enumerate()
            .filter(|(i, record)| {
                records
                    .iter()
                    .enumerate()
                    .any(|(j, other)| j != *i && other == *record)
            })
            .map(|(i, _)| i)
            .collect();
        if !duplicates.is_empty() {
            by_kind.insert(IssueKind::Duplicates, duplicates);
        }

        if let Some(stats) = revenue_stats(records) {
            let outliers: Vec<usize> = records
                .iter()
                .enumerate()
                .filter(|(_, r)| {
                    r.revenue
                        .is_some_and(|rev| stats.is_outlier(rev.as_dollars()))
                })
                .map(|(i, _)| i)
                .collect();
            if !outliers.is_empty() {
                by_kind.insert(IssueKind::Outliers, outliers);
            }
        }

        Self { by_kind }
    }

    /// Iterates over the non-empty categories in sheet order.
    pub fn iter(&self) -> impl Iterator<Item = (IssueKind, &[usize])> {
        self.by_kind.iter().map(|(&kind, idxs)| (kind, &idxs[..]))
    }

    /// Returns the flagged record indices for `kind`, if the category is
    /// non-empty.
    #[must_use]
    pub fn get(&self, kind: IssueKind) -> Option<&[usize]> {
        self.by_kind.get(&kind).map(Vec::as_slice)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_kind.is_empty()
    }
}
