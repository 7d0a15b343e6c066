use std::collections::{BTreeMap, BTreeSet};

use crate::record::SalesRecord;
use crate::usd::Usd;

/// One aggregated (Region, Product) revenue total.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SummaryRow {
    pub region: String,
    pub product: String,
    pub revenue: Usd,
}

/// Revenue totals grouped by (Region, Product), one row per combination
/// present in the data.
///
/// Grouping goes through a `BTreeMap`, so row order is deterministic for a
/// given input regardless of record order. Records without a revenue value
/// cannot contribute and are skipped.
#[derive(Debug, Default)]
pub struct SummaryTable {
    rows: Vec<SummaryRow>,
}

impl SummaryTable {
    /// Aggregates `records` into revenue totals.
    #[must_use]
    pub fn from_records(records: &[SalesRecord]) -> Self {
        let mut totals: BTreeMap<(String, String), Usd> = BTreeMap::new();
        for record in records {
            let Some(revenue) = record.revenue else {
                continue;
            };
            *totals
                .entry((record.region.clone(), record.product.clone()))
                .or_default() += revenue;
        }
        let rows = totals
            .into_iter()
            .map(|((region, product), revenue)| SummaryRow {
                region,
                product,
                revenue,
            })
            .collect();
        Self { rows }
    }

    #[must_use]
    pub fn rows(&self) -> &[SummaryRow] {
        &self.rows
    }

    /// Summed revenue across every row.
    #[must_use]
    pub fn total_revenue(&self) -> Usd {
        self.rows.iter().map(|r| r.revenue).sum()
    }

    /// Summed revenue for one region.
    #[must_use]
    pub fn region_total(&self, region: &str) -> Usd {
        self.rows
            .iter()
            .filter(|r| r.region == region)
            .map(|r| r.revenue)
            .sum()
    }
}

/// A Region × Product cross-tabulation of summed revenue.
///
/// Rows are the distinct regions, columns the distinct products, both in
/// sorted order; combinations absent from the input hold zero, not a missing
/// value.
#[derive(Debug, Default)]
pub struct PivotTable {
    regions: Vec<String>,
    products: Vec<String>,
    cells: Vec<Vec<Usd>>,
}

impl PivotTable {
    /// Cross-tabulates `records` by region and product.
    #[must_use]
    pub fn from_records(records: &[SalesRecord]) -> Self {
        let with_revenue: Vec<&SalesRecord> =
            records.iter().filter(|r| r.revenue.is_some()).collect();
        let regions: Vec<String> = with_revenue
            .iter()
            .map(|r| r.region.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let products: Vec<String> = with_revenue
            .iter()
            .map(|r| r.product.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let mut cells = vec![vec![Usd::default(); products.len()]; regions.len()];
        for record in with_revenue {
            let row = regions.binary_search(&record.region).unwrap_or_else(|_| {
                unreachable!("region {:?} not in pivot rows", record.region)
            });
            let col = products.binary_search(&record.product).unwrap_or_else(|_| {
                unreachable!("product {:?} not in pivot columns", record.product)
            });
            cells[row][col] += record.revenue.unwrap_or_default();
        }
        Self {
            regions,
            products,
            cells,
        }
    }

    #[must_use]
    pub fn regions(&self) -> &[String] {
        &self.regions
    }

    #[must_use]
    pub fn products(&self) -> &[String] {
        &self.products
    }

    /// The cell at (region row, product column).
    #[must_use]
    pub fn cell(&self, row: usize, col: usize) -> Usd {
        self.cells[row][col]
    }

    /// Summed revenue across one region row.
    #[must_use]
    pub fn region_total(&self, row: usize) -> Usd {
        self.cells[row].iter().copied().sum()
    }

    /// Summed revenue across every cell.
    #[must_use]
    pub fn grand_total(&self) -> Usd {
        self.cells.iter().flatten().copied().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::load_records;

    #[test]
    fn summary_groups_revenue_by_region_and_product() {
        let records = load_records("testdata/sales.csv").unwrap();
        let summary = SummaryTable::from_records(&records);
        // 3 regions x 2 products, every combination present.
        assert_eq!(summary.rows().len(), 6, "wrong row count");
        let east_gadget = &summary.rows()[0];
        assert_eq!(east_gadget.region, "East");
        assert_eq!(east_gadget.product, "Gadget");
        assert_eq!(east_gadget.revenue, Usd::from_cents(3000));
        assert_eq!(summary.total_revenue(), Usd::from_cents(30000));
    }

    #[test]
    fn pivot_fills_absent_combinations_with_zero() {
        let records = load_records("testdata/sales_dupes.csv").unwrap();
        let pivot = PivotTable::from_records(&records);
        assert_eq!(pivot.regions(), ["East", "North", "West"]);
        assert_eq!(pivot.products(), ["Gadget", "Widget"]);
        // North sold no Gadgets; the cell must be zero, not absent.
        assert_eq!(pivot.cell(1, 0), Usd::default());
        assert_ne!(pivot.cell(1, 1), Usd::default());
    }

    #[test]
    fn pivot_shape_is_regions_by_products() {
        let records = load_records("testdata/sales.csv").unwrap();
        let pivot = PivotTable::from_records(&records);
        assert_eq!(pivot.regions().len(), 3);
        assert_eq!(pivot.products().len(), 2);
    }

    #[test]
    fn summary_and_pivot_agree_per_region_and_in_total() {
        let records = load_records("testdata/sales.csv").unwrap();
        let summary = SummaryTable::from_records(&records);
        let pivot = PivotTable::from_records(&records);
        for (row, region) in pivot.regions().iter().enumerate() {
            assert_eq!(
                pivot.region_total(row),
                summary.region_total(region),
                "totals disagree for {region}"
            );
        }
        assert_eq!(pivot.grand_total(), summary.total_revenue());
        let loaded_total: Usd = records.iter().filter_map(|r| r.revenue).sum();
        assert_eq!(pivot.grand_total(), loaded_total);
    }
}
