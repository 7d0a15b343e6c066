use log::warn;
use rust_xlsxwriter::{
    Chart, ChartLegendPosition, ChartType, ConditionalFormatBlank, ConditionalFormatCell,
    ConditionalFormatCellRule, ConditionalFormatFormula, ConditionalFormatTop,
    ConditionalFormatTopRule, Format, FormatBorder, Image, Workbook, Worksheet,
};

use std::{
    io,
    path::{Path, PathBuf},
};

use crate::error::{ReportError, Result};
use crate::quality::{revenue_stats, IssueKind, IssueSet};
use crate::record::{SalesRecord, COLUMNS};
use crate::summary::{PivotTable, SummaryTable};

/// Extra character width added to every auto-sized column.
const COLUMN_PADDING: usize = 2;

/// The shared style presets used across all sheets.
///
/// Colors follow the original report palette: light green raw-data headers,
/// orange issue headers, and the standard Excel good/bad/neutral highlight
/// pairs.
struct Styles {
    raw_header: Format,
    issue_header: Format,
    bold: Format,
    currency: Format,
    top_five: Format,
    missing_blank: Format,
    duplicate_row: Format,
    outlier_cell: Format,
}

impl Styles {
    fn new() -> Self {
        Self {
            raw_header: Format::new()
                .set_bold()
                .set_background_color(0xD9EAD3)
                .set_border(FormatBorder::Thin),
            issue_header: Format::new()
                .set_bold()
                .set_background_color(0xFCE5CD)
                .set_border(FormatBorder::Thin),
            bold: Format::new().set_bold(),
            currency: Format::new().set_num_format("$#,##0.00"),
            top_five: Format::new()
                .set_background_color(0xC6EFCE)
                .set_font_color(0x006100),
            missing_blank: Format::new().set_background_color(0xFFC7CE),
            duplicate_row: Format::new().set_background_color(0xF9CB9C),
            outlier_cell: Format::new().set_background_color(0xFFEB9C),
        }
    }
}

/// Writes the report workbook: `RawData`, `Summary`, `Pivot` (with an
/// embedded chart), and one `Issues_<category>` sheet per non-empty issue
/// category.
///
/// The workbook is built entirely in memory and serialized in a single
/// [`Workbook::save`] call, so an error on any earlier path leaves no partial
/// file behind.
#[derive(Debug, Default)]
pub struct ReportRenderer {
    logo_path: Option<PathBuf>,
}

impl ReportRenderer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the logo image embedded on the Summary sheet. A path that does
    /// not exist is skipped with a warning, not an error.
    #[must_use]
    pub fn logo(mut self, path: impl Into<PathBuf>) -> Self {
        self.logo_path = Some(path.into());
        self
    }

    /// Renders every sheet and writes the workbook to `out`, overwriting any
    /// existing file.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Workbook`] for sheet construction failures and
    /// [`ReportError::OutputWrite`] if the final save fails.
    pub fn render(
        &self,
        records: &[SalesRecord],
        issues: &IssueSet,
        summary: &SummaryTable,
        pivot: &PivotTable,
        out: &Path,
    ) -> Result<()> {
        let styles = Styles::new();
        let mut workbook = Workbook::new();
        write_raw_data(&mut workbook, records, &styles)?;
        self.write_summary(&mut workbook, summary, &styles)?;
        write_pivot(&mut workbook, pivot, &styles)?;
        write_issues(&mut workbook, records, issues, &styles)?;
        workbook.save(out).map_err(|e| match e {
            rust_xlsxwriter::XlsxError::IoError(source) => ReportError::output_write(out, source),
            other => ReportError::output_write(out, io::Error::other(other)),
        })?;
        Ok(())
    }

    fn write_summary(
        &self,
        workbook: &mut Workbook,
        summary: &SummaryTable,
        styles: &Styles,
    ) -> Result<()> {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Summary")?;
        let headers = ["Region", "Product", "Revenue"];
        for (col, header) in headers.iter().enumerate() {
            sheet.write_with_format(0, col as u16, *header, &styles.bold)?;
        }
        for (i, row) in summary.rows().iter().enumerate() {
            let r = i as u32 + 1;
            sheet.write(r, 0, row.region.as_str())?;
            sheet.write(r, 1, row.product.as_str())?;
            sheet.write_with_format(r, 2, row.revenue.as_dollars(), &styles.currency)?;
        }
        let cells: Vec<[String; 3]> = summary
            .rows()
            .iter()
            .map(|r| {
                [
                    r.region.clone(),
                    r.product.clone(),
                    r.revenue.to_string(),
                ]
            })
            .collect();
        auto_size_columns(sheet, &headers, cells.iter().map(|c| &c[..]))?;
        // The currency column gets room for the symbol and separators.
        sheet.set_column_width(2, 15)?;

        if !summary.rows().is_empty() {
            let top = ConditionalFormatTop::new()
                .set_rule(ConditionalFormatTopRule::Top(5))
                .set_format(styles.top_five.clone());
            sheet.add_conditional_format(1, 2, summary.rows().len() as u32, 2, &top)?;
        }

        if let Some(logo) = &self.logo_path {
            if logo.exists() {
                let image = Image::new(logo)?.set_scale_width(0.5).set_scale_height(0.5);
                sheet.insert_image(0, 4, &image)?;
            } else {
                warn!("logo {} not found, skipping", logo.display());
            }
        }
        Ok(())
    }
}

fn write_raw_data(workbook: &mut Workbook, records: &[SalesRecord], styles: &Styles) -> Result<()> {
    let sheet = workbook.add_worksheet();
    sheet.set_name("RawData")?;
    let all: Vec<&SalesRecord> = records.iter().collect();
    write_record_table(sheet, &all, &styles.raw_header)
}

/// Writes the shared record-sheet layout: a formatted header row, one row per
/// record in [`COLUMNS`] order, and auto-sized columns. Absent values leave
/// their cell blank.
fn write_record_table(
    sheet: &mut Worksheet,
    records: &[&SalesRecord],
    header: &Format,
) -> Result<()> {
    for (col, name) in COLUMNS.iter().enumerate() {
        sheet.write_with_format(0, col as u16, *name, header)?;
    }
    for (i, record) in records.iter().enumerate() {
        let row = i as u32 + 1;
        if let Some(date) = record.order_date {
            sheet.write(row, 0, date.to_string())?;
        }
        sheet.write(row, 1, record.region.as_str())?;
        sheet.write(row, 2, record.product.as_str())?;
        if let Some(quantity) = record.quantity {
            sheet.write(row, 3, quantity)?;
        }
        if let Some(price) = record.unit_price {
            sheet.write(row, 4, price.as_dollars())?;
        }
        if let Some(revenue) = record.revenue {
            sheet.write(row, 5, revenue.as_dollars())?;
        }
        if let Some(month) = &record.month {
            sheet.write(row, 6, month.as_str())?;
        }
    }
    let cells: Vec<[String; 7]> = records.iter().map(|r| r.display_cells()).collect();
    auto_size_columns(sheet, &COLUMNS, cells.iter().map(|c| &c[..]))
}

fn write_pivot(workbook: &mut Workbook, pivot: &PivotTable, styles: &Styles) -> Result<()> {
    let sheet = workbook.add_worksheet();
    sheet.set_name("Pivot")?;
    sheet.write_with_format(0, 0, "Region", &styles.bold)?;
    for (col, product) in pivot.products().iter().enumerate() {
        sheet.write_with_format(0, col as u16 + 1, product.as_str(), &styles.bold)?;
    }
    for (row, region) in pivot.regions().iter().enumerate() {
        let r = row as u32 + 1;
        sheet.write(r, 0, region.as_str())?;
        for col in 0..pivot.products().len() {
            sheet.write(r, col as u16 + 1, pivot.cell(row, col).as_dollars())?;
        }
    }

    let mut headers = vec!["Region".to_string()];
    headers.extend(pivot.products().iter().cloned());
    let headers: Vec<&str> = headers.iter().map(String::as_str).collect();
    let cells: Vec<Vec<String>> = pivot
        .regions()
        .iter()
        .enumerate()
        .map(|(row, region)| {
            let mut line = vec![region.clone()];
            line.extend((0..pivot.products().len()).map(|col| pivot.cell(row, col).to_string()));
            line
        })
        .collect();
    auto_size_columns(sheet, &headers, cells.iter().map(|c| &c[..]))?;

    if !pivot.regions().is_empty() && !pivot.products().is_empty() {
        let chart = pivot_chart(pivot);
        sheet.insert_chart(1, 5, &chart)?;
    }
    Ok(())
}

/// Builds the clustered column chart over the Pivot sheet: one series per
/// product, regions on the category axis, summed revenue on the value axis.
fn pivot_chart(pivot: &PivotTable) -> Chart {
    let mut chart = Chart::new(ChartType::Column);
    let last_row = pivot.regions().len() as u32;
    for col in 0..pivot.products().len() {
        let col = col as u16 + 1;
        chart
            .add_series()
            .set_name(("Pivot", 0, col))
            .set_categories(("Pivot", 1, 0, last_row, 0))
            .set_values(("Pivot", 1, col, last_row, col));
    }
    chart.title().set_name("Revenue by Region and Product");
    chart.x_axis().set_name("Region");
    chart.y_axis().set_name("Revenue");
    chart.legend().set_position(ChartLegendPosition::Bottom);
    chart
}

fn write_issues(
    workbook: &mut Workbook,
    records: &[SalesRecord],
    issues: &IssueSet,
    styles: &Styles,
) -> Result<()> {
    for (kind, indices) in issues.iter() {
        let sheet = workbook.add_worksheet();
        sheet.set_name(format!("Issues_{}", kind.as_str()))?;
        let subset: Vec<&SalesRecord> = indices.iter().map(|&i| &records[i]).collect();
        write_record_table(sheet, &subset, &styles.issue_header)?;

        let last_row = subset.len() as u32;
        let last_col = COLUMNS.len() as u16 - 1;
        match kind {
            IssueKind::Missing => {
                let blank = ConditionalFormatBlank::new().set_format(styles.missing_blank.clone());
                sheet.add_conditional_format(1, 0, last_row, last_col, &blank)?;
            }
            IssueKind::Duplicates => {
                // Highlight every cell of every flagged row, the equivalent
                // of the classic always-true conditional trick.
                let whole_row = ConditionalFormatFormula::new()
                    .set_rule("=TRUE()")
                    .set_format(styles.duplicate_row.clone());
                sheet.add_conditional_format(1, 0, last_row, last_col, &whole_row)?;
            }
            IssueKind::Outliers => {
                if let Some(stats) = revenue_stats(records) {
                    let rule = ConditionalFormatCell::new()
                        .set_rule(ConditionalFormatCellRule::GreaterThan(
                            stats.upper_threshold(),
                        ))
                        .set_format(styles.outlier_cell.clone());
                    // Revenue column only.
                    sheet.add_conditional_format(1, 5, last_row, 5, &rule)?;
                }
            }
        }
    }
    Ok(())
}

/// Sets each column's width to its widest display value, header included,
/// plus fixed padding. Computed per sheet, since the same logical column can
/// hold different subsets on different sheets.
fn auto_size_columns<'a>(
    sheet: &mut Worksheet,
    headers: &[&str],
    rows: impl Iterator<Item = &'a [String]> + Clone,
) -> Result<()> {
    for (col, header) in headers.iter().enumerate() {
        let mut width = header.len();
        for row in rows.clone() {
            if let Some(cell) = row.get(col) {
                width = width.max(cell.len());
            }
        }
        sheet.set_column_width(col as u16, (width + COLUMN_PADDING) as f64)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::load_records;

    fn render_to(dir: &Path, input: &str, logo: Option<&Path>) -> PathBuf {
        let records = load_records(input).unwrap();
        let issues = IssueSet::inspect(&records);
        let summary = SummaryTable::from_records(&records);
        let pivot = PivotTable::from_records(&records);
        let out = dir.join("report.xlsx");
        let mut renderer = ReportRenderer::new();
        if let Some(logo) = logo {
            renderer = renderer.logo(logo);
        }
        renderer
            .render(&records, &issues, &summary, &pivot, &out)
            .unwrap();
        out
    }

    #[test]
    fn render_fn_produces_a_valid_workbook_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = render_to(dir.path(), "testdata/sales.csv", None);
        let bytes = std::fs::read(&out).unwrap();
        // XLSX files are ZIP archives.
        assert!(bytes.len() > 100);
        assert_eq!(&bytes[0..2], b"PK");
    }

    #[test]
    fn render_fn_skips_a_nonexistent_logo_without_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("no_such_logo.png");
        let out = render_to(dir.path(), "testdata/sales.csv", Some(&missing));
        assert!(out.exists());
    }

    #[test]
    fn render_fn_handles_issue_free_zero_variance_data() {
        let dir = tempfile::tempdir().unwrap();
        let out = render_to(dir.path(), "testdata/sales_flat.csv", None);
        assert!(out.exists());
    }

    #[test]
    fn render_fn_reports_unwritable_output_path() {
        let records = load_records("testdata/sales.csv").unwrap();
        let issues = IssueSet::inspect(&records);
        let summary = SummaryTable::from_records(&records);
        let pivot = PivotTable::from_records(&records);
        let out = Path::new("testdata/no/such/dir/report.xlsx");
        let err = ReportRenderer::new()
            .render(&records, &issues, &summary, &pivot, out)
            .unwrap_err();
        assert!(matches!(err, ReportError::OutputWrite { .. }));
    }
}
