use std::{fs, io, path::Path};

use crate::error::{ReportError, Result};
use crate::summary::{PivotTable, SummaryTable};

/// Subdirectory of the output location that holds the flat-file exports.
const EXPORT_SUBDIR: &str = "powerbi";

/// Writes the summary and pivot tables as headers-only CSV files under
/// `<output_dir>/powerbi/`, for downstream BI tools. The subdirectory is
/// created if absent; existing files are overwritten.
///
/// # Errors
///
/// Returns [`ReportError::OutputWrite`] with the attempted path if the
/// directory or either file cannot be written.
pub fn export_for_bi(
    summary: &SummaryTable,
    pivot: &PivotTable,
    output_dir: &Path,
) -> Result<()> {
    let export_dir = output_dir.join(EXPORT_SUBDIR);
    fs::create_dir_all(&export_dir).map_err(|e| ReportError::output_write(&export_dir, e))?;
    write_summary_csv(summary, &export_dir.join("summary.csv"))?;
    write_pivot_csv(pivot, &export_dir.join("pivot.csv"))?;
    Ok(())
}

fn write_summary_csv(summary: &SummaryTable, path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path).map_err(|e| csv_write_error(path, e))?;
    wtr.write_record(["Region", "Product", "Revenue"])
        .map_err(|e| csv_write_error(path, e))?;
    for row in summary.rows() {
        let revenue = row.revenue.to_string();
        wtr.write_record([row.region.as_str(), row.product.as_str(), revenue.as_str()])
            .map_err(|e| csv_write_error(path, e))?;
    }
    wtr.flush()
        .map_err(|e| ReportError::output_write(path, e))?;
    Ok(())
}

fn write_pivot_csv(pivot: &PivotTable, path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path).map_err(|e| csv_write_error(path, e))?;
    let mut header = vec!["Region".to_string()];
    header.extend(pivot.products().iter().cloned());
    wtr.write_record(&header).map_err(|e| csv_write_error(path, e))?;
    for (row, region) in pivot.regions().iter().enumerate() {
        let mut line = vec![region.clone()];
        line.extend((0..pivot.products().len()).map(|col| pivot.cell(row, col).to_string()));
        wtr.write_record(&line).map_err(|e| csv_write_error(path, e))?;
    }
    wtr.flush()
        .map_err(|e| ReportError::output_write(path, e))?;
    Ok(())
}

fn csv_write_error(path: &Path, e: csv::Error) -> ReportError {
    ReportError::output_write(path, io::Error::other(e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::load_records;

    fn export_dir_for(input: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let records = load_records(input).unwrap();
        let summary = SummaryTable::from_records(&records);
        let pivot = PivotTable::from_records(&records);
        let dir = tempfile::tempdir().unwrap();
        export_for_bi(&summary, &pivot, dir.path()).unwrap();
        let export = dir.path().join(EXPORT_SUBDIR);
        (dir, export)
    }

    #[test]
    fn export_fn_writes_summary_rows_with_headers() {
        let (_dir, export) = export_dir_for("testdata/sales.csv");
        let content = fs::read_to_string(export.join("summary.csv")).unwrap();
        let mut lines = content.lines();
        assert_eq!(lines.next(), Some("Region,Product,Revenue"));
        assert_eq!(lines.next(), Some("East,Gadget,30.00"));
        assert_eq!(content.lines().count(), 7, "header plus six rows");
    }

    #[test]
    fn export_fn_writes_pivot_grid_with_zero_fill() {
        let (_dir, export) = export_dir_for("testdata/sales_dupes.csv");
        let content = fs::read_to_string(export.join("pivot.csv")).unwrap();
        let mut lines = content.lines();
        assert_eq!(lines.next(), Some("Region,Gadget,Widget"));
        assert_eq!(lines.next(), Some("East,0.00,50.00"));
        assert_eq!(lines.next(), Some("North,0.00,5.00"));
        assert_eq!(lines.next(), Some("West,50.00,0.00"));
    }

    #[test]
    fn export_fn_output_is_identical_across_runs() {
        let (_dir, export) = export_dir_for("testdata/sales.csv");
        let first = fs::read(export.join("summary.csv")).unwrap();
        let (_dir2, export2) = export_dir_for("testdata/sales.csv");
        let second = fs::read(export2.join("summary.csv")).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn export_fn_reports_uncreatable_directory() {
        let records = load_records("testdata/sales.csv").unwrap();
        let summary = SummaryTable::from_records(&records);
        let pivot = PivotTable::from_records(&records);
        // A file where the directory should go.
        let dir = tempfile::tempdir().unwrap();
        let clash = dir.path().join("out");
        fs::write(&clash, b"file in the way").unwrap();
        let err = export_for_bi(&summary, &pivot, &clash).unwrap_err();
        assert!(matches!(err, ReportError::OutputWrite { .. }));
    }
}
