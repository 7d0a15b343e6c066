use chrono::{Local, NaiveDate};
use log::info;

use std::{fs, path::PathBuf};

use crate::error::{ReportError, Result};
use crate::export::export_for_bi;
use crate::quality::IssueSet;
use crate::record::load_records;
use crate::render::ReportRenderer;
use crate::summary::{PivotTable, SummaryTable};

/// The sales report pipeline.
///
/// Runs the stages in a fixed order, each consuming the previous stage's
/// output read-only: load → inspect → aggregate → render → export.
///
/// ```no_run
/// # use sales_report::SalesReport;
/// let report = SalesReport::new("data/sales_march.csv", "reports").logo("logo.png");
/// let workbook = report.generate()?;
/// println!("wrote {}", workbook.display());
/// # Ok::<(), sales_report::ReportError>(())
/// ```
#[derive(Debug)]
pub struct SalesReport {
    input: PathBuf,
    output_dir: PathBuf,
    logo: Option<PathBuf>,
}

impl SalesReport {
    /// Creates a pipeline reading `input` and writing under `output_dir`.
    #[must_use]
    pub fn new(input: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output_dir: output_dir.into(),
            logo: None,
        }
    }

    /// Sets an optional logo image for the Summary sheet. A nonexistent path
    /// is skipped silently at render time.
    #[must_use]
    pub fn logo(mut self, path: impl Into<PathBuf>) -> Self {
        self.logo = Some(path.into());
        self
    }

    /// The workbook path for today: `Sales_Report_<YYYY_MM_DD>.xlsx` under
    /// the output directory. Any existing file there is overwritten.
    #[must_use]
    pub fn output_path(&self) -> PathBuf {
        self.output_path_for(Local::now().date_naive())
    }

    fn output_path_for(&self, date: NaiveDate) -> PathBuf {
        let filename = format!("Sales_Report_{}.xlsx", date.format("%Y_%m_%d"));
        self.output_dir.join(filename)
    }

    /// Runs the whole pipeline and returns the workbook path.
    ///
    /// # Errors
    ///
    /// Returns the first stage failure: [`ReportError::InputNotFound`] or
    /// [`ReportError::DataFormat`] from loading, and
    /// [`ReportError::OutputWrite`] or [`ReportError::Workbook`] from the
    /// output stages.
    pub fn generate(&self) -> Result<PathBuf> {
        let records = load_records(&self.input)?;
        info!(
            "loaded {} records from {}",
            records.len(),
            self.input.display()
        );

        let issues = IssueSet::inspect(&records);
        for (kind, indices) in issues.iter() {
            info!("quality: {} {} record(s)", indices.len(), kind.as_str());
        }

        let summary = SummaryTable::from_records(&records);
        let pivot = PivotTable::from_records(&records);

        fs::create_dir_all(&self.output_dir)
            .map_err(|e| ReportError::output_write(&self.output_dir, e))?;
        let out = self.output_path();
        let mut renderer = ReportRenderer::new();
        if let Some(logo) = &self.logo {
            renderer = renderer.logo(logo);
        }
        renderer.render(&records, &issues, &summary, &pivot, &out)?;
        info!("workbook written to {}", out.display());

        export_for_bi(&summary, &pivot, &self.output_dir)?;
        info!(
            "flat files written to {}",
            self.output_dir.join("powerbi").display()
        );
        Ok(out)
    }
}

/// Convenience wrapper used by the CLI.
///
/// # Errors
///
/// See [`SalesReport::generate`].
pub fn generate_report(
    input: impl Into<PathBuf>,
    output_dir: impl Into<PathBuf>,
    logo: Option<impl Into<PathBuf>>,
) -> Result<PathBuf> {
    let mut report = SalesReport::new(input, output_dir);
    if let Some(logo) = logo {
        report = report.logo(logo);
    }
    report.generate()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn output_path_is_derived_from_the_date() {
        let report = SalesReport::new("in.csv", "reports");
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(
            report.output_path_for(date),
            Path::new("reports/Sales_Report_2024_03_05.xlsx")
        );
    }

    #[test]
    fn generate_fn_runs_the_whole_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let report = SalesReport::new("testdata/sales.csv", dir.path());
        let out = report.generate().unwrap();
        assert!(out.exists(), "workbook missing");
        assert!(dir.path().join("powerbi/summary.csv").exists());
        assert!(dir.path().join("powerbi/pivot.csv").exists());
        let bytes = fs::read(&out).unwrap();
        assert_eq!(&bytes[0..2], b"PK");
    }

    #[test]
    fn generate_fn_overwrites_an_existing_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let report = SalesReport::new("testdata/sales.csv", dir.path());
        let out = report.output_path();
        fs::write(&out, b"stale").unwrap();
        report.generate().unwrap();
        let bytes = fs::read(&out).unwrap();
        assert_ne!(&bytes[..], b"stale");
    }

    #[test]
    fn generate_fn_surfaces_load_failures() {
        let dir = tempfile::tempdir().unwrap();
        let report = SalesReport::new("testdata/nope.csv", dir.path());
        assert!(matches!(
            report.generate().unwrap_err(),
            ReportError::InputNotFound { .. }
        ));
    }

    #[test]
    fn generate_fn_exports_identical_flat_files_across_runs() {
        let dir = tempfile::tempdir().unwrap();
        let report = SalesReport::new("testdata/sales.csv", dir.path());
        report.generate().unwrap();
        let first = fs::read(dir.path().join("powerbi/summary.csv")).unwrap();
        report.generate().unwrap();
        let second = fs::read(dir.path().join("powerbi/summary.csv")).unwrap();
        assert_eq!(first, second);
    }
}
