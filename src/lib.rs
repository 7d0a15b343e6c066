#![doc = include_str!("../README.md")]

pub mod error;
pub mod export;
pub mod quality;
pub mod record;
pub mod render;
pub mod report;
pub mod summary;
pub mod usd;

pub use error::ReportError;
pub use quality::{IssueKind, IssueSet};
pub use record::{load_records, OrderDate, SalesRecord};
pub use render::ReportRenderer;
pub use report::{generate_report, SalesReport};
pub use summary::{PivotTable, SummaryTable};
pub use usd::Usd;
