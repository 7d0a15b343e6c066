use chrono::NaiveDate;
use serde::Deserialize;
use serde_with::DeserializeFromStr;

use std::{
    fmt::{Debug, Display},
    path::Path,
    str::FromStr,
};

use crate::error::{ReportError, Result};
use crate::usd::Usd;

/// Column order used by every sheet and export: the five source columns
/// followed by the two derived ones.
pub const COLUMNS: [&str; 7] = [
    "OrderDate",
    "Region",
    "Product",
    "Quantity",
    "UnitPrice",
    "Revenue",
    "Month",
];

/// The source columns that must be present in the input header.
const REQUIRED_COLUMNS: [&str; 5] = ["OrderDate", "Region", "Product", "Quantity", "UnitPrice"];

/// The calendar date of an order.
#[derive(Clone, Copy, DeserializeFromStr, Eq, PartialEq, Ord, PartialOrd)]
pub struct OrderDate(pub NaiveDate);

impl OrderDate {
    /// Returns the calendar month of the order as `YYYY-MM`.
    #[must_use]
    pub fn month(self) -> String {
        self.0.format("%Y-%m").to_string()
    }
}

impl FromStr for OrderDate {
    type Err = anyhow::Error;

    /// Parses `YYYY-MM-DD` or `M/D/YYYY` dates.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .or_else(|_| NaiveDate::parse_from_str(s, "%m/%d/%Y"))
            .map(Self)
            .map_err(|_| anyhow::anyhow!("unparseable date: {s:?}"))
    }
}

impl Display for OrderDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl Debug for OrderDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

/// Defines the CSV format for sales data. Empty fields deserialize to `None`;
/// non-empty fields that fail to parse abort the load.
#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(rename = "OrderDate")]
    order_date: Option<OrderDate>,
    #[serde(rename = "Region")]
    region: String,
    #[serde(rename = "Product")]
    product: String,
    #[serde(rename = "Quantity")]
    quantity: Option<i32>,
    #[serde(rename = "UnitPrice")]
    unit_price: Option<Usd>,
}

/// One sales transaction with its derived fields.
///
/// `revenue` and `month` are computed at load time and are `Some` exactly when
/// all of `order_date`, `quantity`, and `unit_price` are present. Full-record
/// equality drives duplicate detection.
#[derive(Clone, Debug, PartialEq)]
pub struct SalesRecord {
    pub order_date: Option<OrderDate>,
    pub region: String,
    pub product: String,
    pub quantity: Option<i32>,
    pub unit_price: Option<Usd>,
    pub revenue: Option<Usd>,
    pub month: Option<String>,
}

impl SalesRecord {
    fn from_raw(raw: RawRecord) -> Self {
        let revenue = match (raw.quantity, raw.unit_price, raw.order_date) {
            (Some(qty), Some(price), Some(_)) => Some(price * qty),
            _ => None,
        };
        let month = match revenue {
            Some(_) => raw.order_date.map(OrderDate::month),
            None => None,
        };
        Self {
            order_date: raw.order_date,
            region: raw.region,
            product: raw.product,
            quantity: raw.quantity,
            unit_price: raw.unit_price,
            revenue,
            month,
        }
    }

    /// Reports whether any field, including the derived ones, is absent.
    #[must_use]
    pub fn has_missing_field(&self) -> bool {
        self.order_date.is_none()
            || self.quantity.is_none()
            || self.unit_price.is_none()
            || self.revenue.is_none()
            || self.month.is_none()
    }

    /// Returns the record's cell values as display strings, in [`COLUMNS`]
    /// order, with absent values rendered as empty strings. Used for column
    /// auto-sizing.
    #[must_use]
    pub fn display_cells(&self) -> [String; 7] {
        [
            self.order_date.map(|d| d.to_string()).unwrap_or_default(),
            self.region.clone(),
            self.product.clone(),
            self.quantity.map(|q| q.to_string()).unwrap_or_default(),
            self.unit_price.map(|p| p.to_string()).unwrap_or_default(),
            self.revenue.map(|r| r.to_string()).unwrap_or_default(),
            self.month.clone().unwrap_or_default(),
        ]
    }
}

/// Reads sales records from the CSV file at `path` and computes the derived
/// `Revenue` and `Month` fields.
///
/// Empty `OrderDate`/`Quantity`/`UnitPrice` fields are tolerated: the record
/// is loaded with the field (and both derived fields) absent, and the quality
/// inspector flags it as `missing`. Malformed non-empty values abort the load.
///
/// # Errors
///
/// Returns [`ReportError::InputNotFound`] if the file cannot be opened, and
/// [`ReportError::DataFormat`] if a required column is absent from the header
/// or a non-empty field cannot be parsed.
pub fn load_records(path: impl AsRef<Path>) -> Result<Vec<SalesRecord>> {
    let path = path.as_ref();
    let mut rdr = csv::Reader::from_path(path).map_err(|e| match e.into_kind() {
        csv::ErrorKind::Io(source) => ReportError::InputNotFound {
            path: path.to_path_buf(),
            source,
        },
        other => ReportError::DataFormat(format!("{}: {other:?}", path.display())),
    })?;
    let headers = rdr
        .headers()
        .map_err(|e| ReportError::DataFormat(e.to_string()))?;
    for required in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == required) {
            return Err(ReportError::DataFormat(format!(
                "missing required column {required:?}"
            )));
        }
    }
    let mut records = Vec::new();
    for (i, result) in rdr.deserialize().enumerate() {
        let raw: RawRecord =
            result.map_err(|e| ReportError::DataFormat(format!("row {}: {e}", i + 1)))?;
        records.push(SalesRecord::from_raw(raw));
    }
    Ok(records)
}
