//! # Vendor Report Export
//!
//! Serializes the snapshot pair of a successful fetch cycle into a downloadable report.
//!
//! Export is a pure function of the pair and the generation timestamp: it performs no
//! network access and never looks at the orchestrator's state machine. Asking to export
//! when no pair exists is refused with `ExportError::NothingToExport` rather than
//! producing an empty file.

use chrono::{DateTime, NaiveDate, Utc};
use core_types::SnapshotPair;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub mod csv;
pub mod error;
pub mod json;

pub use error::ExportError;

/// Platform commission charged on every gross order amount.
pub const COMMISSION_RATE: Decimal = dec!(0.10);
/// Share of the gross amount the vendor keeps.
pub const NET_RATE: Decimal = dec!(0.90);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            _ => Err(ExportError::UnknownFormat(s.to_string())),
        }
    }
}

/// Renders `pair` in `format`.
///
/// # Errors
///
/// `ExportError::NothingToExport` when `pair` is `None`.
pub fn export(
    pair: Option<&SnapshotPair>,
    format: ExportFormat,
    generated_at: DateTime<Utc>,
) -> Result<Vec<u8>, ExportError> {
    let pair = pair.ok_or(ExportError::NothingToExport)?;
    let bytes = match format {
        ExportFormat::Csv => csv::render(pair, generated_at).into_bytes(),
        ExportFormat::Json => json::render(pair, generated_at)?,
    };
    tracing::debug!(
        %format,
        bytes = bytes.len(),
        generation = pair.generation,
        "Report rendered."
    );
    Ok(bytes)
}

/// `vendor-report-YYYY-MM-DD.<ext>`
pub fn report_file_name(format: ExportFormat, date: NaiveDate) -> String {
    format!("vendor-report-{}.{}", date.format("%Y-%m-%d"), format.extension())
}

/// Renders `pair` and writes it into `dir`, creating the directory if needed.
/// Returns the path of the written file. Nothing is written when there is nothing to
/// export.
pub fn write_report(
    dir: &Path,
    pair: Option<&SnapshotPair>,
    format: ExportFormat,
    generated_at: DateTime<Utc>,
) -> Result<PathBuf, ExportError> {
    let bytes = export(pair, format, generated_at)?;

    std::fs::create_dir_all(dir)?;
    let path = dir.join(report_file_name(format, generated_at.date_naive()));
    std::fs::write(&path, &bytes)?;

    tracing::info!(path = %path.display(), %format, "Report exported.");
    Ok(path)
}
