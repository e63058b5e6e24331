use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Nothing to export: no dashboard data has been loaded")]
    NothingToExport,

    #[error("Unknown export format '{0}': expected csv or json")]
    UnknownFormat(String),

    #[error("Failed to serialize the report: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to write the report: {0}")]
    Io(#[from] std::io::Error),
}
