use thiserror::Error;

/// Failures talking to the remote vendor API.
///
/// The `Display` text is what the dashboard shows as the failure reason, so each
/// variant renders as a single human-readable sentence.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Failed to build the HTTP client: {0}")]
    ClientBuild(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// A non-2xx response. `message` is the body's `message` field when present,
    /// otherwise `API Error: <status>`.
    #[error("{message}")]
    Http { status: u16, message: String },

    #[error("Failed to parse the API response: {0}")]
    Parse(String),
}
