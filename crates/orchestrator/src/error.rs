use api_client::{ApiError, AuthError};
use core_types::Period;
use thiserror::Error;

/// Why a fetch cycle failed.
///
/// The dashboard only ever sees the `Display` text of this error as the failure reason.
#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("The {source_name} response was computed for '{actual}' but '{expected}' was requested")]
    PeriodMismatch {
        source_name: &'static str,
        expected: Period,
        actual: Period,
    },
}
