use serde::Deserialize;

/// The JSON error body returned alongside a non-2xx status.
///
/// Every field is optional: the body may be empty, not JSON, or JSON without a message.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiErrorResponse {
    #[serde(default)]
    pub message: Option<String>,
}
