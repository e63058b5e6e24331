use core_types::Period;
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where the remote vendor API lives and how the HTTP client talks to it.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Base URL that `/dashboard`, `/analytics` and `/orders` are appended to.
    pub base_url: String,
    /// Per-request timeout applied by the HTTP client.
    pub timeout_secs: u64,
}

/// The session material handed to the credential provider.
#[derive(Clone, Default, Deserialize)]
pub struct AuthConfig {
    /// Bearer access token for the remote API.
    pub access_token: Option<String>,
    /// Vendor identity. When absent it is read from the token's `sub` claim.
    pub subject: Option<String>,
}

// Never print the token.
impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("subject", &self.subject)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// The period selected when the dashboard first mounts.
    pub default_period: Period,
    /// Page size for the orders listing.
    pub orders_limit: u32,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            default_period: Period::Month,
            orders_limit: 50,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory that exported reports are written into.
    pub output_dir: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("reports"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// When set, logs roll daily into this directory instead of going to stderr.
    pub directory: Option<PathBuf>,
    /// Fallback filter directive used when `RUST_LOG` is not set.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: None,
            level: "info".to_string(),
        }
    }
}
