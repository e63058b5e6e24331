use crate::error::ConfigError;
use config::builder::DefaultState;
use config::ConfigBuilder;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use logging::init_tracing;
pub use settings::{ApiConfig, AuthConfig, Config, DashboardConfig, ExportConfig, LoggingConfig};

/// The file read when no explicit path is given.
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Prefix for environment overrides, e.g. `VENDOR_DASHBOARD__AUTH__ACCESS_TOKEN`.
pub const ENV_PREFIX: &str = "VENDOR_DASHBOARD";

/// Loads the application configuration.
///
/// Sources are layered in increasing priority: built-in defaults, the TOML file at
/// `path` (or `config.toml`, which may be absent), then `VENDOR_DASHBOARD__*`
/// environment variables. The merged result is validated before it is returned.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));

    let builder = with_defaults(config::Config::builder())?
        .add_source(config::File::from(path).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

    finish(builder)
}

/// Loads configuration from an in-memory TOML document, without touching the
/// filesystem or environment.
pub fn load_config_from_str(toml: &str) -> Result<Config, ConfigError> {
    let builder = with_defaults(config::Config::builder())?
        .add_source(config::File::from_str(toml, config::FileFormat::Toml));

    finish(builder)
}

fn with_defaults(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(builder.set_default("api.timeout_secs", 30)?)
}

fn finish(builder: ConfigBuilder<DefaultState>) -> Result<Config, ConfigError> {
    // Attempt to deserialize the entire configuration into our `Config` struct
    let config = builder.build()?.try_deserialize::<Config>()?;
    validate(&config)?;
    Ok(config)
}

/// Checks the invariants that serde cannot express.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    let url = url::Url::parse(&config.api.base_url).map_err(|e| {
        ConfigError::ValidationError(format!(
            "api.base_url '{}' is not a valid URL: {}",
            config.api.base_url, e
        ))
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::ValidationError(format!(
            "api.base_url must use http or https, got '{}'",
            url.scheme()
        )));
    }
    if config.api.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "api.timeout_secs must be greater than zero".to_string(),
        ));
    }
    if config.dashboard.orders_limit == 0 {
        return Err(ConfigError::ValidationError(
            "dashboard.orders_limit must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::Period;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = load_config_from_str(
            r#"
            [api]
            base_url = "https://api.example.com/prod"
            "#,
        )
        .unwrap();

        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.dashboard.default_period, Period::Month);
        assert_eq!(config.dashboard.orders_limit, 50);
        assert_eq!(config.logging.level, "info");
        assert!(config.auth.access_token.is_none());
    }

    #[test]
    fn test_full_config_is_read() {
        let config = load_config_from_str(
            r#"
            [api]
            base_url = "http://localhost:8080"
            timeout_secs = 5

            [auth]
            access_token = "abc"
            subject = "vendor-7"

            [dashboard]
            default_period = "quarter"
            orders_limit = 10

            [export]
            output_dir = "out"
            "#,
        )
        .unwrap();

        assert_eq!(config.api.timeout_secs, 5);
        assert_eq!(config.auth.subject.as_deref(), Some("vendor-7"));
        assert_eq!(config.dashboard.default_period, Period::Quarter);
        assert_eq!(config.export.output_dir, std::path::PathBuf::from("out"));
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        let result = load_config_from_str(
            r#"
            [api]
            base_url = "not a url"
            "#,
        );
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_non_http_scheme_is_rejected() {
        let result = load_config_from_str(
            r#"
            [api]
            base_url = "ftp://example.com"
            "#,
        );
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let result = load_config_from_str(
            r#"
            [api]
            base_url = "https://api.example.com"
            timeout_secs = 0
            "#,
        );
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_unknown_period_is_rejected() {
        let result = load_config_from_str(
            r#"
            [api]
            base_url = "https://api.example.com"

            [dashboard]
            default_period = "fortnight"
            "#,
        );
        assert!(matches!(result, Err(ConfigError::LoadError(_))));
    }

    #[test]
    fn test_debug_redacts_token() {
        let auth = AuthConfig {
            access_token: Some("super-secret".to_string()),
            subject: None,
        };
        let printed = format!("{:?}", auth);
        assert!(!printed.contains("super-secret"));
        assert!(printed.contains("<redacted>"));
    }
}
