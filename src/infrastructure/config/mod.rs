use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use tracing::debug;
use url::Url;
use validator::Validate;

use crate::domain::client_config::AppConfig;
use crate::domain::error::{AppError, Result};

pub const DEFAULT_CONFIG_FILE: &str = "predictdesk.toml";
pub const ENV_PREFIX: &str = "PREDICTDESK_";
const FALLBACK_SERVICE_URL: &str = "http://127.0.0.1:8000";

/// Values given on the command line; they override every other source
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub service_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub export_dir: Option<PathBuf>,
}

pub struct ConfigService {
    figment: Figment,
}

impl ConfigService {
    /// Defaults, then the TOML file, then `PREDICTDESK_*` environment variables
    pub fn new(config_path: Option<&Path>) -> Self {
        // A missing .env is fine.
        let _ = dotenvy::dotenv();

        let path = config_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        debug!(path = %path.display(), "Loading configuration");

        let figment = Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX));
        Self { figment }
    }

    /// Start from an explicit figment, used by tests
    pub fn from_figment(figment: Figment) -> Self {
        Self { figment }
    }

    pub fn load(&self, overrides: &ConfigOverrides) -> Result<AppConfig> {
        let mut config: AppConfig = self.figment.extract()?;

        if let Some(url) = &overrides.service_url {
            config.service_url = Some(url.clone());
        }
        if let Some(timeout) = overrides.request_timeout_secs {
            config.request_timeout_secs = timeout;
        }
        if let Some(dir) = &overrides.export_dir {
            config.export_dir = dir.clone();
        }

        config.validate()?;
        Ok(config)
    }
}

/// Explicit `service_url` wins; otherwise the origin with its port replaced
pub fn resolve_service_url(config: &AppConfig) -> Result<String> {
    if let Some(url) = &config.service_url {
        return Ok(url.trim_end_matches('/').to_string());
    }
    match &config.origin {
        Some(origin) => derive_service_url(origin, config.service_port),
        None => Ok(FALLBACK_SERVICE_URL.to_string()),
    }
}

/// Replace the port of a page origin, e.g. `http://localhost:5173` -> `http://localhost:8000`
pub fn derive_service_url(origin: &str, port: u16) -> Result<String> {
    let mut url = Url::parse(origin)
        .map_err(|e| AppError::ConfigError(format!("Invalid origin '{}': {}", origin, e)))?;
    url.set_port(Some(port))
        .map_err(|_| AppError::ConfigError(format!("Origin '{}' cannot carry a port", origin)))?;
    url.set_path("");
    url.set_query(None);
    url.set_fragment(None);
    Ok(url.as_str().trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::prediction::PayloadForm;

    fn service(toml: &str) -> ConfigService {
        ConfigService::from_figment(
            Figment::from(Serialized::defaults(AppConfig::default())).merge(Toml::string(toml)),
        )
    }

    #[test]
    fn test_defaults_load() {
        let config = service("").load(&ConfigOverrides::default()).unwrap();
        assert_eq!(config.service_port, 8000);
        assert_eq!(config.schema.len(), 8);
        assert_eq!(config.payload_form, PayloadForm::Features);
    }

    #[test]
    fn test_toml_values_and_overrides() {
        let toml = r#"
            service_url = "http://predict.internal:9000"
            request_timeout_secs = 5
            payload_form = "raw"
            schema = ["x", "y"]
        "#;
        let overrides = ConfigOverrides {
            request_timeout_secs: Some(12),
            ..ConfigOverrides::default()
        };
        let config = service(toml).load(&overrides).unwrap();
        assert_eq!(config.service_url.as_deref(), Some("http://predict.internal:9000"));
        assert_eq!(config.request_timeout_secs, 12);
        assert_eq!(config.payload_form, PayloadForm::Raw);
        assert_eq!(config.schema, vec!["x", "y"]);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let err = service("request_timeout_secs = 0")
            .load(&ConfigOverrides::default())
            .unwrap_err();
        assert!(matches!(err, AppError::ConfigError(_)));

        let err = service("service_port = \"eighty\"")
            .load(&ConfigOverrides::default())
            .unwrap_err();
        assert!(matches!(err, AppError::ConfigError(_)));
    }

    #[test]
    fn test_env_overrides_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(DEFAULT_CONFIG_FILE, "request_timeout_secs = 5")?;
            jail.set_env("PREDICTDESK_REQUEST_TIMEOUT_SECS", "9");
            let config = ConfigService::new(None)
                .load(&ConfigOverrides::default())
                .map_err(|e| e.to_string())?;
            assert_eq!(config.request_timeout_secs, 9);
            Ok(())
        });
    }

    #[test]
    fn test_derive_service_url_swaps_port() {
        assert_eq!(
            derive_service_url("http://localhost:5173", 8000).unwrap(),
            "http://localhost:8000"
        );
        assert_eq!(
            derive_service_url("https://example.org/app?x=1", 8000).unwrap(),
            "https://example.org:8000"
        );
    }

    #[test]
    fn test_resolve_prefers_explicit_url() {
        let config = AppConfig {
            service_url: Some("http://svc:1234/".to_string()),
            origin: Some("http://localhost:3000".to_string()),
            ..AppConfig::default()
        };
        assert_eq!(resolve_service_url(&config).unwrap(), "http://svc:1234");

        let config = AppConfig {
            origin: Some("http://localhost:3000".to_string()),
            ..AppConfig::default()
        };
        assert_eq!(resolve_service_url(&config).unwrap(), "http://localhost:8000");

        assert_eq!(
            resolve_service_url(&AppConfig::default()).unwrap(),
            "http://127.0.0.1:8000"
        );
    }
}
