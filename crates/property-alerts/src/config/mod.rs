use std::env;
use std::fmt;
use std::path::Path;

use crate::workflows::alerts::DeliveryMode;

/// Distinguishes runtime behavior for different stages of the job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Where the search criteria come from for this run. Spreadsheet settings are
/// only mandatory when the remote sheet is actually read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CriteriaOrigin {
    Spreadsheet,
    LocalFile,
}

/// Top-level configuration for the job. Built once and passed by reference.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub smtp: SmtpConfig,
    pub listings: ListingConfig,
    pub sheets: Option<SheetsConfig>,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Reads `.env` from the working directory (when present) and then the
    /// process environment.
    pub fn load(origin: CriteriaOrigin, delivery: DeliveryMode) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(origin, delivery, |key| env::var(key).ok())
    }

    /// Like [`AppConfig::load`] but with an explicit settings file.
    pub fn load_with_env_file<P: AsRef<Path>>(
        path: P,
        origin: CriteriaOrigin,
        delivery: DeliveryMode,
    ) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        dotenvy::from_path(path).map_err(|source| ConfigError::EnvFile {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_lookup(origin, delivery, |key| env::var(key).ok())
    }

    /// Relay credentials are only mandatory when mail is actually sent; a dry
    /// run still needs the addresses to compose the digest.
    pub fn from_lookup<F>(
        origin: CriteriaOrigin,
        delivery: DeliveryMode,
        lookup: F,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let settings = Settings { lookup };

        let environment =
            AppEnvironment::from_str(&settings.optional("APP_ENV", "development"));
        let log_level = settings.optional("APP_LOG_LEVEL", "info");

        let use_mock = settings.flag("USE_MOCK_API", true)?;
        let api_key = if use_mock {
            settings.optional("PROPERTYDATA_API_KEY", "")
        } else {
            settings.required("PROPERTYDATA_API_KEY")?
        };

        let relay_setting = |key: &'static str| match delivery {
            DeliveryMode::Send => settings.required(key),
            DeliveryMode::DryRun => Ok(settings.optional(key, "")),
        };
        let smtp = SmtpConfig {
            host: relay_setting("SMTP_HOST")?,
            port: settings.port("SMTP_PORT", 587)?,
            username: relay_setting("SMTP_USERNAME")?,
            password: relay_setting("SMTP_PASSWORD")?,
            email_from: settings.required("EMAIL_FROM")?,
            email_to: settings.required("EMAIL_TO")?,
        };

        let sheets = match origin {
            CriteriaOrigin::Spreadsheet => Some(SheetsConfig {
                credentials_path: settings.required("GOOGLE_SHEETS_CREDENTIALS_JSON")?,
                spreadsheet_id: settings.required("GOOGLE_SHEETS_SPREADSHEET_ID")?,
                worksheet_name: settings.optional("GOOGLE_SHEETS_WORKSHEET_NAME", "Sheet1"),
            }),
            CriteriaOrigin::LocalFile => None,
        };

        Ok(Self {
            environment,
            smtp,
            listings: ListingConfig { use_mock, api_key },
            sheets,
            telemetry: TelemetryConfig { log_level },
        })
    }
}

struct Settings<F> {
    lookup: F,
}

impl<F> Settings<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn raw(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    fn required(&self, key: &'static str) -> Result<String, ConfigError> {
        self.raw(key).ok_or(ConfigError::Missing(key))
    }

    fn optional(&self, key: &str, default: &str) -> String {
        self.raw(key).unwrap_or_else(|| default.to_string())
    }

    fn flag(&self, key: &'static str, default: bool) -> Result<bool, ConfigError> {
        let Some(value) = self.raw(key) else {
            return Ok(default);
        };
        match value.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::Invalid { key, value }),
        }
    }

    fn port(&self, key: &'static str, default: u16) -> Result<u16, ConfigError> {
        match self.raw(key) {
            Some(value) => value
                .parse::<u16>()
                .map_err(|_| ConfigError::Invalid { key, value }),
            None => Ok(default),
        }
    }
}

/// Mail relay settings.
#[derive(Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub email_from: String,
    pub email_to: String,
}

impl fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("email_from", &self.email_from)
            .field("email_to", &self.email_to)
            .finish()
    }
}

/// Listing data source selection.
#[derive(Clone)]
pub struct ListingConfig {
    pub use_mock: bool,
    pub api_key: String,
}

impl fmt::Debug for ListingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListingConfig")
            .field("use_mock", &self.use_mock)
            .field("api_key_set", &!self.api_key.is_empty())
            .finish()
    }
}

/// Google Sheets connection settings.
#[derive(Debug, Clone)]
pub struct SheetsConfig {
    pub credentials_path: String,
    pub spreadsheet_id: String,
    pub worksheet_name: String,
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { key: &'static str, value: String },
    EnvFile { path: String, source: dotenvy::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => {
                write!(f, "missing required environment variable: {key}")
            }
            ConfigError::Invalid { key, value } => {
                write!(f, "{key} has an invalid value '{value}'")
            }
            ConfigError::EnvFile { path, .. } => {
                write!(f, "unable to read settings file '{path}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Missing(_) | ConfigError::Invalid { .. } => None,
            ConfigError::EnvFile { source, .. } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base_settings() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("SMTP_HOST", "smtp.example.com"),
            ("SMTP_USERNAME", "mailer"),
            ("SMTP_PASSWORD", "secret"),
            ("EMAIL_FROM", "alerts@example.com"),
            ("EMAIL_TO", "buyer@example.com"),
            ("GOOGLE_SHEETS_CREDENTIALS_JSON", "service-account.json"),
            ("GOOGLE_SHEETS_SPREADSHEET_ID", "sheet-123"),
        ])
    }

    fn load(
        origin: CriteriaOrigin,
        settings: &HashMap<&'static str, &'static str>,
    ) -> Result<AppConfig, ConfigError> {
        AppConfig::from_lookup(origin, DeliveryMode::Send, |key| {
            settings.get(key).map(|v| v.to_string())
        })
    }

    #[test]
    fn load_applies_documented_defaults() {
        let config = load(CriteriaOrigin::Spreadsheet, &base_settings()).expect("config loads");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.smtp.port, 587);
        assert!(config.listings.use_mock);
        assert_eq!(config.telemetry.log_level, "info");
        let sheets = config.sheets.expect("sheets configured");
        assert_eq!(sheets.worksheet_name, "Sheet1");
        assert_eq!(sheets.spreadsheet_id, "sheet-123");
    }

    #[test]
    fn non_numeric_port_is_rejected() {
        let mut settings = base_settings();
        settings.insert("SMTP_PORT", "five-eight-seven");
        let err = load(CriteriaOrigin::Spreadsheet, &settings).expect_err("port must parse");
        assert!(matches!(err, ConfigError::Invalid { key: "SMTP_PORT", .. }));
    }

    #[test]
    fn api_key_required_only_outside_mock_mode() {
        let mut settings = base_settings();
        settings.insert("USE_MOCK_API", "false");
        let err = load(CriteriaOrigin::Spreadsheet, &settings).expect_err("key required");
        assert!(matches!(err, ConfigError::Missing("PROPERTYDATA_API_KEY")));

        settings.insert("PROPERTYDATA_API_KEY", "pd-key");
        let config = load(CriteriaOrigin::Spreadsheet, &settings).expect("config loads");
        assert!(!config.listings.use_mock);
        assert_eq!(config.listings.api_key, "pd-key");
    }

    #[test]
    fn blank_values_count_as_missing() {
        let mut settings = base_settings();
        settings.insert("SMTP_HOST", "   ");
        let err = load(CriteriaOrigin::Spreadsheet, &settings).expect_err("host required");
        assert!(matches!(err, ConfigError::Missing("SMTP_HOST")));
    }

    #[test]
    fn local_file_mode_skips_spreadsheet_settings() {
        let mut settings = base_settings();
        settings.remove("GOOGLE_SHEETS_CREDENTIALS_JSON");
        settings.remove("GOOGLE_SHEETS_SPREADSHEET_ID");

        assert!(matches!(
            load(CriteriaOrigin::Spreadsheet, &settings),
            Err(ConfigError::Missing("GOOGLE_SHEETS_CREDENTIALS_JSON"))
        ));
        let config = load(CriteriaOrigin::LocalFile, &settings).expect("config loads");
        assert!(config.sheets.is_none());
    }

    #[test]
    fn dry_run_does_not_need_relay_credentials() {
        let mut settings = base_settings();
        for key in ["SMTP_HOST", "SMTP_USERNAME", "SMTP_PASSWORD"] {
            settings.remove(key);
        }
        let lookup = |key: &str| settings.get(key).map(|v| v.to_string());

        assert!(matches!(
            AppConfig::from_lookup(CriteriaOrigin::Spreadsheet, DeliveryMode::Send, lookup),
            Err(ConfigError::Missing("SMTP_HOST"))
        ));
        let config =
            AppConfig::from_lookup(CriteriaOrigin::Spreadsheet, DeliveryMode::DryRun, lookup)
                .expect("config loads");
        assert!(config.smtp.host.is_empty());
        assert_eq!(config.smtp.email_to, "buyer@example.com");

        settings.remove("EMAIL_TO");
        let lookup = |key: &str| settings.get(key).map(|v| v.to_string());
        assert!(matches!(
            AppConfig::from_lookup(CriteriaOrigin::Spreadsheet, DeliveryMode::DryRun, lookup),
            Err(ConfigError::Missing("EMAIL_TO"))
        ));
    }

    #[test]
    fn mock_flag_rejects_garbage() {
        let mut settings = base_settings();
        settings.insert("USE_MOCK_API", "maybe");
        let err = load(CriteriaOrigin::Spreadsheet, &settings).expect_err("flag must parse");
        assert!(matches!(err, ConfigError::Invalid { key: "USE_MOCK_API", .. }));
    }

    #[test]
    fn secrets_are_redacted_from_debug_output() {
        let config = load(CriteriaOrigin::Spreadsheet, &base_settings()).expect("config loads");
        let rendered = format!("{:?}", config.smtp);
        assert!(!rendered.contains("secret"));
    }
}
