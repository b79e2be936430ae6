use crate::{CliError, Result};
use flavor_api::{AuthSettings, Credentials, DEFAULT_DOMAIN, DEFAULT_INTERFACE};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Configuration-specific errors that can occur while loading settings
///
/// # Variants
/// * `NotFound` - An explicitly requested config file does not exist
/// * `MissingField` - A required setting is in neither the environment nor the file
/// * `InvalidValue` - A setting is present but unusable
/// * `TomlError` - Error parsing TOML data
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(String),

    #[error("Missing required setting: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("TOML parsing error: {0}")]
    TomlError(String),
}

/// `[auth]` section: how to reach and authenticate against OpenStack
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct AuthSection {
    pub auth_url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub project_name: Option<String>,
    pub user_domain_name: Option<String>,
    pub project_domain_name: Option<String>,
    pub application_credential_id: Option<String>,
    pub application_credential_secret: Option<String>,
    pub region_name: Option<String>,
    pub interface: Option<String>,
    pub compute_url: Option<String>,
}

/// `[client]` section: HTTP client tuning
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ClientSection {
    pub timeout_secs: Option<u64>,
}

/// Contents of the configuration file
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ConfigData {
    pub auth: Option<AuthSection>,
    pub client: Option<ClientSection>,
}

/// Implementation of the auth config trait for the main Config struct
///
/// Environment variables are read from the process environment.
impl flavor_api::AuthConfig for Config {
    type Error = CliError;

    fn auth_settings(&self) -> std::result::Result<AuthSettings, Self::Error> {
        self.resolve_auth(|key| std::env::var(key).ok())
    }
}

/// Loaded configuration file plus the path it came from
#[derive(Debug, Clone)]
pub struct Config {
    pub config_path: PathBuf,
    pub data: ConfigData,
}

impl Config {
    /// Load configuration from `path`, or from the default location.
    ///
    /// An explicit path must exist. The default file is optional; when it is
    /// absent the environment is the only source of settings.
    ///
    /// # Errors
    /// * `ConfigError::NotFound` - If an explicit path does not exist
    /// * `ConfigError::TomlError` - If TOML parsing fails
    /// * `CliError::Io` - If the file cannot be read
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(path) => {
                let expanded = expand_path(path)?;
                if !expanded.exists() {
                    return Err(ConfigError::NotFound(expanded.display().to_string()).into());
                }
                expanded
            }
            None => default_config_path()?,
        };

        let data = if config_path.exists() {
            debug!("Loading config from {}", config_path.display());
            let content = fs::read_to_string(&config_path)?;
            Self::parse(&content)?
        } else {
            debug!(
                "No config file at {}, using environment only",
                config_path.display()
            );
            ConfigData::default()
        };

        Ok(Config { config_path, data })
    }

    /// Parse TOML configuration content
    pub fn parse(content: &str) -> Result<ConfigData> {
        toml::from_str(content).map_err(|e| ConfigError::TomlError(e.to_string()).into())
    }

    fn auth(&self) -> AuthSection {
        self.data.auth.clone().unwrap_or_default()
    }

    /// Merge environment variables (looked up through `env`) over the file.
    ///
    /// # Errors
    /// * `ConfigError::MissingField` - No auth URL, or incomplete credentials
    /// * `ConfigError::InvalidValue` - A zero request timeout
    pub fn resolve_auth<E>(&self, env: E) -> Result<AuthSettings>
    where
        E: Fn(&str) -> Option<String>,
    {
        let file = self.auth();
        let setting = |var: &str, value: &Option<String>| -> Option<String> {
            env(var)
                .filter(|v| !v.is_empty())
                .or_else(|| value.clone().filter(|v| !v.is_empty()))
        };
        let required = |var: &str, field: &str, value: &Option<String>| -> Result<String> {
            setting(var, value).ok_or_else(|| {
                ConfigError::MissingField(format!("{} (or auth.{} in config)", var, field)).into()
            })
        };

        let auth_url = required("OS_AUTH_URL", "auth_url", &file.auth_url)?;

        let credentials = match setting(
            "OS_APPLICATION_CREDENTIAL_ID",
            &file.application_credential_id,
        ) {
            Some(id) => Credentials::ApplicationCredential {
                id,
                secret: required(
                    "OS_APPLICATION_CREDENTIAL_SECRET",
                    "application_credential_secret",
                    &file.application_credential_secret,
                )?,
            },
            None => Credentials::Password {
                username: required("OS_USERNAME", "username", &file.username)?,
                password: required("OS_PASSWORD", "password", &file.password)?,
                user_domain_name: setting("OS_USER_DOMAIN_NAME", &file.user_domain_name)
                    .unwrap_or_else(|| DEFAULT_DOMAIN.to_string()),
                project_name: required("OS_PROJECT_NAME", "project_name", &file.project_name)?,
                project_domain_name: setting("OS_PROJECT_DOMAIN_NAME", &file.project_domain_name)
                    .unwrap_or_else(|| DEFAULT_DOMAIN.to_string()),
            },
        };

        let mut settings = AuthSettings::new(auth_url, credentials);
        settings.region_name = setting("OS_REGION_NAME", &file.region_name);
        settings.compute_url = setting("OS_COMPUTE_URL", &file.compute_url);
        settings.interface = setting("OS_INTERFACE", &file.interface)
            .map(|i| normalize_interface(&i))
            .unwrap_or_else(|| DEFAULT_INTERFACE.to_string());

        if let Some(timeout) = self.data.client.as_ref().and_then(|c| c.timeout_secs) {
            if timeout == 0 {
                return Err(ConfigError::InvalidValue {
                    field: "client.timeout_secs".to_string(),
                    value: timeout.to_string(),
                }
                .into());
            }
            settings.timeout = Duration::from_secs(timeout);
        }

        Ok(settings)
    }
}

/// Accept the legacy `publicURL` / `internalURL` spellings
fn normalize_interface(interface: &str) -> String {
    interface
        .strip_suffix("URL")
        .unwrap_or(interface)
        .to_lowercase()
}

fn get_config_dir() -> Result<PathBuf> {
    let home_dir = home::home_dir().ok_or_else(|| ConfigError::InvalidValue {
        field: "home directory".to_string(),
        value: "not found".to_string(),
    })?;

    Ok(home_dir.join(".os-flavor-selector"))
}

/// Default location of the configuration file
pub fn default_config_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join("config.toml"))
}

/// Expand a leading `~` to the user's home directory
pub fn expand_path(path: &Path) -> Result<PathBuf> {
    match path.strip_prefix("~") {
        Ok(rest) => {
            let home_dir = home::home_dir().ok_or_else(|| ConfigError::InvalidValue {
                field: "path".to_string(),
                value: path.display().to_string(),
            })?;
            Ok(home_dir.join(rest))
        }
        Err(_) => Ok(path.to_path_buf()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn config(content: &str) -> Config {
        Config {
            config_path: PathBuf::from("config.toml"),
            data: Config::parse(content).unwrap(),
        }
    }

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    const FILE: &str = r#"
[auth]
auth_url = "https://keystone.example.com:5000/v3"
username = "alice"
password = "wonderland"
project_name = "research"
region_name = "RegionOne"
interface = "internalURL"

[client]
timeout_secs = 10
"#;

    #[test]
    fn test_resolve_from_file() {
        let settings = config(FILE).resolve_auth(env(&[])).unwrap();

        assert_eq!(settings.auth_url, "https://keystone.example.com:5000/v3");
        assert_eq!(settings.region_name.as_deref(), Some("RegionOne"));
        assert_eq!(settings.interface, "internal");
        assert_eq!(settings.timeout, Duration::from_secs(10));
        assert_eq!(
            settings.credentials,
            Credentials::Password {
                username: "alice".to_string(),
                password: "wonderland".to_string(),
                user_domain_name: "Default".to_string(),
                project_name: "research".to_string(),
                project_domain_name: "Default".to_string(),
            }
        );
    }

    #[test]
    fn test_environment_overrides_file() {
        let settings = config(FILE)
            .resolve_auth(env(&[
                ("OS_USERNAME", "bob"),
                ("OS_REGION_NAME", "RegionTwo"),
                ("OS_INTERFACE", ""),
            ]))
            .unwrap();

        match settings.credentials {
            Credentials::Password { username, .. } => assert_eq!(username, "bob"),
            other => panic!("unexpected credentials: {:?}", other),
        }
        assert_eq!(settings.region_name.as_deref(), Some("RegionTwo"));
        assert_eq!(settings.interface, "internal");
    }

    #[test]
    fn test_environment_only() {
        let settings = config("")
            .resolve_auth(env(&[
                ("OS_AUTH_URL", "http://keystone/v3"),
                ("OS_APPLICATION_CREDENTIAL_ID", "app-id"),
                ("OS_APPLICATION_CREDENTIAL_SECRET", "app-secret"),
            ]))
            .unwrap();

        assert_eq!(settings.interface, "public");
        assert_eq!(
            settings.credentials,
            Credentials::ApplicationCredential {
                id: "app-id".to_string(),
                secret: "app-secret".to_string(),
            }
        );
    }

    #[test]
    fn test_missing_auth_url() {
        let result = config("").resolve_auth(env(&[("OS_USERNAME", "bob")]));
        assert!(matches!(
            result,
            Err(CliError::Config(ConfigError::MissingField(ref field))) if field.starts_with("OS_AUTH_URL")
        ));
    }

    #[test]
    fn test_missing_password() {
        let result = config("").resolve_auth(env(&[
            ("OS_AUTH_URL", "http://keystone/v3"),
            ("OS_USERNAME", "bob"),
            ("OS_PROJECT_NAME", "demo"),
        ]));
        assert!(matches!(
            result,
            Err(CliError::Config(ConfigError::MissingField(ref field))) if field.starts_with("OS_PASSWORD")
        ));
    }

    #[test]
    fn test_zero_timeout_is_invalid() {
        let content = format!("{}\n", FILE.replace("timeout_secs = 10", "timeout_secs = 0"));
        let result = config(&content).resolve_auth(env(&[]));
        assert!(matches!(
            result,
            Err(CliError::Config(ConfigError::InvalidValue { .. }))
        ));
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            Config::parse("[auth\nauth_url = 1"),
            Err(CliError::Config(ConfigError::TomlError(_)))
        ));
    }

    #[test]
    fn test_load_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FILE.as_bytes()).unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.config_path, file.path());
        assert_eq!(
            config.data.auth.unwrap().project_name.as_deref(),
            Some("research")
        );
    }

    #[test]
    fn test_load_missing_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::load(Some(dir.path().join("nope.toml").as_path()));
        assert!(matches!(
            result,
            Err(CliError::Config(ConfigError::NotFound(_)))
        ));
    }

    #[test]
    fn test_expand_path_without_tilde() {
        assert_eq!(
            expand_path(Path::new("/etc/flavors.toml")).unwrap(),
            PathBuf::from("/etc/flavors.toml")
        );
    }
}
