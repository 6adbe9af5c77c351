//! Stored settings, validation and loading
//!
//! The stored object mirrors what the settings page writes:
//! `{apiUrl, apiKey, instances: [{hostUrl, systemType}], debug}`. Every key
//! may be absent; [`Settings::validate`] turns it into a [`Configuration`]
//! the rest of the crate can rely on.

use std::env;
use std::fs as stdfs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use omnitime_core_types::DebugLog;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{info, warn};
use url::Url;

use crate::errors::ActivationError;

pub const DEFAULT_SYSTEM_TYPE: &str = "gitlab";

pub const ENV_API_URL: &str = "OMNITIME_API_URL";
pub const ENV_API_KEY: &str = "OMNITIME_API_KEY";
pub const ENV_DEBUG: &str = "OMNITIME_DEBUG";

const LOCAL_CONFIG: &str = "config/omnitime.yaml";
const LOCAL_ENV: &str = "config/local.env";

fn default_system_type() -> String {
    DEFAULT_SYSTEM_TYPE.to_string()
}

/// One tracked deployment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceConfig {
    pub host_url: String,
    #[serde(default = "default_system_type")]
    pub system_type: String,
}

impl InstanceConfig {
    pub fn new(host_url: impl Into<String>, system_type: impl Into<String>) -> Self {
        Self {
            host_url: host_url.into(),
            system_type: system_type.into(),
        }
    }

    /// Host part only, without any scheme the user may have typed.
    pub fn host(&self) -> String {
        let host = self.host_url.trim();
        if host.starts_with("http") {
            if let Some(parsed) = Url::parse(host).ok().and_then(|url| url_host(&url)) {
                return parsed;
            }
        }
        host.to_string()
    }

    /// Match pattern covering http and https on this host.
    pub fn origin_pattern(&self) -> String {
        format!("*://{}/*", self.host())
    }
}

fn url_host(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

/// Raw stored settings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instances: Option<Vec<InstanceConfig>>,
    #[serde(default)]
    pub debug: bool,
}

impl Settings {
    /// Trim every value and drop instances without a host.
    pub fn normalized(&self) -> Settings {
        Settings {
            api_url: self.api_url.as_deref().map(|v| v.trim().to_string()),
            api_key: self.api_key.as_deref().map(|v| v.trim().to_string()),
            instances: self.instances.as_ref().map(|instances| {
                instances
                    .iter()
                    .map(|instance| InstanceConfig {
                        host_url: instance.host_url.trim().to_string(),
                        system_type: instance.system_type.clone(),
                    })
                    .filter(|instance| !instance.host_url.is_empty())
                    .collect()
            }),
            debug: self.debug,
        }
    }

    /// `*://<host>/*` for each configured instance.
    pub fn origin_patterns(&self) -> Vec<String> {
        self.instances
            .iter()
            .flatten()
            .filter(|instance| !instance.host_url.trim().is_empty())
            .map(InstanceConfig::origin_pattern)
            .collect()
    }

    pub fn debug_log(&self) -> DebugLog {
        DebugLog::new(self.debug)
    }

    pub fn validate(&self) -> Result<Configuration, ActivationError> {
        let instances = self
            .instances
            .clone()
            .ok_or(ActivationError::ConfigurationMissing("instances"))?;
        let api_url = self
            .api_url
            .clone()
            .filter(|url| !url.is_empty())
            .ok_or(ActivationError::ConfigurationMissing("apiUrl"))?;

        Ok(Configuration {
            api_url,
            api_key: self.api_key.clone().unwrap_or_default(),
            instances,
            debug: self.debug,
        })
    }

    /// Apply `OMNITIME_*` environment variables on top of the file.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = env::var(ENV_API_URL) {
            self.api_url = Some(url);
        }
        if let Ok(key) = env::var(ENV_API_KEY) {
            self.api_key = Some(key);
        }
        if let Ok(raw) = env::var(ENV_DEBUG) {
            match parse_flag(&raw) {
                Some(flag) => self.debug = flag,
                None => warn!(value = %raw, "ignoring unrecognised {ENV_DEBUG}"),
            }
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

/// Settings that passed validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Configuration {
    pub api_url: String,
    pub api_key: String,
    pub instances: Vec<InstanceConfig>,
    pub debug: bool,
}

impl Configuration {
    /// First instance whose `hostUrl` equals `host` exactly.
    pub fn instance_for_host(&self, host: &str) -> Option<&InstanceConfig> {
        self.instances
            .iter()
            .find(|instance| instance.host_url == host)
    }

    pub fn debug_log(&self) -> DebugLog {
        DebugLog::new(self.debug)
    }
}

/// Where settings are read from and written to.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    async fn load(&self) -> Result<Settings>;
    async fn save(&self, settings: &Settings) -> Result<()>;
}

/// YAML file store. JSON files load too.
#[derive(Clone, Debug)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ConfigStore for FileConfigStore {
    async fn load(&self) -> Result<Settings> {
        if !self.path.exists() {
            warn!(
                "Config file not found, using defaults: {}",
                self.path.display()
            );
            return Ok(Settings::default());
        }

        let content = fs::read_to_string(&self.path)
            .await
            .context("Failed to read config file")?;
        if content.trim().is_empty() {
            return Ok(Settings::default());
        }
        let settings: Settings =
            serde_yaml::from_str(&content).context("Failed to parse config file")?;

        info!("Loaded configuration from: {}", self.path.display());
        Ok(settings)
    }

    async fn save(&self, settings: &Settings) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .context("Failed to create config directory")?;
        }
        let content = serde_yaml::to_string(settings).context("Failed to serialize settings")?;
        fs::write(&self.path, content)
            .await
            .context("Failed to write config file")?;
        Ok(())
    }
}

/// In-process store.
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    settings: RwLock<Settings>,
}

impl MemoryConfigStore {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings: RwLock::new(settings),
        }
    }
}

#[async_trait]
impl ConfigStore for MemoryConfigStore {
    async fn load(&self) -> Result<Settings> {
        Ok(self.settings.read().clone())
    }

    async fn save(&self, settings: &Settings) -> Result<()> {
        *self.settings.write() = settings.clone();
        Ok(())
    }
}

/// Explicit path, else `./config/omnitime.yaml`, else the user config dir.
pub fn resolve_config_path(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    let local = PathBuf::from(LOCAL_CONFIG);
    if local.exists() {
        return Ok(local);
    }
    let mut path = dirs::config_dir().context("Failed to get config directory")?;
    path.push("omnitime");
    path.push("config.yaml");
    Ok(path)
}

pub struct LoadedConfig {
    pub settings: Settings,
    pub path: PathBuf,
}

/// Resolve, read and apply environment overrides.
pub async fn load_config(explicit: Option<&Path>) -> Result<LoadedConfig> {
    let path = resolve_config_path(explicit)?;
    let mut settings = FileConfigStore::new(&path).load().await?;
    settings.apply_env_overrides();
    Ok(LoadedConfig { settings, path })
}

/// Export `KEY=value` lines from `config/local.env` unless already set.
pub fn load_local_env_overrides() {
    load_env_file(Path::new(LOCAL_ENV));
}

pub fn load_env_file(path: &Path) {
    if !path.exists() {
        return;
    }

    match stdfs::read_to_string(path) {
        Ok(contents) => {
            for (idx, raw_line) in contents.lines().enumerate() {
                let line = raw_line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                let Some((key, value)) = line.split_once('=') else {
                    warn!(line = idx + 1, "invalid local.env entry; skipping");
                    continue;
                };
                let key = key.trim();
                if key.is_empty() || env::var(key).is_ok() {
                    continue;
                }
                env::set_var(key, unquote(value.trim()));
            }
            info!(path = %path.display(), "Loaded environment overrides");
        }
        Err(err) => {
            warn!(path = %path.display(), ?err, "failed to read env overrides");
        }
    }
}

fn unquote(value: &str) -> String {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .map(|inner| inner.replace("\\\"", "\""))
        .unwrap_or_else(|| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(yaml: &str) -> Settings {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn camel_case_keys_and_defaults() {
        let parsed = settings(
            "apiUrl: https://time.example.com/api\ninstances:\n  - hostUrl: gitlab.example.com\n",
        );
        assert_eq!(
            parsed.api_url.as_deref(),
            Some("https://time.example.com/api")
        );
        assert_eq!(parsed.api_key, None);
        assert!(!parsed.debug);
        assert_eq!(
            parsed.instances.unwrap(),
            vec![InstanceConfig::new("gitlab.example.com", "gitlab")]
        );
    }

    #[test]
    fn json_settings_load() {
        let parsed = settings(
            r#"{"apiUrl": "https://t/api", "apiKey": "k", "debug": true, "instances": []}"#,
        );
        assert!(parsed.debug);
        assert_eq!(parsed.api_key.as_deref(), Some("k"));
    }

    #[test]
    fn validate_requires_instances_and_api_url() {
        let missing_instances = Settings {
            api_url: Some("https://t/api".into()),
            ..Settings::default()
        };
        assert_eq!(
            missing_instances.validate().unwrap_err(),
            ActivationError::ConfigurationMissing("instances")
        );

        let empty_url = Settings {
            api_url: Some(String::new()),
            instances: Some(vec![]),
            ..Settings::default()
        };
        assert_eq!(
            empty_url.validate().unwrap_err(),
            ActivationError::ConfigurationMissing("apiUrl")
        );

        let ok = Settings {
            api_url: Some("https://t/api".into()),
            instances: Some(vec![]),
            ..Settings::default()
        }
        .validate()
        .unwrap();
        assert_eq!(ok.api_key, "");
    }

    #[test]
    fn host_match_is_exact() {
        let config = Configuration {
            api_url: "https://t/api".into(),
            api_key: String::new(),
            instances: vec![
                InstanceConfig::new("gitlab.example.com", "gitlab"),
                InstanceConfig::new("git.example.com:8443", "gitlab"),
            ],
            debug: false,
        };
        assert!(config.instance_for_host("gitlab.example.com").is_some());
        assert!(config.instance_for_host("GITLAB.example.com").is_none());
        assert!(config.instance_for_host("example.com").is_none());
        assert!(config.instance_for_host("git.example.com").is_none());
        assert!(config.instance_for_host("git.example.com:8443").is_some());
    }

    #[test]
    fn normalized_trims_and_drops_blank_hosts() {
        let raw = Settings {
            api_url: Some("  https://t/api \n".into()),
            api_key: Some(" k ".into()),
            instances: Some(vec![
                InstanceConfig::new("  gitlab.example.com ", "gitlab"),
                InstanceConfig::new("   ", "gitlab"),
            ]),
            debug: true,
        };
        let clean = raw.normalized();
        assert_eq!(clean.api_url.as_deref(), Some("https://t/api"));
        assert_eq!(clean.api_key.as_deref(), Some("k"));
        assert_eq!(
            clean.instances.unwrap(),
            vec![InstanceConfig::new("gitlab.example.com", "gitlab")]
        );
    }

    #[test]
    fn origin_patterns_strip_scheme() {
        let raw = Settings {
            instances: Some(vec![
                InstanceConfig::new("gitlab.example.com", "gitlab"),
                InstanceConfig::new("https://git.example.com:8443/some/path", "gitlab"),
                InstanceConfig::new("", "gitlab"),
            ]),
            ..Settings::default()
        };
        assert_eq!(
            raw.origin_patterns(),
            vec![
                "*://gitlab.example.com/*".to_string(),
                "*://git.example.com:8443/*".to_string(),
            ]
        );
    }

    #[test]
    fn flag_parsing() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag(" 0 "), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn unquote_values() {
        assert_eq!(unquote("\"a \\\"b\\\"\""), "a \"b\"");
        assert_eq!(unquote("plain"), "plain");
    }
}
