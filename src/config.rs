//! Client configuration - backend address and polling cadence
//!
//! Layered: built-in defaults, then `config.yaml`, then a legacy `ip.json`
//! in the working directory, then `IMAGINE_*` environment variables.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::{
    CONFIG_DIR_NAME, DEFAULT_HOST, DEFAULT_PORT, DEFAULT_PROGRESS_POLL_MS, DEFAULT_QUEUE_POLL_MS,
};

const CONFIG_FILE_NAME: &str = "config.yaml";
const LEGACY_IP_FILE: &str = "ip.json";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scheme: String,
    pub host: String,
    pub port: u16,
    /// Full base URL; when set it wins over scheme/host/port
    pub base_url: Option<String>,
    pub queue_poll_ms: u64,
    pub progress_poll_ms: u64,
    /// No timeout unless configured
    pub request_timeout_secs: Option<u64>,
    pub log_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            scheme: String::from("http"),
            host: String::from(DEFAULT_HOST),
            port: DEFAULT_PORT,
            base_url: None,
            queue_poll_ms: DEFAULT_QUEUE_POLL_MS,
            progress_poll_ms: DEFAULT_PROGRESS_POLL_MS,
            request_timeout_secs: None,
            log_dir: None,
        }
    }
}

#[derive(Deserialize)]
struct LegacyIp {
    ip: String,
}

impl Config {
    /// Load from the standard locations and the process environment
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let path = std::env::var("IMAGINE_CONFIG")
            .ok()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .or_else(Self::default_path);

        let mut config = match path {
            Some(p) if p.exists() => Self::from_path(&p)?,
            _ => Config::default(),
        };

        config.apply_legacy_ip(Path::new(LEGACY_IP_FILE))?;
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// `<config dir>/imagine/config.yaml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config = serde_yaml::from_str(&content)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    /// Honor the `{"ip": "..."}` file the server's helper script writes
    pub fn apply_legacy_ip(&mut self, path: &Path) -> Result<()> {
        if !path.exists() {
            return Ok(());
        }
        let content = fs::read_to_string(path)?;
        let legacy: LegacyIp = serde_json::from_str(&content)
            .with_context(|| format!("parsing {}", path.display()))?;
        tracing::info!(ip = %legacy.ip, "using host from {}", path.display());
        self.host = legacy.ip;
        self.port = DEFAULT_PORT;
        self.base_url = None;
        Ok(())
    }

    /// Apply `IMAGINE_*` overrides read through `lookup`
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(host) = get("IMAGINE_HOST") {
            self.host = host;
            self.base_url = None;
        }
        if let Some(port) = get("IMAGINE_PORT") {
            self.port = port
                .parse()
                .with_context(|| format!("IMAGINE_PORT is not a port: {}", port))?;
            self.base_url = None;
        }
        if let Some(url) = get("IMAGINE_BASE_URL") {
            self.base_url = Some(url);
        }
        if let Some(ms) = get("IMAGINE_QUEUE_POLL_MS") {
            self.queue_poll_ms = ms.parse().context("IMAGINE_QUEUE_POLL_MS")?;
        }
        if let Some(ms) = get("IMAGINE_PROGRESS_POLL_MS") {
            self.progress_poll_ms = ms.parse().context("IMAGINE_PROGRESS_POLL_MS")?;
        }
        if let Some(secs) = get("IMAGINE_TIMEOUT_SECS") {
            self.request_timeout_secs = Some(secs.parse().context("IMAGINE_TIMEOUT_SECS")?);
        }
        if let Some(dir) = get("IMAGINE_LOG_DIR") {
            self.log_dir = Some(PathBuf::from(dir));
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let url = self.base_url();
        reqwest::Url::parse(&url).map_err(|e| anyhow!("invalid base URL {}: {}", url, e))?;
        if self.queue_poll_ms == 0 || self.progress_poll_ms == 0 {
            return Err(anyhow!("poll periods must be greater than zero"));
        }
        Ok(())
    }

    /// Base URL without a trailing slash
    pub fn base_url(&self) -> String {
        match &self.base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("{}://{}:{}", self.scheme, self.host, self.port),
        }
    }

    pub fn queue_period(&self) -> Duration {
        Duration::from_millis(self.queue_poll_ms)
    }

    pub fn progress_period(&self) -> Duration {
        Duration::from_millis(self.progress_poll_ms)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Where the log file goes; falls back to the working directory
    pub fn log_dir(&self) -> PathBuf {
        self.log_dir
            .clone()
            .or_else(|| dirs::data_local_dir().map(|d| d.join(CONFIG_DIR_NAME)))
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.base_url(), "http://127.0.0.1:8000");
        assert_eq!(config.queue_period(), Duration::from_secs(2));
        assert_eq!(config.progress_period(), Duration::from_secs(1));
        assert_eq!(config.request_timeout(), None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_yaml_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "host: gen.local\nport: 9001\nqueue_poll_ms: 5000\n").unwrap();

        let config = Config::from_path(&path).unwrap();
        assert_eq!(config.base_url(), "http://gen.local:9001");
        assert_eq!(config.queue_poll_ms, 5000);
        assert_eq!(config.progress_poll_ms, DEFAULT_PROGRESS_POLL_MS);
    }

    #[test]
    fn test_legacy_ip_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ip.json");
        fs::write(&path, r#"{"ip": "192.168.1.40"}"#).unwrap();

        let mut config = Config {
            port: 1234,
            ..Config::default()
        };
        config.apply_legacy_ip(&path).unwrap();
        assert_eq!(config.base_url(), "http://192.168.1.40:8000");

        let mut untouched = Config::default();
        untouched
            .apply_legacy_ip(&dir.path().join("missing.json"))
            .unwrap();
        assert_eq!(untouched, Config::default());
    }

    #[test]
    fn test_env_wins_last() {
        let mut config = Config::default();
        config
            .apply_env(env(&[
                ("IMAGINE_BASE_URL", "https://gen.example.com/"),
                ("IMAGINE_PROGRESS_POLL_MS", "250"),
                ("IMAGINE_TIMEOUT_SECS", "15"),
            ]))
            .unwrap();
        assert_eq!(config.base_url(), "https://gen.example.com");
        assert_eq!(config.progress_period(), Duration::from_millis(250));
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(15)));
    }

    #[test]
    fn test_bad_env_values_are_errors() {
        let mut config = Config::default();
        assert!(config.apply_env(env(&[("IMAGINE_PORT", "eighty")])).is_err());

        let zero = Config {
            queue_poll_ms: 0,
            ..Config::default()
        };
        assert!(zero.validate().is_err());

        let junk = Config {
            base_url: Some("not a url".into()),
            ..Config::default()
        };
        assert!(junk.validate().is_err());
    }
}
