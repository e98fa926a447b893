use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: Server,
    #[serde(default)]
    pub poll: Poll,
    #[serde(default)]
    pub retry: Retry,
    #[serde(default)]
    pub classifier: Classifier,
    #[serde(default)]
    pub logging: Logging,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config: {}", path.display()))?;
        let cfg: Config = toml::from_str(&raw).with_context(|| "parsing TOML")?;
        Ok(cfg)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Server {
    /// Path of the REST endpoint appended to `http://<host>:<port>`.
    pub path: String,
    pub timeout_secs: u64,
    pub user_agent: String,
}
impl Default for Server {
    fn default() -> Self {
        Self {
            path: "/rest".into(),
            timeout_secs: 10,
            user_agent: concat!("ddc-client/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

impl Server {
    pub fn base_url(&self, host: &str, port: u16) -> String {
        let path = self.path.trim_start_matches('/');
        format!("http://{host}:{port}/{path}")
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Poll {
    pub idle_delay_secs: u64,
}
impl Default for Poll {
    fn default() -> Self {
        Self {
            idle_delay_secs: 30,
        }
    }
}

impl Poll {
    /// Never shorter than one second.
    pub fn idle_delay(&self) -> Duration {
        Duration::from_secs(self.idle_delay_secs.max(1))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Retry {
    pub enabled: bool,
    /// Values below one second are raised to one second.
    pub initial_delay_secs: u64,
    pub max_delay_secs: u64,
    pub multiplier: f64,
    /// Consecutive transport failures tolerated before giving up. 0 retries forever.
    pub max_attempts: u32,
}
impl Default for Retry {
    fn default() -> Self {
        Self {
            enabled: true,
            initial_delay_secs: 1,
            max_delay_secs: 300,
            multiplier: 2.0,
            max_attempts: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Classifier {
    /// Reported to the server as `pc_version`.
    pub version: String,
    pub isolate_failures: bool,
    pub patterns: Vec<String>,
    pub suffixes: Vec<String>,
    pub keywords: Vec<String>,
    pub allow_suffixes: Vec<String>,
}
impl Default for Classifier {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").into(),
            isolate_failures: false,
            patterns: vec![
                "^[0-9a-f]{16,}\\.".into(),
                "(^|\\.)xn--[a-z0-9-]*(casino|loan|pharma)".into(),
            ],
            suffixes: vec!["zip".into(), "mov".into()],
            keywords: vec![
                "casino".into(),
                "viagra".into(),
                "payday-loan".into(),
                "free-money".into(),
            ],
            allow_suffixes: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Logging {
    pub level: String,
    pub json: bool,
    pub write_to_file: bool,
    pub file_path: String,
}
impl Default for Logging {
    fn default() -> Self {
        Self {
            level: "info".into(),
            json: false,
            write_to_file: false,
            file_path: "ddc-client.log".into(),
        }
    }
}
