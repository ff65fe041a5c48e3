use std::{env, str::FromStr, time::Duration};

use config::{Config, ConfigError, File};
use inscribe_executors::batch::PipelineProfile;
use serde::Deserialize;
use serde_with::{DurationSeconds, serde_as};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CliConfig {
    #[serde(default)]
    pub log_format: LogFormat,
    #[serde(default)]
    pub rpc: RpcConfig,
    #[serde(default)]
    pub indexer: IndexerConfig,
    #[serde(default)]
    pub profiles: ProfilesConfig,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

#[serde_as]
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RpcConfig {
    #[serde_as(as = "DurationSeconds<u64>")]
    #[serde(rename = "request_timeout_secs")]
    pub request_timeout: Duration,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
        }
    }
}

#[serde_as]
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IndexerConfig {
    pub url: String,
    #[serde_as(as = "DurationSeconds<u64>")]
    #[serde(rename = "request_timeout_secs")]
    pub request_timeout: Duration,
    pub page_size: u32,
    pub balance_concurrency: usize,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            url: "https://api.croscribe.com/".into(),
            request_timeout: Duration::from_secs(30),
            page_size: 100_000,
            balance_concurrency: 4,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProfilesConfig {
    pub mint: PipelineProfile,
    pub async_mint: PipelineProfile,
    pub collect: PipelineProfile,
}

impl Default for ProfilesConfig {
    fn default() -> Self {
        Self {
            mint: PipelineProfile::mint(),
            async_mint: PipelineProfile::async_mint(),
            collect: PipelineProfile::collect(),
        }
    }
}

/// Layers `configuration/cli_base.yaml`, the per-environment file and
/// `APP__*` environment variables. Every layer is optional.
pub fn get_config() -> Result<CliConfig, ConfigError> {
    let base_path = env::current_dir()
        .map_err(|e| ConfigError::Message(format!("Failed to determine the current directory: {e}")))?;
    let configuration_directory = base_path.join("configuration");

    let environment: Environment = env::var("APP_ENVIRONMENT")
        .as_deref()
        .unwrap_or("local")
        .parse()
        .map_err(ConfigError::Message)?;

    Config::builder()
        .add_source(File::from(configuration_directory.join("cli_base.yaml")).required(false))
        .add_source(File::from(configuration_directory.join(environment.file_name())).required(false))
        .add_source(config::Environment::with_prefix("app").separator("__"))
        .build()?
        .try_deserialize::<CliConfig>()
}

/// Selects the `cli_{name}.yaml` overlay. Only environments with a shipped
/// overlay are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn file_name(self) -> &'static str {
        match self {
            Environment::Local => "cli_local.yaml",
            Environment::Production => "cli_production.yaml",
        }
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "local" => Ok(Environment::Local),
            "production" => Ok(Environment::Production),
            other => Err(format!(
                "unsupported APP_ENVIRONMENT `{other}`, expected `local` or `production`"
            )),
        }
    }
}
