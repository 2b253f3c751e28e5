use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub compaction: CompactionConfig,
    #[serde(default)]
    pub readers: ReadersConfig,
    #[serde(default)]
    pub writers: WritersConfig,
    #[serde(default)]
    pub statsd: StatsdConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub tables: HashMap<String, TableConfig>,
}

#[derive(Debug, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_dir")]
    pub dir: String,
}

#[derive(Debug, Deserialize)]
pub struct CompactionConfig {
    /// Seconds between compaction ticks.
    #[serde(default = "default_compaction_interval")]
    pub interval: u64,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    /// Merge worker count; defaults to the logical CPU count.
    pub concurrency: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReadersConfig {
    #[serde(default)]
    pub presto: PrestoConfig,
}

#[derive(Debug, Deserialize)]
pub struct PrestoConfig {
    #[serde(default = "default_presto_port")]
    pub port: u16,
}

#[derive(Debug, Default, Deserialize)]
pub struct WritersConfig {
    #[serde(default)]
    pub grpc: GrpcConfig,
}

#[derive(Debug, Deserialize)]
pub struct GrpcConfig {
    #[serde(default = "default_grpc_port")]
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct StatsdConfig {
    #[serde(default = "default_statsd_host")]
    pub host: String,
    #[serde(default = "default_statsd_port")]
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TableConfig {
    /// Overrides the config-map key as the table name.
    pub name: Option<String>,
    /// Buffer entry time-to-live, in seconds.
    #[serde(default = "default_table_ttl")]
    pub ttl: u64,
    pub hash_by: String,
    pub sort_by: String,
}

#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
    #[serde(default = "default_log_level")]
    pub stdout_level: String,
    #[serde(default = "default_log_level")]
    pub file_level: String,
}

fn default_storage_dir() -> String {
    "/data".to_string()
}

fn default_output_dir() -> String {
    "/output".to_string()
}

fn default_compaction_interval() -> u64 {
    60
}

fn default_presto_port() -> u16 {
    8042
}

fn default_grpc_port() -> u16 {
    8080
}

fn default_statsd_host() -> String {
    "localhost".to_string()
}

fn default_statsd_port() -> u16 {
    8125
}

fn default_table_ttl() -> u64 {
    3600
}

fn default_log_dir() -> String {
    "logs".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: default_storage_dir(),
        }
    }
}

impl Default for CompactionConfig {
    fn default() -> Self {
        Self {
            interval: default_compaction_interval(),
            output_dir: default_output_dir(),
            concurrency: None,
        }
    }
}

impl Default for PrestoConfig {
    fn default() -> Self {
        Self {
            port: default_presto_port(),
        }
    }
}

impl Default for GrpcConfig {
    fn default() -> Self {
        Self {
            port: default_grpc_port(),
        }
    }
}

impl Default for StatsdConfig {
    fn default() -> Self {
        Self {
            host: default_statsd_host(),
            port: default_statsd_port(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: default_log_dir(),
            stdout_level: default_log_level(),
            file_level: default_log_level(),
        }
    }
}

use std::env;

pub fn load_settings() -> Result<Settings, config::ConfigError> {
    let config_path = env::var("TALARIA_CONFIG").unwrap_or_else(|_| "config".to_string());

    let settings: Settings = config::Config::builder()
        .add_source(config::File::with_name(&config_path).required(false))
        .build()?
        .try_deserialize()?;

    Ok(settings)
}
