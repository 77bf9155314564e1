use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub kafka: KafkaConfig,
    pub schema_registry: SchemaRegistryConfig,
    pub connect: ConnectConfig,
    pub simulation: SimulationConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KafkaConfig {
    pub brokers: Vec<String>,
    #[serde(default = "default_partitions")]
    pub default_partitions: i32,
    #[serde(default = "default_replication_factor")]
    pub default_replication_factor: i32,
    #[serde(default = "default_acks")]
    pub acks: String,
    #[serde(default = "default_linger_ms")]
    pub linger_ms: u32,
    #[serde(default = "default_message_timeout_ms")]
    pub message_timeout_ms: u32,
    #[serde(default = "default_retries")]
    pub retries: u32,
    #[serde(default = "default_drain_timeout_secs")]
    pub drain_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SchemaRegistryConfig {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConnectConfig {
    pub url: String,
    #[serde(default = "default_connector_name")]
    pub connector_name: String,
    #[serde(default = "default_table")]
    pub table: String,
    #[serde(default = "default_incrementing_column")]
    pub incrementing_column: String,
    #[serde(default = "default_topic_prefix")]
    pub topic_prefix: String,
    pub connection_url: String,
    pub connection_user: String,
    pub connection_password: String,
    #[serde(default = "default_tasks_max")]
    pub tasks_max: u32,
    #[serde(default = "default_batch_max_rows")]
    pub batch_max_rows: u32,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimulationConfig {
    #[serde(default = "default_stations")]
    pub stations: Vec<String>,
    #[serde(default = "default_time_step_ms")]
    pub time_step_ms: u64,
    #[serde(default = "default_topic")]
    pub topic: String,
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("TRANSIT")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        settings.try_deserialize()
    }
}

fn default_partitions() -> i32 {
    3
}

fn default_replication_factor() -> i32 {
    1
}

fn default_acks() -> String {
    "all".to_string()
}

fn default_linger_ms() -> u32 {
    100
}

fn default_message_timeout_ms() -> u32 {
    30_000
}

fn default_retries() -> u32 {
    5
}

fn default_drain_timeout_secs() -> u64 {
    10
}

fn default_connector_name() -> String {
    "stations".to_string()
}

fn default_table() -> String {
    "stations".to_string()
}

fn default_incrementing_column() -> String {
    "stop_id".to_string()
}

fn default_topic_prefix() -> String {
    "transit.raw.".to_string()
}

fn default_tasks_max() -> u32 {
    1
}

fn default_batch_max_rows() -> u32 {
    100
}

fn default_poll_interval_ms() -> u64 {
    5000
}

fn default_stations() -> Vec<String> {
    vec![
        "addison".to_string(),
        "belmont".to_string(),
        "fullerton".to_string(),
    ]
}

fn default_time_step_ms() -> u64 {
    1000
}

fn default_topic() -> String {
    "transit.turnstiles".to_string()
}
