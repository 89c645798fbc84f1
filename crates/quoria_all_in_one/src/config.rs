use config::{Config, ConfigError, Environment};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServiceConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    // NATS configuration
    /// NATS server URL
    #[serde(default = "default_nats_url")]
    pub nats_url: String,

    /// NATS JetStream stream name for maintenance task messages
    #[serde(default = "default_maintenance_stream")]
    pub maintenance_stream: String,

    /// Batch size for task consumers
    #[serde(default = "default_nats_batch_size")]
    pub nats_batch_size: usize,

    /// Max wait time for batches in seconds
    #[serde(default = "default_nats_batch_wait_secs")]
    pub nats_batch_wait_secs: u64,

    /// Startup timeout for initialization operations in seconds
    #[serde(default = "default_startup_timeout_secs")]
    pub startup_timeout_secs: u64,

    // PostgreSQL configuration
    /// PostgreSQL host
    #[serde(default = "default_postgres_host")]
    pub postgres_host: String,

    /// PostgreSQL port
    #[serde(default = "default_postgres_port")]
    pub postgres_port: u16,

    /// PostgreSQL database name
    #[serde(default = "default_postgres_database")]
    pub postgres_database: String,

    /// PostgreSQL username
    #[serde(default = "default_postgres_username")]
    pub postgres_username: String,

    /// PostgreSQL password
    #[serde(default = "default_postgres_password")]
    pub postgres_password: String,

    /// Maximum connections in the pool
    #[serde(default = "default_postgres_max_pool_size")]
    pub postgres_max_pool_size: usize,

    /// Path to PostgreSQL migrations directory
    #[serde(default = "default_postgres_migrations_dir")]
    pub postgres_migrations_dir: String,

    /// Path to goose binary
    #[serde(default = "default_goose_binary_path")]
    pub goose_binary_path: String,

    /// Deployment-specific table-name prefix substituted into SQL text
    #[serde(default = "default_table_prefix")]
    pub table_prefix: String,

    // Maintenance task staleness thresholds
    /// Expire-policies messages older than this are dropped (seconds)
    #[serde(default = "default_expire_policies_stale_secs")]
    pub expire_policies_stale_secs: u64,

    /// Checkin-records messages older than this are dropped (seconds)
    #[serde(default = "default_checkin_records_stale_secs")]
    pub checkin_records_stale_secs: u64,

    /// Agency-backfill messages older than this are dropped (seconds)
    #[serde(default = "default_agency_backfill_stale_secs")]
    pub agency_backfill_stale_secs: u64,

    // OpenTelemetry configuration
    /// OpenTelemetry OTLP endpoint (gRPC)
    #[serde(default = "default_otel_endpoint")]
    pub otel_endpoint: String,

    /// Enable OpenTelemetry export
    #[serde(default = "default_otel_enabled")]
    pub otel_enabled: bool,

    /// Service name for OpenTelemetry resource
    #[serde(default = "default_otel_service_name")]
    pub otel_service_name: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

// NATS defaults
fn default_nats_url() -> String {
    "nats://localhost:4222".to_string()
}

fn default_maintenance_stream() -> String {
    "maintenance_tasks".to_string()
}

fn default_nats_batch_size() -> usize {
    10
}

fn default_nats_batch_wait_secs() -> u64 {
    5
}

fn default_startup_timeout_secs() -> u64 {
    30
}

// PostgreSQL defaults
fn default_postgres_host() -> String {
    "localhost".to_string()
}

fn default_postgres_port() -> u16 {
    5432
}

fn default_postgres_database() -> String {
    "quoria".to_string()
}

fn default_postgres_username() -> String {
    "quoria".to_string()
}

fn default_postgres_password() -> String {
    "quoria".to_string()
}

fn default_postgres_max_pool_size() -> usize {
    5
}

fn default_postgres_migrations_dir() -> String {
    "/home/quoria/migrations/postgres".to_string()
}

fn default_goose_binary_path() -> String {
    "goose".to_string()
}

fn default_table_prefix() -> String {
    "quoria_".to_string()
}

// Staleness thresholds are deliberately per task
fn default_expire_policies_stale_secs() -> u64 {
    30
}

fn default_checkin_records_stale_secs() -> u64 {
    1800
}

fn default_agency_backfill_stale_secs() -> u64 {
    10
}

// OpenTelemetry defaults
fn default_otel_endpoint() -> String {
    "http://localhost:4317".to_string()
}

fn default_otel_enabled() -> bool {
    true
}

fn default_otel_service_name() -> String {
    "quoria-all-in-one".to_string()
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(Environment::with_prefix("QUORIA"))
            .build()?
            .try_deserialize()
    }
}
