//! Process-wide config resolver for broker, OLAP, and auth parameters.
//!
//! Merges environment variables, `.env` files, and runtime overrides
//! (CLI flags passed in by `moose-cli`), with init-once semantics — see
//! [`ConfigRegistry::get_or_init`]. Uses a flat `SECTION__FIELD` environment
//! variable contract rather than layered YAML files.

mod loader;

use std::sync::OnceLock;

/// ClickHouse (OLAP store) connection parameters.
///
/// Populated from `MOOSE_CLICKHOUSE_CONFIG__{HOST,HOST_PORT,USER,PASSWORD,DB_NAME,USE_SSL}`.
#[derive(Debug, Clone)]
pub struct ClickhouseConfig {
    pub host: String,
    pub host_port: u16,
    pub user: String,
    pub password: String,
    pub db_name: String,
    pub use_ssl: bool,
}

impl Default for ClickhouseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            host_port: 8123,
            user: "default".to_string(),
            password: String::new(),
            db_name: "local".to_string(),
            use_ssl: false,
        }
    }
}

impl ClickhouseConfig {
    fn from_env() -> Self {
        let section = loader::env_section("MOOSE_CLICKHOUSE_CONFIG");
        let default = Self::default();
        Self {
            host: section.get("host").cloned().unwrap_or(default.host),
            host_port: section
                .get("host_port")
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.host_port),
            user: section.get("user").cloned().unwrap_or(default.user),
            password: section.get("password").cloned().unwrap_or(default.password),
            db_name: section.get("db_name").cloned().unwrap_or(default.db_name),
            use_ssl: section
                .get("use_ssl")
                .map(|v| matches!(v.to_ascii_lowercase().as_str(), "true" | "1"))
                .unwrap_or(default.use_ssl),
        }
    }
}

/// Broker (Redpanda/Kafka-compatible) connection parameters.
///
/// Populated from `MOOSE_REDPANDA_CONFIG__*`, aliased as `MOOSE_KAFKA_CONFIG__*`
/// — both prefixes are checked, with `MOOSE_REDPANDA_CONFIG__*` taking
/// priority on conflicting keys.
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    pub broker: String,
    pub message_timeout_ms: u32,
    pub sasl_username: Option<String>,
    pub sasl_password: Option<String>,
    pub sasl_mechanism: Option<String>,
    pub security_protocol: Option<String>,
    pub namespace: Option<String>,
    pub schema_registry_url: Option<String>,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            broker: "localhost:19092".to_string(),
            message_timeout_ms: 150_000,
            sasl_username: None,
            sasl_password: None,
            sasl_mechanism: None,
            security_protocol: None,
            namespace: None,
            schema_registry_url: None,
        }
    }
}

impl BrokerConfig {
    fn from_env() -> Self {
        let mut section = loader::env_section("MOOSE_KAFKA_CONFIG");
        section.extend(loader::env_section("MOOSE_REDPANDA_CONFIG"));
        let default = Self::default();
        Self {
            broker: section.get("broker").cloned().unwrap_or(default.broker),
            message_timeout_ms: section
                .get("message_timeout_ms")
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.message_timeout_ms),
            sasl_username: section.get("sasl_username").cloned(),
            sasl_password: section.get("sasl_password").cloned(),
            sasl_mechanism: section.get("sasl_mechanism").cloned(),
            security_protocol: section.get("security_protocol").cloned(),
            namespace: section.get("namespace").cloned(),
            schema_registry_url: section.get("schema_registry_url").cloned(),
        }
    }
}

/// Gateway authentication and external-service parameters, normally supplied
/// as CLI flags to `consumption-apis` and merged on top of any
/// environment defaults.
#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    pub jwt_public_key_pem: Option<String>,
    pub jwt_issuer: Option<String>,
    pub jwt_audience: Option<String>,
    pub enforce_auth: bool,
    pub temporal_url: Option<String>,
    pub temporal_namespace: Option<String>,
    pub client_cert_path: Option<String>,
    pub client_key_path: Option<String>,
    pub api_key: Option<String>,
}

/// Process-wide, init-once configuration registry.
///
/// A single instance lives for the life of the process; there is no
/// teardown API (teardown is implicit at process exit).
pub struct ConfigRegistry {
    pub clickhouse: ClickhouseConfig,
    pub broker: BrokerConfig,
    pub auth: AuthConfig,
    pub source_dir: String,
    pub management_port: u16,
    pub max_streaming_concurrency: usize,
    pub hostname: String,
}

static REGISTRY: OnceLock<ConfigRegistry> = OnceLock::new();

impl ConfigRegistry {
    /// Resolve configuration from the environment (and `.env`, which never
    /// overwrites an already-set environment variable). Idempotent: later
    /// calls observe whatever was resolved on the first call.
    pub fn get_or_init() -> &'static ConfigRegistry {
        REGISTRY.get_or_init(|| {
            loader::load_dotenv();
            ConfigRegistry {
                clickhouse: ClickhouseConfig::from_env(),
                broker: BrokerConfig::from_env(),
                auth: AuthConfig::default(),
                source_dir: loader::env_or("MOOSE_SOURCE_DIR", "app"),
                management_port: loader::env_or("MOOSE_MANAGEMENT_PORT", "5001")
                    .parse()
                    .unwrap_or(5001),
                max_streaming_concurrency: loader::env_or("MAX_STREAMING_CONCURRENCY", "100")
                    .parse()
                    .unwrap_or(100),
                hostname: loader::env_or("HOSTNAME", "moose"),
            }
        })
    }

    /// Build a registry directly from explicit values (CLI-supplied), used
    /// by `moose-cli` subcommands which take broker/OLAP/auth parameters as
    /// positional/flag arguments rather than environment variables. This
    /// does not touch the process-wide singleton; callers that need a
    /// singleton should not call `get_or_init` afterwards in the same
    /// process, since the two would disagree.
    pub fn from_parts(
        clickhouse: ClickhouseConfig,
        broker: BrokerConfig,
        auth: AuthConfig,
    ) -> ConfigRegistry {
        ConfigRegistry {
            clickhouse,
            broker,
            auth,
            source_dir: loader::env_or("MOOSE_SOURCE_DIR", "app"),
            management_port: loader::env_or("MOOSE_MANAGEMENT_PORT", "5001")
                .parse()
                .unwrap_or(5001),
            max_streaming_concurrency: loader::env_or("MAX_STREAMING_CONCURRENCY", "100")
                .parse()
                .unwrap_or(100),
            hostname: loader::env_or("HOSTNAME", "moose"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn clickhouse_config_defaults_when_unset() {
        for key in [
            "MOOSE_CLICKHOUSE_CONFIG__HOST",
            "MOOSE_CLICKHOUSE_CONFIG__HOST_PORT",
        ] {
            std::env::remove_var(key);
        }
        let cfg = ClickhouseConfig::from_env();
        assert_eq!(cfg.host, "localhost");
        assert_eq!(cfg.host_port, 8123);
    }

    #[test]
    #[serial]
    fn clickhouse_config_reads_env_section() {
        std::env::set_var("MOOSE_CLICKHOUSE_CONFIG__HOST", "ch.internal");
        std::env::set_var("MOOSE_CLICKHOUSE_CONFIG__USE_SSL", "true");
        let cfg = ClickhouseConfig::from_env();
        assert_eq!(cfg.host, "ch.internal");
        assert!(cfg.use_ssl);
        std::env::remove_var("MOOSE_CLICKHOUSE_CONFIG__HOST");
        std::env::remove_var("MOOSE_CLICKHOUSE_CONFIG__USE_SSL");
    }

    #[test]
    #[serial]
    fn kafka_alias_is_overridden_by_redpanda() {
        std::env::set_var("MOOSE_KAFKA_CONFIG__BROKER", "kafka:9092");
        std::env::set_var("MOOSE_REDPANDA_CONFIG__BROKER", "redpanda:19092");
        let cfg = BrokerConfig::from_env();
        assert_eq!(cfg.broker, "redpanda:19092");
        std::env::remove_var("MOOSE_KAFKA_CONFIG__BROKER");
        std::env::remove_var("MOOSE_REDPANDA_CONFIG__BROKER");
    }
}
