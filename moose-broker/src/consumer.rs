//! Consumer factory: one `StreamConsumer` per (source,
//! target) streaming function pair, named `flow-<source>-<target>` so
//! multiple functions fed by the same source topic don't share a
//! consumer group and steal each other's partitions.

use moose_core::config::ConfigRegistry;
use rdkafka::consumer::StreamConsumer;

use crate::client_config::{base_client_config, client_id};

/// Session/heartbeat/commit intervals for the broker consumer.
const SESSION_TIMEOUT_MS: u32 = 30_000;
const HEARTBEAT_INTERVAL_MS: u32 = 3_000;
const AUTO_COMMIT_INTERVAL_MS: u32 = 5_000;

/// Number of partitions `moose-streaming` will pull from and process
/// concurrently per consumer. Not an `rdkafka` client property — enforced
/// by the caller's semaphore-bounded batch loop.
pub const PARTITIONS_CONSUMED_CONCURRENTLY: usize = 3;

/// Group id for the consumer backing the `source -> target` streaming
/// function.
pub fn consumer_group_id(source: &str, target: &str) -> String {
    format!("flow-{source}-{target}")
}

/// Build a consumer for the `source -> target` streaming function.
pub fn build_consumer(
    registry: &ConfigRegistry,
    source: &str,
    target: &str,
) -> Result<StreamConsumer, rdkafka::error::KafkaError> {
    let mut config = base_client_config(registry);
    config
        .set("client.id", client_id(registry, "consumer"))
        .set("group.id", consumer_group_id(source, target))
        .set("session.timeout.ms", SESSION_TIMEOUT_MS.to_string())
        .set("heartbeat.interval.ms", HEARTBEAT_INTERVAL_MS.to_string())
        .set("enable.auto.commit", "true")
        .set("auto.commit.interval.ms", AUTO_COMMIT_INTERVAL_MS.to_string())
        .set("auto.offset.reset", "earliest");
    config.create()
}

#[cfg(test)]
mod tests {
    use super::*;
    use moose_core::config::{AuthConfig, BrokerConfig, ClickhouseConfig};

    #[test]
    fn group_id_follows_flow_naming_convention() {
        assert_eq!(consumer_group_id("orders_raw", "orders_clean"), "flow-orders_raw-orders_clean");
    }

    #[test]
    fn builds_consumer_for_a_flow() {
        let registry = ConfigRegistry::from_parts(
            ClickhouseConfig::default(),
            BrokerConfig {
                broker: "localhost:19092".into(),
                ..BrokerConfig::default()
            },
            AuthConfig::default(),
        );
        let consumer = build_consumer(&registry, "orders_raw", "orders_clean");
        assert!(consumer.is_ok());
    }
}
