//! Producer factory: idempotence disabled, `acks=all`, a long
//! bounded retry budget with capped backoff — so a slow broker degrades
//! delivery latency rather than dropping records silently.

use moose_core::config::ConfigRegistry;
use rdkafka::producer::FutureProducer;

use crate::client_config::{base_client_config, client_id};

/// Retry budget: up to 150 retries, backoff capped at 1s.
const PRODUCER_RETRIES: u32 = 150;
const PRODUCER_RETRY_BACKOFF_MAX_MS: u32 = 1_000;

/// Build a producer for a single streaming/workflow worker.
///
/// `enable.idempotence` is left off deliberately: Moose's delivery
/// contract is at-least-once with DLQ-on-failure, not
/// exactly-once, so the extra broker-side bookkeeping idempotence buys
/// isn't worth its throughput cost here.
pub fn build_producer(registry: &ConfigRegistry) -> Result<FutureProducer, rdkafka::error::KafkaError> {
    let mut config = base_client_config(registry);
    config
        .set("client.id", client_id(registry, "producer"))
        .set("message.timeout.ms", registry.broker.message_timeout_ms.to_string())
        .set("acks", "all")
        .set("enable.idempotence", "false")
        .set("retries", PRODUCER_RETRIES.to_string())
        .set("retry.backoff.max.ms", PRODUCER_RETRY_BACKOFF_MAX_MS.to_string());
    config.create()
}

#[cfg(test)]
mod tests {
    use super::*;
    use moose_core::config::{AuthConfig, BrokerConfig, ClickhouseConfig};

    #[test]
    fn builds_producer_with_retry_budget() {
        let registry = ConfigRegistry::from_parts(
            ClickhouseConfig::default(),
            BrokerConfig {
                broker: "localhost:19092".into(),
                ..BrokerConfig::default()
            },
            AuthConfig::default(),
        );
        // `create()` only validates config shape; it doesn't dial the broker.
        let producer = build_producer(&registry);
        assert!(producer.is_ok());
    }
}
