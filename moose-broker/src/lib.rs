//! Broker client factory for the Moose runtime.
//!
//! Builds authenticated `rdkafka` producers and consumers from
//! [`moose_core::config::BrokerConfig`], and strips/attaches the
//! confluent-style schema-registry envelope on message payloads.
//! Consumed by `moose-streaming` and `moose-workflow`.

mod client_config;
mod consumer;
mod envelope;
mod producer;

pub use consumer::{build_consumer, consumer_group_id, PARTITIONS_CONSUMED_CONCURRENTLY};
pub use envelope::strip_schema_registry_envelope;
pub use producer::build_producer;
