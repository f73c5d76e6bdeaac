//! `streaming-functions`: start one transform worker group — every worker
//! in the group joins the same `flow-<source>-<target>` consumer group, per
//! §4.3.
//!
//! `function_file` names a declarative binding-options manifest rather than
//! loadable handler code: AOT handler loading is out of scope here (see
//! `DESIGN.md`), so the bound handler is an identity pass-through and only
//! the DLQ/topic wiring around it is real.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use clap::Args;
use moose_core::config::{BrokerConfig, ConfigRegistry};
use moose_core::model::{TopicDescriptor, TransformHandlerOptions};
use moose_streaming::{FlowWorker, TransformHandler};

use super::CommandResult;

struct IdentityTransform;

#[async_trait]
impl TransformHandler for IdentityTransform {
    async fn call(&self, record: serde_json::Value) -> Result<serde_json::Value, String> {
        Ok(record)
    }
}

#[derive(Args, Debug)]
pub struct StreamingFunctionsArgs {
    pub source_topic_json: String,
    pub function_file: PathBuf,
    pub broker_csv: String,
    pub max_subscribers: usize,

    #[arg(long)]
    pub target_topic: Option<String>,
    #[arg(long)]
    pub sasl_username: Option<String>,
    #[arg(long)]
    pub sasl_password: Option<String>,
    #[arg(long)]
    pub sasl_mechanism: Option<String>,
    #[arg(long)]
    pub security_protocol: Option<String>,
    #[arg(long)]
    pub log_payloads: bool,
}

fn parse_topic(json: &str) -> Result<TopicDescriptor, String> {
    serde_json::from_str(json).map_err(|e| format!("invalid topic descriptor JSON: {e}"))
}

fn read_handler_options(path: &PathBuf) -> TransformHandlerOptions {
    let Ok(raw) = std::fs::read_to_string(path) else {
        return TransformHandlerOptions::default();
    };
    serde_json::from_str::<serde_json::Value>(&raw)
        .ok()
        .and_then(|v| v.get("deadLetterQueue").and_then(|d| d.as_str()).map(str::to_string))
        .map(|dlq| TransformHandlerOptions {
            dead_letter_queue: Some(dlq),
        })
        .unwrap_or_default()
}

pub async fn run(args: StreamingFunctionsArgs) -> CommandResult {
    let source = parse_topic(&args.source_topic_json)?;
    let target = match &args.target_topic {
        Some(json) => parse_topic(json)?,
        None => source.clone(),
    };

    let broker = BrokerConfig {
        broker: args.broker_csv.clone(),
        sasl_username: args.sasl_username.clone(),
        sasl_password: args.sasl_password.clone(),
        sasl_mechanism: args.sasl_mechanism.clone(),
        security_protocol: args.security_protocol.clone(),
        ..BrokerConfig::default()
    };
    let registry = ConfigRegistry::from_parts(Default::default(), broker, Default::default());
    let handler_options = read_handler_options(&args.function_file);

    tracing::info!(
        source = %source.name,
        target = %target.name,
        subscribers = args.max_subscribers,
        log_payloads = args.log_payloads,
        "starting streaming function worker group"
    );

    let mut joins = Vec::with_capacity(args.max_subscribers);
    for subscriber in 0..args.max_subscribers {
        let consumer = moose_broker::build_consumer(&registry, &source.name, &target.name)
            .map_err(|e| format!("failed to build consumer: {e}"))?;
        let producer = moose_broker::build_producer(&registry).map_err(|e| format!("failed to build producer: {e}"))?;
        let dlq_producer =
            moose_broker::build_producer(&registry).map_err(|e| format!("failed to build DLQ producer: {e}"))?;

        let worker = FlowWorker::new(
            source.name.clone(),
            target.name.clone(),
            consumer,
            producer,
            dlq_producer,
            handler_options.dead_letter_queue.clone(),
            target.name.clone(),
            moose_core::model::build_mutation_tree(&[]),
            vec![(Arc::new(IdentityTransform), handler_options.clone())],
            target.max_message_bytes,
            moose_streaming::concurrency_from_env(),
        );

        let source_name = source.name.clone();
        joins.push(tokio::spawn(async move {
            if let Err(err) = worker.run(&source_name).await {
                tracing::error!(subscriber, error = %err, "streaming function worker exited with an error");
            }
        }));
    }

    for join in joins {
        let _ = join.await;
    }
    Ok(())
}
