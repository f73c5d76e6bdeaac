//! Per-`(source, target)` worker lifecycle: owns one consumer/producer pair, runs the
//! batch loop, and tears both down gracefully on stop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use moose_core::model::mutation::FieldMutation;
use moose_core::model::TransformHandlerOptions;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::message::Message;
use rdkafka::producer::FutureProducer;
use tracing::{error, info, warn};

use crate::batch::{process_batch, InputRecord};
use crate::chunking::{chunk_indices, send_with_bisection, SendError, SendFuture};
use crate::dlq::DlqPublisher;
use crate::transform::SharedTransformHandler;

/// How long `shutdown` waits for in-flight sends to drain after pausing
/// the consumer, before stopping the producer.
pub const DRAIN_WINDOW: Duration = Duration::from_secs(2);

/// Default bounded concurrency for the batch loop,
/// overridable by `MAX_STREAMING_CONCURRENCY`.
pub const DEFAULT_CONCURRENCY: usize = 100;

/// Upper bound on how many records accumulate into one batch before the
/// consume loop stops collecting and processes what it has.
const BATCH_MAX_SIZE: usize = 500;

/// How long the consume loop waits for the first/next record before
/// processing whatever batch it has accumulated so far.
const BATCH_MAX_WAIT: Duration = Duration::from_millis(500);

pub fn concurrency_from_env() -> usize {
    std::env::var("MAX_STREAMING_CONCURRENCY")
        .ok()
        .and_then(|v| v.parse().ok())
        .filter(|&n: &usize| n > 0)
        .unwrap_or(DEFAULT_CONCURRENCY)
}

/// What happened when a send-pipeline failure routed one message to the
/// flow's DLQ.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DlqOutcome {
    /// No DLQ configured for this flow — nothing to publish.
    NotConfigured,
    /// DLQ configured and the record published successfully.
    Published,
    /// DLQ configured but the publish itself failed.
    PublishFailed,
}

/// Whether a chunk send failure can be swallowed: only when no message in the chunk has an unresolved DLQ
/// failure. A message with no DLQ configured is not itself a reason to
/// rethrow — it was never going to be recoverable either way.
pub fn send_error_is_suppressed(outcomes: &[DlqOutcome]) -> bool {
    !outcomes.iter().any(|o| *o == DlqOutcome::PublishFailed)
}

pub struct FlowWorker {
    pub source: String,
    pub target: String,
    consumer: StreamConsumer,
    producer: FutureProducer,
    dlq: DlqPublisher,
    /// DLQ topic for messages that fail the send pipeline after bisection
    /// bottoms out, if this flow has one configured. Distinct from each
    /// handler's own `TransformHandlerOptions::dead_letter_queue`, which
    /// only covers handler throws.
    flow_dlq_topic: Option<String>,
    mutation_tree: Vec<FieldMutation>,
    handlers: Vec<(SharedTransformHandler, TransformHandlerOptions)>,
    target_topic: String,
    max_message_bytes: usize,
    concurrency: usize,
    running: Arc<AtomicBool>,
    stale: Arc<AtomicBool>,
}

impl FlowWorker {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        source: String,
        target: String,
        consumer: StreamConsumer,
        producer: FutureProducer,
        dlq_producer: FutureProducer,
        flow_dlq_topic: Option<String>,
        target_topic: String,
        mutation_tree: Vec<FieldMutation>,
        handlers: Vec<(SharedTransformHandler, TransformHandlerOptions)>,
        max_message_bytes: usize,
        concurrency: usize,
    ) -> Self {
        Self {
            source,
            target,
            consumer,
            producer,
            dlq: DlqPublisher::new(dlq_producer),
            flow_dlq_topic,
            mutation_tree,
            handlers,
            target_topic,
            max_message_bytes,
            concurrency,
            running: Arc::new(AtomicBool::new(true)),
            stale: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn running_flag(&self) -> Arc<AtomicBool> {
        self.running.clone()
    }

    pub fn stale_flag(&self) -> Arc<AtomicBool> {
        self.stale.clone()
    }

    fn is_runnable(&self) -> bool {
        self.running.load(Ordering::SeqCst) && !self.stale.load(Ordering::SeqCst)
    }

    /// Process one already-fetched batch of raw records: runs every bound
    /// handler per message, then flushes outgoing messages through the
    /// chunked send pipeline with DLQ fallback. Skips entirely (returning
    /// `0`) if the worker isn't runnable, so offsets
    /// are not advanced past unprocessed data.
    pub async fn process(&self, records: Vec<InputRecord>) -> Result<usize, SendError> {
        if !self.is_runnable() {
            return Ok(0);
        }
        let handlers = self.handlers.clone();
        let outcomes = process_batch(records, &self.mutation_tree, &handlers, self.concurrency, || {
            info!(source = %self.source, target = %self.target, "streaming heartbeat");
        })
        .await;

        let mut outgoing: Vec<Vec<u8>> = Vec::new();
        for outcome in outcomes.into_iter().flatten() {
            for (topic, record) in outcome.dlq_records {
                if let Err(err) = self.dlq.publish(&topic, &record).await {
                    warn!(error = %err, topic, "failed to publish transform-handler DLQ record");
                }
            }
            for message in outcome.outgoing {
                if let Ok(bytes) = serde_json::to_vec(&message) {
                    outgoing.push(bytes);
                }
            }
        }

        let processed = outgoing.len();
        self.send_pipeline(outgoing).await?;
        Ok(processed)
    }

    async fn send_pipeline(&self, messages: Vec<Vec<u8>>) -> Result<(), SendError> {
        if messages.is_empty() {
            return Ok(());
        }
        let chunks = chunk_indices(&messages, self.max_message_bytes);
        let topic = self.target_topic.clone();
        let producer = self.producer.clone();
        let send = |indices: &[usize]| -> SendFuture<'_> {
            let topic = topic.clone();
            let producer = producer.clone();
            let payloads: Vec<Vec<u8>> = indices.iter().map(|&i| messages[i].clone()).collect();
            Box::pin(async move {
                for payload in &payloads {
                    let record = rdkafka::producer::FutureRecord::<(), Vec<u8>>::to(&topic).payload(payload);
                    producer
                        .send(record, rdkafka::util::Timeout::Never)
                        .await
                        .map_err(|(err, _)| classify_send_error(&err))?;
                }
                Ok(())
            })
        };

        for chunk in chunks {
            if let Err(err) = send_with_bisection(&messages, chunk.clone(), self.max_message_bytes, &send).await {
                self.handle_chunk_failure(&err, &chunk, &messages).await?;
            }
        }
        Ok(())
    }

    /// Every message in a
    /// chunk that exhausted bisection gets DLQ'd if this flow has a DLQ,
    /// and the original error is rethrown unless every message resolved
    /// cleanly (published, or no DLQ was ever owed).
    async fn handle_chunk_failure(
        &self,
        err: &SendError,
        chunk: &[usize],
        messages: &[Vec<u8>],
    ) -> Result<(), SendError> {
        let mut outcomes = Vec::with_capacity(chunk.len());
        for &i in chunk {
            let outcome = match &self.flow_dlq_topic {
                None => DlqOutcome::NotConfigured,
                Some(topic) => {
                    let original_record: serde_json::Value =
                        serde_json::from_slice(&messages[i]).unwrap_or(serde_json::Value::Null);
                    let record = moose_core::registry::build_dlq_record(
                        original_record,
                        err.to_string(),
                        "SendPipelineError",
                        "transform",
                    );
                    match self.dlq.publish(topic, &record).await {
                        Ok(()) => DlqOutcome::Published,
                        Err(publish_err) => {
                            warn!(error = %publish_err, topic, "failed to publish send-pipeline DLQ record");
                            DlqOutcome::PublishFailed
                        }
                    }
                }
            };
            outcomes.push(outcome);
        }

        if send_error_is_suppressed(&outcomes) {
            Ok(())
        } else {
            Err(err.clone())
        }
    }

    /// Pause all assigned partitions, disconnect the consumer, wait the
    /// drain window, then drop the producer.
    /// Disconnect failures are logged but never block shutdown.
    pub async fn shutdown(self) {
        self.running.store(false, Ordering::SeqCst);
        match self.consumer.assignment() {
            Ok(assignment) => {
                if let Err(err) = self.consumer.pause(&assignment) {
                    warn!(error = %err, source = %self.source, target = %self.target, "failed to pause partitions during shutdown");
                }
            }
            Err(err) => {
                warn!(error = %err, source = %self.source, target = %self.target, "failed to read assignment during shutdown");
            }
        }
        drop(self.consumer);
        tokio::time::sleep(DRAIN_WINDOW).await;
        drop(self.producer);
    }

    /// Subscribe to `source_topic` and drive the consume-batch-send loop
    /// until `shutdown` flips `running` to false. Offsets auto-commit per
    /// the consumer's `auto.commit.interval.ms`, so a batch that returns
    /// `Err` (unsuppressed send failure) must not have advanced the
    /// position past the failing messages — `process` already guarantees
    /// that by only touching messages it actually consumed here.
    pub async fn run(&self, source_topic: &str) -> Result<(), rdkafka::error::KafkaError> {
        self.consumer.subscribe(&[source_topic])?;

        while self.is_runnable() {
            let batch = self.collect_batch().await;
            if batch.is_empty() {
                continue;
            }
            if let Err(err) = self.process(batch).await {
                error!(
                    source = %self.source,
                    target = %self.target,
                    error = %err,
                    "batch processing failed; offsets for this batch will not advance"
                );
            }
        }
        Ok(())
    }

    /// Pull records off the subscribed consumer until `BATCH_MAX_SIZE` is
    /// reached or `BATCH_MAX_WAIT` elapses since the last record arrived,
    /// whichever comes first.
    async fn collect_batch(&self) -> Vec<InputRecord> {
        let mut batch = Vec::new();
        while batch.len() < BATCH_MAX_SIZE {
            match tokio::time::timeout(BATCH_MAX_WAIT, self.consumer.recv()).await {
                Ok(Ok(message)) => {
                    batch.push(InputRecord {
                        payload: message.payload().unwrap_or_default().to_vec(),
                        partition: message.partition(),
                        offset: message.offset(),
                        timestamp_ms: message.timestamp().to_millis().unwrap_or(0),
                    });
                }
                Ok(Err(err)) => {
                    warn!(source = %self.source, target = %self.target, error = %err, "consumer recv error");
                    break;
                }
                Err(_timeout) => break,
            }
        }
        batch
    }
}

fn classify_send_error(err: &rdkafka::error::KafkaError) -> SendError {
    match err.rdkafka_error_code() {
        Some(rdkafka::types::RDKafkaErrorCode::MsgSizeTooLarge) => SendError::MessageTooLarge,
        _ => SendError::Other(err.to_string()),
    }
}
