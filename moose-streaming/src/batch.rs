//! Per-message processing within a batch: envelope
//! strip, date revival, parallel handler fan-out, output normalization,
//! per-handler DLQ on throw.

use futures_util::{stream, StreamExt};
use moose_broker::strip_schema_registry_envelope;
use moose_core::model::mutation::{apply_mutations, FieldMutation};
use moose_core::model::{annotate_original_record, DlqRecord, TransformHandlerOptions};
use moose_core::registry::build_dlq_record;
use serde_json::Value;

use crate::transform::{normalize_output, SharedTransformHandler};

/// One consumed broker record, not yet decoded.
#[derive(Debug, Clone)]
pub struct InputRecord {
    pub payload: Vec<u8>,
    pub partition: i32,
    pub offset: i64,
    pub timestamp_ms: i64,
}

/// Result of running every handler bound to this flow against one decoded
/// input record.
#[derive(Default)]
pub struct MessageOutcome {
    /// Outgoing messages produced by handlers that succeeded.
    pub outgoing: Vec<Value>,
    /// `(dlq_topic, record)` pairs for handlers that threw and had a DLQ configured.
    pub dlq_records: Vec<(String, DlqRecord)>,
    /// Count of handler throws with no DLQ configured — caller logs and
    /// rethrows so the outer batch loop logs the failure and does not commit.
    pub unrouted_failures: usize,
}

/// Decode one input record (envelope strip + JSON parse + date revival)
/// and fan out to every bound handler, awaiting all of them.
///
/// Returns `Err` only when the payload itself doesn't parse as JSON — at
/// that point no handler ran, so there's nothing to fan out to.
pub async fn process_record(
    record: &InputRecord,
    mutation_tree: &[FieldMutation],
    handlers: &[(SharedTransformHandler, TransformHandlerOptions)],
) -> Result<MessageOutcome, serde_json::Error> {
    let (_, stripped) = strip_schema_registry_envelope(&record.payload);
    let mut value: Value = serde_json::from_slice(stripped)?;
    apply_mutations(mutation_tree, &mut value);

    let calls = handlers.iter().map(|(handler, opts)| {
        let handler = handler.clone();
        let opts = opts.clone();
        let input = value.clone();
        async move { (handler.call(input).await, opts) }
    });
    let results = futures_util::future::join_all(calls).await;

    let mut outcome = MessageOutcome::default();
    for (result, opts) in results {
        match result {
            Ok(output) => outcome.outgoing.extend(normalize_output(output)),
            Err(error_message) => match opts.dead_letter_queue {
                Some(topic) => {
                    let annotated = annotate_original_record(
                        value.clone(),
                        record.partition,
                        record.offset,
                        record.timestamp_ms,
                    );
                    let dlq_record = build_dlq_record(annotated, error_message, "TransformHandlerError", "transform");
                    outcome.dlq_records.push((topic, dlq_record));
                }
                None => outcome.unrouted_failures += 1,
            },
        }
    }
    Ok(outcome)
}

/// Process a batch with bounded concurrency: up to `concurrency` records are
/// in flight at once via `buffered`, which still yields outcomes in the same
/// order their sources were processed in within the batch. Invokes
/// `heartbeat` at most every 100 records and always after the last one, so a
/// long batch doesn't look dead to the consumer group's session-timeout
/// clock.
pub async fn process_batch(
    records: Vec<InputRecord>,
    mutation_tree: &[FieldMutation],
    handlers: &[(SharedTransformHandler, TransformHandlerOptions)],
    concurrency: usize,
    mut heartbeat: impl FnMut(),
) -> Vec<Result<MessageOutcome, serde_json::Error>> {
    const HEARTBEAT_INTERVAL: usize = 100;
    let total = records.len();
    let mut outcomes = Vec::with_capacity(total);

    let mut in_flight = stream::iter(records.iter())
        .map(|record| process_record(record, mutation_tree, handlers))
        .buffered(concurrency.max(1));

    let mut processed = 0usize;
    while let Some(outcome) = in_flight.next().await {
        outcomes.push(outcome);
        processed += 1;
        if processed == total || processed % HEARTBEAT_INTERVAL == 0 {
            heartbeat();
        }
    }
    outcomes
}
