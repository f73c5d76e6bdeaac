//! Streaming transform engine: consumer loop, batch
//! processing, chunked sends with oversize bisection, and DLQ publishing.

mod batch;
mod chunking;
mod dlq;
mod transform;
mod worker;

pub use batch::{process_batch, process_record, InputRecord, MessageOutcome};
pub use chunking::{chunk_indices, send_with_bisection, SendError, SendFuture, PER_MESSAGE_OVERHEAD_BYTES};
pub use dlq::DlqPublisher;
pub use transform::{normalize_output, SharedTransformHandler, TransformHandler};
pub use worker::{
    concurrency_from_env, send_error_is_suppressed, DlqOutcome, FlowWorker, DEFAULT_CONCURRENCY, DRAIN_WINDOW,
};
