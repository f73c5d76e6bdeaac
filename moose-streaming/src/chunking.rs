//! Send-pipeline chunking and oversize-batch bisection.

use std::future::Future;
use std::pin::Pin;

/// Per-message framing/metadata overhead counted against `max_message_bytes`.
pub const PER_MESSAGE_OVERHEAD_BYTES: usize = 500;

/// Group message indices into chunks such that each chunk's
/// `sum(byte_len + overhead)` does not exceed `max_message_bytes`, except a
/// chunk of exactly one message which is let through oversized (it has
/// nowhere left to shrink; bisection will report it as fatal).
pub fn chunk_indices(messages: &[Vec<u8>], max_message_bytes: usize) -> Vec<Vec<usize>> {
    let mut chunks = Vec::new();
    let mut current = Vec::new();
    let mut current_size = 0usize;

    for (i, msg) in messages.iter().enumerate() {
        let size = msg.len() + PER_MESSAGE_OVERHEAD_BYTES;
        if !current.is_empty() && current_size + size > max_message_bytes {
            chunks.push(std::mem::take(&mut current));
            current_size = 0;
        }
        current.push(i);
        current_size += size;
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Outcome of attempting to send one chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendError {
    /// `ERR_MSG_SIZE_TOO_LARGE` / code 10, directly or
    /// transitively via `cause`.
    MessageTooLarge,
    /// Any other broker-side send failure.
    Other(String),
}

impl std::fmt::Display for SendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SendError::MessageTooLarge => write!(f, "message too large"),
            SendError::Other(msg) => write!(f, "{msg}"),
        }
    }
}

pub type SendFuture<'a> = Pin<Box<dyn Future<Output = Result<(), SendError>> + Send + 'a>>;

/// Send `chunk` (indices into `messages`), recursively bisecting on
/// `MESSAGE_TOO_LARGE` until each sub-chunk either sends or bottoms out at
/// one message. Bisection depth is bounded by
/// `ceil(log2(chunk.len())) + 1` since each level at least halves the
/// remaining indices.
///
/// `send` is called with the actual message bytes for the given indices.
/// Returns the indices that were fatally oversized even alone, so the
/// caller can route them to the DLQ.
pub fn send_with_bisection<'a, F>(
    messages: &'a [Vec<u8>],
    chunk: Vec<usize>,
    max_message_bytes: usize,
    send: &'a F,
) -> SendFuture<'a>
where
    F: Fn(&[usize]) -> SendFuture<'a> + Sync,
{
    Box::pin(async move {
        match send(&chunk).await {
            Ok(()) => Ok(()),
            Err(SendError::MessageTooLarge) if chunk.len() > 1 => {
                let halved_cap = (max_message_bytes / 2).max(1);
                let sub_messages: Vec<Vec<u8>> = chunk.iter().map(|&i| messages[i].clone()).collect();
                let sub_chunks_local = chunk_indices(&sub_messages, halved_cap);
                for local_indices in sub_chunks_local {
                    let global_indices: Vec<usize> = local_indices.iter().map(|&j| chunk[j]).collect();
                    send_with_bisection(messages, global_indices, halved_cap, send).await?;
                }
                Ok(())
            }
            Err(SendError::MessageTooLarge) => Err(SendError::MessageTooLarge),
            Err(other) => Err(other),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn chunks_split_when_sum_exceeds_cap() {
        let messages = vec![vec![0u8; 100], vec![0u8; 100], vec![0u8; 100]];
        // each costs 600 bytes (100 + 500 overhead); cap at 1000 fits one per chunk... let's check
        let chunks = chunk_indices(&messages, 1000);
        // 600 + 600 = 1200 > 1000, so each message gets its own chunk
        assert_eq!(chunks, vec![vec![0], vec![1], vec![2]]);
    }

    #[test]
    fn chunks_pack_multiple_when_they_fit() {
        let messages = vec![vec![0u8; 10], vec![0u8; 10], vec![0u8; 10]];
        let chunks = chunk_indices(&messages, 10_000);
        assert_eq!(chunks, vec![vec![0, 1, 2]]);
    }

    #[test]
    fn single_oversize_message_still_forms_its_own_chunk() {
        let messages = vec![vec![0u8; 5000]];
        let chunks = chunk_indices(&messages, 100);
        assert_eq!(chunks, vec![vec![0]]);
    }

    #[tokio::test]
    async fn bisection_splits_until_send_succeeds() {
        let messages: Vec<Vec<u8>> = (0..4).map(|_| vec![0u8; 10]).collect();
        let attempts = Arc::new(AtomicUsize::new(0));
        let attempts_clone = attempts.clone();

        let send = move |indices: &[usize]| -> SendFuture<'static> {
            attempts_clone.fetch_add(1, Ordering::SeqCst);
            let too_big = indices.len() > 1;
            Box::pin(async move {
                if too_big {
                    Err(SendError::MessageTooLarge)
                } else {
                    Ok(())
                }
            })
        };

        let result = send_with_bisection(&messages, vec![0, 1, 2, 3], 10_000, &send).await;
        assert!(result.is_ok());
        // 1 attempt at size 4, then bisects to sub-chunks until each is size 1.
        assert!(attempts.load(Ordering::SeqCst) > 1);
    }

    #[tokio::test]
    async fn single_message_that_is_always_too_large_is_fatal() {
        let messages = vec![vec![0u8; 10]];
        let send = |_: &[usize]| -> SendFuture<'static> { Box::pin(async { Err(SendError::MessageTooLarge) }) };
        let result = send_with_bisection(&messages, vec![0], 10_000, &send).await;
        assert_eq!(result, Err(SendError::MessageTooLarge));
    }

    #[tokio::test]
    async fn non_size_errors_are_not_bisected() {
        let messages: Vec<Vec<u8>> = (0..4).map(|_| vec![0u8; 10]).collect();
        let send = |_: &[usize]| -> SendFuture<'static> {
            Box::pin(async { Err(SendError::Other("broker down".into())) })
        };
        let result = send_with_bisection(&messages, vec![0, 1, 2, 3], 10_000, &send).await;
        assert_eq!(result, Err(SendError::Other("broker down".into())));
    }
}
