//! DLQ publishing.

use moose_core::model::DlqRecord;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;

pub struct DlqPublisher {
    producer: FutureProducer,
}

impl DlqPublisher {
    pub fn new(producer: FutureProducer) -> Self {
        Self { producer }
    }

    /// Publish one DLQ record to `topic` as a UTF-8 JSON payload.
    pub async fn publish(&self, topic: &str, record: &DlqRecord) -> Result<(), String> {
        let payload = serde_json::to_vec(record).map_err(|e| e.to_string())?;
        self.producer
            .send(
                FutureRecord::<(), Vec<u8>>::to(topic).payload(&payload),
                Timeout::Never,
            )
            .await
            .map_err(|(err, _)| err.to_string())?;
        Ok(())
    }
}
