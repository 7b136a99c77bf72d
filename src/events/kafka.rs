//! Kafka-backed analytics sink.

use std::time::Duration;

use futures::future::BoxFuture;
use rdkafka::{
    ClientConfig,
    producer::{FutureProducer, FutureRecord},
    util::Timeout,
};
use tracing::warn;

use super::{EventError, EventSink, GameEventRecord};

/// Upper bound on any produce call, so analytics can never stall a game.
const SEND_TIMEOUT: Duration = Duration::from_secs(1);

/// Analytics producer writing JSON events to a single Kafka topic.
#[derive(Clone)]
pub struct KafkaEventSink {
    producer: FutureProducer,
    topic: String,
}

impl KafkaEventSink {
    /// Build a producer and probe the brokers with a test write.
    ///
    /// A failed probe means the sink is not installed at all; the caller is
    /// expected to run without analytics in that case.
    pub async fn connect(brokers: &str, topic: &str) -> Result<Self, EventError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "1000")
            .create()
            .map_err(|source| {
                EventError::unavailable(format!("building producer for `{brokers}`"), source)
            })?;

        let sink = Self {
            producer,
            topic: topic.to_owned(),
        };
        sink.probe().await?;
        Ok(sink)
    }

    async fn probe(&self) -> Result<(), EventError> {
        let record = FutureRecord::to(&self.topic).key("probe").payload("probe");
        self.producer
            .send(record, Timeout::After(SEND_TIMEOUT))
            .await
            .map_err(|(source, _)| {
                EventError::unavailable(format!("probing topic `{}`", self.topic), source)
            })?;
        Ok(())
    }

    async fn send(&self, event: GameEventRecord) -> Result<(), EventError> {
        let payload = match serde_json::to_vec(&event) {
            Ok(payload) => payload,
            Err(err) => {
                // Serialization failure is a code bug, not a broker problem;
                // drop the event rather than erroring the caller.
                warn!(error = %err, "failed to serialize analytics event");
                return Ok(());
            }
        };

        let record = FutureRecord::to(&self.topic)
            .key(event.event_type)
            .payload(&payload);

        self.producer
            .send(record, Timeout::After(SEND_TIMEOUT))
            .await
            .map_err(|(source, _)| {
                EventError::unavailable(
                    format!("producing `{}` to `{}`", event.event_type, self.topic),
                    source,
                )
            })?;
        Ok(())
    }
}

impl EventSink for KafkaEventSink {
    fn publish(&self, event: GameEventRecord) -> BoxFuture<'static, Result<(), EventError>> {
        let sink = self.clone();
        Box::pin(async move { sink.send(event).await })
    }
}
