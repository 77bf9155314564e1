use crate::{config::KafkaConfig, Error, Result};
use futures::future::BoxFuture;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::ClientConfig;

/// Terminal state of one enqueued message: the partition it landed on, or
/// a description of why delivery definitively failed (retries exhausted).
pub type DeliveryOutcome = std::result::Result<i32, String>;

/// Seam between publishers and the broker client.
///
/// `enqueue` must not block on network I/O; the returned future resolves
/// once the broker accepts the message or the client's retry budget is
/// exhausted.
pub trait BrokerSink: Send + Sync {
    fn enqueue(
        &self,
        topic: &str,
        key: Vec<u8>,
        payload: Vec<u8>,
    ) -> Result<BoxFuture<'static, DeliveryOutcome>>;
}

/// Shared rdkafka-backed sink. One instance per process, injected into
/// every publisher; dropped only after all publishers have closed.
pub struct KafkaSink {
    producer: FutureProducer,
}

impl KafkaSink {
    pub fn new(config: &KafkaConfig) -> Result<Self> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", config.brokers.join(","))
            .set("acks", &config.acks)
            .set("linger.ms", config.linger_ms.to_string())
            .set("message.timeout.ms", config.message_timeout_ms.to_string())
            .set("retries", config.retries.to_string())
            .create()
            .map_err(Error::Kafka)?;

        Ok(Self { producer })
    }
}

impl BrokerSink for KafkaSink {
    fn enqueue(
        &self,
        topic: &str,
        key: Vec<u8>,
        payload: Vec<u8>,
    ) -> Result<BoxFuture<'static, DeliveryOutcome>> {
        let record = FutureRecord::to(topic).key(&key).payload(&payload);

        match self.producer.send_result(record) {
            Ok(delivery) => Ok(Box::pin(async move {
                match delivery.await {
                    Ok(Ok((partition, _offset))) => Ok(partition),
                    Ok(Err((e, _message))) => Err(e.to_string()),
                    Err(_canceled) => Err("delivery future canceled".to_string()),
                }
            })),
            // Local queue rejection (e.g. queue full), not a delivery failure.
            Err((e, _record)) => Err(Error::Kafka(e)),
        }
    }
}
