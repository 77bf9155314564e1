use crate::{Error, Result};
use async_trait::async_trait;
use rdkafka::admin::{AdminClient, AdminOptions, NewTopic, TopicReplication};
use rdkafka::client::DefaultClientContext;
use rdkafka::types::RDKafkaErrorCode;
use rdkafka::ClientConfig;
use std::collections::HashSet;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

/// Immutable description of a topic to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicSpec {
    pub name: String,
    pub partitions: i32,
    pub replication_factor: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicCreation {
    Created,
    AlreadyExists,
}

/// Administrative create-topic surface, one request per call.
#[async_trait]
pub trait TopicAdmin: Send + Sync {
    async fn create_topic(&self, spec: &TopicSpec) -> Result<TopicCreation>;
}

pub struct KafkaTopicAdmin {
    admin_client: AdminClient<DefaultClientContext>,
}

impl KafkaTopicAdmin {
    pub fn new(brokers: &[String]) -> Result<Self> {
        let admin_client: AdminClient<_> = ClientConfig::new()
            .set("bootstrap.servers", brokers.join(","))
            .create()
            .map_err(Error::Kafka)?;

        Ok(Self { admin_client })
    }
}

#[async_trait]
impl TopicAdmin for KafkaTopicAdmin {
    async fn create_topic(&self, spec: &TopicSpec) -> Result<TopicCreation> {
        let new_topic = NewTopic::new(
            &spec.name,
            spec.partitions,
            TopicReplication::Fixed(spec.replication_factor),
        );

        let opts = AdminOptions::new().operation_timeout(Some(Duration::from_secs(30)));

        let results = self
            .admin_client
            .create_topics(&[new_topic], &opts)
            .await
            .map_err(Error::Kafka)?;

        for result in results {
            match result {
                Ok(topic) => {
                    info!("Successfully created topic: {}", topic);
                }
                Err((_topic, RDKafkaErrorCode::TopicAlreadyExists)) => {
                    return Ok(TopicCreation::AlreadyExists);
                }
                Err((topic, error)) => {
                    return Err(Error::TopicProvisioning {
                        topic,
                        message: error.to_string(),
                    });
                }
            }
        }

        Ok(TopicCreation::Created)
    }
}

/// Process-wide idempotent topic-creation authority.
///
/// Constructed once by the orchestrator and shared by reference with every
/// publisher; it outlives all of them. The known-topics set is guarded by
/// an async mutex held across the create call, so N concurrent
/// `ensure_topic` calls for one name serialize around a single
/// administrative request.
pub struct TopicRegistry {
    admin: std::sync::Arc<dyn TopicAdmin>,
    known: Mutex<HashSet<String>>,
}

impl TopicRegistry {
    pub fn new(admin: std::sync::Arc<dyn TopicAdmin>) -> Self {
        Self {
            admin,
            known: Mutex::new(HashSet::new()),
        }
    }

    /// Submits the topic for creation unless it is already known.
    ///
    /// A broker-side "already exists" response is success and recorded.
    /// Any other failure is not recorded, so the next call retries
    /// creation; the error is returned for the caller to decide whether
    /// to proceed.
    #[instrument(skip(self), fields(topic = %spec.name))]
    pub async fn ensure_topic(&self, spec: &TopicSpec) -> Result<()> {
        let mut known = self.known.lock().await;
        if known.contains(&spec.name) {
            debug!("Topic '{}' already known", spec.name);
            return Ok(());
        }

        match self.admin.create_topic(spec).await {
            Ok(TopicCreation::Created) => {
                info!(
                    partitions = spec.partitions,
                    replication_factor = spec.replication_factor,
                    "Created topic '{}'",
                    spec.name
                );
                known.insert(spec.name.clone());
                Ok(())
            }
            Ok(TopicCreation::AlreadyExists) => {
                info!("Topic '{}' already exists on the broker", spec.name);
                known.insert(spec.name.clone());
                Ok(())
            }
            Err(e) => {
                warn!("Failed to create topic '{}': {}", spec.name, e);
                Err(e)
            }
        }
    }
}
