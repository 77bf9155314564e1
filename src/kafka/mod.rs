pub mod publisher;
pub mod sink;
pub mod topic_registry;


pub use publisher::{DeliveryCallback, DeliveryResult, Publisher};
pub use sink::{BrokerSink, DeliveryOutcome, KafkaSink};
pub use topic_registry::{KafkaTopicAdmin, TopicAdmin, TopicCreation, TopicRegistry, TopicSpec};
