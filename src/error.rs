//! Error types and result handling for transit-stream.
//!
//! This module defines the main error type [`Error`] and a convenience
//! [`Result`] type alias used throughout the crate.
//!
//! # Example
//!
//! ```rust
//! use transit_stream::{Error, Result};
//!
//! fn provision_topic() -> Result<()> {
//!     Err(Error::TopicProvisioning {
//!         topic: "turnstiles".to_string(),
//!         message: "broker unreachable".to_string(),
//!     })
//! }
//!
//! match provision_topic() {
//!     Ok(()) => println!("Provisioned"),
//!     Err(Error::TopicProvisioning { topic, message }) => {
//!         eprintln!("Provisioning '{}' failed: {}", topic, message)
//!     }
//!     Err(e) => eprintln!("Other error: {}", e),
//! }
//! ```

use thiserror::Error;

/// The main error type for transit-stream operations.
///
/// Covers the full failure taxonomy: local schema validation, topic
/// provisioning, Kafka client errors, and control-plane configuration
/// failures. Delivery failures after enqueue are never surfaced through
/// this type; they arrive asynchronously as failed
/// [`DeliveryResult`](crate::kafka::DeliveryResult)s.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error, typically from an invalid file or environment.
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Kafka client, producer, or admin error.
    #[error("Kafka error: {0}")]
    Kafka(#[from] rdkafka::error::KafkaError),

    /// JSON serialization error when encoding messages.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP transport error talking to the control plane or schema registry.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A message failed structural validation against its schema.
    ///
    /// Raised synchronously before any broker contact; no delivery is
    /// attempted for the rejected message.
    #[error("Validation error for schema '{schema}': {message}")]
    Validation {
        /// Name of the schema the value was checked against
        schema: String,
        /// Description of the violation
        message: String,
    },

    /// Topic creation failed for a reason other than "already exists".
    ///
    /// Not fatal to publishers; the registry does not record the topic as
    /// known, so a later `ensure_topic` call retries creation.
    #[error("Topic provisioning failed for '{topic}': {message}")]
    TopicProvisioning {
        /// Topic whose creation was attempted
        topic: String,
        /// Description of the failure
        message: String,
    },

    /// Control-plane connector creation failed.
    ///
    /// Fatal at startup; downstream ingestion depends on the pipeline.
    #[error("Connector configuration failed ({status}): {body}")]
    Connector {
        /// HTTP status returned by the control plane
        status: u16,
        /// Response body, for diagnosis
        body: String,
    },

    /// Operation timeout.
    #[error("Timeout error: {message}")]
    Timeout {
        /// Description of what timed out
        message: String,
    },
}

/// A convenient Result type alias for transit-stream operations.
pub type Result<T> = std::result::Result<T, Error>;
