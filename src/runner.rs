//! Simulation orchestrator.
//!
//! Owns the process-wide resources (broker sink, topic registry), builds
//! one publisher per configured station, and drives a fixed-timestep
//! loop until shutdown is requested. Loop internals are deliberately
//! trivial; the interesting behavior lives in the publishers.

use crate::config::Config;
use crate::kafka::{
    DeliveryCallback, KafkaSink, KafkaTopicAdmin, Publisher, TopicRegistry, TopicSpec,
};
use crate::schema::{FieldType, Schema, SchemaPair, SchemaRegistryClient};
use crate::Result;
use chrono::Utc;
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const LINES: &[&str] = &["red", "blue", "green", "brown"];

pub struct Runner {
    config: Config,
}

struct Station {
    station_id: i64,
    name: String,
    line: String,
    publisher: Publisher,
    failed: Arc<AtomicU64>,
}

impl Runner {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub async fn run(&self) -> Result<()> {
        let sink = Arc::new(KafkaSink::new(&self.config.kafka)?);
        let admin = Arc::new(KafkaTopicAdmin::new(&self.config.kafka.brokers)?);
        let registry = Arc::new(TopicRegistry::new(admin));

        let topic = self.config.simulation.topic.clone();
        let schemas = turnstile_schemas();

        // Best-effort: publishing validates locally either way.
        let registry_client = SchemaRegistryClient::new(&self.config.schema_registry.url);
        if let Err(e) = registry_client.register_pair(&topic, &schemas).await {
            warn!("Schema registration failed, continuing: {}", e);
        }

        let drain_timeout = Duration::from_secs(self.config.kafka.drain_timeout_secs);
        let mut stations = Vec::new();
        for (idx, name) in self.config.simulation.stations.iter().enumerate() {
            let spec = TopicSpec {
                name: topic.clone(),
                partitions: self.config.kafka.default_partitions,
                replication_factor: self.config.kafka.default_replication_factor,
            };

            let failed = Arc::new(AtomicU64::new(0));
            let failures = failed.clone();
            let on_delivery: DeliveryCallback = Arc::new(move |_seq, result| {
                if !result.success {
                    failures.fetch_add(1, Ordering::SeqCst);
                }
            });

            let publisher = Publisher::new(
                &registry,
                sink.clone(),
                spec,
                schemas.clone(),
                on_delivery,
                drain_timeout,
            )
            .await;

            stations.push(Station {
                station_id: 40_000 + idx as i64,
                name: name.clone(),
                line: LINES[idx % LINES.len()].to_string(),
                publisher,
                failed,
            });
        }

        info!(
            stations = stations.len(),
            topic = %topic,
            time_step_ms = self.config.simulation.time_step_ms,
            "Simulation started"
        );

        let mut interval =
            tokio::time::interval(Duration::from_millis(self.config.simulation.time_step_ms));
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    for station in &stations {
                        station.tick();
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Shutdown requested, draining publishers");
                    break;
                }
            }
        }

        for station in stations {
            let accepted = station.publisher.accepted();
            let failed = station.failed.load(Ordering::SeqCst);
            if let Err(e) = station.publisher.close().await {
                warn!(station = %station.name, "Drain failed: {}", e);
            }
            info!(
                station = %station.name,
                accepted,
                failed,
                "Publisher closed"
            );
        }

        Ok(())
    }
}

impl Station {
    fn tick(&self) {
        let key = json!({ "timestamp": Utc::now().timestamp_millis() });
        let value = json!({
            "station_id": self.station_id,
            "station_name": self.name,
            "line": self.line,
        });

        // Delivery failures arrive on the callback; only local rejection
        // (validation, queue full) lands here. Log and continue.
        if let Err(e) = self.publisher.publish(&key, &value) {
            warn!(station = %self.name, "Publish rejected: {}", e);
        }
    }
}

/// Key/value descriptors for turnstile events.
pub fn turnstile_schemas() -> SchemaPair {
    SchemaPair::new(
        Schema::new(
            "turnstile_key",
            vec![Schema::field("timestamp", FieldType::Long)],
        ),
        Schema::new(
            "turnstile_value",
            vec![
                Schema::field("station_id", FieldType::Long),
                Schema::field("station_name", FieldType::String),
                Schema::field("line", FieldType::String),
            ],
        ),
    )
}
