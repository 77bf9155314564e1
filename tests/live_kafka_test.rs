use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use transit_stream::config::KafkaConfig;
use transit_stream::kafka::{
    DeliveryCallback, KafkaSink, KafkaTopicAdmin, Publisher, TopicRegistry, TopicSpec,
};
use transit_stream::runner::turnstile_schemas;

fn live_kafka_config() -> KafkaConfig {
    KafkaConfig {
        brokers: vec!["localhost:9092".to_string()],
        default_partitions: 3,
        default_replication_factor: 1,
        acks: "all".to_string(),
        linger_ms: 0,
        message_timeout_ms: 10_000,
        retries: 3,
        drain_timeout_secs: 10,
    }
}

#[tokio::test]
#[ignore] // Run with: cargo test --ignored live_kafka_test::test_publish_and_drain
async fn test_publish_and_drain() {
    tracing_subscriber::fmt()
        .with_env_filter("transit_stream=debug")
        .try_init()
        .ok();

    let config = live_kafka_config();
    let sink = Arc::new(KafkaSink::new(&config).unwrap());
    let admin = Arc::new(KafkaTopicAdmin::new(&config.brokers).unwrap());
    let registry = TopicRegistry::new(admin);

    let delivered = Arc::new(AtomicU64::new(0));
    let count = delivered.clone();
    let on_delivery: DeliveryCallback = Arc::new(move |_seq, result| {
        assert!(result.success, "delivery failed: {:?}", result.error);
        count.fetch_add(1, Ordering::SeqCst);
    });

    let publisher = Publisher::new(
        &registry,
        sink,
        TopicSpec {
            name: "transit.turnstiles.live-test".to_string(),
            partitions: 3,
            replication_factor: 1,
        },
        turnstile_schemas(),
        on_delivery,
        Duration::from_secs(config.drain_timeout_secs),
    )
    .await;

    for i in 0..10 {
        publisher
            .publish(
                &json!({"timestamp": chrono::Utc::now().timestamp_millis()}),
                &json!({
                    "station_id": 40_000 + i,
                    "station_name": "Belmont",
                    "line": "red"
                }),
            )
            .unwrap();
    }

    publisher.close().await.unwrap();
    assert_eq!(delivered.load(Ordering::SeqCst), 10);
}
