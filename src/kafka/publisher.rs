//! Per-stream publisher over a shared broker sink.
//!
//! A `Publisher` binds one topic and one key/value schema pair to the
//! process-wide sink. `publish` is a non-blocking enqueue; delivery
//! acknowledgments arrive on a single background task per publisher, in
//! enqueue order, and are reported through an explicit callback carrying
//! each request's sequence number. `close` is the only blocking
//! operation: a bounded drain of everything still in flight.

use crate::kafka::sink::{BrokerSink, DeliveryOutcome};
use crate::kafka::topic_registry::{TopicRegistry, TopicSpec};
use crate::schema::{SchemaCodec, SchemaPair};
use crate::Result;
use chrono::Utc;
use futures::future::BoxFuture;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Terminal report for one accepted publish request.
#[derive(Debug, Clone)]
pub struct DeliveryResult {
    pub topic: String,
    pub partition: Option<i32>,
    pub success: bool,
    pub error: Option<String>,
}

/// Invoked once per accepted request, in enqueue order, with the
/// request's sequence number.
pub type DeliveryCallback = Arc<dyn Fn(u64, DeliveryResult) + Send + Sync>;

struct Pending {
    seq: u64,
    enqueue_ts_ms: i64,
    delivery: BoxFuture<'static, DeliveryOutcome>,
}

pub struct Publisher {
    topic: String,
    schemas: SchemaPair,
    sink: Arc<dyn BrokerSink>,
    pending_tx: mpsc::UnboundedSender<Pending>,
    ack_task: JoinHandle<()>,
    accepted: Arc<AtomicU64>,
    resolved: Arc<AtomicU64>,
    drain_timeout: Duration,
}

impl Publisher {
    /// Ensures the topic exists, then binds to the shared sink.
    ///
    /// A provisioning failure is logged as a warning and construction
    /// proceeds: the publisher relies on broker-side auto-creation in
    /// that case. The registry does not record the failed topic, so the
    /// next publisher constructed for it retries creation.
    pub async fn new(
        registry: &TopicRegistry,
        sink: Arc<dyn BrokerSink>,
        spec: TopicSpec,
        schemas: SchemaPair,
        on_delivery: DeliveryCallback,
        drain_timeout: Duration,
    ) -> Self {
        if let Err(e) = registry.ensure_topic(&spec).await {
            warn!(
                topic = %spec.name,
                "Topic provisioning failed ({}), proceeding and relying on broker auto-creation",
                e
            );
        }

        let (pending_tx, pending_rx) = mpsc::unbounded_channel();
        let resolved = Arc::new(AtomicU64::new(0));
        let ack_task = tokio::spawn(acknowledge_loop(
            spec.name.clone(),
            pending_rx,
            on_delivery,
            resolved.clone(),
        ));

        Self {
            topic: spec.name,
            schemas,
            sink,
            pending_tx,
            ack_task,
            accepted: Arc::new(AtomicU64::new(0)),
            resolved,
            drain_timeout,
        }
    }

    /// Validates, encodes, and enqueues one message. Never blocks on
    /// network I/O.
    ///
    /// A validation failure returns immediately without contacting the
    /// broker and produces no [`DeliveryResult`]. Once this returns `Ok`,
    /// exactly one `DeliveryResult` is emitted for the request before
    /// [`close`](Self::close) returns.
    pub fn publish(&self, key: &Value, value: &Value) -> Result<()> {
        let key_bytes = SchemaCodec::encode(key, &self.schemas.key)?;
        let payload = SchemaCodec::encode(value, &self.schemas.value)?;

        let delivery = self.sink.enqueue(&self.topic, key_bytes, payload)?;
        let seq = self.accepted.fetch_add(1, Ordering::SeqCst);
        let pending = Pending {
            seq,
            enqueue_ts_ms: Utc::now().timestamp_millis(),
            delivery,
        };

        if self.pending_tx.send(pending).is_err() {
            // Only possible if the acknowledgment task died; the message
            // is already enqueued, so its result goes unreported.
            error!(
                topic = %self.topic,
                seq,
                "Acknowledgment task gone, delivery result will not be reported"
            );
        }

        Ok(())
    }

    /// Number of requests accepted for delivery so far.
    pub fn accepted(&self) -> u64 {
        self.accepted.load(Ordering::SeqCst)
    }

    /// Drains the publisher: waits until every accepted request has
    /// reached a terminal state, or the drain timeout elapses.
    ///
    /// After this returns no further `DeliveryResult` is emitted;
    /// requests still unresolved at timeout are logged as potential loss
    /// and not retried.
    pub async fn close(self) -> Result<()> {
        let Self {
            topic,
            pending_tx,
            ack_task,
            accepted,
            resolved,
            drain_timeout,
            ..
        } = self;

        drop(pending_tx);
        let abort = ack_task.abort_handle();

        match tokio::time::timeout(drain_timeout, ack_task).await {
            Ok(Ok(())) => {
                info!(
                    topic = %topic,
                    resolved = resolved.load(Ordering::SeqCst),
                    "Publisher drained"
                );
            }
            Ok(Err(e)) => {
                error!(topic = %topic, "Acknowledgment task failed during drain: {}", e);
            }
            Err(_elapsed) => {
                abort.abort();
                let unresolved =
                    accepted.load(Ordering::SeqCst) - resolved.load(Ordering::SeqCst);
                warn!(
                    topic = %topic,
                    unresolved,
                    "Drain timed out, unresolved messages are potential loss"
                );
            }
        }

        Ok(())
    }
}

/// Awaits delivery futures strictly in enqueue order, so callbacks
/// observe per-publisher FIFO even when the broker acknowledges out of
/// order.
async fn acknowledge_loop(
    topic: String,
    mut pending_rx: mpsc::UnboundedReceiver<Pending>,
    on_delivery: DeliveryCallback,
    resolved: Arc<AtomicU64>,
) {
    while let Some(pending) = pending_rx.recv().await {
        let result = match pending.delivery.await {
            Ok(partition) => {
                debug!(
                    topic = %topic,
                    partition,
                    seq = pending.seq,
                    enqueue_ts_ms = pending.enqueue_ts_ms,
                    "Message delivered"
                );
                DeliveryResult {
                    topic: topic.clone(),
                    partition: Some(partition),
                    success: true,
                    error: None,
                }
            }
            Err(e) => {
                warn!(
                    topic = %topic,
                    seq = pending.seq,
                    enqueue_ts_ms = pending.enqueue_ts_ms,
                    "Message delivery failed: {}",
                    e
                );
                DeliveryResult {
                    topic: topic.clone(),
                    partition: None,
                    success: false,
                    error: Some(e),
                }
            }
        };

        resolved.fetch_add(1, Ordering::SeqCst);
        on_delivery(pending.seq, result);
    }
}
