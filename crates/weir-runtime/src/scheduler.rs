//! Event-time admission scheduler
//!
//! Every inbound message is admitted with a deadline of its arrival time
//! plus the owning client's wait window. One delivery worker drains the
//! pending set by deadline; a message fires only once it is inside half
//! its own window, and when an event fires, every still-pending event of
//! the same client with an earlier-or-equal event timestamp is flushed
//! ahead of it. That pair of rules is what absorbs out-of-order arrivals.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;

use weir_core::{now_millis, ClientId};
use weir_session::{SessionRegistry, SharedSession, DEFAULT_MAX_WAIT_SECS};
use weir_wire::{InboundMessage, OutboundMessage};

/// Scheduler configuration
#[derive(Clone, Debug)]
pub struct SchedulerConfig {
    /// Pause between polls while the head of the queue is not yet due
    pub idle_wait: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        SchedulerConfig {
            idle_wait: Duration::from_millis(5),
        }
    }
}

/// A buffered message waiting out its deadline
struct Pending {
    deadline_ms: f64,
    /// Admission order, used as the stable tie-break
    seq: u64,
    arrival_ms: f64,
    message: InboundMessage,
}

impl Pending {
    fn client_id(&self) -> ClientId {
        self.message.client_id
    }
}

impl PartialEq for Pending {
    fn eq(&self, other: &Self) -> bool {
        self.deadline_ms == other.deadline_ms && self.seq == other.seq
    }
}

impl Eq for Pending {}

impl PartialOrd for Pending {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Pending {
    // Reversed so the BinaryHeap pops the smallest deadline first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .deadline_ms
            .total_cmp(&self.deadline_ms)
            .then(other.seq.cmp(&self.seq))
    }
}

struct Inner {
    pending: Mutex<BinaryHeap<Pending>>,
    wakeup: Notify,
    registry: SessionRegistry,
    seq: AtomicU64,
    /// Wait window the scheduler last saw per client; deadlines are
    /// computed from this at admission and reconciled after delivery.
    known_wait: Mutex<HashMap<ClientId, f64>>,
    outbound: mpsc::UnboundedSender<OutboundMessage>,
    config: SchedulerConfig,
}

/// The admission/reordering core
#[derive(Clone)]
pub struct EventScheduler {
    inner: Arc<Inner>,
}

impl EventScheduler {
    /// Create a scheduler and the outbound channel the transport drains.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<OutboundMessage>) {
        Self::with_config(SchedulerConfig::default())
    }

    pub fn with_config(
        config: SchedulerConfig,
    ) -> (Self, mpsc::UnboundedReceiver<OutboundMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let scheduler = EventScheduler {
            inner: Arc::new(Inner {
                pending: Mutex::new(BinaryHeap::new()),
                wakeup: Notify::new(),
                registry: SessionRegistry::new(),
                seq: AtomicU64::new(0),
                known_wait: Mutex::new(HashMap::new()),
                outbound: tx,
                config,
            }),
        };
        (scheduler, rx)
    }

    /// Session handle for a client, if it has made contact.
    pub fn session(&self, client_id: ClientId) -> Option<SharedSession> {
        self.inner.registry.get(client_id)
    }

    /// Messages currently waiting out their deadline.
    pub fn pending_len(&self) -> usize {
        self.inner.pending.lock().len()
    }

    /// Admit a message that arrived now.
    pub fn enqueue(&self, message: InboundMessage) {
        self.enqueue_at(message, now_millis());
    }

    /// Admit a message with an explicit arrival time (milliseconds).
    /// Never blocks, never rejects: once admitted, a message is always
    /// eventually delivered.
    pub fn enqueue_at(&self, message: InboundMessage, arrival_ms: f64) {
        let client = message.client_id;
        // First contact creates the session before anything is buffered.
        self.inner.registry.get_or_create(client);
        let wait_secs = *self
            .inner
            .known_wait
            .lock()
            .entry(client)
            .or_insert(DEFAULT_MAX_WAIT_SECS);
        let pending = Pending {
            deadline_ms: arrival_ms + wait_secs * 1000.0,
            seq: self.inner.seq.fetch_add(1, AtomicOrdering::Relaxed),
            arrival_ms,
            message,
        };
        tracing::trace!(
            client = %client,
            deadline_ms = pending.deadline_ms,
            "admitting message"
        );
        self.inner.pending.lock().push(pending);
        self.inner.wakeup.notify_one();
    }

    /// Start the single delivery worker.
    pub fn spawn(&self) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(run_delivery_loop(inner))
    }
}

async fn run_delivery_loop(inner: Arc<Inner>) {
    loop {
        let Some(next) = inner.pending.lock().pop() else {
            inner.wakeup.notified().await;
            continue;
        };

        let client = next.client_id();
        let known_wait = inner
            .known_wait
            .lock()
            .get(&client)
            .copied()
            .unwrap_or(DEFAULT_MAX_WAIT_SECS);

        // Not yet inside half its own window: re-admit unchanged and idle
        // briefly instead of spinning.
        if next.deadline_ms - now_millis() >= known_wait * 500.0 {
            inner.pending.lock().push(next);
            tokio::time::sleep(inner.config.idle_wait).await;
            continue;
        }

        let session = inner.registry.get_or_create(client);

        // Out-of-order correction: a pending event whose event time is at
        // or before the due event's must land first, in event-time order.
        if let Some(due_ts) = next.message.event_timestamp() {
            let mut earlier = Vec::new();
            {
                let mut pending = inner.pending.lock();
                let mut keep = Vec::with_capacity(pending.len());
                for p in pending.drain() {
                    let flush = p.client_id() == client
                        && p.message.event_timestamp().is_some_and(|ts| ts <= due_ts);
                    if flush {
                        earlier.push(p);
                    } else {
                        keep.push(p);
                    }
                }
                pending.extend(keep);
            }
            earlier.sort_by(|a, b| {
                let a_ts = a.message.event_timestamp().unwrap_or(a.arrival_ms);
                let b_ts = b.message.event_timestamp().unwrap_or(b.arrival_ms);
                a_ts.total_cmp(&b_ts).then(a.seq.cmp(&b.seq))
            });
            for p in earlier {
                deliver(&inner, &session, p);
            }
        }

        deliver(&inner, &session, next);

        // Processing may have changed the client's wait window; re-anchor
        // every still-pending deadline from its original arrival time.
        let new_wait = session.lock().max_wait_secs();
        if new_wait != known_wait {
            inner.known_wait.lock().insert(client, new_wait);
            let mut pending = inner.pending.lock();
            let reanchored: Vec<Pending> = pending
                .drain()
                .map(|mut p| {
                    if p.client_id() == client {
                        p.deadline_ms = p.arrival_ms + new_wait * 1000.0;
                    }
                    p
                })
                .collect();
            pending.extend(reanchored);
            tracing::debug!(client = %client, new_wait, "re-anchored pending deadlines");
        }
    }
}

fn deliver(inner: &Inner, session: &SharedSession, pending: Pending) {
    tracing::debug!(
        client = %pending.client_id(),
        is_event = pending.message.is_event(),
        "delivering message"
    );
    let outbound = session.lock().process(pending.message.payload);
    for message in outbound {
        if inner.outbound.send(message).is_err() {
            tracing::warn!("outbound channel closed, dropping message");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weir_core::{Address, EntityId, Event};
    use weir_wire::{ClientRequest, InboundPayload, RequestCommand};

    const CLIENT: ClientId = ClientId(1);

    fn sensor_msg(ts: f64, entity: u32, value: f64) -> InboundMessage {
        InboundMessage::event(
            CLIENT,
            Event::numeric(ts, CLIENT, EntityId(entity), "TempSensor", value),
        )
    }

    fn command_msg(command: RequestCommand, request: ClientRequest) -> InboundMessage {
        InboundMessage {
            client_id: CLIENT,
            payload: InboundPayload::Command {
                command,
                request,
                reply: Some(Address::new("10.0.0.2/5050")),
            },
        }
    }

    fn recorded_timestamps(scheduler: &EventScheduler) -> Vec<f64> {
        scheduler
            .session(CLIENT)
            .map(|s| s.lock().history().iter().map(|e| e.timestamp).collect())
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn test_event_held_until_due_then_delivered() {
        let (scheduler, _rx) = EventScheduler::new();
        scheduler.spawn();

        scheduler.enqueue(sensor_msg(0.5, 2, 1.0));
        assert_eq!(scheduler.pending_len(), 1);

        // Default window is 2s; the message becomes due after ~1s.
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert!(recorded_timestamps(&scheduler).is_empty());

        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(recorded_timestamps(&scheduler), vec![0.5]);
        assert_eq!(scheduler.pending_len(), 0);
    }

    #[tokio::test]
    async fn test_out_of_order_arrivals_delivered_in_event_time_order() {
        let (scheduler, _rx) = EventScheduler::new();
        scheduler.spawn();

        // Wall-clock order 0.2 then 0.0; both inside the wait window.
        scheduler.enqueue(sensor_msg(0.2, 2, 1.0));
        scheduler.enqueue(sensor_msg(0.0, 3, 1.0));

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(recorded_timestamps(&scheduler), vec![0.0, 0.2]);
    }

    #[tokio::test]
    async fn test_wait_time_change_reanchors_pending_deadlines() {
        let (scheduler, _rx) = EventScheduler::new();
        scheduler.spawn();

        // Both admitted under the default 2s window. The config update
        // grows the window to 4s; the event's deadline must be recomputed
        // from its original arrival, so it fires at ~2s, not ~1s.
        scheduler.enqueue(command_msg(
            RequestCommand::ConfigUpdateMaxWaitTime,
            ClientRequest::UpdateMaxWaitTime(4.0),
        ));
        scheduler.enqueue(sensor_msg(0.5, 2, 1.0));

        tokio::time::sleep(Duration::from_millis(1400)).await;
        // Config has been applied, event re-anchored and still pending.
        let session = scheduler.session(CLIENT).unwrap();
        assert_eq!(session.lock().max_wait_secs(), 4.0);
        assert!(recorded_timestamps(&scheduler).is_empty());
        assert_eq!(scheduler.pending_len(), 1);

        // Nothing was dropped: the event lands once its new deadline is due.
        tokio::time::sleep(Duration::from_millis(1200)).await;
        assert_eq!(recorded_timestamps(&scheduler), vec![0.5]);
    }

    #[tokio::test]
    async fn test_query_reply_reaches_outbound_channel() {
        let (scheduler, mut rx) = EventScheduler::new();
        scheduler.spawn();

        scheduler.enqueue(sensor_msg(1.0, 7, 3.0));
        scheduler.enqueue(command_msg(
            RequestCommand::AnalysisGetAllEntities,
            ClientRequest::AllEntities,
        ));

        let reply = tokio::time::timeout(Duration::from_secs(3), rx.recv())
            .await
            .expect("reply within the wait window")
            .expect("channel open");
        assert_eq!(
            reply,
            OutboundMessage::ToClient {
                addr: Address::new("10.0.0.2/5050"),
                command: RequestCommand::AnalysisGetAllEntities,
                body: "[7]".to_string(),
            }
        );
    }
}
