//! Per-client session state
//!
//! Mutated exclusively by the scheduler's delivery worker, so no locking
//! lives here; the registry hands out `Arc<Mutex<ClientSession>>` handles.

use std::collections::BTreeMap;

use weir_core::{Address, ClientId, EntityId, Event, TimeWindow};
use weir_filter::Filter;
use weir_predict::{predict_boolean, predict_numeric};
use weir_wire::{
    float_list_body, list_body, ActuatorCommand, ClientRequest, InboundPayload, OutboundMessage,
    RequestCommand,
};

/// Wait window applied to a client that has never configured one
pub const DEFAULT_MAX_WAIT_SECS: f64 = 2.0;

/// Standing reactive instruction for one actuator
#[derive(Clone, Debug)]
pub struct ActuatorRule {
    pub filter: Filter,
    /// Toggle the last known state instead of forcing `true`
    pub toggle: bool,
    /// Event timestamp the rule was last evaluated at; an event must move
    /// the timeline strictly past this to trigger re-evaluation
    pub last_applied: f64,
}

/// Server-side record of one entity
#[derive(Debug)]
struct EntityRecord {
    id: EntityId,
    is_actuator: bool,
    events: Vec<Event>,
    /// Callback address captured from the actuator's first event
    callback: Option<Address>,
    rule: Option<ActuatorRule>,
}

impl EntityRecord {
    fn new(id: EntityId, is_actuator: bool) -> Self {
        EntityRecord {
            id,
            is_actuator,
            events: Vec::new(),
            callback: None,
            rule: None,
        }
    }

    /// Event with the largest timestamp (latest arrival wins ties)
    fn latest_event(&self) -> Option<&Event> {
        self.events
            .iter()
            .max_by(|a, b| a.timestamp.total_cmp(&b.timestamp))
    }
}

/// Values predicted for an entity, kinded by its payload type
#[derive(Clone, Debug, PartialEq)]
pub enum Predicted {
    Numeric(Vec<f64>),
    Boolean(Vec<bool>),
}

impl Predicted {
    pub fn is_empty(&self) -> bool {
        match self {
            Predicted::Numeric(v) => v.is_empty(),
            Predicted::Boolean(v) => v.is_empty(),
        }
    }

    /// Reply-body rendering
    pub fn body(&self) -> String {
        match self {
            Predicted::Numeric(v) => float_list_body(v),
            Predicted::Boolean(v) => list_body(v),
        }
    }
}

/// Per-client session: event history, filters, rules, queries
#[derive(Debug)]
pub struct ClientSession {
    client_id: ClientId,
    max_wait_secs: f64,
    entities: BTreeMap<EntityId, EntityRecord>,
    /// Append-only, in delivery order
    all_events: Vec<Event>,
    notify_filter: Option<Filter>,
    matched_log: Vec<Event>,
    reply_addr: Option<Address>,
}

impl ClientSession {
    pub fn new(client_id: ClientId) -> Self {
        ClientSession {
            client_id,
            max_wait_secs: DEFAULT_MAX_WAIT_SECS,
            entities: BTreeMap::new(),
            all_events: Vec::new(),
            notify_filter: None,
            matched_log: Vec::new(),
            reply_addr: None,
        }
    }

    pub fn client_id(&self) -> ClientId {
        self.client_id
    }

    pub fn max_wait_secs(&self) -> f64 {
        self.max_wait_secs
    }

    /// Change the wait window. Re-anchoring of already-pending deadlines is
    /// the scheduler's job.
    pub fn update_max_wait_time(&mut self, secs: f64) {
        if secs <= 0.0 {
            tracing::warn!(client = %self.client_id, secs, "ignoring non-positive wait time");
            return;
        }
        self.max_wait_secs = secs;
    }

    /// Events recorded so far, in delivery order.
    pub fn history(&self) -> &[Event] {
        &self.all_events
    }

    /// Single mutation entry point used by the delivery worker.
    pub fn process(&mut self, payload: InboundPayload) -> Vec<OutboundMessage> {
        match payload {
            InboundPayload::Event { event, callback } => self.record_event(event, callback),
            InboundPayload::Command {
                command,
                request,
                reply,
            } => {
                if self.reply_addr.is_none() {
                    self.reply_addr = reply;
                }
                self.handle_request(command, request)
            }
        }
    }

    /// Record one device reading: updates history, the notify log, and
    /// re-evaluates standing actuator rules.
    pub fn record_event(
        &mut self,
        event: Event,
        callback: Option<Address>,
    ) -> Vec<OutboundMessage> {
        let mut out = Vec::new();
        if event.client_id != self.client_id {
            tracing::warn!(
                client = %self.client_id,
                sender = %event.client_id,
                "dropping event owned by another client"
            );
            return out;
        }

        let record = self
            .entities
            .entry(event.entity_id)
            .or_insert_with(|| EntityRecord::new(event.entity_id, event.is_actuator()));
        if record.callback.is_none() {
            record.callback = callback;
        }
        record.events.push(event.clone());
        self.all_events.push(event.clone());

        if let Some(filter) = &self.notify_filter {
            if filter.satisfies(&event) {
                self.matched_log.push(event.clone());
            }
        }

        // Rules are judged against the client-wide latest event, not the
        // one that advanced the timeline.
        let Some(latest) = self.most_recent_n(1).pop() else {
            return out;
        };
        for record in self.entities.values_mut() {
            let fired = match record.rule.as_mut() {
                Some(rule) if event.timestamp > rule.last_applied => {
                    rule.last_applied = event.timestamp;
                    rule.filter.satisfies(&latest).then_some(rule.toggle)
                }
                _ => None,
            };
            let Some(toggle) = fired else { continue };
            // A rule over an entity that has never reported does not fire.
            if record.events.is_empty() {
                continue;
            }
            let Some(addr) = record.callback.clone() else {
                tracing::warn!(actuator = %record.id, "rule fired but no callback is known");
                continue;
            };
            if toggle {
                let Some(prev) = record.latest_event().and_then(|e| e.payload.as_boolean())
                else {
                    continue;
                };
                out.push(OutboundMessage::ToActuator {
                    addr,
                    actuator: record.id,
                    command: ActuatorCommand::ToggleState,
                    state: !prev,
                });
            } else {
                out.push(OutboundMessage::ToActuator {
                    addr,
                    actuator: record.id,
                    command: ActuatorCommand::SetState,
                    state: true,
                });
            }
        }
        out
    }

    /// Replace the notify filter; `None` disables match logging.
    pub fn set_notify_filter(&mut self, filter: Option<Filter>) {
        self.notify_filter = filter;
    }

    /// Entity ids of matched events, sorted by event timestamp. Clears the
    /// log; a second read without new matches is empty.
    pub fn read_and_clear_log(&mut self) -> Vec<EntityId> {
        let mut matched = std::mem::take(&mut self.matched_log);
        matched.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
        matched.into_iter().map(|e| e.entity_id).collect()
    }

    /// All events inside the window (bounds inclusive), ascending by
    /// timestamp.
    pub fn events_in_window(&self, window: TimeWindow) -> Vec<Event> {
        let mut events: Vec<Event> = self
            .all_events
            .iter()
            .filter(|e| window.contains(e.timestamp))
            .cloned()
            .collect();
        events.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
        events
    }

    /// Ids of every entity seen so far, ascending.
    pub fn all_known_entities(&self) -> Vec<EntityId> {
        self.entities.keys().copied().collect()
    }

    /// The n events with the largest timestamps (ties prefer the larger
    /// entity id), returned ascending by timestamp.
    pub fn most_recent_n(&self, n: usize) -> Vec<Event> {
        let mut events = self.all_events.clone();
        events.sort_by(|a, b| {
            b.timestamp
                .total_cmp(&a.timestamp)
                .then(b.entity_id.cmp(&a.entity_id))
        });
        events.truncate(n);
        events.reverse();
        events
    }

    /// Entity with the most recorded events; ties resolve to the larger
    /// id. Returns the zero sentinel when no entities exist - callers
    /// should check `all_known_entities` first.
    pub fn most_active_entity(&self) -> EntityId {
        let mut best = EntityId::NONE;
        let mut best_count = 0usize;
        for (id, record) in &self.entities {
            let count = record.events.len();
            if count > best_count || (count == best_count && *id > best) {
                best = *id;
                best_count = count;
            }
        }
        best
    }

    /// Predict the next n event timestamps for an entity. Unknown or
    /// silent entities yield an empty prediction, never an error.
    pub fn predict_timestamps(&self, entity: EntityId, n: usize) -> Vec<f64> {
        let Some(record) = self.entities.get(&entity) else {
            return Vec::new();
        };
        if record.events.is_empty() {
            return Vec::new();
        }
        let mut timestamps: Vec<f64> = record.events.iter().map(|e| e.timestamp).collect();
        timestamps.sort_by(f64::total_cmp);
        predict_numeric(&timestamps, n)
    }

    /// Predict the next n values for an entity, numeric or boolean by its
    /// kind. Unknown or silent entities yield an empty prediction.
    pub fn predict_values(&self, entity: EntityId, n: usize) -> Predicted {
        let Some(record) = self.entities.get(&entity) else {
            return Predicted::Numeric(Vec::new());
        };
        if record.events.is_empty() {
            return Predicted::Numeric(Vec::new());
        }
        let mut events: Vec<&Event> = record.events.iter().collect();
        events.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));

        if record.is_actuator {
            let values: Vec<bool> = events
                .iter()
                .filter_map(|e| e.payload.as_boolean())
                .collect();
            Predicted::Boolean(predict_boolean(&values, n))
        } else {
            let values: Vec<f64> = events
                .iter()
                .filter_map(|e| e.payload.as_numeric())
                .collect();
            Predicted::Numeric(predict_numeric(&values, n))
        }
    }

    /// Install or replace the reactive rule for an actuator. A no-op when
    /// the session has recorded no events at all; the toggle variant also
    /// requires the entity to be known already.
    pub fn arm_actuator_rule(&mut self, entity: EntityId, filter: Filter, toggle: bool) {
        if self.all_events.is_empty() {
            return;
        }
        let record = if toggle {
            match self.entities.get_mut(&entity) {
                Some(record) => record,
                None => return,
            }
        } else {
            self.entities
                .entry(entity)
                .or_insert_with(|| EntityRecord::new(entity, true))
        };
        // The evaluation anchor survives re-arming.
        let last_applied = record.rule.take().map(|r| r.last_applied).unwrap_or(0.0);
        record.rule = Some(ActuatorRule {
            filter,
            toggle,
            last_applied,
        });
    }

    fn handle_request(
        &mut self,
        command: RequestCommand,
        request: ClientRequest,
    ) -> Vec<OutboundMessage> {
        tracing::debug!(client = %self.client_id, ?request, "processing request");
        let mut out = Vec::new();
        match request {
            ClientRequest::UpdateMaxWaitTime(secs) => self.update_max_wait_time(secs),
            ClientRequest::SetActuatorState { actuator, filter } => {
                self.arm_actuator_rule(actuator, filter, false)
            }
            ClientRequest::ToggleActuatorState { actuator, filter } => {
                self.arm_actuator_rule(actuator, filter, true)
            }
            ClientRequest::NotifyIf(filter) => self.set_notify_filter(Some(filter)),
            ClientRequest::FlushLog => {
                let ids = self.read_and_clear_log();
                out.extend(self.reply(command, list_body(&ids)));
            }
            ClientRequest::EventsInWindow(window) => {
                let events = self.events_in_window(window);
                out.extend(self.reply(command, list_body(&events)));
            }
            ClientRequest::AllEntities => {
                let ids = self.all_known_entities();
                out.extend(self.reply(command, list_body(&ids)));
            }
            ClientRequest::LatestEvents(n) => {
                let events = self.most_recent_n(n);
                out.extend(self.reply(command, list_body(&events)));
            }
            ClientRequest::MostActiveEntity => {
                let id = self.most_active_entity();
                out.extend(self.reply(command, id.to_string()));
            }
            ClientRequest::PredictTimestamps { entity, n } => {
                let predicted = self.predict_timestamps(entity, n);
                out.extend(self.reply(command, float_list_body(&predicted)));
            }
            ClientRequest::PredictValues { entity, n } => {
                let predicted = self.predict_values(entity, n);
                out.extend(self.reply(command, predicted.body()));
            }
        }
        out
    }

    fn reply(&self, command: RequestCommand, body: String) -> Option<OutboundMessage> {
        match self.reply_addr.clone() {
            Some(addr) => Some(OutboundMessage::ToClient {
                addr,
                command,
                body,
            }),
            None => {
                tracing::warn!(client = %self.client_id, "no reply address known, dropping result");
                None
            }
        }
    }
}
