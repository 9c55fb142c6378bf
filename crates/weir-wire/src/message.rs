//! Inbound message decoding
//!
//! One frame per line: `NAME<()>clientId<()>BODY[<()>host/port]` where
//! NAME is CLIENT, SENSOR or ACTUATOR and BODY is a `{k=v, ...}` record.
//! The trailing element, when present, is the sender's return address
//! (client reply address, or actuator callback).

use weir_core::{Address, ClientId, EntityId, Event, WeirError, WeirResult};

use crate::{ClientRequest, RequestCommand, RequestKind};

const FIELD_SEPARATOR: &str = "<()>";

/// What a frame carried
#[derive(Clone, Debug, PartialEq)]
pub enum InboundPayload {
    /// A device reading, with the actuator's callback address if it sent one
    Event {
        event: Event,
        callback: Option<Address>,
    },
    /// A decoded client command
    Command {
        command: RequestCommand,
        request: ClientRequest,
        reply: Option<Address>,
    },
}

/// A decoded inbound frame, routed by client id
#[derive(Clone, Debug, PartialEq)]
pub struct InboundMessage {
    pub client_id: ClientId,
    pub payload: InboundPayload,
}

impl InboundMessage {
    pub fn event(client_id: ClientId, event: Event) -> Self {
        InboundMessage {
            client_id,
            payload: InboundPayload::Event {
                event,
                callback: None,
            },
        }
    }

    pub fn is_event(&self) -> bool {
        matches!(self.payload, InboundPayload::Event { .. })
    }

    /// Event timestamp, if this message is an event
    pub fn event_timestamp(&self) -> Option<f64> {
        match &self.payload {
            InboundPayload::Event { event, .. } => Some(event.timestamp),
            InboundPayload::Command { .. } => None,
        }
    }

    /// Decode one protocol line into a typed message.
    pub fn decode_line(line: &str) -> WeirResult<Self> {
        let parts: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
        if parts.len() < 3 {
            return Err(WeirError::MalformedFrame(format!(
                "expected NAME{sep}clientId{sep}BODY, got {line:?}",
                sep = FIELD_SEPARATOR
            )));
        }

        let name = parts[0];
        let client_id = ClientId(parts[1].parse().map_err(|_| {
            WeirError::MalformedFrame(format!("bad client id {:?}", parts[1]))
        })?);
        let return_addr = parts.get(3).map(|a| Address::new(*a));

        let body = parts[2]
            .split(['{', '}'])
            .nth(1)
            .ok_or_else(|| WeirError::MalformedFrame(format!("no body record in {line:?}")))?;
        // Positional k=v fields; a missing value decodes as the empty string.
        let values: Vec<&str> = body
            .split(',')
            .map(|field| field.splitn(2, '=').nth(1).unwrap_or("").trim())
            .collect();
        let value_at = |i: usize| values.get(i).copied().unwrap_or("");

        let payload = match name {
            "CLIENT" => {
                // Kind is carried redundantly; validate it is a known group.
                RequestKind::from_name(value_at(1))?;
                let command = RequestCommand::from_name(value_at(2))?;
                let request = ClientRequest::decode(command, value_at(3))?;
                InboundPayload::Command {
                    command,
                    request,
                    reply: return_addr,
                }
            }
            "SENSOR" | "ACTUATOR" => {
                let timestamp: f64 = value_at(0).parse().map_err(|_| {
                    WeirError::MalformedFrame(format!("bad timestamp {:?}", value_at(0)))
                })?;
                let owner = ClientId(value_at(1).parse().map_err(|_| {
                    WeirError::MalformedFrame(format!("bad client id {:?}", value_at(1)))
                })?);
                let entity = EntityId(value_at(2).parse().map_err(|_| {
                    WeirError::MalformedFrame(format!("bad entity id {:?}", value_at(2)))
                })?);
                let entity_type = value_at(3);

                let event = if name == "SENSOR" {
                    let value: f64 = value_at(4).parse().map_err(|_| {
                        WeirError::MalformedFrame(format!("bad sensor value {:?}", value_at(4)))
                    })?;
                    Event::numeric(timestamp, owner, entity, entity_type, value)
                } else {
                    let value = value_at(4).eq_ignore_ascii_case("true");
                    Event::boolean(timestamp, owner, entity, entity_type, value)
                };
                InboundPayload::Event {
                    event,
                    callback: return_addr,
                }
            }
            other => {
                return Err(WeirError::MalformedFrame(format!(
                    "unknown sender {other:?}"
                )))
            }
        };

        Ok(InboundMessage { client_id, payload })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weir_core::TimeWindow;

    #[test]
    fn test_decode_sensor_line() {
        let line = "SENSOR<()>1<()>SensorEvent: {timeStamp=0.5, clientId=1, entityId=2, entityType=TempSensor, value=23.5}";
        let msg = InboundMessage::decode_line(line).unwrap();
        assert_eq!(msg.client_id, ClientId(1));
        assert_eq!(
            msg.payload,
            InboundPayload::Event {
                event: Event::numeric(0.5, ClientId(1), EntityId(2), "TempSensor", 23.5),
                callback: None,
            }
        );
    }

    #[test]
    fn test_decode_actuator_line_with_callback() {
        let line = "ACTUATOR<()>1<()>ActuatorEvent: {timeStamp=2.0, clientId=1, entityId=9, entityType=Switch, value=true}<()>10.0.0.5/4040";
        let msg = InboundMessage::decode_line(line).unwrap();
        assert!(msg.is_event());
        assert_eq!(msg.event_timestamp(), Some(2.0));
        match msg.payload {
            InboundPayload::Event { event, callback } => {
                assert_eq!(event.payload.as_boolean(), Some(true));
                assert_eq!(callback, Some(Address::new("10.0.0.5/4040")));
            }
            other => panic!("expected event, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_client_line() {
        let line = "CLIENT<()>3<()>Request: {timeStamp=1700000000000.0, requestType=ANALYSIS, requestCommand=ANALYSIS_GET_EVENTS_IN_WINDOW, requestData=1.0<>9.0}<()>10.0.0.2/5050";
        let msg = InboundMessage::decode_line(line).unwrap();
        assert_eq!(msg.client_id, ClientId(3));
        assert_eq!(
            msg.payload,
            InboundPayload::Command {
                command: RequestCommand::AnalysisGetEventsInWindow,
                request: ClientRequest::EventsInWindow(TimeWindow::new(1.0, 9.0)),
                reply: Some(Address::new("10.0.0.2/5050")),
            }
        );
    }

    #[test]
    fn test_decode_client_line_empty_data() {
        let line = "CLIENT<()>3<()>Request: {timeStamp=1.0, requestType=CONTROL, requestCommand=CONTROL_NOTIFY_IF, requestData=}";
        let msg = InboundMessage::decode_line(line).unwrap();
        match msg.payload {
            InboundPayload::Command { request, .. } => {
                assert_eq!(request, ClientRequest::FlushLog)
            }
            other => panic!("expected command, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_rejects_malformed_frames() {
        assert!(InboundMessage::decode_line("").is_err());
        assert!(InboundMessage::decode_line("SENSOR<()>1").is_err());
        assert!(InboundMessage::decode_line("ROUTER<()>1<()>{a=b}").is_err());
        assert!(InboundMessage::decode_line("SENSOR<()>x<()>{timeStamp=1}").is_err());
    }
}
