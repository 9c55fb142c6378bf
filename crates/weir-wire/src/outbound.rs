//! Outbound message encoding
//!
//! The core never opens connections: it produces addressed payloads and
//! hands them to the transport adapter. Two shapes exist - a command to an
//! actuator's callback address, and a result line to a client's reply
//! address, tagged with the originating command code.

use std::fmt;

use weir_core::{now_millis, Address, EntityId};

use crate::RequestCommand;

/// Command sent from the core to an actuator
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActuatorCommand {
    SetState,
    ToggleState,
}

impl ActuatorCommand {
    pub fn as_str(self) -> &'static str {
        match self {
            ActuatorCommand::SetState => "SET_STATE",
            ActuatorCommand::ToggleState => "TOGGLE_STATE",
        }
    }
}

/// An addressed payload for the transport layer to deliver
#[derive(Clone, Debug, PartialEq)]
pub enum OutboundMessage {
    /// Reactive command to a device
    ToActuator {
        addr: Address,
        actuator: EntityId,
        command: ActuatorCommand,
        state: bool,
    },
    /// Query result back to the client
    ToClient {
        addr: Address,
        command: RequestCommand,
        body: String,
    },
}

impl OutboundMessage {
    pub fn addr(&self) -> &Address {
        match self {
            OutboundMessage::ToActuator { addr, .. } => addr,
            OutboundMessage::ToClient { addr, .. } => addr,
        }
    }

    /// Encode into the wire line the recipient expects.
    pub fn encode(&self) -> String {
        match self {
            OutboundMessage::ToActuator { command, state, .. } => format!(
                "Request: {{timeStamp={:?}, commandToActuator={}, requestData={}}}",
                now_millis(),
                command.as_str(),
                state
            ),
            OutboundMessage::ToClient { command, body, .. } => format!(
                "You requested {}, here is your result: {}",
                command.as_str(),
                body
            ),
        }
    }
}

/// Render a reply body as a bracketed list, e.g. `[3, 5, 9]`.
pub fn list_body<T: fmt::Display>(items: &[T]) -> String {
    let rendered: Vec<String> = items.iter().map(|i| i.to_string()).collect();
    format!("[{}]", rendered.join(", "))
}

/// Render a float list the way the fleet expects (`[1.0, 2.5]`).
pub fn float_list_body(items: &[f64]) -> String {
    let rendered: Vec<String> = items.iter().map(|v| format!("{:?}", v)).collect();
    format!("[{}]", rendered.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actuator_command_line() {
        let msg = OutboundMessage::ToActuator {
            addr: Address::new("10.0.0.5/4040"),
            actuator: EntityId(9),
            command: ActuatorCommand::ToggleState,
            state: false,
        };
        let line = msg.encode();
        assert!(line.starts_with("Request: {timeStamp="));
        assert!(line.ends_with("commandToActuator=TOGGLE_STATE, requestData=false}"));
    }

    #[test]
    fn test_client_reply_line() {
        let msg = OutboundMessage::ToClient {
            addr: Address::new("10.0.0.2/5050"),
            command: RequestCommand::AnalysisGetAllEntities,
            body: "[1, 2]".to_string(),
        };
        assert_eq!(
            msg.encode(),
            "You requested ANALYSIS_GET_ALL_ENTITIES, here is your result: [1, 2]"
        );
    }

    #[test]
    fn test_list_bodies() {
        assert_eq!(list_body(&[EntityId(3), EntityId(5)]), "[3, 5]");
        assert_eq!(list_body::<EntityId>(&[]), "[]");
        assert_eq!(float_list_body(&[100.0, 121.5]), "[100.0, 121.5]");
    }
}
