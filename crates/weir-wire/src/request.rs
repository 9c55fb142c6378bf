//! Client request commands and their payload grammar
//!
//! Each command carries a positional string payload (fields separated by
//! `<>`). `ClientRequest::decode` is the single place that grammar is
//! parsed; past it, the core only sees typed requests.

use weir_core::{EntityId, TimeWindow, WeirError, WeirResult};
use weir_filter::Filter;

/// Request type groups
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestKind {
    Config,
    Control,
    Analysis,
    Predict,
}

impl RequestKind {
    pub fn from_name(name: &str) -> WeirResult<Self> {
        match name {
            "CONFIG" => Ok(RequestKind::Config),
            "CONTROL" => Ok(RequestKind::Control),
            "ANALYSIS" => Ok(RequestKind::Analysis),
            "PREDICT" => Ok(RequestKind::Predict),
            other => Err(WeirError::UnknownRequestType(other.to_string())),
        }
    }
}

/// Enumerated command codes (wire-stable)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestCommand {
    ConfigUpdateMaxWaitTime,
    ControlSetActuatorState,
    ControlToggleActuatorState,
    ControlNotifyIf,
    AnalysisGetEventsInWindow,
    AnalysisGetAllEntities,
    AnalysisGetLatestEvents,
    AnalysisGetMostActiveEntity,
    PredictNextNTimestamps,
    PredictNextNValues,
}

impl RequestCommand {
    pub fn from_name(name: &str) -> WeirResult<Self> {
        match name {
            "CONFIG_UPDATE_MAX_WAIT_TIME" => Ok(RequestCommand::ConfigUpdateMaxWaitTime),
            "CONTROL_SET_ACTUATOR_STATE" => Ok(RequestCommand::ControlSetActuatorState),
            "CONTROL_TOGGLE_ACTUATOR_STATE" => Ok(RequestCommand::ControlToggleActuatorState),
            "CONTROL_NOTIFY_IF" => Ok(RequestCommand::ControlNotifyIf),
            "ANALYSIS_GET_EVENTS_IN_WINDOW" => Ok(RequestCommand::AnalysisGetEventsInWindow),
            "ANALYSIS_GET_ALL_ENTITIES" => Ok(RequestCommand::AnalysisGetAllEntities),
            "ANALYSIS_GET_LATEST_EVENTS" => Ok(RequestCommand::AnalysisGetLatestEvents),
            "ANALYSIS_GET_MOST_ACTIVE_ENTITY" => Ok(RequestCommand::AnalysisGetMostActiveEntity),
            "PREDICT_NEXT_N_TIMESTAMPS" => Ok(RequestCommand::PredictNextNTimestamps),
            "PREDICT_NEXT_N_VALUES" => Ok(RequestCommand::PredictNextNValues),
            other => Err(WeirError::UnknownRequestCommand(other.to_string())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RequestCommand::ConfigUpdateMaxWaitTime => "CONFIG_UPDATE_MAX_WAIT_TIME",
            RequestCommand::ControlSetActuatorState => "CONTROL_SET_ACTUATOR_STATE",
            RequestCommand::ControlToggleActuatorState => "CONTROL_TOGGLE_ACTUATOR_STATE",
            RequestCommand::ControlNotifyIf => "CONTROL_NOTIFY_IF",
            RequestCommand::AnalysisGetEventsInWindow => "ANALYSIS_GET_EVENTS_IN_WINDOW",
            RequestCommand::AnalysisGetAllEntities => "ANALYSIS_GET_ALL_ENTITIES",
            RequestCommand::AnalysisGetLatestEvents => "ANALYSIS_GET_LATEST_EVENTS",
            RequestCommand::AnalysisGetMostActiveEntity => "ANALYSIS_GET_MOST_ACTIVE_ENTITY",
            RequestCommand::PredictNextNTimestamps => "PREDICT_NEXT_N_TIMESTAMPS",
            RequestCommand::PredictNextNValues => "PREDICT_NEXT_N_VALUES",
        }
    }

    pub fn kind(self) -> RequestKind {
        match self {
            RequestCommand::ConfigUpdateMaxWaitTime => RequestKind::Config,
            RequestCommand::ControlSetActuatorState
            | RequestCommand::ControlToggleActuatorState
            | RequestCommand::ControlNotifyIf => RequestKind::Control,
            RequestCommand::AnalysisGetEventsInWindow
            | RequestCommand::AnalysisGetAllEntities
            | RequestCommand::AnalysisGetLatestEvents
            | RequestCommand::AnalysisGetMostActiveEntity => RequestKind::Analysis,
            RequestCommand::PredictNextNTimestamps | RequestCommand::PredictNextNValues => {
                RequestKind::Predict
            }
        }
    }
}

/// A fully decoded client request
#[derive(Clone, Debug, PartialEq)]
pub enum ClientRequest {
    UpdateMaxWaitTime(f64),
    SetActuatorState { actuator: EntityId, filter: Filter },
    ToggleActuatorState { actuator: EntityId, filter: Filter },
    NotifyIf(Filter),
    /// CONTROL_NOTIFY_IF with an empty payload: read and clear the log
    FlushLog,
    EventsInWindow(TimeWindow),
    AllEntities,
    LatestEvents(usize),
    MostActiveEntity,
    PredictTimestamps { entity: EntityId, n: usize },
    PredictValues { entity: EntityId, n: usize },
}

impl ClientRequest {
    /// Parse a command's string payload into a typed request.
    pub fn decode(command: RequestCommand, data: &str) -> WeirResult<Self> {
        let malformed = |reason: &str| WeirError::MalformedPayload {
            command: command.as_str().to_string(),
            reason: reason.to_string(),
        };

        match command {
            RequestCommand::ConfigUpdateMaxWaitTime => {
                let secs: f64 = data.parse().map_err(|_| malformed("bad wait time"))?;
                Ok(ClientRequest::UpdateMaxWaitTime(secs))
            }
            RequestCommand::ControlSetActuatorState
            | RequestCommand::ControlToggleActuatorState => {
                let (id, serialized) = data
                    .split_once("<>")
                    .ok_or_else(|| malformed("expected <actuatorId><>FILTER"))?;
                let actuator = EntityId(id.parse().map_err(|_| malformed("bad actuator id"))?);
                let filter = Filter::deserialize(serialized)?;
                if command == RequestCommand::ControlSetActuatorState {
                    Ok(ClientRequest::SetActuatorState { actuator, filter })
                } else {
                    Ok(ClientRequest::ToggleActuatorState { actuator, filter })
                }
            }
            RequestCommand::ControlNotifyIf => {
                if data.is_empty() {
                    Ok(ClientRequest::FlushLog)
                } else {
                    Ok(ClientRequest::NotifyIf(Filter::deserialize(data)?))
                }
            }
            RequestCommand::AnalysisGetEventsInWindow => {
                let (start, end) = data
                    .split_once("<>")
                    .ok_or_else(|| malformed("expected <start><>end"))?;
                let start: f64 = start.parse().map_err(|_| malformed("bad start time"))?;
                let end: f64 = end.parse().map_err(|_| malformed("bad end time"))?;
                Ok(ClientRequest::EventsInWindow(TimeWindow::new(start, end)))
            }
            RequestCommand::AnalysisGetAllEntities => Ok(ClientRequest::AllEntities),
            RequestCommand::AnalysisGetLatestEvents => {
                let n: usize = data.parse().map_err(|_| malformed("bad event count"))?;
                Ok(ClientRequest::LatestEvents(n))
            }
            RequestCommand::AnalysisGetMostActiveEntity => Ok(ClientRequest::MostActiveEntity),
            RequestCommand::PredictNextNTimestamps | RequestCommand::PredictNextNValues => {
                let (id, n) = data
                    .split_once("<>")
                    .ok_or_else(|| malformed("expected <entityId><>n"))?;
                let entity = EntityId(id.parse().map_err(|_| malformed("bad entity id"))?);
                let n: usize = n.parse().map_err(|_| malformed("bad prediction count"))?;
                if command == RequestCommand::PredictNextNTimestamps {
                    Ok(ClientRequest::PredictTimestamps { entity, n })
                } else {
                    Ok(ClientRequest::PredictValues { entity, n })
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weir_filter::{BooleanOp, NumericOp};

    #[test]
    fn test_command_name_roundtrip() {
        for name in [
            "CONFIG_UPDATE_MAX_WAIT_TIME",
            "CONTROL_SET_ACTUATOR_STATE",
            "CONTROL_TOGGLE_ACTUATOR_STATE",
            "CONTROL_NOTIFY_IF",
            "ANALYSIS_GET_EVENTS_IN_WINDOW",
            "ANALYSIS_GET_ALL_ENTITIES",
            "ANALYSIS_GET_LATEST_EVENTS",
            "ANALYSIS_GET_MOST_ACTIVE_ENTITY",
            "PREDICT_NEXT_N_TIMESTAMPS",
            "PREDICT_NEXT_N_VALUES",
        ] {
            let command = RequestCommand::from_name(name).unwrap();
            assert_eq!(command.as_str(), name);
        }
        assert!(RequestCommand::from_name("CONFIG_REBOOT").is_err());
    }

    #[test]
    fn test_decode_config_update() {
        let req =
            ClientRequest::decode(RequestCommand::ConfigUpdateMaxWaitTime, "0.5").unwrap();
        assert_eq!(req, ClientRequest::UpdateMaxWaitTime(0.5));
    }

    #[test]
    fn test_decode_actuator_control() {
        let req = ClientRequest::decode(
            RequestCommand::ControlToggleActuatorState,
            "7<>0:0:true",
        )
        .unwrap();
        assert_eq!(
            req,
            ClientRequest::ToggleActuatorState {
                actuator: EntityId(7),
                filter: Filter::boolean(BooleanOp::Equals, true),
            }
        );
    }

    #[test]
    fn test_decode_notify_if_empty_flushes() {
        let req = ClientRequest::decode(RequestCommand::ControlNotifyIf, "").unwrap();
        assert_eq!(req, ClientRequest::FlushLog);

        let req = ClientRequest::decode(RequestCommand::ControlNotifyIf, "1:1:5.0").unwrap();
        assert_eq!(
            req,
            ClientRequest::NotifyIf(
                Filter::numeric("value", NumericOp::GreaterThan, 5.0).unwrap()
            )
        );
    }

    #[test]
    fn test_decode_window_and_predict() {
        let req =
            ClientRequest::decode(RequestCommand::AnalysisGetEventsInWindow, "1.0<>9.5").unwrap();
        assert_eq!(
            req,
            ClientRequest::EventsInWindow(TimeWindow::new(1.0, 9.5))
        );

        let req =
            ClientRequest::decode(RequestCommand::PredictNextNTimestamps, "3<>5").unwrap();
        assert_eq!(
            req,
            ClientRequest::PredictTimestamps {
                entity: EntityId(3),
                n: 5
            }
        );
    }

    #[test]
    fn test_decode_rejects_malformed_payloads() {
        assert!(ClientRequest::decode(RequestCommand::ConfigUpdateMaxWaitTime, "fast").is_err());
        assert!(
            ClientRequest::decode(RequestCommand::ControlSetActuatorState, "0:0:true").is_err()
        );
        assert!(ClientRequest::decode(RequestCommand::AnalysisGetLatestEvents, "-1").is_err());
        assert!(ClientRequest::decode(RequestCommand::PredictNextNValues, "3").is_err());
    }
}
