//! Wire events: inbound client frames and outbound server frames.
//!
//! Every frame on the WebSocket is a JSON envelope `{"event": ..., "data":
//! ...}`. Inbound frames deserialize into the closed [`ClientEvent`] union;
//! anything that does not match a known tag is rejected by the relay rather
//! than forwarded. Field names follow the operator/participant UI protocol
//! (`runId`, `clientTs`, `type`).

use serde::{Deserialize, Serialize};

use crate::session::SessionId;

/// Inbound event from a connected client.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Operator-issued stimulus command, broadcast to every connection.
    TriggerAction(TriggerAction),
    /// Participant acknowledgment of a received stimulus. Logged only.
    ParticipantAck(ParticipantAck),
    /// Participant answer to a prompt, forwarded to the operator group.
    ParticipantInput(ParticipantInput),
    /// Participant confirmation (e.g. "I can hear the audio"), forwarded
    /// to the operator group.
    ParticipantConfirm(ParticipantConfirm),
    /// Request to join the operator ("wizard") group.
    JoinWizard,
}

/// Stimulus channel of a [`TriggerAction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    /// Audio cue played on the participant device.
    Audio,
    /// Haptic pulse.
    Haptic,
    /// On-screen text.
    Text,
    /// Simulated beacon proximity event.
    Beacon,
    /// Scripted correction injected into the participant flow.
    InjectCorrection,
}

impl TriggerKind {
    /// Returns the wire/audit string for this kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Audio => "audio",
            Self::Haptic => "haptic",
            Self::Text => "text",
            Self::Beacon => "beacon",
            Self::InjectCorrection => "inject_correction",
        }
    }
}

/// Operator stimulus command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerAction {
    /// Stimulus channel.
    #[serde(rename = "type")]
    pub kind: TriggerKind,
    /// Script-assigned action identifier (e.g. `overview_01`).
    pub id: String,
    /// Channel-specific parameters, passed through unmodified.
    #[serde(default)]
    pub payload: serde_json::Value,
    /// Optional operator note.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Participant acknowledgment of a received stimulus.
#[derive(Debug, Clone, Deserialize)]
pub struct ParticipantAck {
    /// Identifier of the acknowledged action.
    pub id: String,
    /// Free-text response, if any.
    #[serde(default)]
    pub response: Option<String>,
    /// Observer note, if any.
    #[serde(default)]
    pub note: Option<String>,
}

/// Answer kind of a [`ParticipantInput`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    /// Selection from a fixed set of options.
    Choice,
    /// Free-text answer.
    Text,
}

/// Participant answer to a prompt.
#[derive(Debug, Clone, Deserialize)]
pub struct ParticipantInput {
    /// Experiment run identifier.
    #[serde(rename = "runId", default)]
    pub run_id: String,
    /// Prompt identifier.
    pub id: String,
    /// Answer kind.
    #[serde(rename = "type")]
    pub kind: InputKind,
    /// Answer value.
    #[serde(default)]
    pub value: String,
    /// Client-side timestamp, passed through as an opaque string.
    #[serde(rename = "clientTs", default)]
    pub client_timestamp: String,
}

/// Participant confirmation.
#[derive(Debug, Clone, Deserialize)]
pub struct ParticipantConfirm {
    /// Confirmation identifier (e.g. `confirm_hearing`).
    pub id: String,
    /// Confirmation response, if any.
    #[serde(default)]
    pub response: Option<String>,
    /// Observer note, if any.
    #[serde(default)]
    pub note: Option<String>,
}

/// Outbound event delivered to a connected client.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Direct status notification (connection greeting, group join).
    Status(StatusPayload),
    /// Direct reply to a [`TriggerAction`] sender.
    Ack(TriggerAck),
    /// Broadcast of a [`TriggerAction`], unmodified.
    Action(TriggerAction),
    /// Presence change of a connection, sent to the operator group.
    ParticipantStatus(PresenceChange),
    /// Forwarded participant input or confirmation, sent to the operator
    /// group.
    ParticipantInput(ForwardedInput),
    /// Direct reply to a [`ParticipantInput`] sender.
    ParticipantInputAck(InputAck),
}

/// Discriminator for [`StatusPayload`] messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    /// Connection accepted; `sid` carries the assigned identifier.
    Connected,
    /// The connection is now a member of the operator group.
    JoinedWizard,
}

/// Direct status notification.
#[derive(Debug, Clone, Serialize)]
pub struct StatusPayload {
    /// What happened.
    pub msg: StatusKind,
    /// Session the notification concerns.
    pub sid: SessionId,
}

/// Delivery status used in direct replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AckStatus {
    /// The trigger was broadcast.
    Sent,
    /// The input was logged and forwarded.
    Received,
}

/// Direct reply to a trigger sender.
#[derive(Debug, Clone, Serialize)]
pub struct TriggerAck {
    /// Always [`AckStatus::Sent`].
    pub status: AckStatus,
    /// Identifier of the broadcast action.
    pub id: String,
}

/// Direct reply to a participant input sender.
#[derive(Debug, Clone, Serialize)]
pub struct InputAck {
    /// Always [`AckStatus::Received`].
    pub status: AckStatus,
    /// Identifier of the received input.
    pub id: String,
    /// Server receipt timestamp; identical to the one in the forwarded
    /// operator-group message for the same event.
    #[serde(rename = "serverTs")]
    pub server_timestamp: String,
}

/// System-derived presence notification. Never client-supplied.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PresenceChange {
    /// `true` on connect, `false` on disconnect.
    pub connected: bool,
}

/// Kind of a [`ForwardedInput`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ForwardKind {
    /// Forwarded choice input.
    Choice,
    /// Forwarded text input.
    Text,
    /// Forwarded confirmation.
    Confirm,
}

impl From<InputKind> for ForwardKind {
    fn from(kind: InputKind) -> Self {
        match kind {
            InputKind::Choice => Self::Choice,
            InputKind::Text => Self::Text,
        }
    }
}

/// Participant input or confirmation as forwarded to the operator group.
///
/// Confirmations carry no `runId` or `clientTs`; those fields are omitted
/// from the serialized payload.
#[derive(Debug, Clone, Serialize)]
pub struct ForwardedInput {
    /// Experiment run identifier, for inputs.
    #[serde(rename = "runId", skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    /// Prompt or confirmation identifier.
    pub id: String,
    /// Forwarded kind.
    #[serde(rename = "type")]
    pub kind: ForwardKind,
    /// Answer or confirmation value.
    pub value: String,
    /// Client-side timestamp, for inputs.
    #[serde(rename = "clientTs", skip_serializing_if = "Option::is_none")]
    pub client_timestamp: Option<String>,
    /// Server receipt timestamp.
    #[serde(rename = "serverTs")]
    pub server_timestamp: String,
}

#[cfg(test)]
#[allow(clippy::panic, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn trigger_action_parses_wire_shape() {
        let json = r#"{
            "event": "trigger_action",
            "data": {
                "type": "audio",
                "id": "overview_01",
                "payload": {"volume": 5},
                "note": "first cue"
            }
        }"#;
        let event: Result<ClientEvent, _> = serde_json::from_str(json);
        let Ok(ClientEvent::TriggerAction(action)) = event else {
            panic!("expected trigger_action");
        };
        assert_eq!(action.kind, TriggerKind::Audio);
        assert_eq!(action.id, "overview_01");
        assert_eq!(action.payload["volume"], 5);
        assert_eq!(action.note.as_deref(), Some("first cue"));
    }

    #[test]
    fn trigger_action_without_payload_or_note() {
        let json = r#"{"event": "trigger_action", "data": {"type": "haptic", "id": "h1"}}"#;
        let event: Result<ClientEvent, _> = serde_json::from_str(json);
        let Ok(ClientEvent::TriggerAction(action)) = event else {
            panic!("expected trigger_action");
        };
        assert!(action.payload.is_null());
        assert!(action.note.is_none());
    }

    #[test]
    fn participant_input_parses_wire_field_names() {
        let json = r#"{
            "event": "participant_input",
            "data": {
                "runId": "run_03",
                "id": "q1",
                "type": "choice",
                "value": "b",
                "clientTs": "2026-08-28T10:00:00Z"
            }
        }"#;
        let event: Result<ClientEvent, _> = serde_json::from_str(json);
        let Ok(ClientEvent::ParticipantInput(input)) = event else {
            panic!("expected participant_input");
        };
        assert_eq!(input.run_id, "run_03");
        assert_eq!(input.kind, InputKind::Choice);
        assert_eq!(input.client_timestamp, "2026-08-28T10:00:00Z");
    }

    #[test]
    fn join_wizard_needs_no_data() {
        let event: Result<ClientEvent, _> = serde_json::from_str(r#"{"event": "join_wizard"}"#);
        assert!(matches!(event, Ok(ClientEvent::JoinWizard)));
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let event: Result<ClientEvent, _> =
            serde_json::from_str(r#"{"event": "drop_tables", "data": {}}"#);
        assert!(event.is_err());
    }

    #[test]
    fn unknown_trigger_kind_is_rejected() {
        let json = r#"{"event": "trigger_action", "data": {"type": "smell", "id": "x"}}"#;
        let event: Result<ClientEvent, _> = serde_json::from_str(json);
        assert!(event.is_err());
    }

    #[test]
    fn trigger_ack_serializes_sent_status() {
        let ack = ServerEvent::Ack(TriggerAck {
            status: AckStatus::Sent,
            id: "overview_01".to_string(),
        });
        let value = serde_json::to_value(&ack).unwrap_or_default();
        assert_eq!(value["event"], "ack");
        assert_eq!(value["data"]["status"], "sent");
        assert_eq!(value["data"]["id"], "overview_01");
    }

    #[test]
    fn forwarded_confirm_omits_run_fields() {
        let event = ServerEvent::ParticipantInput(ForwardedInput {
            run_id: None,
            id: "confirm_hearing".to_string(),
            kind: ForwardKind::Confirm,
            value: "confirmed".to_string(),
            client_timestamp: None,
            server_timestamp: "2026-08-28T10:00:00.000Z".to_string(),
        });
        let value = serde_json::to_value(&event).unwrap_or_default();
        let data = &value["data"];
        assert_eq!(data["type"], "confirm");
        assert!(data.get("runId").is_none());
        assert!(data.get("clientTs").is_none());
        assert_eq!(data["serverTs"], "2026-08-28T10:00:00.000Z");
    }

    #[test]
    fn presence_change_wire_shape() {
        let event = ServerEvent::ParticipantStatus(PresenceChange { connected: true });
        let value = serde_json::to_value(&event).unwrap_or_default();
        assert_eq!(value["event"], "participant_status");
        assert_eq!(value["data"]["connected"], true);
    }
}
