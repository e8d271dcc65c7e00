//! Event relay: normalizes inbound events, writes audit records, and
//! forwards to the right audience.
//!
//! The relay is stateless per event. The only state it touches is the
//! [`SessionRegistry`] (audience resolution and delivery) and the
//! [`AuditLog`] (append). Ordering per event is fixed: timestamp at receipt,
//! audit append, forward, direct reply. An audit failure never blocks the
//! forward.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;

use super::events::{
    AckStatus, ClientEvent, ForwardKind, ForwardedInput, InputAck, ParticipantAck,
    ParticipantConfirm, ParticipantInput, PresenceChange, ServerEvent, StatusKind, StatusPayload,
    TriggerAck, TriggerAction,
};
use crate::audit::{AuditLog, AuditRecord, format_timestamp};
use crate::session::{OPERATOR_GROUP, SessionId, SessionInfo, SessionRegistry};

/// Central dispatcher for all relay traffic.
///
/// Owns the audit writer and shares the session registry with the WebSocket
/// layer. One instance serves the whole process; connection tasks call into
/// it concurrently.
#[derive(Debug)]
pub struct EventRelay {
    registry: Arc<SessionRegistry>,
    audit: AuditLog,
}

impl EventRelay {
    /// Creates a new relay over the given registry and audit log.
    #[must_use]
    pub fn new(registry: Arc<SessionRegistry>, audit: AuditLog) -> Self {
        Self { registry, audit }
    }

    /// Returns a reference to the shared [`SessionRegistry`].
    #[must_use]
    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Registers a new connection, greets it with its assigned id, and
    /// announces its presence to the operator group.
    pub async fn session_opened(
        &self,
        id: SessionId,
        tx: mpsc::UnboundedSender<ServerEvent>,
    ) -> SessionInfo {
        let info = self.registry.register(id, tx).await;
        tracing::info!(session_id = %id, "client connected");

        self.registry
            .send_to(
                &id,
                ServerEvent::Status(StatusPayload {
                    msg: StatusKind::Connected,
                    sid: id,
                }),
            )
            .await;
        self.registry
            .broadcast_group(
                OPERATOR_GROUP,
                &ServerEvent::ParticipantStatus(PresenceChange { connected: true }),
            )
            .await;
        info
    }

    /// Unregisters a connection and announces its departure to the
    /// operator group.
    pub async fn session_closed(&self, id: &SessionId) {
        self.registry.unregister(id).await;
        tracing::info!(session_id = %id, "client disconnected");

        self.registry
            .broadcast_group(
                OPERATOR_GROUP,
                &ServerEvent::ParticipantStatus(PresenceChange { connected: false }),
            )
            .await;
    }

    /// Parses one inbound text frame and dispatches it.
    ///
    /// Frames that do not match a known event tag are logged and dropped;
    /// they are never forwarded and produce no reply.
    pub async fn handle_message(&self, sender: SessionId, text: &str) {
        match serde_json::from_str::<ClientEvent>(text) {
            Ok(event) => self.handle_event(sender, event).await,
            Err(err) => {
                let err = crate::error::RelayError::MalformedEvent(err);
                tracing::warn!(session_id = %sender, %err, "dropping malformed event");
            }
        }
    }

    /// Dispatches one parsed inbound event.
    pub async fn handle_event(&self, sender: SessionId, event: ClientEvent) {
        match event {
            ClientEvent::TriggerAction(action) => self.on_trigger_action(sender, action).await,
            ClientEvent::ParticipantAck(ack) => self.on_participant_ack(sender, &ack).await,
            ClientEvent::ParticipantInput(input) => {
                self.on_participant_input(sender, input).await;
            }
            ClientEvent::ParticipantConfirm(confirm) => {
                self.on_participant_confirm(sender, confirm).await;
            }
            ClientEvent::JoinWizard => self.on_join_wizard(sender).await,
        }
    }

    /// Operator stimulus: audit, broadcast to every connection (sender
    /// included), then ack the sender.
    async fn on_trigger_action(&self, sender: SessionId, action: TriggerAction) {
        let record = AuditRecord {
            server_timestamp: Utc::now(),
            action_type: action.kind.as_str().to_string(),
            action_id: action.id.clone(),
            description: render_payload(&action.payload),
            expected_effect: action.note.clone().unwrap_or_default(),
            participant_response: String::new(),
            observer_note: String::new(),
        };
        self.append_audit(&record).await;

        let delivered = self
            .registry
            .broadcast(&ServerEvent::Action(action.clone()))
            .await;
        tracing::info!(
            session_id = %sender,
            action_id = %action.id,
            kind = action.kind.as_str(),
            delivered,
            "trigger action broadcast"
        );

        self.registry
            .send_to(
                &sender,
                ServerEvent::Ack(TriggerAck {
                    status: AckStatus::Sent,
                    id: action.id,
                }),
            )
            .await;
    }

    /// Participant acknowledgment: audit only, no forwarding, no reply.
    async fn on_participant_ack(&self, sender: SessionId, ack: &ParticipantAck) {
        let record = AuditRecord {
            server_timestamp: Utc::now(),
            action_type: "ack".to_string(),
            action_id: ack.id.clone(),
            description: "participant ack".to_string(),
            expected_effect: String::new(),
            participant_response: ack.response.clone().unwrap_or_default(),
            observer_note: ack.note.clone().unwrap_or_default(),
        };
        self.append_audit(&record).await;
        tracing::info!(session_id = %sender, action_id = %ack.id, "participant ack");
    }

    /// Participant input: audit, forward to the operator group, then ack
    /// the sender. The forwarded message and the ack carry the same server
    /// timestamp.
    async fn on_participant_input(&self, sender: SessionId, input: ParticipantInput) {
        let now = Utc::now();
        let server_ts = format_timestamp(now);

        let record = AuditRecord {
            server_timestamp: now,
            action_type: "participant_input".to_string(),
            action_id: input.id.clone(),
            description: format!("run:{};clientTs:{}", input.run_id, input.client_timestamp),
            expected_effect: String::new(),
            participant_response: input.value.clone(),
            observer_note: format!("runId:{};clientTs:{}", input.run_id, input.client_timestamp),
        };
        self.append_audit(&record).await;

        let forwarded = ServerEvent::ParticipantInput(ForwardedInput {
            run_id: Some(input.run_id),
            id: input.id.clone(),
            kind: input.kind.into(),
            value: input.value,
            client_timestamp: Some(input.client_timestamp),
            server_timestamp: server_ts.clone(),
        });
        let delivered = self.registry.broadcast_group(OPERATOR_GROUP, &forwarded).await;
        tracing::info!(
            session_id = %sender,
            action_id = %input.id,
            delivered,
            "participant input forwarded"
        );

        self.registry
            .send_to(
                &sender,
                ServerEvent::ParticipantInputAck(InputAck {
                    status: AckStatus::Received,
                    id: input.id,
                    server_timestamp: server_ts,
                }),
            )
            .await;
    }

    /// Participant confirmation: audit, forward to the operator group as a
    /// `confirm`-kind input. No direct reply.
    async fn on_participant_confirm(&self, sender: SessionId, confirm: ParticipantConfirm) {
        let now = Utc::now();
        let server_ts = format_timestamp(now);
        let response = confirm.response.unwrap_or_default();

        let record = AuditRecord {
            server_timestamp: now,
            action_type: "participant_confirm".to_string(),
            action_id: confirm.id.clone(),
            description: "participant confirmed hearing".to_string(),
            expected_effect: String::new(),
            participant_response: response.clone(),
            observer_note: confirm.note.unwrap_or_default(),
        };
        self.append_audit(&record).await;

        let forwarded = ServerEvent::ParticipantInput(ForwardedInput {
            run_id: None,
            id: confirm.id.clone(),
            kind: ForwardKind::Confirm,
            value: response,
            client_timestamp: None,
            server_timestamp: server_ts,
        });
        let delivered = self.registry.broadcast_group(OPERATOR_GROUP, &forwarded).await;
        tracing::info!(
            session_id = %sender,
            action_id = %confirm.id,
            delivered,
            "participant confirm forwarded"
        );
    }

    /// Operator-group join. Joining is permissive: any connection may
    /// request membership. Failure (defunct session) is logged, never
    /// surfaced to the client.
    async fn on_join_wizard(&self, sender: SessionId) {
        match self.registry.join_group(&sender, OPERATOR_GROUP).await {
            Ok(()) => {
                tracing::info!(session_id = %sender, "joined operator group");
                self.registry
                    .send_to(
                        &sender,
                        ServerEvent::Status(StatusPayload {
                            msg: StatusKind::JoinedWizard,
                            sid: sender,
                        }),
                    )
                    .await;
            }
            Err(err) => {
                tracing::warn!(session_id = %sender, %err, "join_wizard failed");
            }
        }
    }

    /// Appends an audit record, degrading to a warning on failure so the
    /// event is still forwarded.
    async fn append_audit(&self, record: &AuditRecord) {
        if let Err(err) = self.audit.append(record).await {
            tracing::warn!(
                %err,
                path = %self.audit.path().display(),
                action_id = %record.action_id,
                "audit append failed; event forwarded without durability"
            );
        }
    }
}

/// Renders a trigger payload for the audit description column: `null`
/// becomes empty, a bare string passes through, anything else is compact
/// JSON.
fn render_payload(payload: &serde_json::Value) -> String {
    match payload {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}
