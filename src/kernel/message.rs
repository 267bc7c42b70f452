use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    User,
    Agent,
    Log,
}

/// Extra meaning attached to an agent message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageTag {
    Plan,
    Clarification,
    Failure,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentMessage {
    pub id: Uuid,
    pub kind: MessageKind,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<MessageTag>,
}

impl AgentMessage {
    pub fn new(kind: MessageKind, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            text: text.into(),
            timestamp: Utc::now(),
            tag: None,
        }
    }

    pub fn tagged(kind: MessageKind, text: impl Into<String>, tag: MessageTag) -> Self {
        Self {
            tag: Some(tag),
            ..Self::new(kind, text)
        }
    }
}

/// Append-only conversation log.
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    entries: Vec<AgentMessage>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: AgentMessage) {
        self.entries.push(message);
    }

    pub fn user(&mut self, text: impl Into<String>) {
        self.push(AgentMessage::new(MessageKind::User, text));
    }

    pub fn agent(&mut self, text: impl Into<String>) {
        self.push(AgentMessage::new(MessageKind::Agent, text));
    }

    pub fn log(&mut self, text: impl Into<String>) {
        self.push(AgentMessage::new(MessageKind::Log, text));
    }

    pub fn as_slice(&self) -> &[AgentMessage] {
        &self.entries
    }
}
