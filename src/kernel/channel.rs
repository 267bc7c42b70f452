use tracing::{debug, info};
use url::Url;

use super::event::RequestId;
use super::message::{AgentMessage, MessageKind, MessageLog, MessageTag};
use super::session::{InstanceId, SessionManager};
use crate::catalog::Capability;
use crate::error::{WorkbenchError, WorkbenchResult};
use crate::services::completion::{
    CompletionRequest, CompletionResponse, DraftingInput, Flow, SummarizeInput,
};

/// What a channel's capability is allowed to do with completions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChannelScope {
    /// Results are written back to the shared document.
    pub is_document: bool,
    /// Bare URLs become summarization requests.
    pub is_summarizer: bool,
}

#[derive(Debug, Clone, Copy)]
struct PendingTurn {
    id: RequestId,
    flow: Flow,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    Replied,
    ContentUpdated,
    Failed(String),
}

/// Conversation bound to exactly one activation. A new activation gets a
/// new channel; nothing carries over.
#[derive(Debug, Clone)]
pub struct AgentChannel {
    instance_id: InstanceId,
    capability: Capability,
    scope: ChannelScope,
    log: MessageLog,
    /// Document content immediately before the last agent mutation.
    snapshot: Option<String>,
    pending: Option<PendingTurn>,
}

impl AgentChannel {
    pub fn new(instance_id: InstanceId, capability: Capability, scope: ChannelScope) -> Self {
        let mut log = MessageLog::new();
        log.agent(format!("Agent ready for {}. How can I assist?", capability.name));
        Self {
            instance_id,
            capability,
            scope,
            log,
            snapshot: None,
            pending: None,
        }
    }

    /// Awaiting input -> Processing. Returns the request the driver must issue.
    pub fn begin_turn(
        &mut self,
        id: RequestId,
        text: &str,
        document: &str,
    ) -> WorkbenchResult<CompletionRequest> {
        if self.pending.is_some() {
            return Err(WorkbenchError::ChannelBusy);
        }
        let text = text.trim();
        if text.is_empty() {
            return Err(WorkbenchError::EmptyInput);
        }

        self.log.user(text);
        self.log.log(format!("Processing request for {}...", self.capability.name));

        let request = self.scoped_request(text, document);
        debug!(instance = %self.instance_id, request = %id, flow = %request.flow(), "channel turn started");
        self.pending = Some(PendingTurn {
            id,
            flow: request.flow(),
        });
        Ok(request)
    }

    fn scoped_request(&self, text: &str, document: &str) -> CompletionRequest {
        if self.scope.is_document {
            let prompt = if document.trim().is_empty() {
                text.to_string()
            } else {
                format!("Context:\n{}\n\nUser request: {}", document, text)
            };
            return CompletionRequest::Drafting(DraftingInput { prompt });
        }
        if self.scope.is_summarizer && is_web_url(text) {
            return CompletionRequest::Summarization(SummarizeInput {
                url: text.to_string(),
            });
        }
        CompletionRequest::Drafting(DraftingInput {
            prompt: format!("You are assisting inside {}. User request: {}", self.capability.name, text),
        })
    }

    /// Processing -> Awaiting input. `None` means the id is not the turn this
    /// channel is waiting on, and nothing was touched.
    pub fn settle(
        &mut self,
        id: RequestId,
        outcome: Result<CompletionResponse, WorkbenchError>,
        session: &mut SessionManager,
    ) -> Option<TurnOutcome> {
        let pending = match self.pending {
            Some(p) if p.id == id => p,
            _ => return None,
        };
        self.pending = None;

        let result = match outcome.and_then(|r| r.validate(pending.flow)) {
            Ok(CompletionResponse::Drafting(out)) => {
                self.log.agent(out.draft.as_str());
                if self.scope.is_document {
                    // Taken at settle, not at send, so edits made while processing survive a revert.
                    let before = session.document_content().to_string();
                    if session.update_content(&out.draft) {
                        self.snapshot = Some(before);
                        info!(instance = %self.instance_id, "document updated by agent");
                        return Some(TurnOutcome::ContentUpdated);
                    }
                }
                TurnOutcome::Replied
            }
            Ok(CompletionResponse::Summarization(out)) => {
                self.log.agent(out.summary);
                TurnOutcome::Replied
            }
            Ok(other) => self.fail(format!("unexpected {} response", other.flow())),
            Err(WorkbenchError::CompletionServiceFailure(reason)) => self.fail(reason),
            Err(other) => self.fail(other.to_string()),
        };
        Some(result)
    }

    fn fail(&mut self, reason: String) -> TurnOutcome {
        self.log.push(AgentMessage::tagged(
            MessageKind::Agent,
            format!("Sorry, an error occurred: {}", reason),
            MessageTag::Failure,
        ));
        TurnOutcome::Failed(reason)
    }

    /// One-level undo of the last agent mutation.
    pub fn revert(&mut self, session: &mut SessionManager) -> WorkbenchResult<()> {
        if !self.can_revert() {
            return Err(WorkbenchError::NothingToRevert);
        }
        let previous = self.snapshot.take().ok_or(WorkbenchError::NothingToRevert)?;
        session.update_content(&previous);
        self.log.log(format!("Reverted to previous content for {}.", self.capability.name));
        info!(instance = %self.instance_id, "agent change reverted");
        Ok(())
    }

    /// Keeps the last agent change; it can no longer be reverted.
    pub fn approve(&mut self) -> bool {
        if self.snapshot.take().is_none() {
            return false;
        }
        self.log.log(format!("Approved latest change for {}.", self.capability.name));
        true
    }

    pub fn can_revert(&self) -> bool {
        self.scope.is_document && self.snapshot.is_some()
    }

    pub fn is_processing(&self) -> bool {
        self.pending.is_some()
    }

    pub fn instance_id(&self) -> InstanceId {
        self.instance_id
    }

    pub fn capability(&self) -> &Capability {
        &self.capability
    }

    pub fn messages(&self) -> &[AgentMessage] {
        self.log.as_slice()
    }
}

fn is_web_url(text: &str) -> bool {
    if text.contains(char::is_whitespace) {
        return false;
    }
    Url::parse(text)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host().is_some())
        .unwrap_or(false)
}
