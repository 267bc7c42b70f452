use super::event::RequestId;
use super::session::InstanceId;
use crate::error::WorkbenchError;
use crate::services::completion::{CompletionRequest, CompletionResponse, Flow, SuggestionsInput};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuggestionState {
    Loading(RequestId),
    Ready(Vec<String>),
    Failed(String),
}

/// Tips for the active instance. Scoped to one activation like the channel.
#[derive(Debug, Clone)]
pub struct SuggestionBoard {
    instance_id: InstanceId,
    tool_name: String,
    state: SuggestionState,
}

impl SuggestionBoard {
    pub fn request(
        instance_id: InstanceId,
        tool_name: &str,
        id: RequestId,
    ) -> (Self, CompletionRequest) {
        let board = Self {
            instance_id,
            tool_name: tool_name.to_string(),
            state: SuggestionState::Loading(id),
        };
        let request = board.build_request();
        (board, request)
    }

    pub fn refresh(&mut self, id: RequestId) -> CompletionRequest {
        self.state = SuggestionState::Loading(id);
        self.build_request()
    }

    fn build_request(&self) -> CompletionRequest {
        CompletionRequest::Suggestions(SuggestionsInput {
            active_tool: self.tool_name.clone(),
        })
    }

    /// `None` when `id` is not the request currently loading; otherwise
    /// whether tips were stored.
    pub fn settle(
        &mut self,
        id: RequestId,
        outcome: Result<CompletionResponse, WorkbenchError>,
    ) -> Option<bool> {
        if self.state != SuggestionState::Loading(id) {
            return None;
        }
        self.state = match outcome.and_then(|r| r.validate(Flow::Suggestions)) {
            Ok(CompletionResponse::Suggestions(out)) => SuggestionState::Ready(out.suggestions),
            Ok(other) => SuggestionState::Failed(format!("unexpected {} response", other.flow())),
            Err(WorkbenchError::CompletionServiceFailure(reason)) => SuggestionState::Failed(reason),
            Err(e) => SuggestionState::Failed(e.to_string()),
        };
        Some(matches!(self.state, SuggestionState::Ready(_)))
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, SuggestionState::Loading(_))
    }

    pub fn instance_id(&self) -> InstanceId {
        self.instance_id
    }

    pub fn state(&self) -> &SuggestionState {
        &self.state
    }

    pub fn items(&self) -> &[String] {
        match &self.state {
            SuggestionState::Ready(items) => items,
            _ => &[],
        }
    }
}
