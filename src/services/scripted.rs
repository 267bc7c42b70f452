use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use crate::services::completion::{
    CompletionRequest, CompletionResponse, CompletionService, DraftingOutput, Flow,
    PlanningOutput, SuggestionsOutput, SummarizeOutput,
};

/// What to answer when nothing is queued for a flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    Fail,
    Echo,
}

/// Offline Completion Service: replays queued outcomes per flow and keeps
/// every request it saw.
pub struct ScriptedCompletionService {
    queued: Mutex<HashMap<Flow, VecDeque<Result<CompletionResponse, String>>>>,
    seen: Mutex<Vec<CompletionRequest>>,
    fallback: Fallback,
}

impl ScriptedCompletionService {
    pub fn new() -> Self {
        Self::with_fallback(Fallback::Fail)
    }

    pub fn echo() -> Self {
        Self::with_fallback(Fallback::Echo)
    }

    pub fn with_fallback(fallback: Fallback) -> Self {
        Self {
            queued: Mutex::new(HashMap::new()),
            seen: Mutex::new(Vec::new()),
            fallback,
        }
    }

    pub fn push_response(&self, response: CompletionResponse) {
        self.enqueue(response.flow(), Ok(response));
    }

    pub fn push_failure(&self, flow: Flow, reason: &str) {
        self.enqueue(flow, Err(reason.to_string()));
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.seen.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn requests_for(&self, flow: Flow) -> Vec<CompletionRequest> {
        self.requests().into_iter().filter(|r| r.flow() == flow).collect()
    }

    fn enqueue(&self, flow: Flow, outcome: Result<CompletionResponse, String>) {
        if let Ok(mut q) = self.queued.lock() {
            q.entry(flow).or_default().push_back(outcome);
        }
    }

    fn echo_response(request: &CompletionRequest) -> CompletionResponse {
        match request {
            CompletionRequest::Drafting(input) => CompletionResponse::Drafting(DraftingOutput {
                draft: input.prompt.clone(),
            }),
            CompletionRequest::Summarization(input) => {
                CompletionResponse::Summarization(SummarizeOutput {
                    summary: format!("Summary of {}", input.url),
                })
            }
            CompletionRequest::Planning(input) => {
                let first = input.available_tools.first();
                CompletionResponse::Planning(PlanningOutput {
                    plan_steps: first
                        .map(|t| vec![format!("1. Use '{}' for: {}", t.name, input.user_goal)])
                        .unwrap_or_default(),
                    identified_tool_ids: first.map(|t| vec![t.id.clone()]).unwrap_or_default(),
                    clarification_question: None,
                    agent_thought_process: None,
                })
            }
            CompletionRequest::Suggestions(input) => {
                CompletionResponse::Suggestions(SuggestionsOutput {
                    suggestions: vec![format!("Ask the {} agent what it can do.", input.active_tool)],
                })
            }
        }
    }
}

impl Default for ScriptedCompletionService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CompletionService for ScriptedCompletionService {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let flow = request.flow();
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(request.clone());
        }

        let next = self
            .queued
            .lock()
            .ok()
            .and_then(|mut q| q.get_mut(&flow).and_then(|items| items.pop_front()));

        match next {
            Some(Ok(response)) => Ok(response),
            Some(Err(reason)) => Err(anyhow!(reason)),
            None => match self.fallback {
                Fallback::Echo => Ok(Self::echo_response(&request)),
                Fallback::Fail => Err(anyhow!("no scripted {} response", flow)),
            },
        }
    }
}
