//! Completion Service contract.
//!
//! The service is a black box that maps a structured request to a
//! structured result. Field names on the wire are camelCase.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::WorkbenchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Flow {
    Drafting,
    Summarization,
    Planning,
    Suggestions,
}

impl fmt::Display for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Flow::Drafting => "drafting",
            Flow::Summarization => "summarization",
            Flow::Planning => "planning",
            Flow::Suggestions => "suggestions",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftingInput {
    pub prompt: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftingOutput {
    pub draft: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummarizeInput {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummarizeOutput {
    pub summary: String,
}

/// Catalog projection handed to the planner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInfo {
    pub id: String,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanningInput {
    pub user_goal: String,
    pub available_tools: Vec<ToolInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanningOutput {
    pub plan_steps: Vec<String>,
    pub identified_tool_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clarification_question: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_thought_process: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionsInput {
    pub active_tool: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionsOutput {
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CompletionRequest {
    Drafting(DraftingInput),
    Summarization(SummarizeInput),
    Planning(PlanningInput),
    Suggestions(SuggestionsInput),
}

impl CompletionRequest {
    pub fn flow(&self) -> Flow {
        match self {
            CompletionRequest::Drafting(_) => Flow::Drafting,
            CompletionRequest::Summarization(_) => Flow::Summarization,
            CompletionRequest::Planning(_) => Flow::Planning,
            CompletionRequest::Suggestions(_) => Flow::Suggestions,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CompletionResponse {
    Drafting(DraftingOutput),
    Summarization(SummarizeOutput),
    Planning(PlanningOutput),
    Suggestions(SuggestionsOutput),
}

impl CompletionResponse {
    pub fn flow(&self) -> Flow {
        match self {
            CompletionResponse::Drafting(_) => Flow::Drafting,
            CompletionResponse::Summarization(_) => Flow::Summarization,
            CompletionResponse::Planning(_) => Flow::Planning,
            CompletionResponse::Suggestions(_) => Flow::Suggestions,
        }
    }

    /// Rejects responses of the wrong shape and empty payloads.
    ///
    /// A planning result with neither steps nor a question is NOT rejected
    /// here; the planner reports that case as `EmptyPlanResult`.
    pub fn validate(self, expected: Flow) -> Result<Self, WorkbenchError> {
        if self.flow() != expected {
            return Err(WorkbenchError::CompletionServiceFailure(format!(
                "expected a {} response, got {}",
                expected,
                self.flow()
            )));
        }
        let empty = match &self {
            CompletionResponse::Drafting(out) => out.draft.trim().is_empty(),
            CompletionResponse::Summarization(out) => out.summary.trim().is_empty(),
            CompletionResponse::Suggestions(out) => out.suggestions.is_empty(),
            CompletionResponse::Planning(_) => false,
        };
        if empty {
            return Err(WorkbenchError::CompletionServiceFailure(format!(
                "empty {} response",
                expected
            )));
        }
        Ok(self)
    }
}

/// The narrow seam to whatever produces completions.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> anyhow::Result<CompletionResponse>;
}
