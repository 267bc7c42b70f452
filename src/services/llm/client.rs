use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use crate::config::CompletionConfig;
use crate::services::completion::{
    CompletionRequest, CompletionResponse, CompletionService, DraftingOutput, PlanningOutput,
    SuggestionsOutput, SummarizeOutput,
};

/// Talks to a llama-server style `/completion` endpoint, constraining the
/// output with a JSON schema per flow.
#[derive(Clone)]
pub struct HttpCompletionService {
    client: Client,
    base_url: String,
    n_predict: usize,
    temperature: f32,
}

#[derive(Serialize)]
struct ServerRequest {
    prompt: String,
    stream: bool,
    n_predict: usize,
    temperature: f32,
    json_schema: Value,
}

#[derive(Deserialize)]
struct ServerResponse {
    content: String,
}

impl HttpCompletionService {
    pub fn new(config: &CompletionConfig) -> Result<Self> {
        let mut builder = Client::builder();
        // No timeout unless configured.
        if let Some(ms) = config.timeout_ms {
            builder = builder.timeout(Duration::from_millis(ms));
        }
        Ok(Self {
            client: builder.build().context("building HTTP client")?,
            base_url: config.endpoint.trim_end_matches('/').to_string(),
            n_predict: config.n_predict,
            temperature: config.temperature,
        })
    }

    fn prompt_and_schema(request: &CompletionRequest) -> (String, Value) {
        match request {
            CompletionRequest::Drafting(input) => (
                format!(
                    "You are an assistant helping a user draft a document.\n\
                     Based on the user's prompt, generate the document draft.\n\
                     Prompt: {}\nReturn ONLY valid JSON.",
                    input.prompt
                ),
                json!({
                    "type": "object",
                    "properties": { "draft": { "type": "string" } },
                    "required": ["draft"]
                }),
            ),
            CompletionRequest::Summarization(input) => (
                format!(
                    "You are an expert web content summarizer.\n\
                     Summarize the content of the webpage at this URL.\n\
                     URL: {}\nReturn ONLY valid JSON.",
                    input.url
                ),
                json!({
                    "type": "object",
                    "properties": { "summary": { "type": "string" } },
                    "required": ["summary"]
                }),
            ),
            CompletionRequest::Planning(input) => {
                let tools: Vec<String> = input
                    .available_tools
                    .iter()
                    .map(|t| format!("- ID: {}, Name: \"{}\", Description: \"{}\"", t.id, t.name, t.description))
                    .collect();
                (
                    format!(
                        "You are an orchestration agent. Plan the user's goal using the available tools. \
                         You do not execute anything.\n\
                         User's Goal:\n{}\n\nAvailable Tools:\n{}\n\n\
                         Identify up to 3 relevant tool ids in order of use and at most 5 actionable steps. \
                         If the goal is too vague, ask one clarification question instead and leave the steps empty. \
                         Explain your reasoning in 1-2 sentences.\nReturn ONLY valid JSON.",
                        input.user_goal,
                        tools.join("\n")
                    ),
                    json!({
                        "type": "object",
                        "properties": {
                            "planSteps": { "type": "array", "items": { "type": "string" } },
                            "identifiedToolIds": { "type": "array", "items": { "type": "string" } },
                            "clarificationQuestion": { "type": "string" },
                            "agentThoughtProcess": { "type": "string" }
                        },
                        "required": ["planSteps", "identifiedToolIds"]
                    }),
                )
            }
            CompletionRequest::Suggestions(input) => (
                format!(
                    "Provide 3-5 short suggestions that help the user discover features of the \
                     currently active tool and optimize their workflow.\n\
                     Current Tool: {}\nReturn ONLY valid JSON.",
                    input.active_tool
                ),
                json!({
                    "type": "object",
                    "properties": {
                        "suggestions": { "type": "array", "items": { "type": "string" } }
                    },
                    "required": ["suggestions"]
                }),
            ),
        }
    }

    /// The server wraps the model output in `content`; the model output is
    /// itself the JSON document for the flow.
    fn parse_content(request: &CompletionRequest, content: &str) -> Result<CompletionResponse> {
        let content = content.trim();
        if content.is_empty() {
            return Err(anyhow!("empty completion content"));
        }
        let parsed = match request {
            CompletionRequest::Drafting(_) => {
                CompletionResponse::Drafting(serde_json::from_str::<DraftingOutput>(content)?)
            }
            CompletionRequest::Summarization(_) => {
                CompletionResponse::Summarization(serde_json::from_str::<SummarizeOutput>(content)?)
            }
            CompletionRequest::Planning(_) => {
                CompletionResponse::Planning(serde_json::from_str::<PlanningOutput>(content)?)
            }
            CompletionRequest::Suggestions(_) => {
                CompletionResponse::Suggestions(serde_json::from_str::<SuggestionsOutput>(content)?)
            }
        };
        Ok(parsed)
    }
}

#[async_trait]
impl CompletionService for HttpCompletionService {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let (prompt, json_schema) = Self::prompt_and_schema(&request);
        let body = ServerRequest {
            prompt,
            stream: false,
            n_predict: self.n_predict,
            temperature: self.temperature,
            json_schema,
        };

        debug!(flow = %request.flow(), "posting completion request");
        let response = self
            .client
            .post(format!("{}/completion", self.base_url))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!("completion server error: {}", response.status()));
        }

        let server: ServerResponse = response.json().await?;
        Self::parse_content(&request, &server.content)
            .with_context(|| format!("malformed {} response", request.flow()))
    }
}
