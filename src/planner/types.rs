use serde::{Deserialize, Serialize};

use crate::services::completion::PlanningOutput;

/// Either a clarification request or an actionable plan. When the service
/// sends both, the clarification wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub steps: Vec<String>,
    pub identified_capability_ids: Vec<String>,
    pub clarification_question: Option<String>,
    pub rationale: Option<String>,
}

impl Plan {
    pub fn from_output(out: PlanningOutput) -> Self {
        let clarification_question = out
            .clarification_question
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty());
        let rationale = out
            .agent_thought_process
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());

        if clarification_question.is_some() {
            return Self {
                steps: Vec::new(),
                identified_capability_ids: Vec::new(),
                clarification_question,
                rationale,
            };
        }

        Self {
            steps: out
                .plan_steps
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            identified_capability_ids: out.identified_tool_ids,
            clarification_question: None,
            rationale,
        }
    }

    pub fn is_clarification(&self) -> bool {
        self.clarification_question.is_some()
    }

    pub fn is_actionable(&self) -> bool {
        !self.is_clarification() && !self.steps.is_empty()
    }

    pub fn first_capability(&self) -> Option<&str> {
        self.identified_capability_ids.first().map(String::as_str)
    }

    /// Text of the agent message that presents this plan.
    pub fn render(&self) -> String {
        let mut text = String::from("Here's a proposed plan:");
        for step in &self.steps {
            text.push('\n');
            text.push_str(step);
        }
        text
    }
}

/// How a planning round ended.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanOutcome {
    Clarification(String),
    Planned(Plan),
    Empty,
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlanOutcomeKind {
    Clarification,
    Planned,
    Empty,
    Failed,
}

impl PlanOutcome {
    pub fn kind(&self) -> PlanOutcomeKind {
        match self {
            PlanOutcome::Clarification(_) => PlanOutcomeKind::Clarification,
            PlanOutcome::Planned(_) => PlanOutcomeKind::Planned,
            PlanOutcome::Empty => PlanOutcomeKind::Empty,
            PlanOutcome::Failed(_) => PlanOutcomeKind::Failed,
        }
    }
}
