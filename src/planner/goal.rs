use tracing::{info, warn};

use super::types::{Plan, PlanOutcome};
use crate::catalog::CapabilityCatalog;
use crate::error::{WorkbenchError, WorkbenchResult};
use crate::kernel::event::RequestId;
use crate::kernel::message::{AgentMessage, MessageKind, MessageLog, MessageTag};
use crate::services::completion::{CompletionRequest, CompletionResponse, Flow, PlanningInput};

const UNABLE_TO_PLAN: &str =
    "I couldn't put a plan together for that. Could you clarify what you'd like to achieve?";
const REFINE_PROMPT: &str =
    "Sure, tell me more about your goal and I'll refine the plan.";

/// Goal -> plan conversation used while no tool is active.
#[derive(Debug, Clone)]
pub struct GoalPlanner {
    log: MessageLog,
    plan: Option<Plan>,
    in_flight: Option<RequestId>,
}

impl GoalPlanner {
    pub fn new(user_name: &str) -> Self {
        let mut log = MessageLog::new();
        log.agent(format!("Hello {}, how can I help you orchestrate your day?", user_name));
        Self {
            log,
            plan: None,
            in_flight: None,
        }
    }

    pub fn submit(
        &mut self,
        id: RequestId,
        goal: &str,
        catalog: &CapabilityCatalog,
    ) -> WorkbenchResult<CompletionRequest> {
        if self.in_flight.is_some() {
            return Err(WorkbenchError::PlannerBusy);
        }
        let goal = goal.trim();
        if goal.is_empty() {
            return Err(WorkbenchError::EmptyInput);
        }

        self.log.user(goal);
        self.in_flight = Some(id);
        Ok(CompletionRequest::Planning(PlanningInput {
            user_goal: goal.to_string(),
            available_tools: catalog.tool_infos(),
        }))
    }

    /// `None` when `id` is not the request in flight.
    pub fn settle(
        &mut self,
        id: RequestId,
        outcome: Result<CompletionResponse, WorkbenchError>,
    ) -> Option<PlanOutcome> {
        if self.in_flight != Some(id) {
            return None;
        }
        self.in_flight = None;
        self.plan = None;

        let output = match outcome.and_then(|r| r.validate(Flow::Planning)) {
            Ok(CompletionResponse::Planning(out)) => out,
            Ok(other) => return Some(self.fail(format!("unexpected {} response", other.flow()))),
            Err(WorkbenchError::CompletionServiceFailure(reason)) => return Some(self.fail(reason)),
            Err(e) => return Some(self.fail(e.to_string())),
        };

        let plan = Plan::from_output(output);
        if let Some(question) = plan.clarification_question.clone() {
            self.log.push(AgentMessage::tagged(
                MessageKind::Agent,
                question.as_str(),
                MessageTag::Clarification,
            ));
            info!("planner asked for clarification");
            return Some(PlanOutcome::Clarification(question));
        }

        if plan.is_actionable() {
            self.log.push(AgentMessage::tagged(MessageKind::Agent, plan.render(), MessageTag::Plan));
            if let Some(rationale) = &plan.rationale {
                self.log.log(rationale.as_str());
            }
            info!(
                steps = plan.steps.len(),
                capabilities = plan.identified_capability_ids.len(),
                "plan accepted"
            );
            self.plan = Some(plan.clone());
            return Some(PlanOutcome::Planned(plan));
        }

        warn!("{}", WorkbenchError::EmptyPlanResult);
        self.log.agent(UNABLE_TO_PLAN);
        Some(PlanOutcome::Empty)
    }

    fn fail(&mut self, reason: String) -> PlanOutcome {
        warn!(%reason, "planning failed");
        self.log.push(AgentMessage::tagged(
            MessageKind::Agent,
            format!("Sorry, I couldn't plan that: {}", reason),
            MessageTag::Failure,
        ));
        PlanOutcome::Failed(reason)
    }

    pub fn refine(&mut self) {
        self.plan = None;
        self.log.agent(REFINE_PROMPT);
    }

    /// Drops the in-flight request so its result will be ignored.
    pub fn abandon(&mut self) -> Option<RequestId> {
        self.in_flight.take()
    }

    pub fn clear_plan(&mut self) {
        self.plan = None;
    }

    pub fn plan(&self) -> Option<&Plan> {
        self.plan.as_ref()
    }

    pub fn is_processing(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn messages(&self) -> &[AgentMessage] {
        self.log.as_slice()
    }
}
