use std::sync::Arc;
use tracing::{info, warn};

use super::channel::{AgentChannel, ChannelScope, TurnOutcome};
use super::event::{RequestId, RequestOrigin, RequestTicket, Settlement, SideEffect};
use super::session::{InstanceId, SessionManager};
use super::suggestions::SuggestionBoard;
use super::telemetry::{TelemetryEvent, TelemetryRecorder};
use crate::catalog::CapabilityCatalog;
use crate::config::WorkbenchConfig;
use crate::error::{WorkbenchError, WorkbenchResult};
use crate::planner::executor::PlanExecutor;
use crate::planner::goal::GoalPlanner;
use crate::planner::types::PlanOutcome;
use crate::services::completion::CompletionRequest;

/// Single-threaded orchestration core.
///
/// Operations mutate state synchronously and queue `SideEffect`s. Completion
/// calls are performed by a driver, which hands results back via `settle`.
/// The only suspension points are those calls.
pub struct Workbench {
    config: WorkbenchConfig,
    catalog: Arc<CapabilityCatalog>,
    session: SessionManager,
    channel: Option<AgentChannel>,
    suggestions: Option<SuggestionBoard>,
    planner: GoalPlanner,
    executor: PlanExecutor,
    next_request: u64,
    effects: Vec<SideEffect>,
    pub telemetry: TelemetryRecorder,
}

impl Workbench {
    pub fn new(config: WorkbenchConfig, catalog: CapabilityCatalog) -> WorkbenchResult<Self> {
        let catalog = Arc::new(catalog);
        let session = SessionManager::new(catalog.clone(), config.document_capability.clone());
        let planner = GoalPlanner::new(&config.user_name);
        let startup = config.startup_capability.clone();

        let mut workbench = Self {
            config,
            catalog,
            session,
            channel: None,
            suggestions: None,
            planner,
            executor: PlanExecutor::new(),
            next_request: 0,
            effects: Vec::new(),
            telemetry: TelemetryRecorder::new(),
        };

        if let Some(id) = startup {
            workbench.open(&id)?;
        }
        Ok(workbench)
    }

    fn issue(&mut self, origin: RequestOrigin, request: CompletionRequest, id: RequestId) {
        self.telemetry.record(TelemetryEvent::CompletionIssued {
            request_id: id,
            origin: origin.kind(),
        });
        self.effects.push(SideEffect::RequestCompletion {
            ticket: RequestTicket { id, origin },
            request,
        });
    }

    fn allocate_request(&mut self) -> RequestId {
        self.next_request += 1;
        RequestId(self.next_request)
    }

    // === Session ===

    /// Opens `capability_id` as the one active instance. Any previous
    /// channel, snapshot and suggestions are discarded.
    pub fn open(&mut self, capability_id: &str) -> WorkbenchResult<InstanceId> {
        let instance_id = self.session.open(capability_id)?.instance_id;
        let capability = self
            .catalog
            .get(capability_id)
            .cloned()
            .ok_or_else(|| WorkbenchError::UnknownCapability(capability_id.to_string()))?;

        let scope = ChannelScope {
            is_document: self.session.is_document(capability_id),
            is_summarizer: capability_id == self.config.summarization_capability,
        };
        self.channel = Some(AgentChannel::new(instance_id, capability.clone(), scope));
        self.suggestions = None;

        if let Some(abandoned) = self.planner.abandon() {
            info!(request = %abandoned, "left orchestration mode with a plan request in flight");
        }

        self.telemetry.record(TelemetryEvent::InstanceOpened { instance_id });
        self.effects.push(SideEffect::ActivateCapability {
            capability_id: capability_id.to_string(),
            instance_id,
        });

        if self.config.suggestions_enabled {
            let id = self.allocate_request();
            let (board, request) = SuggestionBoard::request(instance_id, &capability.name, id);
            self.suggestions = Some(board);
            self.issue(RequestOrigin::Suggestions(instance_id), request, id);
        }

        Ok(instance_id)
    }

    /// Back to orchestration mode. A no-op when nothing is open.
    pub fn close(&mut self) {
        if let Some(closed) = self.session.close() {
            self.channel = None;
            self.suggestions = None;
            self.telemetry.record(TelemetryEvent::InstanceClosed {
                instance_id: closed.instance_id,
            });
            self.effects.push(SideEffect::EnterOrchestration);
        }
    }

    /// Direct user edit. Only the document capability keeps content here.
    pub fn update_content(&mut self, content: &str) -> bool {
        self.session.update_content(content)
    }

    // === Agent channel ===

    pub fn send_message(&mut self, text: &str) -> WorkbenchResult<RequestId> {
        let id = RequestId(self.next_request + 1);
        let channel = self.channel.as_mut().ok_or(WorkbenchError::NoActiveInstance)?;
        let request = channel.begin_turn(id, text, self.session.document_content())?;
        let origin = RequestOrigin::Channel(channel.instance_id());
        self.next_request = id.0;
        self.issue(origin, request, id);
        Ok(id)
    }

    pub fn revert(&mut self) -> WorkbenchResult<()> {
        let channel = self.channel.as_mut().ok_or(WorkbenchError::NoActiveInstance)?;
        channel.revert(&mut self.session)?;
        let instance_id = channel.instance_id();
        self.telemetry.record(TelemetryEvent::ContentReverted { instance_id });
        Ok(())
    }

    pub fn approve(&mut self) -> WorkbenchResult<bool> {
        let channel = self.channel.as_mut().ok_or(WorkbenchError::NoActiveInstance)?;
        Ok(channel.approve())
    }

    pub fn can_revert(&self) -> bool {
        self.channel.as_ref().map(|c| c.can_revert()).unwrap_or(false)
    }

    pub fn refresh_suggestions(&mut self) -> WorkbenchResult<RequestId> {
        let instance_id = self
            .session
            .active_instance_id()
            .ok_or(WorkbenchError::NoActiveInstance)?;
        let id = self.allocate_request();
        let request = match self.suggestions.as_mut() {
            Some(board) => board.refresh(id),
            None => {
                let name = self
                    .channel
                    .as_ref()
                    .map(|c| c.capability().name.clone())
                    .unwrap_or_default();
                let (board, request) = SuggestionBoard::request(instance_id, &name, id);
                self.suggestions = Some(board);
                request
            }
        };
        self.issue(RequestOrigin::Suggestions(instance_id), request, id);
        Ok(id)
    }

    // === Orchestration ===

    pub fn submit_goal(&mut self, goal: &str) -> WorkbenchResult<RequestId> {
        if self.session.active().is_some() {
            return Err(WorkbenchError::PlannerUnavailable);
        }
        let id = RequestId(self.next_request + 1);
        let request = self.planner.submit(id, goal, &self.catalog)?;
        self.next_request = id.0;
        self.issue(RequestOrigin::Planner, request, id);
        Ok(id)
    }

    pub fn refine_plan(&mut self) {
        self.planner.refine();
    }

    /// Opens the first capability of the held plan. On failure the plan and
    /// the session are left as they were.
    pub fn execute_plan(&mut self) -> WorkbenchResult<InstanceId> {
        let target = self
            .executor
            .resolve(self.planner.plan(), &self.catalog)?
            .id
            .clone();
        let instance_id = self.open(&target)?;
        self.planner.clear_plan();
        self.telemetry.record(TelemetryEvent::PlanDispatched { instance_id });
        info!(capability = %target, instance = %instance_id, "plan dispatched");
        Ok(instance_id)
    }

    // === Results ===

    /// Applies a finished completion. Returns false when the result was
    /// stale and dropped without touching any state.
    pub fn settle(&mut self, settlement: Settlement) -> bool {
        let Settlement { ticket, outcome } = settlement;
        let outcome = outcome.map_err(WorkbenchError::CompletionServiceFailure);
        let current = self.session.active_instance_id();

        // Some(ok) once applied; ok is false when the result ended in a failure message.
        let applied = match ticket.origin {
            RequestOrigin::Channel(instance_id) => match self.channel.as_mut() {
                Some(channel) if current == Some(instance_id) && channel.instance_id() == instance_id => {
                    match channel.settle(ticket.id, outcome, &mut self.session) {
                        Some(TurnOutcome::Failed(reason)) => {
                            warn!(request = %ticket.id, %reason, "agent turn failed");
                            Some(false)
                        }
                        Some(_) => Some(true),
                        None => None,
                    }
                }
                _ => None,
            },
            RequestOrigin::Suggestions(instance_id) => match self.suggestions.as_mut() {
                Some(board) if current == Some(instance_id) && board.instance_id() == instance_id => {
                    board.settle(ticket.id, outcome)
                }
                _ => None,
            },
            RequestOrigin::Planner if current.is_none() => {
                self.planner.settle(ticket.id, outcome).map(|result| {
                    self.telemetry.record(TelemetryEvent::PlanOutcome { kind: result.kind() });
                    if let PlanOutcome::Failed(reason) = &result {
                        warn!(request = %ticket.id, %reason, "planning request failed");
                        return false;
                    }
                    true
                })
            }
            RequestOrigin::Planner => None,
        };

        match applied {
            Some(ok) => {
                self.telemetry.record(TelemetryEvent::CompletionSettled {
                    request_id: ticket.id,
                    origin: ticket.origin.kind(),
                    ok,
                });
                true
            }
            None => {
                info!(request = %ticket.id, origin = ?ticket.origin.kind(), "discarded stale completion");
                self.telemetry.record(TelemetryEvent::StaleResultDiscarded {
                    request_id: ticket.id,
                    origin: ticket.origin.kind(),
                });
                false
            }
        }
    }

    /// Hands queued side effects to the driver.
    pub fn drain_effects(&mut self) -> Vec<SideEffect> {
        std::mem::take(&mut self.effects)
    }

    // === Read-only views ===

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn channel(&self) -> Option<&AgentChannel> {
        self.channel.as_ref()
    }

    pub fn suggestions(&self) -> Option<&SuggestionBoard> {
        self.suggestions.as_ref()
    }

    pub fn planner(&self) -> &GoalPlanner {
        &self.planner
    }

    pub fn catalog(&self) -> &CapabilityCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &WorkbenchConfig {
        &self.config
    }

    pub fn in_orchestration(&self) -> bool {
        self.session.active().is_none()
    }
}
