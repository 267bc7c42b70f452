use workbench::kernel::event::{RequestOrigin, RequestTicket, Settlement, SideEffect};
use workbench::kernel::message::{MessageKind, MessageTag};
use workbench::services::completion::{CompletionRequest, CompletionResponse, PlanningOutput};
use workbench::{CapabilityCatalog, Workbench, WorkbenchConfig, WorkbenchError};

fn quiet_workbench() -> Workbench {
    let config = WorkbenchConfig {
        user_name: "Ada".into(),
        suggestions_enabled: false,
        ..WorkbenchConfig::default()
    };
    Workbench::new(config, CapabilityCatalog::builtin()).unwrap()
}

fn planner_ticket(wb: &mut Workbench) -> (RequestTicket, CompletionRequest) {
    wb.drain_effects()
        .into_iter()
        .find_map(|e| match e {
            SideEffect::RequestCompletion { ticket, request } if ticket.origin == RequestOrigin::Planner => {
                Some((ticket, request))
            }
            _ => None,
        })
        .unwrap()
}

fn planned(ticket: RequestTicket, output: PlanningOutput) -> Settlement {
    Settlement {
        ticket,
        outcome: Ok(CompletionResponse::Planning(output)),
    }
}

fn hold_plan(wb: &mut Workbench, ids: &[&str]) {
    wb.submit_goal("write a report from this article").unwrap();
    let (ticket, _) = planner_ticket(wb);
    assert!(wb.settle(planned(
        ticket,
        PlanningOutput {
            plan_steps: vec!["1. Read the article".into(), "2. Draft the report".into()],
            identified_tool_ids: ids.iter().map(|s| s.to_string()).collect(),
            clarification_question: None,
            agent_thought_process: Some("Reading first, then writing.".into()),
        },
    )));
}

#[tokio::test]
async fn test_planner_greets_user() {
    let wb = quiet_workbench();
    let messages = wb.planner().messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].kind, MessageKind::Agent);
    assert_eq!(messages[0].text, "Hello Ada, how can I help you orchestrate your day?");
}

#[tokio::test]
async fn test_tokyo_clarification() {
    let mut wb = quiet_workbench();

    // 1. Submit the goal
    wb.submit_goal("plan a trip to Tokyo").unwrap();
    let (ticket, request) = planner_ticket(&mut wb);
    match request {
        CompletionRequest::Planning(input) => {
            assert_eq!(input.user_goal, "plan a trip to Tokyo");
            assert_eq!(input.available_tools.len(), 10);
        }
        other => panic!("unexpected request {:?}", other),
    }
    let before = wb.planner().messages().len();

    // 2. Service asks for dates
    let question = "What dates are you planning to travel?";
    assert!(wb.settle(planned(
        ticket,
        PlanningOutput {
            plan_steps: vec![],
            identified_tool_ids: vec![],
            clarification_question: Some(question.into()),
            agent_thought_process: None,
        },
    )));

    // 3. Exactly one new agent message, no plan retained
    let messages = wb.planner().messages();
    assert_eq!(messages.len(), before + 1);
    let last = messages.last().unwrap();
    assert_eq!(last.kind, MessageKind::Agent);
    assert_eq!(last.text, question);
    assert_eq!(last.tag, Some(MessageTag::Clarification));
    assert!(wb.planner().plan().is_none());

    assert_eq!(wb.execute_plan().unwrap_err(), WorkbenchError::NoPlanHeld);
    assert!(wb.in_orchestration());
    assert_eq!(wb.telemetry.snapshot().planning_stats.clarifications, 1);
}

#[tokio::test]
async fn test_execute_opens_first_capability() {
    let mut wb = quiet_workbench();
    hold_plan(&mut wb, &["document-processor", "web-navigator"]);

    let plan = wb.planner().plan().unwrap();
    assert_eq!(plan.steps.len(), 2);
    assert_eq!(plan.rationale.as_deref(), Some("Reading first, then writing."));

    let messages = wb.planner().messages();
    let plan_message = &messages[messages.len() - 2];
    assert_eq!(plan_message.tag, Some(MessageTag::Plan));
    assert!(plan_message.text.starts_with("Here's a proposed plan:"));
    assert_eq!(messages.last().unwrap().kind, MessageKind::Log);

    let instance = wb.execute_plan().unwrap();
    let active = wb.session().active().unwrap();
    assert_eq!(active.capability_id, "document-processor");
    assert_eq!(active.instance_id, instance);
    assert!(wb.planner().plan().is_none());
    assert_eq!(wb.telemetry.snapshot().planning_stats.dispatched, 1);
}

#[tokio::test]
async fn test_execute_with_unknown_first_id_keeps_plan() {
    let mut wb = quiet_workbench();
    hold_plan(&mut wb, &["teleporter", "web-navigator"]);

    assert_eq!(
        wb.execute_plan().unwrap_err(),
        WorkbenchError::UnknownCapability("teleporter".into())
    );
    assert!(wb.planner().plan().is_some());
    assert!(wb.in_orchestration());
}

#[tokio::test]
async fn test_plan_without_ids_cannot_execute() {
    let mut wb = quiet_workbench();
    hold_plan(&mut wb, &[]);
    assert!(wb.planner().plan().is_some());
    assert_eq!(wb.execute_plan().unwrap_err(), WorkbenchError::NoPlanHeld);
}

#[tokio::test]
async fn test_empty_plan_result_gives_generic_message() {
    let mut wb = quiet_workbench();
    wb.submit_goal("do the thing").unwrap();
    let (ticket, _) = planner_ticket(&mut wb);
    let before = wb.planner().messages().len();

    assert!(wb.settle(planned(ticket, PlanningOutput::default())));

    assert_eq!(wb.planner().messages().len(), before + 1);
    assert_eq!(wb.planner().messages().last().unwrap().kind, MessageKind::Agent);
    assert!(wb.planner().plan().is_none());
    assert!(!wb.planner().is_processing());
    assert_eq!(wb.telemetry.snapshot().planning_stats.empty, 1);
}

#[tokio::test]
async fn test_planning_failure_is_reported() {
    let mut wb = quiet_workbench();
    hold_plan(&mut wb, &["document-processor"]);

    wb.submit_goal("something else").unwrap();
    let (ticket, _) = planner_ticket(&mut wb);
    wb.settle(Settlement {
        ticket,
        outcome: Err("model overloaded".into()),
    });

    let last = wb.planner().messages().last().unwrap();
    assert_eq!(last.tag, Some(MessageTag::Failure));
    assert!(last.text.contains("model overloaded"));
    assert!(wb.planner().plan().is_none(), "old plan is not kept after a new submit");
    assert_eq!(wb.execute_plan().unwrap_err(), WorkbenchError::NoPlanHeld);
}

#[tokio::test]
async fn test_submit_rules() {
    let mut wb = quiet_workbench();
    assert_eq!(wb.submit_goal("  ").unwrap_err(), WorkbenchError::EmptyInput);

    wb.submit_goal("first goal").unwrap();
    assert_eq!(wb.submit_goal("second goal").unwrap_err(), WorkbenchError::PlannerBusy);

    wb.open("settings").unwrap();
    assert_eq!(
        wb.submit_goal("third goal").unwrap_err(),
        WorkbenchError::PlannerUnavailable
    );
}

#[tokio::test]
async fn test_plan_arriving_after_tool_opened_is_dropped() {
    let mut wb = quiet_workbench();
    wb.submit_goal("organise my week").unwrap();
    let (ticket, _) = planner_ticket(&mut wb);

    wb.open("task-manager").unwrap();
    wb.close();
    let before = wb.planner().messages().len();

    assert!(!wb.settle(planned(
        ticket,
        PlanningOutput {
            plan_steps: vec!["1. List tasks".into()],
            identified_tool_ids: vec!["task-manager".into()],
            ..PlanningOutput::default()
        },
    )));
    assert_eq!(wb.planner().messages().len(), before);
    assert!(wb.planner().plan().is_none());

    // The planner accepts new goals again
    wb.submit_goal("organise my week").unwrap();
}

#[tokio::test]
async fn test_refine_drops_plan() {
    let mut wb = quiet_workbench();
    hold_plan(&mut wb, &["document-processor"]);
    let before = wb.planner().messages().len();

    wb.refine_plan();
    assert!(wb.planner().plan().is_none());
    assert_eq!(wb.planner().messages().len(), before + 1);
    assert_eq!(wb.execute_plan().unwrap_err(), WorkbenchError::NoPlanHeld);
}

#[tokio::test]
async fn test_oversized_plan_is_kept_as_given() {
    let mut wb = quiet_workbench();
    wb.submit_goal("run my whole quarter").unwrap();
    let (ticket, _) = planner_ticket(&mut wb);

    let steps: Vec<String> = (1..=9).map(|i| format!("{}. step {}", i, i)).collect();
    let ids = vec![
        "task-manager",
        "spreadsheet-tool",
        "document-processor",
        "presentation-builder",
        "comms-hub",
    ];
    assert!(wb.settle(planned(
        ticket,
        PlanningOutput {
            plan_steps: steps.clone(),
            identified_tool_ids: ids.iter().map(|s| s.to_string()).collect(),
            ..PlanningOutput::default()
        },
    )));

    let plan = wb.planner().plan().unwrap();
    assert_eq!(plan.steps, steps);
    assert_eq!(plan.identified_capability_ids, ids);

    wb.execute_plan().unwrap();
    assert_eq!(wb.session().active().unwrap().capability_id, "task-manager");
    assert_eq!(wb.telemetry.snapshot().completion_stats.succeeded, 1);
}

#[tokio::test]
async fn test_planning_failure_counts_as_failed_completion() {
    let mut wb = quiet_workbench();
    wb.submit_goal("anything").unwrap();
    let (ticket, _) = planner_ticket(&mut wb);
    wb.settle(Settlement {
        ticket,
        outcome: Err("timeout".into()),
    });

    let snap = wb.telemetry.snapshot();
    assert_eq!(snap.completion_stats.failed, 1);
    assert_eq!(snap.planning_stats.failed, 1);
}
