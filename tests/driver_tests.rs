use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use workbench::kernel::event::{RequestOrigin, Settlement, SideEffect};
use workbench::kernel::message::MessageTag;
use workbench::kernel::suggestions::SuggestionState;
use workbench::services::completion::{
    CompletionRequest, CompletionResponse, DraftingOutput, Flow, PlanningOutput, SuggestionsOutput,
    SummarizeOutput,
};
use workbench::services::{CompletionService, ScriptedCompletionService};
use workbench::{CapabilityCatalog, Driver, Workbench, WorkbenchConfig};

fn driver_with(service: Arc<ScriptedCompletionService>, suggestions_enabled: bool) -> Driver {
    let config = WorkbenchConfig {
        suggestions_enabled,
        ..WorkbenchConfig::default()
    };
    let wb = Workbench::new(config, CapabilityCatalog::builtin()).unwrap();
    Driver::new(wb, service)
}

#[tokio::test]
async fn test_goal_to_document_edit_end_to_end() {
    let service = Arc::new(ScriptedCompletionService::new());
    service.push_response(CompletionResponse::Planning(PlanningOutput {
        plan_steps: vec!["1. Draft the cover letter".into()],
        identified_tool_ids: vec!["document-processor".into()],
        clarification_question: None,
        agent_thought_process: None,
    }));
    service.push_response(CompletionResponse::Drafting(DraftingOutput {
        draft: "Dear hiring manager,".into(),
    }));
    let mut driver = driver_with(service.clone(), false);

    // 1. Plan
    driver.workbench_mut().submit_goal("write a cover letter").unwrap();
    driver.run_until_idle().await;
    assert!(driver.workbench().planner().plan().is_some());

    // 2. Execute
    driver.workbench_mut().execute_plan().unwrap();
    let effects = driver.run_until_idle().await;
    assert!(effects.iter().any(|e| matches!(
        e,
        SideEffect::ActivateCapability { capability_id, .. } if capability_id == "document-processor"
    )));

    // 3. Draft
    driver.workbench_mut().send_message("start the letter").unwrap();
    assert_eq!(driver.run_until_idle().await.len(), 0);
    assert_eq!(driver.in_flight(), 0);

    let wb = driver.workbench();
    assert_eq!(wb.session().document_content(), "Dear hiring manager,");
    assert!(wb.can_revert());
    assert_eq!(service.requests_for(Flow::Planning).len(), 1);
    assert_eq!(service.requests_for(Flow::Drafting).len(), 1);

    let stats = wb.telemetry.snapshot().completion_stats;
    assert_eq!(stats.issued, 2);
    assert_eq!(stats.succeeded, 2);
    assert_eq!(stats.stale_discarded, 0);
}

#[tokio::test]
async fn test_service_error_surfaces_in_channel() {
    let service = Arc::new(ScriptedCompletionService::new());
    service.push_failure(Flow::Drafting, "503 from completion server");
    let mut driver = driver_with(service, false);

    driver.workbench_mut().open("document-processor").unwrap();
    driver.workbench_mut().update_content("A");
    driver.workbench_mut().send_message("rewrite").unwrap();
    driver.run_until_idle().await;

    let wb = driver.workbench();
    let last = wb.channel().unwrap().messages().last().unwrap();
    assert_eq!(last.tag, Some(MessageTag::Failure));
    assert!(last.text.contains("503 from completion server"));
    assert_eq!(wb.session().document_content(), "A");
    assert!(!wb.channel().unwrap().is_processing());
}

#[tokio::test]
async fn test_url_goes_to_summarization() {
    let service = Arc::new(ScriptedCompletionService::new());
    service.push_response(CompletionResponse::Summarization(SummarizeOutput {
        summary: "A page about crabs.".into(),
    }));
    service.push_response(CompletionResponse::Drafting(DraftingOutput {
        draft: "Crabs walk sideways.".into(),
    }));
    let mut driver = driver_with(service.clone(), false);

    driver.workbench_mut().open("document-processor").unwrap();
    driver.workbench_mut().update_content("notes");
    driver.workbench_mut().open("web-navigator").unwrap();

    driver.workbench_mut().send_message("https://example.com/crabs").unwrap();
    driver.run_until_idle().await;
    driver.workbench_mut().send_message("why do crabs walk sideways?").unwrap();
    driver.run_until_idle().await;

    match &service.requests_for(Flow::Summarization)[0] {
        CompletionRequest::Summarization(input) => assert_eq!(input.url, "https://example.com/crabs"),
        other => panic!("unexpected request {:?}", other),
    }
    assert_eq!(service.requests_for(Flow::Drafting).len(), 1);

    let wb = driver.workbench();
    let texts: Vec<&str> = wb.channel().unwrap().messages().iter().map(|m| m.text.as_str()).collect();
    assert!(texts.contains(&"A page about crabs."));
    assert!(texts.contains(&"Crabs walk sideways."));
    assert_eq!(wb.session().document_content(), "notes");
}

#[tokio::test]
async fn test_open_issues_one_suggestions_request() {
    let service = Arc::new(ScriptedCompletionService::new());
    service.push_response(CompletionResponse::Suggestions(SuggestionsOutput {
        suggestions: vec!["Try asking for an outline.".into()],
    }));
    let mut driver = driver_with(service.clone(), true);

    driver.workbench_mut().open("document-processor").unwrap();
    driver.run_until_idle().await;

    let requests = service.requests_for(Flow::Suggestions);
    assert_eq!(requests.len(), 1);
    match &requests[0] {
        CompletionRequest::Suggestions(input) => assert_eq!(input.active_tool, "Document Processor"),
        other => panic!("unexpected request {:?}", other),
    }
    let board = driver.workbench().suggestions().unwrap();
    assert_eq!(board.items(), ["Try asking for an outline.".to_string()]);

    // Refresh with nothing scripted stores the failure instead
    driver.workbench_mut().refresh_suggestions().unwrap();
    driver.run_until_idle().await;
    assert!(matches!(
        driver.workbench().suggestions().unwrap().state(),
        SuggestionState::Failed(_)
    ));
}

#[tokio::test]
async fn test_suggestions_for_replaced_instance_are_dropped() {
    let config = WorkbenchConfig::default();
    let mut wb = Workbench::new(config, CapabilityCatalog::builtin()).unwrap();

    wb.open("document-processor").unwrap();
    let old = wb
        .drain_effects()
        .into_iter()
        .find_map(|e| match e {
            SideEffect::RequestCompletion { ticket, .. } => Some(ticket),
            _ => None,
        })
        .unwrap();
    assert!(matches!(old.origin, RequestOrigin::Suggestions(_)));

    let current = wb.open("web-navigator").unwrap();
    assert!(!wb.settle(Settlement {
        ticket: old,
        outcome: Ok(CompletionResponse::Suggestions(SuggestionsOutput {
            suggestions: vec!["Outline first.".into()],
        })),
    }));

    let board = wb.suggestions().unwrap();
    assert_eq!(board.instance_id(), current);
    assert!(board.is_loading());
    assert!(board.items().is_empty());
    assert_eq!(wb.telemetry.snapshot().completion_stats.stale_discarded, 1);
}

#[tokio::test]
async fn test_echo_service_drives_console_flow() {
    let mut driver = driver_with(Arc::new(ScriptedCompletionService::echo()), true);

    driver.workbench_mut().submit_goal("tidy my notes").unwrap();
    driver.run_until_idle().await;
    driver.workbench_mut().execute_plan().unwrap();
    driver.workbench_mut().send_message("hello").unwrap();
    driver.run_until_idle().await;

    let wb = driver.workbench();
    assert_eq!(wb.session().active().unwrap().capability_id, "document-processor");
    assert_eq!(wb.session().document_content(), "hello");
    assert_eq!(wb.suggestions().unwrap().items().len(), 1);
    assert_eq!(driver.in_flight(), 0);
}

struct PanickingService;

#[async_trait]
impl CompletionService for PanickingService {
    async fn complete(&self, _request: CompletionRequest) -> anyhow::Result<CompletionResponse> {
        panic!("model backend crashed");
    }
}

#[tokio::test]
async fn test_panicking_service_returns_channel_to_idle() {
    let config = WorkbenchConfig {
        suggestions_enabled: false,
        ..WorkbenchConfig::default()
    };
    let wb = Workbench::new(config, CapabilityCatalog::builtin()).unwrap();
    let mut driver = Driver::new(wb, Arc::new(PanickingService));

    driver.workbench_mut().open("document-processor").unwrap();
    driver.workbench_mut().update_content("A");
    driver.workbench_mut().send_message("rewrite").unwrap();

    tokio::time::timeout(Duration::from_secs(5), driver.run_until_idle())
        .await
        .expect("driver should settle a panicked call");
    assert_eq!(driver.in_flight(), 0);

    let wb = driver.workbench();
    let channel = wb.channel().unwrap();
    assert!(!channel.is_processing());
    let last = channel.messages().last().unwrap();
    assert_eq!(last.tag, Some(MessageTag::Failure));
    assert!(last.text.contains("completion task failed"));
    assert_eq!(wb.session().document_content(), "A");
    assert_eq!(wb.telemetry.snapshot().completion_stats.failed, 1);

    // Awaiting input again
    driver.workbench_mut().send_message("try again").unwrap();
}
