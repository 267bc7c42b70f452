use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use workbench::kernel::event::SideEffect;
use workbench::kernel::message::{AgentMessage, MessageKind};
use workbench::kernel::session::InstanceId;
use workbench::kernel::suggestions::SuggestionState;
use workbench::services::{CompletionService, HttpCompletionService, ScriptedCompletionService};
use workbench::{Driver, Workbench, WorkbenchConfig};

const ENV_OFFLINE: &str = "WORKBENCH_OFFLINE";

// Loop wakeups (never touch the workbench directly)
enum ConsoleEvent {
    Line(Option<String>),
    Settled(Option<bool>),
    Shutdown,
}

/// Tracks how much of each log has already been printed.
#[derive(Default)]
struct Cursor {
    planner: usize,
    channel: Option<(InstanceId, usize)>,
    tips_shown: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = WorkbenchConfig::load(config_path.as_deref())?;
    let catalog = config.catalog()?;

    let service: Arc<dyn CompletionService> = if std::env::var(ENV_OFFLINE).is_ok() {
        tracing::info!("offline mode: completions echo their input");
        Arc::new(ScriptedCompletionService::echo())
    } else {
        tracing::info!(endpoint = %config.completion.endpoint, "using completion server");
        Arc::new(HttpCompletionService::new(&config.completion)?)
    };

    let workbench = Workbench::new(config, catalog)?;
    let mut driver = Driver::new(workbench, service);

    let token = CancellationToken::new();
    let ctrl_c = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut cursor = Cursor::default();

    print_help();
    present(&mut driver, &mut cursor);

    loop {
        let event = tokio::select! {
            line = lines.next_line() => ConsoleEvent::Line(line.ok().flatten()),
            settled = driver.next_settlement(), if driver.in_flight() > 0 => ConsoleEvent::Settled(settled),
            _ = token.cancelled() => ConsoleEvent::Shutdown,
        };

        match event {
            ConsoleEvent::Line(None) | ConsoleEvent::Shutdown => break,
            ConsoleEvent::Line(Some(line)) => {
                if !handle_line(&mut driver, line.trim()) {
                    break;
                }
            }
            ConsoleEvent::Settled(_) => {}
        }
        present(&mut driver, &mut cursor);
    }

    let stats = driver.workbench().telemetry.snapshot();
    tracing::info!(
        issued = stats.completion_stats.issued,
        stale = stats.completion_stats.stale_discarded,
        plans = stats.planning_stats.plans,
        "workbench shutting down"
    );
    Ok(())
}

/// Returns false when the user asked to quit.
fn handle_line(driver: &mut Driver, line: &str) -> bool {
    let (command, arg) = match line.split_once(' ') {
        Some((c, a)) => (c, a.trim()),
        None => (line, ""),
    };
    let wb = driver.workbench_mut();

    let result = match command {
        "" => Ok(()),
        "/quit" => return false,
        "/help" => {
            print_help();
            Ok(())
        }
        "/tools" => {
            for cap in wb.catalog().iter() {
                println!("  {:<22} {} [{}]", cap.id, cap.description, cap.category);
            }
            let quick: Vec<&str> = wb.catalog().quick_access().into_iter().map(|c| c.id.as_str()).collect();
            println!("  quick access: {}", quick.join(", "));
            Ok(())
        }
        "/open" => wb.open(arg).map(|_| ()),
        "/close" => {
            wb.close();
            Ok(())
        }
        "/edit" => {
            if !wb.update_content(arg) {
                println!("(only the document capability keeps content)");
            }
            Ok(())
        }
        "/doc" => {
            println!("----\n{}\n----", wb.session().document_content());
            Ok(())
        }
        "/undo" => wb.revert(),
        "/approve" => wb.approve().map(|_| ()),
        "/suggest" => wb.refresh_suggestions().map(|_| ()),
        "/execute" => wb.execute_plan().map(|_| ()),
        "/refine" => {
            wb.refine_plan();
            Ok(())
        }
        "/stats" => {
            println!("{:#?}", wb.telemetry.snapshot());
            Ok(())
        }
        _ if command.starts_with('/') => {
            println!("unknown command {}", command);
            Ok(())
        }
        _ if wb.in_orchestration() => wb.submit_goal(line).map(|_| ()),
        _ => wb.send_message(line).map(|_| ()),
    };

    if let Err(e) = result {
        println!("! {}", e);
    }
    true
}

/// Spawns pending calls and prints whatever is new.
fn present(driver: &mut Driver, cursor: &mut Cursor) {
    for effect in driver.pump() {
        match effect {
            SideEffect::ActivateCapability { capability_id, instance_id } => {
                println!("== {} ({}) ==", capability_id, instance_id);
            }
            SideEffect::EnterOrchestration => println!("== orchestration =="),
            SideEffect::RequestCompletion { .. } => {}
        }
    }

    let wb = driver.workbench();
    let planner = wb.planner().messages();
    if wb.in_orchestration() {
        print_messages(&planner[cursor.planner.min(planner.len())..]);
        cursor.planner = planner.len();
    }

    match wb.channel() {
        Some(channel) => {
            let id = channel.instance_id();
            let seen = match cursor.channel {
                Some((current, n)) if current == id => n,
                _ => 0,
            };
            let messages = channel.messages();
            print_messages(&messages[seen.min(messages.len())..]);
            cursor.channel = Some((id, messages.len()));
        }
        None => cursor.channel = None,
    }

    match wb.suggestions().map(|b| b.state()) {
        Some(SuggestionState::Ready(items)) if !cursor.tips_shown => {
            for tip in items {
                println!("  tip: {}", tip);
            }
            cursor.tips_shown = true;
        }
        Some(SuggestionState::Failed(reason)) if !cursor.tips_shown => {
            println!("  (no tips: {})", reason);
            cursor.tips_shown = true;
        }
        Some(SuggestionState::Loading(_)) | None => cursor.tips_shown = false,
        _ => {}
    }
}

fn print_messages(messages: &[AgentMessage]) {
    for m in messages {
        let who = match m.kind {
            MessageKind::User => "you",
            MessageKind::Agent => "agent",
            MessageKind::Log => "log",
        };
        println!("[{} {}] {}", m.timestamp.format("%H:%M:%S"), who, m.text);
    }
}

fn print_help() {
    println!("Commands: /tools /open <id> /close /edit <text> /doc /undo /approve");
    println!("          /suggest /execute /refine /stats /quit");
    println!("Anything else goes to the planner, or to the open tool's agent.");
}
