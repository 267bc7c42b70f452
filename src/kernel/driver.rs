use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::event::{RequestId, Settlement, SideEffect};
use super::workbench::Workbench;
use crate::services::completion::CompletionService;

/// Executes the workbench's side effects.
///
/// Completion calls run as spawned tasks and report back over a channel.
/// The workbench is only touched from the task that owns the driver, so
/// results are applied one at a time.
pub struct Driver {
    workbench: Workbench,
    service: Arc<dyn CompletionService>,
    tx: mpsc::Sender<Settlement>,
    rx: mpsc::Receiver<Settlement>,
    in_flight: HashSet<RequestId>,
}

impl Driver {
    pub fn new(workbench: Workbench, service: Arc<dyn CompletionService>) -> Self {
        let (tx, rx) = mpsc::channel(100);
        Self {
            workbench,
            service,
            tx,
            rx,
            in_flight: HashSet::new(),
        }
    }

    /// Spawns every queued completion call. Presentation effects are
    /// returned to the caller in the order they were produced.
    pub fn pump(&mut self) -> Vec<SideEffect> {
        let mut presentation = Vec::new();
        for effect in self.workbench.drain_effects() {
            match effect {
                SideEffect::RequestCompletion { ticket, request } => {
                    self.in_flight.insert(ticket.id);
                    let service = self.service.clone();
                    let tx = self.tx.clone();
                    debug!(request = %ticket.id, flow = %request.flow(), "spawning completion");
                    tokio::spawn(async move {
                        // Inner task so a panicking service still produces a settlement.
                        let call = tokio::spawn(async move { service.complete(request).await });
                        let outcome = match call.await {
                            Ok(result) => result.map_err(|e| format!("{:#}", e)),
                            Err(e) => {
                                warn!(request = %ticket.id, error = %e, "completion task failed");
                                Err(format!("completion task failed: {}", e))
                            }
                        };
                        if tx.send(Settlement { ticket, outcome }).await.is_err() {
                            warn!(request = %ticket.id, "driver gone before completion settled");
                        }
                    });
                }
                other => presentation.push(other),
            }
        }
        presentation
    }

    /// Waits for the next finished call and applies it. `Some(false)` means
    /// the result was stale and dropped; `None` means nothing is in flight.
    pub async fn next_settlement(&mut self) -> Option<bool> {
        if self.in_flight.is_empty() {
            return None;
        }
        let settlement = self.rx.recv().await?;
        self.in_flight.remove(&settlement.ticket.id);
        Some(self.workbench.settle(settlement))
    }

    /// Pumps and settles until no call is outstanding. Returns the
    /// presentation effects seen along the way.
    pub async fn run_until_idle(&mut self) -> Vec<SideEffect> {
        let mut presentation = self.pump();
        while self.next_settlement().await.is_some() {
            presentation.extend(self.pump());
        }
        presentation
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn workbench(&self) -> &Workbench {
        &self.workbench
    }

    pub fn workbench_mut(&mut self) -> &mut Workbench {
        &mut self.workbench
    }
}
