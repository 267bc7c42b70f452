use std::collections::VecDeque;

use super::event::TelemetryEvent;
use crate::planner::types::PlanOutcomeKind;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetrySnapshot {
    pub session_stats: SessionStats,
    pub completion_stats: CompletionStats,
    pub planning_stats: PlanningStats,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionStats {
    pub opened: u64,
    pub closed: u64,
    pub reverts: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionStats {
    pub issued: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub stale_discarded: u64,
    /// Share of issued requests whose result was thrown away.
    pub stale_ratio: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlanningStats {
    pub plans: u64,
    pub clarifications: u64,
    pub empty: u64,
    pub failed: u64,
    pub dispatched: u64,
}

pub fn compute_snapshot(events: &VecDeque<TelemetryEvent>) -> TelemetrySnapshot {
    let mut snap = TelemetrySnapshot::default();

    for event in events {
        match event {
            TelemetryEvent::InstanceOpened { .. } => snap.session_stats.opened += 1,
            TelemetryEvent::InstanceClosed { .. } => snap.session_stats.closed += 1,
            TelemetryEvent::ContentReverted { .. } => snap.session_stats.reverts += 1,
            TelemetryEvent::CompletionIssued { .. } => snap.completion_stats.issued += 1,
            TelemetryEvent::CompletionSettled { ok, .. } => {
                if *ok {
                    snap.completion_stats.succeeded += 1;
                } else {
                    snap.completion_stats.failed += 1;
                }
            }
            TelemetryEvent::StaleResultDiscarded { .. } => snap.completion_stats.stale_discarded += 1,
            TelemetryEvent::PlanOutcome { kind } => match kind {
                PlanOutcomeKind::Planned => snap.planning_stats.plans += 1,
                PlanOutcomeKind::Clarification => snap.planning_stats.clarifications += 1,
                PlanOutcomeKind::Empty => snap.planning_stats.empty += 1,
                PlanOutcomeKind::Failed => snap.planning_stats.failed += 1,
            },
            TelemetryEvent::PlanDispatched { .. } => snap.planning_stats.dispatched += 1,
        }
    }

    if snap.completion_stats.issued > 0 {
        snap.completion_stats.stale_ratio =
            snap.completion_stats.stale_discarded as f64 / snap.completion_stats.issued as f64;
    }

    snap
}
