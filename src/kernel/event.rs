use serde::{Deserialize, Serialize};
use std::fmt;

use super::session::InstanceId;
use crate::services::completion::{CompletionRequest, CompletionResponse};

/// Monotonic per workbench.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

/// Who is waiting for a completion. Instance-bound origins go stale as soon
/// as the active instance changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestOrigin {
    Channel(InstanceId),
    Suggestions(InstanceId),
    Planner,
}

impl RequestOrigin {
    pub fn kind(&self) -> OriginKind {
        match self {
            RequestOrigin::Channel(_) => OriginKind::Channel,
            RequestOrigin::Suggestions(_) => OriginKind::Suggestions,
            RequestOrigin::Planner => OriginKind::Planner,
        }
    }
}

/// Content-free projection of an origin, for telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OriginKind {
    Channel,
    Suggestions,
    Planner,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestTicket {
    pub id: RequestId,
    pub origin: RequestOrigin,
}

/// Work the kernel asks its driver to perform. The kernel itself never awaits.
#[derive(Debug, Clone)]
pub enum SideEffect {
    RequestCompletion {
        ticket: RequestTicket,
        request: CompletionRequest,
    },
    /// The presentation layer should mount whatever it maps this id to.
    ActivateCapability {
        capability_id: String,
        instance_id: InstanceId,
    },
    EnterOrchestration,
}

/// A finished completion call travelling back to the kernel.
#[derive(Debug, Clone)]
pub struct Settlement {
    pub ticket: RequestTicket,
    pub outcome: Result<CompletionResponse, String>,
}
