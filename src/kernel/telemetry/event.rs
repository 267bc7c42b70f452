use serde::{Deserialize, Serialize};

use crate::kernel::event::{OriginKind, RequestId};
use crate::kernel::session::InstanceId;
use crate::planner::types::PlanOutcomeKind;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TelemetryEvent {
    InstanceOpened {
        instance_id: InstanceId,
    },

    InstanceClosed {
        instance_id: InstanceId,
    },

    CompletionIssued {
        request_id: RequestId,
        origin: OriginKind,
    },

    CompletionSettled {
        request_id: RequestId,
        origin: OriginKind,
        ok: bool,
    },

    /// Result arrived for an activation or request that no longer exists.
    StaleResultDiscarded {
        request_id: RequestId,
        origin: OriginKind,
    },

    ContentReverted {
        instance_id: InstanceId,
    },

    PlanOutcome {
        kind: PlanOutcomeKind,
    },

    PlanDispatched {
        instance_id: InstanceId,
    },
}
