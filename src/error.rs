use thiserror::Error;

/// Every failure the workbench core can report.
///
/// None of these are fatal. Completion failures are surfaced in the
/// relevant conversation log as well as returned to the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkbenchError {
    #[error("unknown capability: {0}")]
    UnknownCapability(String),

    #[error("completion service failure: {0}")]
    CompletionServiceFailure(String),

    #[error("the planner returned neither steps nor a clarification question")]
    EmptyPlanResult,

    #[error("no plan is currently held")]
    NoPlanHeld,

    #[error("no tool instance is active")]
    NoActiveInstance,

    #[error("a request is already in flight for this channel")]
    ChannelBusy,

    #[error("a planning request is already in flight")]
    PlannerBusy,

    #[error("the planner is only available while no tool is active")]
    PlannerUnavailable,

    #[error("there is no agent change to revert")]
    NothingToRevert,

    #[error("input is empty")]
    EmptyInput,

    #[error("duplicate capability id in catalog: {0}")]
    DuplicateCapability(String),
}

pub type WorkbenchResult<T> = Result<T, WorkbenchError>;
