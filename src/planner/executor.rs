use super::types::Plan;
use crate::catalog::{Capability, CapabilityCatalog};
use crate::error::{WorkbenchError, WorkbenchResult};

/// Resolves which capability an accepted plan dispatches to.
/// Only the first identified capability is opened.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlanExecutor;

impl PlanExecutor {
    pub fn new() -> Self {
        Self
    }

    pub fn resolve<'c>(
        &self,
        plan: Option<&Plan>,
        catalog: &'c CapabilityCatalog,
    ) -> WorkbenchResult<&'c Capability> {
        let plan = plan.ok_or(WorkbenchError::NoPlanHeld)?;
        let first = plan.first_capability().ok_or(WorkbenchError::NoPlanHeld)?;
        catalog
            .get(first)
            .ok_or_else(|| WorkbenchError::UnknownCapability(first.to_string()))
    }
}
