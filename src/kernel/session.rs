use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::catalog::CapabilityCatalog;
use crate::error::{WorkbenchError, WorkbenchResult};

/// Unique per activation, even when the same capability is reopened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstanceId(pub Uuid);

impl InstanceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for InstanceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "inst-{}", self.0.simple())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInstance {
    pub capability_id: String,
    pub instance_id: InstanceId,
    /// Only ever `Some` for the document capability.
    pub content: Option<String>,
}

/// Mutations other than opening, which inserts directly in `open`.
#[derive(Debug, Clone)]
enum SessionDelta {
    Closed,
    DocumentUpdated(String),
}

/// Owns the single active instance and the shared document slot.
#[derive(Debug, Clone)]
pub struct SessionManager {
    catalog: Arc<CapabilityCatalog>,
    document_capability: String,
    active: Option<ToolInstance>,
    document_content: String,
    /// Bumped on every applied delta; unchanged means state is unchanged.
    pub version: u64,
}

impl SessionManager {
    pub fn new(catalog: Arc<CapabilityCatalog>, document_capability: impl Into<String>) -> Self {
        Self {
            catalog,
            document_capability: document_capability.into(),
            active: None,
            document_content: String::new(),
            version: 0,
        }
    }

    fn reduce(&mut self, delta: SessionDelta) {
        self.version += 1;
        match delta {
            SessionDelta::Closed => {
                self.active = None;
            }
            SessionDelta::DocumentUpdated(content) => {
                if let Some(inst) = self.active.as_mut() {
                    inst.content = Some(content.clone());
                }
                self.document_content = content;
            }
        }
    }

    /// Replaces whatever is active with a fresh activation of `capability_id`.
    pub fn open(&mut self, capability_id: &str) -> WorkbenchResult<&ToolInstance> {
        if !self.catalog.contains(capability_id) {
            return Err(WorkbenchError::UnknownCapability(capability_id.to_string()));
        }

        let content = if self.is_document(capability_id) {
            Some(self.document_content.clone())
        } else {
            None
        };
        let instance = ToolInstance {
            capability_id: capability_id.to_string(),
            instance_id: InstanceId::new(),
            content,
        };

        if let Some(prev) = &self.active {
            debug!(previous = %prev.instance_id, "replacing active instance");
        }
        info!(capability = capability_id, instance = %instance.instance_id, "instance opened");
        self.version += 1;
        Ok(self.active.insert(instance))
    }

    /// Enters orchestration mode. Returns the instance that was closed, if any.
    pub fn close(&mut self) -> Option<ToolInstance> {
        let closed = self.active.clone()?;
        info!(instance = %closed.instance_id, "instance closed");
        self.reduce(SessionDelta::Closed);
        Some(closed)
    }

    /// Applies only while the document capability is active. Returns whether
    /// anything changed.
    pub fn update_content(&mut self, content: &str) -> bool {
        if !self.active_is_document() {
            return false;
        }
        self.reduce(SessionDelta::DocumentUpdated(content.to_string()));
        true
    }

    pub fn active(&self) -> Option<&ToolInstance> {
        self.active.as_ref()
    }

    pub fn active_instance_id(&self) -> Option<InstanceId> {
        self.active.as_ref().map(|i| i.instance_id)
    }

    pub fn document_content(&self) -> &str {
        &self.document_content
    }

    pub fn is_document(&self, capability_id: &str) -> bool {
        capability_id == self.document_capability
    }

    pub fn active_is_document(&self) -> bool {
        self.active
            .as_ref()
            .map(|i| self.is_document(&i.capability_id))
            .unwrap_or(false)
    }
}
