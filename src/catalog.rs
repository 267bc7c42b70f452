use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{WorkbenchError, WorkbenchResult};
use crate::services::completion::ToolInfo;

/// Read-only descriptor of something the user can activate.
/// `id` is the only stable key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capability {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
}

impl Capability {
    pub fn new(id: &str, name: &str, description: &str, category: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            category: category.to_string(),
        }
    }
}

/// Ordered, immutable set of capabilities supplied once at startup.
#[derive(Debug, Clone)]
pub struct CapabilityCatalog {
    entries: Vec<Capability>,
    index: HashMap<String, usize>,
}

impl CapabilityCatalog {
    pub fn new(entries: Vec<Capability>) -> WorkbenchResult<Self> {
        let (index, duplicate) = Self::index(&entries);
        if let Some(id) = duplicate {
            return Err(WorkbenchError::DuplicateCapability(id));
        }
        Ok(Self { entries, index })
    }

    /// First occurrence wins; the first repeated id is reported.
    fn index(entries: &[Capability]) -> (HashMap<String, usize>, Option<String>) {
        let mut index = HashMap::with_capacity(entries.len());
        let mut duplicate = None;
        for (i, cap) in entries.iter().enumerate() {
            if index.contains_key(&cap.id) {
                duplicate.get_or_insert_with(|| cap.id.clone());
                continue;
            }
            index.insert(cap.id.clone(), i);
        }
        (index, duplicate)
    }

    /// The stock set of ten capabilities.
    pub fn builtin() -> Self {
        let entries = vec![
            Capability::new("document-processor", "Document Processor", "Write, edit, and format text with AI assistance.", "Productivity"),
            Capability::new("web-navigator", "Web Navigator", "AI-enhanced browser for summaries and information extraction.", "Productivity"),
            Capability::new("comms-hub", "Comms Hub", "Integrated email, calendar, and messenger.", "Communication"),
            Capability::new("creative-suite", "Creative Suite", "Tools for image generation and editing.", "Creative"),
            Capability::new("task-manager", "Task Manager", "AI-assisted task planning and tracking.", "Productivity"),
            Capability::new("spreadsheet-tool", "Spreadsheet Tool", "Data organization, calculation, and visualization.", "Productivity"),
            Capability::new("presentation-builder", "Presentation Builder", "Create slideshows with AI assistance.", "Productivity"),
            Capability::new("code-editor", "Code Editor", "View and make minor edits to code snippets.", "Development"),
            Capability::new("game-center", "Game Center", "Access to casual games.", "Entertainment"),
            Capability::new("settings", "Settings", "Customize your workspace experience.", "System"),
        ];
        let (index, duplicate) = Self::index(&entries);
        debug_assert!(duplicate.is_none(), "builtin capability ids must be unique");
        Self { entries, index }
    }

    pub fn get(&self, id: &str) -> Option<&Capability> {
        self.index.get(id).and_then(|&i| self.entries.get(i))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Capability> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Launcher shortlist: first four Productivity or Creative entries.
    pub fn quick_access(&self) -> Vec<&Capability> {
        self.entries
            .iter()
            .filter(|c| c.category == "Productivity" || c.category == "Creative")
            .take(4)
            .collect()
    }

    /// Projection sent to the planner (category is not part of that contract).
    pub fn tool_infos(&self) -> Vec<ToolInfo> {
        self.entries
            .iter()
            .map(|c| ToolInfo {
                id: c.id.clone(),
                name: c.name.clone(),
                description: c.description.clone(),
            })
            .collect()
    }
}

impl Default for CapabilityCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
