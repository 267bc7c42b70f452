use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::catalog::{Capability, CapabilityCatalog};

pub const ENV_COMPLETION_URL: &str = "WORKBENCH_COMPLETION_URL";
pub const ENV_USER_NAME: &str = "WORKBENCH_USER_NAME";

/// Injected configuration. Nothing in the core reads globals.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorkbenchConfig {
    /// Used in the planner greeting.
    pub user_name: String,
    /// The one capability whose content survives across activations.
    pub document_capability: String,
    /// Capability whose channel turns bare URLs into summarization requests.
    pub summarization_capability: String,
    /// Opened at boot when set; otherwise the workbench starts in orchestration mode.
    pub startup_capability: Option<String>,
    pub suggestions_enabled: bool,
    pub completion: CompletionConfig,
    /// Replaces the built-in catalog when non-empty.
    pub capabilities: Vec<Capability>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CompletionConfig {
    pub endpoint: String,
    /// Client-level timeout. Unset means the request may wait indefinitely.
    pub timeout_ms: Option<u64>,
    pub n_predict: usize,
    pub temperature: f32,
}

impl Default for WorkbenchConfig {
    fn default() -> Self {
        Self {
            user_name: "User".to_string(),
            document_capability: "document-processor".to_string(),
            summarization_capability: "web-navigator".to_string(),
            startup_capability: None,
            suggestions_enabled: true,
            completion: CompletionConfig::default(),
            capabilities: Vec::new(),
        }
    }
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8080".to_string(),
            timeout_ms: None,
            n_predict: 512,
            temperature: 0.4,
        }
    }
}

impl WorkbenchConfig {
    /// Defaults, then the TOML file (if given), then environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => {
                let raw = std::fs::read_to_string(p)
                    .with_context(|| format!("reading config file {}", p.display()))?;
                Self::from_toml(&raw).with_context(|| format!("parsing config file {}", p.display()))?
            }
            None => Self::default(),
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Lookup is injected so tests don't touch the process environment.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_COMPLETION_URL).filter(|v| !v.trim().is_empty()) {
            self.completion.endpoint = url;
        }
        if let Some(name) = lookup(ENV_USER_NAME).filter(|v| !v.trim().is_empty()) {
            self.user_name = name;
        }
    }

    pub fn catalog(&self) -> Result<CapabilityCatalog> {
        if self.capabilities.is_empty() {
            return Ok(CapabilityCatalog::builtin());
        }
        Ok(CapabilityCatalog::new(self.capabilities.clone())?)
    }
}
