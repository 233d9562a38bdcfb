//! Snapshot loading and element summaries shared by the query commands

use std::path::{Path, PathBuf};

use action_locator::ElementHandle;
use action_primitives::{MemoryTree, PropertySource, WindowSource};
use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use tokio::fs;
use tracing::debug;
use uiquery_core_types::{ControlType, RuntimeId, WindowHandle};

use super::context::CliContext;

/// `--snapshot`, else the `snapshot` entry of the configuration file.
pub fn snapshot_path(arg: Option<PathBuf>, ctx: &CliContext) -> Result<PathBuf> {
    arg.or_else(|| ctx.config().snapshot.clone()).ok_or_else(|| {
        anyhow!(
            "No snapshot given; pass --snapshot or set `snapshot` in {}",
            ctx.config_path().display()
        )
    })
}

pub async fn load_snapshot(path: &Path) -> Result<MemoryTree> {
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
    let tree = MemoryTree::from_yaml(&content)
        .with_context(|| format!("Failed to parse snapshot {}", path.display()))?;
    debug!(path = %path.display(), "snapshot loaded");
    Ok(tree)
}

/// Properties reported for a matched element.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElementSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub control_type: Option<ControlType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub automation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime_id: Option<RuntimeId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_handle: Option<WindowHandle>,
    pub locator: String,
}

impl ElementSummary {
    pub fn from_handle(handle: &ElementHandle<MemoryTree>) -> Result<Self> {
        let provider = handle.provider();
        Ok(Self {
            control_type: handle.control_type()?,
            name: handle.name()?,
            automation_id: handle.automation_id()?,
            class_name: handle.class_name()?,
            runtime_id: provider.runtime_id(handle.node())?,
            window_handle: provider.native_window_handle(handle.node())?,
            locator: handle.locator_path()?,
        })
    }

    /// One-line description: `Button "OK" #ok`.
    pub fn label(&self) -> String {
        let mut out = self
            .control_type
            .map(|ct| ct.name().to_string())
            .unwrap_or_else(|| "?".to_string());
        if let Some(name) = self.name.as_deref().filter(|n| !n.is_empty()) {
            out.push_str(&format!(" \"{name}\""));
        }
        if let Some(id) = self.automation_id.as_deref().filter(|id| !id.is_empty()) {
            out.push_str(&format!(" #{id}"));
        }
        if let Some(window) = self.window_handle {
            out.push_str(&format!(" [{window}]"));
        }
        out
    }
}
