//! Anchoring strategies for path resolution
//!
//! 1. Root - resolve from the calling element (relative paths) or the session root
//! 2. AllTopLevelWindows - resolve independently from every top-level window,
//!    first success wins. Costly; only used for non-relative paths when enabled.

use std::fmt;

use action_primitives::AutomationProvider;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uiquery_core_types::ProviderError;

use crate::config::SearchConfig;
use crate::handle::ElementHandle;
use crate::types::Scope;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorStrategy {
    Root,
    AllTopLevelWindows,
}

impl AnchorStrategy {
    /// Strategy for a path under `config`. Relative paths are always root-anchored.
    pub fn select(relative: bool, config: &SearchConfig) -> Self {
        if !relative && config.search_from_all_top_level_windows {
            AnchorStrategy::AllTopLevelWindows
        } else {
            AnchorStrategy::Root
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AnchorStrategy::Root => "root",
            AnchorStrategy::AllTopLevelWindows => "all_top_level_windows",
        }
    }

    /// Elements the first path segment is resolved under, in trial order.
    ///
    /// Non-relative paths anchor at the session root itself. Window anchors
    /// carry `config`; the root keeps its own and the resolver passes
    /// `config` down to everything found beneath it.
    pub fn anchors<P: AutomationProvider>(
        &self,
        start: &ElementHandle<P>,
        relative: bool,
        config: SearchConfig,
    ) -> Result<Vec<ElementHandle<P>>, ProviderError> {
        match self {
            AnchorStrategy::Root if relative => Ok(vec![start.clone()]),
            AnchorStrategy::Root => Ok(vec![start.session_root()]),
            AnchorStrategy::AllTopLevelWindows => {
                let root = start.session_root();
                let windows = start.provider().top_level_windows()?;
                debug!(count = windows.len(), "anchoring at top-level windows");
                Ok(windows
                    .into_iter()
                    .map(|window| root.discovered_with(window, Scope::Children, config))
                    .collect())
            }
        }
    }
}

impl fmt::Display for AnchorStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
