//! Application configuration

use std::path::PathBuf;

use action_locator::SearchConfig;
use serde::{Deserialize, Serialize};

/// Contents of `uiquery.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Defaults for every query session
    pub search: SearchConfig,

    /// Snapshot used when a command is given no `--snapshot`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<PathBuf>,
}
