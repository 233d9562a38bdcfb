use std::path::{Path, PathBuf};

use action_locator::SearchConfig;

use super::output::OutputFormat;
use crate::config::Config;

/// Resolved configuration shared by every command.
pub struct CliContext {
    config: Config,
    config_path: PathBuf,
    output: OutputFormat,
}

impl CliContext {
    pub fn new(config: Config, config_path: PathBuf, output: OutputFormat) -> Self {
        Self {
            config,
            config_path,
            output,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn search(&self) -> SearchConfig {
        self.config.search
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn output(&self) -> OutputFormat {
        self.output
    }
}
