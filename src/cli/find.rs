use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use action_locator::{SearchConfig, Session};
use action_primitives::MemoryTree;
use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use tracing::info;

use super::context::CliContext;
use super::output::emit;
use super::snapshot::{load_snapshot, snapshot_path, ElementSummary};

#[derive(Args, Clone, Debug)]
pub struct FindArgs {
    /// Path expression, e.g. "/Window[@Name='Editor']//Button[@Name='Save']"
    pub path: String,

    /// Tree snapshot (YAML or JSON)
    #[arg(short, long, value_name = "FILE")]
    pub snapshot: Option<PathBuf>,

    /// Report every match instead of the first
    #[arg(long)]
    pub all: bool,

    /// Resolve non-relative paths from every top-level window
    #[arg(long)]
    pub from_all_top_level: bool,

    /// Enumerate OS windows even where the search root has no window handle
    #[arg(long)]
    pub all_os_windows: bool,

    /// Treat '/pattern/flags' predicate values as regular expressions
    #[arg(long)]
    pub regex: bool,

    /// Polling budget, e.g. "750ms" or "2s"
    #[arg(long, value_parser = humantime::parse_duration)]
    pub timeout: Option<Duration>,

    /// Search once instead of polling until the timeout
    #[arg(long)]
    pub no_wait: bool,
}

impl FindArgs {
    /// Command-line flags layered over the configured search settings.
    pub fn search_config(&self, base: SearchConfig) -> SearchConfig {
        let mut config = base;
        if self.from_all_top_level {
            config.search_from_all_top_level_windows = true;
        }
        if self.all_os_windows {
            config.include_all_os_windows = true;
        }
        if self.regex {
            config.use_regex_values = true;
        }
        if let Some(timeout) = self.timeout {
            config.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        }
        if self.no_wait {
            config.wait_for_element = false;
        }
        config
    }
}

#[derive(Debug, Serialize)]
pub struct FindReport {
    pub path: String,
    pub matches: Vec<ElementSummary>,
}

pub async fn cmd_find(args: FindArgs, ctx: &CliContext) -> Result<()> {
    let snapshot = snapshot_path(args.snapshot.clone(), ctx)?;
    let tree = load_snapshot(&snapshot).await?;
    let config = args.search_config(ctx.search());
    info!(path = %args.path, snapshot = %snapshot.display(), "running query");

    let path = args.path.clone();
    let all = args.all;
    let report = tokio::task::spawn_blocking(move || run_query(tree, config, &path, all))
        .await
        .context("Query task failed")??;

    emit(ctx.output(), &report, |report| {
        if report.matches.is_empty() {
            return "no match".to_string();
        }
        report
            .matches
            .iter()
            .map(|m| format!("{}\n    {}", m.label(), m.locator))
            .collect::<Vec<_>>()
            .join("\n")
    })
}

/// Run a path query against a snapshot. Blocks while polling.
pub fn run_query(tree: MemoryTree, config: SearchConfig, path: &str, all: bool) -> Result<FindReport> {
    let tree = Arc::new(tree);
    let root = Session::new(tree.clone(), config).attach(tree.root());

    let handles = if all {
        root.find_all_by_path(path)?
    } else {
        root.find_by_path(path)?.into_iter().collect()
    };

    let matches = handles
        .iter()
        .map(ElementSummary::from_handle)
        .collect::<Result<Vec<_>>>()?;
    Ok(FindReport {
        path: path.to_string(),
        matches,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use action_primitives::NodeSpec;
    use uiquery_core_types::ControlType;

    fn tree() -> MemoryTree {
        let spec = NodeSpec::new(ControlType::Pane).child(
            NodeSpec::new(ControlType::Window)
                .named("Editor")
                .with_window(0x10)
                .child(NodeSpec::new(ControlType::Button).named("OK"))
                .child(NodeSpec::new(ControlType::Button).named("Cancel")),
        );
        MemoryTree::from_spec(&spec).unwrap()
    }

    fn quick() -> SearchConfig {
        SearchConfig::default().with_wait(false)
    }

    #[test]
    fn test_flags_override_config() {
        let args = FindArgs {
            path: "/Window".into(),
            snapshot: None,
            all: false,
            from_all_top_level: true,
            all_os_windows: false,
            regex: true,
            timeout: Some(Duration::from_millis(750)),
            no_wait: true,
        };
        let config = args.search_config(SearchConfig::default());
        assert!(config.search_from_all_top_level_windows);
        assert!(config.use_regex_values);
        assert!(!config.include_all_os_windows);
        assert!(!config.wait_for_element);
        assert_eq!(config.timeout_ms, 750);
    }

    #[test]
    fn test_run_query_first_and_all() {
        let first = run_query(tree(), quick(), "//Button", false).unwrap();
        assert_eq!(first.matches.len(), 1);
        assert_eq!(first.matches[0].name.as_deref(), Some("OK"));
        assert_eq!(first.matches[0].locator, "//Button[@Name='OK']");

        let all = run_query(tree(), quick(), "//Button", true).unwrap();
        let names: Vec<_> = all.matches.iter().filter_map(|m| m.name.clone()).collect();
        assert_eq!(names, vec!["OK", "Cancel"]);
    }

    #[test]
    fn test_run_query_soft_miss_and_hard_error() {
        let miss = run_query(tree(), quick(), "//Edit", false).unwrap();
        assert!(miss.matches.is_empty());
        assert!(run_query(tree(), quick(), "Button", false).is_err());
    }

    #[test]
    fn test_summary_label() {
        let report = run_query(tree(), quick(), "/Window", false).unwrap();
        assert_eq!(report.matches[0].label(), "Window \"Editor\" [0x10]");
    }
}
