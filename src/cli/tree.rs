use std::path::PathBuf;
use std::sync::Arc;

use action_locator::{ElementHandle, SearchConfig, Session};
use action_primitives::MemoryTree;
use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use super::context::CliContext;
use super::output::emit;
use super::snapshot::{load_snapshot, snapshot_path, ElementSummary};

#[derive(Args, Clone, Debug)]
pub struct TreeArgs {
    /// Tree snapshot (YAML or JSON)
    #[arg(short, long, value_name = "FILE")]
    pub snapshot: Option<PathBuf>,

    /// Maximum depth to print below the root
    #[arg(long)]
    pub depth: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct TreeNode {
    #[serde(flatten)]
    pub element: ElementSummary,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    fn render(&self, depth: usize, out: &mut Vec<String>) {
        out.push(format!("{}{}", "  ".repeat(depth), self.element.label()));
        for child in &self.children {
            child.render(depth + 1, out);
        }
    }
}

/// Walk-visible tree below the snapshot root, limited to `max_depth` levels.
pub fn build_tree(tree: MemoryTree, max_depth: Option<usize>) -> Result<TreeNode> {
    let tree = Arc::new(tree);
    let root = Session::new(tree.clone(), SearchConfig::default()).attach(tree.root());
    build_node(&root, 0, max_depth)
}

fn build_node(
    handle: &ElementHandle<MemoryTree>,
    depth: usize,
    max_depth: Option<usize>,
) -> Result<TreeNode> {
    let children = if max_depth.map_or(true, |max| depth < max) {
        handle
            .children()?
            .iter()
            .map(|child| build_node(child, depth + 1, max_depth))
            .collect::<Result<Vec<_>>>()?
    } else {
        Vec::new()
    };
    Ok(TreeNode {
        element: ElementSummary::from_handle(handle)?,
        children,
    })
}

pub async fn cmd_tree(args: TreeArgs, ctx: &CliContext) -> Result<()> {
    let snapshot = snapshot_path(args.snapshot.clone(), ctx)?;
    let tree = load_snapshot(&snapshot).await?;
    let depth = args.depth;
    let root = tokio::task::spawn_blocking(move || build_tree(tree, depth))
        .await
        .context("Tree task failed")??;

    emit(ctx.output(), &root, |root| {
        let mut lines = Vec::new();
        root.render(0, &mut lines);
        lines.join("\n")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use action_primitives::NodeSpec;
    use uiquery_core_types::ControlType;

    fn snapshot() -> MemoryTree {
        let spec = NodeSpec::new(ControlType::Pane).named("Desktop").child(
            NodeSpec::new(ControlType::Window)
                .named("Main")
                .child(NodeSpec::new(ControlType::Button).named("OK"))
                .hidden_child(
                    NodeSpec::new(ControlType::Window)
                        .named("Popup")
                        .with_window(7),
                ),
        );
        MemoryTree::from_spec(&spec).unwrap()
    }

    #[test]
    fn test_tree_lists_visible_nodes() {
        let root = build_tree(snapshot(), None).unwrap();
        let mut lines = Vec::new();
        root.render(0, &mut lines);
        assert_eq!(
            lines,
            vec!["Pane \"Desktop\"", "  Window \"Main\"", "    Button \"OK\""]
        );
    }

    #[test]
    fn test_tree_depth_limit() {
        let root = build_tree(snapshot(), Some(1)).unwrap();
        assert_eq!(root.children.len(), 1);
        assert!(root.children[0].children.is_empty());
    }
}
