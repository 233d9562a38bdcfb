use clap::Subcommand;

use super::config::ConfigArgs;
use super::find::FindArgs;
use super::parse::ParseArgs;
use super::tree::TreeArgs;

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Evaluate a path expression against a tree snapshot
    Find(FindArgs),

    /// Validate a path expression and show its segments
    Parse(ParseArgs),

    /// Print the walk-visible tree of a snapshot
    Tree(TreeArgs),

    /// Inspect the effective search configuration
    Config(ConfigArgs),
}
