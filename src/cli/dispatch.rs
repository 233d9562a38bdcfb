use super::config::cmd_config;
use super::env::CliArgs;
use super::find::cmd_find;
use super::parse::cmd_parse;
use super::tree::cmd_tree;
use crate::cli::commands::Commands;
use crate::cli::context::CliContext;
use anyhow::Result;

pub async fn dispatch(cli: &CliArgs, ctx: &CliContext) -> Result<()> {
    match cli.command.clone() {
        Commands::Find(args) => cmd_find(args, ctx).await,
        Commands::Parse(args) => cmd_parse(args, ctx),
        Commands::Tree(args) => cmd_tree(args, ctx).await,
        Commands::Config(args) => cmd_config(args, ctx),
    }
}
