use anyhow::Result;
use clap::{Args, Subcommand};
use serde::Serialize;

use super::context::CliContext;
use super::output::emit;
use crate::config::Config;

#[derive(Args, Clone, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Clone, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration (file, then environment)
    Show,

    /// Print the path the configuration is read from
    Path,
}

#[derive(Serialize)]
struct ShowReport<'a> {
    path: String,
    #[serde(flatten)]
    config: &'a Config,
}

pub fn cmd_config(args: ConfigArgs, ctx: &CliContext) -> Result<()> {
    match args.action {
        ConfigAction::Show => {
            let report = ShowReport {
                path: ctx.config_path().display().to_string(),
                config: ctx.config(),
            };
            emit(ctx.output(), &report, |report| {
                let body = serde_yaml::to_string(report.config).unwrap_or_default();
                format!("Current configuration ({}):\n{}", report.path, body)
            })
        }
        ConfigAction::Path => {
            println!("{}", ctx.config_path().display());
            Ok(())
        }
    }
}
