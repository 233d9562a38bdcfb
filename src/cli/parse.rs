use action_locator::{PathExpression, Scope};
use anyhow::Result;
use clap::Args;
use serde::Serialize;

use super::context::CliContext;
use super::output::emit;

#[derive(Args, Clone, Debug)]
pub struct ParseArgs {
    /// Path expression to validate
    pub path: String,

    /// Compile '/pattern/flags' predicate values as regular expressions
    #[arg(long)]
    pub regex: bool,
}

#[derive(Debug, Serialize)]
pub struct ParseReport {
    pub path: String,
    pub relative: bool,
    pub segments: Vec<SegmentReport>,
}

#[derive(Debug, Serialize)]
pub struct SegmentReport {
    pub scope: Scope,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    pub predicates: Vec<(String, String)>,
    pub condition: String,
}

/// Parse and compile `path`. Unknown attributes fail here, as they would in a search.
pub fn parse_report(path: &str, use_regex: bool) -> Result<ParseReport> {
    let expression = PathExpression::parse(path)?;
    let compiled = expression.compile(use_regex)?;
    let segments = expression
        .segments
        .iter()
        .zip(compiled)
        .map(|(segment, compiled)| SegmentReport {
            scope: segment.scope,
            type_name: segment.node_test.type_name.clone(),
            predicates: segment
                .node_test
                .predicates
                .iter()
                .map(|p| (p.attribute.clone(), p.value.clone()))
                .collect(),
            condition: compiled.condition.to_string(),
        })
        .collect();
    Ok(ParseReport {
        path: expression.to_string(),
        relative: expression.relative,
        segments,
    })
}

pub fn cmd_parse(args: ParseArgs, ctx: &CliContext) -> Result<()> {
    let use_regex = args.regex || ctx.search().use_regex_values;
    let report = parse_report(&args.path, use_regex)?;
    emit(ctx.output(), &report, |report| {
        let mut lines = vec![format!(
            "{} ({} segment{}, {})",
            report.path,
            report.segments.len(),
            if report.segments.len() == 1 { "" } else { "s" },
            if report.relative {
                "relative to the calling element"
            } else {
                "anchored at the session root"
            }
        )];
        for (idx, segment) in report.segments.iter().enumerate() {
            lines.push(format!(
                "  {}. {:<11} {}",
                idx + 1,
                segment.scope.name(),
                segment.condition
            ));
        }
        lines.join("\n")
    })
}
