use anyhow::Result;

use super::format::cmd_format;
use super::inspect::{cmd_match, cmd_patterns};
use super::report::cmd_report;
use crate::cli::commands::Commands;
use crate::cli::context::CliContext;
use crate::cli::env::CliArgs;

pub async fn dispatch(cli: &CliArgs, ctx: &CliContext) -> Result<()> {
    match cli.command.clone() {
        Commands::Report(args) => cmd_report(args, ctx, cli.output).await,
        Commands::Match(args) => cmd_match(args, ctx, cli.output),
        Commands::Patterns => cmd_patterns(ctx, cli.output),
        Commands::Format(args) => cmd_format(args, cli.output),
    }
}
