use clap::Subcommand;

use super::format::FormatArgs;
use super::inspect::MatchArgs;
use super::report::ReportArgs;

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Fetch and print the time report for one issue
    Report(ReportArgs),

    /// Check whether a page URL activates the overlay
    Match(MatchArgs),

    /// Print host match patterns for the configured instances
    Patterns,

    /// Format a minute count the way the report does
    Format(FormatArgs),
}
