use anyhow::Result;
use clap::Args;
use report_overlay::format_minutes;
use serde::Serialize;

use super::output::{emit, OutputFormat};

#[derive(Args, Clone, Debug)]
pub struct FormatArgs {
    /// Minutes to format
    pub minutes: u64,
}

#[derive(Serialize)]
struct Formatted {
    minutes: u64,
    label: String,
}

pub fn cmd_format(args: FormatArgs, output: OutputFormat) -> Result<()> {
    let formatted = Formatted {
        minutes: args.minutes,
        label: format_minutes(args.minutes),
    };
    emit(output, &formatted, || formatted.label.clone())
}
