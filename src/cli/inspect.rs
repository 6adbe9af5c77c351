use anyhow::{Context, Result};
use clap::Args;
use page_dom::Location;
use serde::Serialize;
use site_adapter::AdapterRegistry;

use super::context::CliContext;
use super::output::{emit, OutputFormat};
use crate::content::match_instance;
use crate::errors::ActivationError;

#[derive(Args, Clone, Debug)]
pub struct MatchArgs {
    /// Page URL to test, e.g. https://gitlab.example.com/group/app/-/issues/7
    pub page_url: String,
}

#[derive(Serialize)]
struct MatchReport {
    host: String,
    matched: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_type: Option<String>,
    adapter_registered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

pub fn cmd_match(args: MatchArgs, ctx: &CliContext, output: OutputFormat) -> Result<()> {
    let location = Location::parse(&args.page_url).context("Invalid page URL")?;
    let registry = AdapterRegistry::with_builtin();
    let host = location.host();

    let report = match ctx.settings().validate() {
        Ok(configuration) => match match_instance(&configuration, &location) {
            Ok(instance) => MatchReport {
                host,
                matched: true,
                system_type: Some(instance.system_type.clone()),
                adapter_registered: registry.supports(&instance.system_type),
                reason: (!registry.supports(&instance.system_type)).then(|| {
                    ActivationError::UnsupportedSystemType(instance.system_type.clone())
                        .to_string()
                }),
            },
            Err(err) => unmatched(host, err),
        },
        Err(err) => unmatched(host, err),
    };

    emit(output, &report, || {
        let mut text = match &report.system_type {
            Some(system_type) => format!("{} -> {}", report.host, system_type),
            None => format!("{} -> no match", report.host),
        };
        if report.matched {
            let status = if report.adapter_registered {
                "adapter registered"
            } else {
                "no adapter registered"
            };
            text.push_str(&format!(" ({status})"));
        }
        if let Some(reason) = &report.reason {
            text.push_str(&format!("\n{reason}"));
        }
        text
    })
}

fn unmatched(host: String, err: ActivationError) -> MatchReport {
    MatchReport {
        host,
        matched: false,
        system_type: None,
        adapter_registered: false,
        reason: Some(err.to_string()),
    }
}

pub fn cmd_patterns(ctx: &CliContext, output: OutputFormat) -> Result<()> {
    let patterns = ctx.settings().normalized().origin_patterns();
    emit(output, &patterns, || {
        if patterns.is_empty() {
            format!("No instances configured in {}", ctx.config_path().display())
        } else {
            patterns.join("\n")
        }
    })
}
