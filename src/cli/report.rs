use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::Args;
use extensions_bridge::{BackgroundService, BridgeRequest, HttpFetchBridge, RequestPrimitive};
use omnitime_core_types::AdapterMetadata;
use page_dom::Location;
use report_overlay::ReportView;
use tracing::info;

use super::context::CliContext;
use super::output::{emit, OutputFormat};
use crate::orchestrator::build_query_url;

#[derive(Args, Clone, Debug)]
pub struct ReportArgs {
    /// Origin of the tracker page, e.g. https://gitlab.example.com
    #[arg(long)]
    pub origin: String,

    /// Project identifier
    #[arg(long)]
    pub project_id: String,

    /// Issue identifier
    #[arg(long)]
    pub issue_id: String,
}

pub async fn cmd_report(args: ReportArgs, ctx: &CliContext, output: OutputFormat) -> Result<()> {
    let configuration = ctx.settings().normalized().validate()?;
    let metadata = AdapterMetadata::new(args.project_id, args.issue_id)
        .ok_or_else(|| anyhow!("project id and issue id must not be empty"))?;
    let origin = Location::parse(&args.origin)
        .context("Invalid origin")?
        .origin();

    let url = build_query_url(&configuration.api_url, &origin, &metadata);
    info!(%url, "requesting report");

    let bridge = HttpFetchBridge::new()?.with_log(configuration.debug_log());
    let service = BackgroundService::spawn(Arc::new(bridge));
    let response = service
        .client()
        .send(BridgeRequest::fetch_time_data(url, configuration.api_key))
        .await?;
    let payload = response
        .into_result()
        .context("Failed to load time data")?;

    let view = ReportView::from_payload(&payload);
    emit(output, &view, || view.to_string())
}
