//! Content-script activation for one page
//!
//! Reads settings, applies the page-boundary rule, picks the adapter for the
//! instance's system type and wires locator, guard, overlay and orchestrator
//! together. On pages that are not configured instances nothing happens at
//! all: no scanning, no requests, no log lines.

use std::sync::Arc;

use anyhow::Result;
use extensions_bridge::RequestPrimitive;
use omnitime_core_types::DebugLog;
use page_dom::{Location, Page};
use report_overlay::ReportOverlay;
use site_adapter::{AdapterRegistry, SiteAdapter};
use target_locator::{InjectionGuard, LocatorHandle, PollPolicy, TargetLocator};

use crate::config::{ConfigStore, Configuration, InstanceConfig, Settings};
use crate::errors::ActivationError;
use crate::orchestrator::FetchOrchestrator;

/// The configured instance whose host equals the page's host.
pub fn match_instance<'a>(
    configuration: &'a Configuration,
    location: &Location,
) -> Result<&'a InstanceConfig, ActivationError> {
    let host = location.host();
    configuration
        .instance_for_host(&host)
        .ok_or(ActivationError::NoHostMatch(host))
}

/// Everything running on an activated page.
pub struct ActiveSession {
    pub instance: InstanceConfig,
    pub adapter: Arc<dyn SiteAdapter>,
    pub overlay: Arc<ReportOverlay>,
    pub orchestrator: Arc<FetchOrchestrator>,
    pub locator: LocatorHandle,
}

impl ActiveSession {
    pub fn locator(&self) -> &Arc<TargetLocator> {
        self.locator.locator()
    }
}

pub struct ContentScript {
    registry: AdapterRegistry,
    primitive: Arc<dyn RequestPrimitive>,
    poll: PollPolicy,
}

impl ContentScript {
    pub fn new(registry: AdapterRegistry, primitive: Arc<dyn RequestPrimitive>) -> Self {
        Self {
            registry,
            primitive,
            poll: PollPolicy::default(),
        }
    }

    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    pub fn registry(&self) -> &AdapterRegistry {
        &self.registry
    }

    /// Load settings from `store`, then [`activate`](Self::activate).
    pub async fn activate_from_store(
        &self,
        page: Page,
        store: &dyn ConfigStore,
    ) -> Result<ActiveSession> {
        let settings = store.load().await?;
        Ok(self.activate(page, &settings)?)
    }

    /// Must be called inside a tokio runtime.
    pub fn activate(&self, page: Page, settings: &Settings) -> Result<ActiveSession, ActivationError> {
        let log = settings.debug_log();

        let configuration = settings.validate().map_err(|err| {
            log.warn(&err);
            err
        })?;

        // Silent on foreign hosts.
        let instance = match_instance(&configuration, &page.location())?.clone();
        log.info("Configuration match found. Starting adapter selection.");

        let adapter = self.adapter_for(&instance, log)?;
        log.info(format_args!("Using adapter '{}'", adapter.name()));

        let overlay = ReportOverlay::new(page.document().clone(), log);
        let orchestrator = FetchOrchestrator::new(
            page.clone(),
            adapter.clone(),
            overlay.clone(),
            self.primitive.clone(),
            &configuration,
        );
        let guard = InjectionGuard::new(adapter.clone(), orchestrator.click_handler(), log);
        let locator =
            Arc::new(TargetLocator::new(page, adapter.clone(), guard, log).with_policy(self.poll));

        Ok(ActiveSession {
            instance,
            adapter,
            overlay,
            orchestrator,
            locator: locator.start(),
        })
    }

    fn adapter_for(
        &self,
        instance: &InstanceConfig,
        log: DebugLog,
    ) -> Result<Arc<dyn SiteAdapter>, ActivationError> {
        self.registry
            .create(&instance.system_type)
            .map_err(|err| {
                log.warn(&err);
                ActivationError::UnsupportedSystemType(instance.system_type.clone())
            })
    }
}
