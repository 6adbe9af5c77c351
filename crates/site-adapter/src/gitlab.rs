//! GitLab issue pages
//!
//! Two scan strategies in fallback order:
//! 1. Specific - known test hooks and component classes
//! 2. SidebarLabel - a "Time tracking" label inside the issue sidebar

use omnitime_core_types::AdapterMetadata;
use page_dom::{NodeId, Page, Selector};

use crate::adapter::{SiteAdapter, TRIGGER_TOOLTIP};
use crate::errors::AdapterError;

/// Label text the sidebar fallback looks for (trimmed, case-insensitive).
pub const TIME_TRACKING_LABEL: &str = "time tracking";

const SPECIFIC_SELECTORS: &[&str] = &[
    "[data-testid=\"work-item-time-tracking\"]",
    "[data-testid=\"time-tracking-component\"]",
    "[data-testid=\"time-tracking-item\"]",
    ".time-tracking-component",
    ".block.time-tracking",
];

const SIDEBAR_SELECTORS: &[&str] = &["aside", ".right-sidebar", ".issuable-sidebar"];

const LABEL_CANDIDATES: &str = "h3, .title, .block-title, div, span";
const BLOCK_SELECTOR: &str = ".block";
const HEADING_TAG: &str = "h3";
const PROJECT_ID_ATTRIBUTE: &str = "data-project-id";
const ISSUES_SEGMENT: &str = "/issues/";

/// Scan strategy enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStrategy {
    /// High-confidence selectors against the whole document
    Specific,

    /// Label text search inside the sidebar
    SidebarLabel,
}

impl ScanStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            ScanStrategy::Specific => "specific",
            ScanStrategy::SidebarLabel => "sidebar-label",
        }
    }

    /// All strategies in fallback order
    pub fn fallback_chain() -> [ScanStrategy; 2] {
        [ScanStrategy::Specific, ScanStrategy::SidebarLabel]
    }
}

/// Adapter for GitLab issue and work-item pages.
pub struct GitlabAdapter {
    specific: Vec<Selector>,
    sidebars: Vec<Selector>,
    label_candidates: Selector,
    block: Selector,
    heading: Selector,
}

impl GitlabAdapter {
    pub fn new() -> Result<Self, AdapterError> {
        Ok(Self {
            specific: compile(SPECIFIC_SELECTORS)?,
            sidebars: compile(SIDEBAR_SELECTORS)?,
            label_candidates: Selector::parse(LABEL_CANDIDATES)?,
            block: Selector::parse(BLOCK_SELECTOR)?,
            heading: Selector::parse(HEADING_TAG)?,
        })
    }

    /// Run a single strategy.
    pub fn scan_with(&self, page: &Page, strategy: ScanStrategy) -> Option<NodeId> {
        match strategy {
            ScanStrategy::Specific => self.scan_specific(page),
            ScanStrategy::SidebarLabel => self.scan_sidebar_label(page),
        }
    }

    fn scan_specific(&self, page: &Page) -> Option<NodeId> {
        let document = page.document();
        self.specific
            .iter()
            .find_map(|selector| document.query_selector(selector))
    }

    fn scan_sidebar_label(&self, page: &Page) -> Option<NodeId> {
        let document = page.document();
        let sidebar = self
            .sidebars
            .iter()
            .find_map(|selector| document.query_selector(selector))?;

        let label = document
            .query_selector_within(sidebar, &self.label_candidates)
            .into_iter()
            .find(|node| is_label(page, *node))?;

        // Prefer the surrounding block, then the direct parent.
        Some(
            document
                .closest(label, &self.block)
                .or_else(|| document.parent_element(label))
                .unwrap_or(label),
        )
    }
}

impl SiteAdapter for GitlabAdapter {
    fn name(&self) -> &'static str {
        "gitlab"
    }

    fn scan_for_target(&self, page: &Page) -> Option<NodeId> {
        for strategy in ScanStrategy::fallback_chain() {
            if let Some(target) = self.scan_with(page, strategy) {
                return Some(target);
            }
        }
        None
    }

    fn style_target(&self, page: &Page, target: NodeId) -> Result<NodeId, AdapterError> {
        let document = page.document();
        let trigger = match document.first_within(target, &self.heading) {
            Some(heading) => heading,
            // Both remaining cases (the target is the label itself, or a
            // container without a heading) use the whole target.
            None => target,
        };

        document.set_style(trigger, "cursor", "pointer")?;
        document.set_attribute(trigger, "title", TRIGGER_TOOLTIP)?;
        Ok(trigger)
    }

    fn get_metadata(&self, page: &Page) -> Result<AdapterMetadata, AdapterError> {
        let document = page.document();
        let project_id = document
            .attribute(document.body(), PROJECT_ID_ATTRIBUTE)
            .unwrap_or_default();
        let location = page.location();
        let issue_id = issue_id_from_path(location.pathname()).unwrap_or_default();

        AdapterMetadata::new(project_id.trim(), issue_id).ok_or_else(|| {
            AdapterError::Extraction(format!(
                "could not extract GitLab project ID or issue ID from {}",
                location.pathname()
            ))
        })
    }
}

fn compile(selectors: &[&str]) -> Result<Vec<Selector>, AdapterError> {
    selectors
        .iter()
        .map(|s| Selector::parse(s).map_err(AdapterError::from))
        .collect()
}

fn is_label(page: &Page, node: NodeId) -> bool {
    page.document().inner_text(node).to_lowercase() == TIME_TRACKING_LABEL
}

/// `/group/project/-/issues/42/designs` -> `42`
fn issue_id_from_path(path: &str) -> Option<&str> {
    let (_, rest) = path.split_once(ISSUES_SEGMENT)?;
    rest.split('/').next().filter(|id| !id.is_empty())
}
