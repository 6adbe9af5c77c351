//! Site adapter contract

use omnitime_core_types::AdapterMetadata;
use page_dom::{NodeId, Page};

use crate::errors::AdapterError;

/// Tooltip placed on every trigger.
pub const TRIGGER_TOOLTIP: &str = "Click to view OmniTime report";

/// Knows one issue tracker's markup.
///
/// New trackers are new implementations registered in the
/// [`AdapterRegistry`](crate::AdapterRegistry); existing adapters are not
/// extended with per-tracker branches.
pub trait SiteAdapter: Send + Sync {
    /// System type this adapter is registered under (`"gitlab"`).
    fn name(&self) -> &'static str;

    /// Find the tracker's time-tracking element.
    ///
    /// Runs on every poll tick and every mutation batch, so it must not
    /// touch the page. `None` is the normal "not rendered yet" answer.
    fn scan_for_target(&self, page: &Page) -> Option<NodeId>;

    /// Pick the clickable part of `target` and give it a pointer cursor and
    /// tooltip. Leaves text and existing listeners alone.
    fn style_target(&self, page: &Page, target: NodeId) -> Result<NodeId, AdapterError>;

    /// Identifiers for the report query. Partial results are an error.
    fn get_metadata(&self, page: &Page) -> Result<AdapterMetadata, AdapterError>;
}
