//! Report popup for the time-tracking trigger
//!
//! - [`ReportOverlay`]: backdrop + panel lifecycle in the host document
//! - [`ReportView`]: payload to rows, shared with text output
//! - [`format_minutes`]: compact minute labels

pub mod format;
pub mod overlay;
pub mod view;

pub use format::format_minutes;
pub use overlay::{error_text, OverlayState, OverlayTicket, ReportOverlay};
pub use view::{ReportRow, ReportView, EMPTY_MESSAGE};
