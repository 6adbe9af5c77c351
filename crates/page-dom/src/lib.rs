//! Host page model for content-side code
//!
//! The content core never owns the page it runs on. This crate gives it a
//! document tree it can query with CSS selectors, decorate, listen on and
//! observe for child-list changes:
//! - `Document`: shared arena-backed tree with event listeners
//! - `Selector`: the CSS subset site adapters rely on
//! - `MutationRecord` broadcast: the mutation-observer feed
//! - `Page` / `Location`: document plus the current URL

pub mod document;
pub mod errors;
pub mod events;
pub mod location;
pub mod selector;

pub use document::{Document, NodeId};
pub use errors::{DomError, SelectorError};
pub use events::{DomEvent, EventKind, Listener, ListenerId, MutationRecord};
pub use location::{Location, Page};
pub use selector::Selector;
