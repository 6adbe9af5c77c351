//! Error types for the page model

use thiserror::Error;

use crate::NodeId;

/// Selector parse failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SelectorError {
    /// Empty selector or empty item in a selector list
    #[error("empty selector in '{0}'")]
    Empty(String),

    /// Character the parser does not understand at this position
    #[error("unexpected '{found}' in selector '{selector}'")]
    Unexpected { selector: String, found: char },

    /// Quoted attribute value without closing quote
    #[error("unterminated string in selector '{0}'")]
    UnterminatedString(String),

    /// Selector ended in the middle of a construct
    #[error("unexpected end of selector '{0}'")]
    UnexpectedEnd(String),
}

/// Document operation failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomError {
    #[error("unknown node {0}")]
    UnknownNode(NodeId),

    #[error("node {0} is not an element")]
    NotAnElement(NodeId),

    /// Appending would create a cycle or re-parent the document root
    #[error("cannot insert node {child} under {parent}")]
    HierarchyRequest { parent: NodeId, child: NodeId },

    #[error("invalid page url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error(transparent)]
    Selector(#[from] SelectorError),
}
