//! Page location and the page handle adapters work against

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use url::Url;

use crate::document::Document;
use crate::errors::DomError;

/// Current page URL with the accessors content code needs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Location {
    url: Url,
}

impl Location {
    pub fn parse(input: &str) -> Result<Self, DomError> {
        let url = Url::parse(input).map_err(|err| DomError::InvalidUrl {
            url: input.to_string(),
            reason: err.to_string(),
        })?;
        Ok(Self { url })
    }

    /// Host name plus an explicit non-default port (`example.com:8443`).
    pub fn host(&self) -> String {
        match (self.url.host_str(), self.url.port()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.to_string(),
            (None, _) => String::new(),
        }
    }

    /// Serialized origin (`https://example.com`).
    pub fn origin(&self) -> String {
        self.url.origin().ascii_serialization()
    }

    pub fn pathname(&self) -> &str {
        self.url.path()
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}

/// A document together with its (navigable) location.
#[derive(Clone, Debug)]
pub struct Page {
    document: Document,
    location: Arc<RwLock<Location>>,
}

impl Page {
    pub fn new(document: Document, location: Location) -> Self {
        Self {
            document,
            location: Arc::new(RwLock::new(location)),
        }
    }

    /// Blank document at `url`.
    pub fn blank(url: &str) -> Result<Self, DomError> {
        Ok(Self::new(Document::new(), Location::parse(url)?))
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn location(&self) -> Location {
        self.location.read().clone()
    }

    /// Client-side route change; the document is kept.
    pub fn navigate(&self, location: Location) {
        *self.location.write() = location;
    }
}
