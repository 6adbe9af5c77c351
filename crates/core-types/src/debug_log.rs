use std::fmt;

use tracing::{info, warn};

const LOG_TARGET: &str = "omnitime";

/// Diagnostic logger handed to each component at construction.
///
/// Carries the configured `debug` switch; when disabled nothing is emitted.
/// Never changes behavior, only visibility.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DebugLog {
    enabled: bool,
}

impl DebugLog {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn disabled() -> Self {
        Self { enabled: false }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn info(&self, message: impl fmt::Display) {
        if self.enabled {
            info!(target: LOG_TARGET, "OmniTime: {}", message);
        }
    }

    pub fn warn(&self, message: impl fmt::Display) {
        if self.enabled {
            warn!(target: LOG_TARGET, "OmniTime: {}", message);
        }
    }
}
