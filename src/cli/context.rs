use std::path::{Path, PathBuf};

use crate::config::Settings;

pub struct CliContext {
    settings: Settings,
    config_path: PathBuf,
}

impl CliContext {
    pub fn new(settings: Settings, config_path: PathBuf) -> Self {
        Self {
            settings,
            config_path,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }
}
