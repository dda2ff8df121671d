use log::warn;
use serde::{Deserialize, Serialize};

use capview_platform::AppPaths;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default)]
    pub debug_logging: bool,

    #[serde(default = "default_true")]
    pub check_updates: bool,

    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,

    #[serde(default = "default_max_log_size_bytes")]
    pub max_log_size_bytes: u64,
}

fn default_true() -> bool {
    true
}

fn default_http_timeout() -> u64 {
    5
}

fn default_max_log_size_bytes() -> u64 {
    1024 * 1024
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            debug_logging: false,
            check_updates: true,
            http_timeout_secs: default_http_timeout(),
            max_log_size_bytes: default_max_log_size_bytes(),
        }
    }
}

impl AppSettings {
    /// Load settings from disk, falling back to defaults when the file is
    /// missing or unreadable. A missing file is written back so users have
    /// something to edit.
    pub fn load() -> Self {
        let Ok(paths) = AppPaths::new() else {
            return Self::default();
        };
        let path = paths.settings_file();

        match std::fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|error| {
                warn!("Ignoring malformed settings file: {error}");
                Self::default()
            }),
            Err(_) => {
                let settings = Self::default();
                settings.save(&paths);
                settings
            }
        }
    }

    pub fn save(&self, paths: &AppPaths) {
        let Ok(contents) = serde_json::to_string_pretty(self) else {
            return;
        };
        if paths.ensure_dirs().is_ok()
            && let Err(error) = std::fs::write(paths.settings_file(), contents)
        {
            warn!("Failed to write settings file: {error}");
        }
    }
}
