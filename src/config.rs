use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Reconciliation settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct SyncConfig {
    /// How long an apply may stay unacknowledged before queued updates for
    /// the view are applied anyway (milliseconds)
    #[serde(default = "default_apply_timeout")]
    pub apply_timeout_ms: u64,

    /// Views the host did not classify are held for this long (or until the
    /// first keystroke) before they are treated as real editors. A view closed
    /// inside this interval without a keystroke counts as a peek.
    #[serde(default = "default_transient_grace")]
    pub transient_grace_ms: u64,

    /// Lines shared between consecutive pages on page forward/backward
    #[serde(default = "default_page_overlap")]
    pub page_overlap: usize,

    /// Screen rows the host and modal engine may disagree by before a
    /// scroll correction is sent
    #[serde(default = "default_screen_row_tolerance")]
    pub screen_row_tolerance: usize,

    /// Lines kept visible above/below the cursor for screen-relative motions
    #[serde(default)]
    pub scroll_off: usize,

    /// Whether the host cursor blinks
    #[serde(default = "default_true")]
    pub cursor_blink: bool,

    /// Number of recent reconciliation problems kept for inspection
    #[serde(default = "default_diagnostics_capacity")]
    pub diagnostics_capacity: usize,

    /// Interval of the driver's timeout/promotion tick (milliseconds)
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
}

fn default_apply_timeout() -> u64 {
    1500
}

fn default_transient_grace() -> u64 {
    500
}

fn default_page_overlap() -> usize {
    2
}

fn default_screen_row_tolerance() -> usize {
    2
}

fn default_true() -> bool {
    true
}

fn default_diagnostics_capacity() -> usize {
    64
}

fn default_tick_interval() -> u64 {
    100
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            apply_timeout_ms: default_apply_timeout(),
            transient_grace_ms: default_transient_grace(),
            page_overlap: default_page_overlap(),
            screen_row_tolerance: default_screen_row_tolerance(),
            scroll_off: 0,
            cursor_blink: default_true(),
            diagnostics_capacity: default_diagnostics_capacity(),
            tick_interval_ms: default_tick_interval(),
        }
    }
}

impl SyncConfig {
    /// Load configuration from a JSON file. Missing fields take their defaults.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        let config: SyncConfig =
            serde_json::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path.as_ref(), contents).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// JSON schema of the configuration, pretty-printed
    pub fn schema_json() -> Result<String, ConfigError> {
        let schema = schemars::schema_for!(SyncConfig);
        serde_json::to_string_pretty(&schema).map_err(|e| ConfigError::SerializeError(e.to_string()))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.apply_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "apply_timeout_ms must be greater than 0".to_string(),
            ));
        }

        if self.tick_interval_ms == 0 {
            return Err(ConfigError::ValidationError(
                "tick_interval_ms must be greater than 0".to_string(),
            ));
        }

        if self.tick_interval_ms > self.apply_timeout_ms {
            return Err(ConfigError::ValidationError(
                "tick_interval_ms must be <= apply_timeout_ms".to_string(),
            ));
        }

        if self.page_overlap > 10 {
            return Err(ConfigError::ValidationError(
                "page_overlap must be <= 10".to_string(),
            ));
        }

        if self.scroll_off > 100 {
            return Err(ConfigError::ValidationError(
                "scroll_off must be <= 100".to_string(),
            ));
        }

        if self.diagnostics_capacity == 0 {
            return Err(ConfigError::ValidationError(
                "diagnostics_capacity must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Serialize error: {0}")]
    SerializeError(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
}
