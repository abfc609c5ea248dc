//! Engine configuration
//!
//! The engine itself is configuration-free; the only ambient setting is the
//! logging profile, loaded from TOML:
//!
//! ```toml
//! [logging]
//! profile = "production"
//! ```

use serde::Deserialize;

use crate::errors::{DocTrackError, ExError};
use crate::logging_facility::{self, Profile};

/// Top-level engine configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// `[logging]` section
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    #[serde(default)]
    pub profile: Profile,
}

impl EngineConfig {
    /// Parse a configuration document
    ///
    /// # Errors
    ///
    /// `InvalidConfig` when the text is not valid TOML, contains unknown
    /// keys, or names an unknown logging profile.
    pub fn from_toml_str(text: &str) -> Result<Self, ExError> {
        toml::from_str(text).map_err(|e| {
            ExError::from(DocTrackError::from(e)).with_op("load_config")
        })
    }

    /// Install the global tracing subscriber for the configured profile
    pub fn init_logging(&self) {
        logging_facility::init(self.logging.profile);
    }
}
