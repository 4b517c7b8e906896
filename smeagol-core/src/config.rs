//! Options for the wire codec.

use serde::{Deserialize, Serialize};

use crate::error::{BookingError, BookingResult};

/// How the codec renders outbound JSON.
///
/// ```toml
/// pretty = true
/// emit_nulls = false
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecOptions {
    /// Pretty-print JSON output.
    pub pretty: bool,
    /// Write absent optional fields as `null` instead of leaving them out.
    pub emit_nulls: bool,
}

impl CodecOptions {
    pub fn from_toml_str(content: &str) -> BookingResult<Self> {
        toml::from_str(content).map_err(|e| BookingError::Config(e.to_string()))
    }

    pub fn to_toml_string(&self) -> BookingResult<String> {
        toml::to_string_pretty(self).map_err(|e| BookingError::Config(e.to_string()))
    }
}
