//! Reader and writer configuration

use serde::{Deserialize, Serialize};

/// Default nesting limit for [`JsonTextReader`](crate::JsonTextReader)
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// Text reader configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderOptions {
    /// Maximum number of simultaneously open containers
    pub max_depth: usize,
    /// Accept a percent-encoded document introduced by a leading `%`
    pub percent_decoding: bool,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            percent_decoding: true,
        }
    }
}

impl ReaderOptions {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_percent_decoding(mut self, enabled: bool) -> Self {
        self.percent_decoding = enabled;
        self
    }
}

/// Text writer configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriterOptions {
    pub pretty_print: bool,
    /// Indentation unit used when `pretty_print` is on
    pub indent: String,
    pub newline: String,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            pretty_print: false,
            indent: "    ".to_string(),
            newline: "\n".to_string(),
        }
    }
}

impl WriterOptions {
    pub fn pretty() -> Self {
        Self {
            pretty_print: true,
            ..Self::default()
        }
    }
}
