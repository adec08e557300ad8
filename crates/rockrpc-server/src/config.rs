use rockrpc_json::{ReaderOptions, WriterOptions};
use serde::{Deserialize, Serialize};

/// Dispatcher settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Caller is trusted; method failures are reported with their message and
    /// cause chain. When false the message is redacted.
    pub local_execution: bool,
    /// Answer `system.listMethods`, `system.methodHelp` and `system.about`
    pub expose_system_methods: bool,
    pub reader: ReaderOptions,
    pub writer: WriterOptions,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            local_execution: true,
            expose_system_methods: true,
            reader: ReaderOptions::default(),
            writer: WriterOptions::default(),
        }
    }
}

impl DispatcherConfig {
    pub fn with_local_execution(mut self, local: bool) -> Self {
        self.local_execution = local;
        self
    }

    pub fn with_system_methods(mut self, expose: bool) -> Self {
        self.expose_system_methods = expose;
        self
    }

    pub fn with_reader_options(mut self, options: ReaderOptions) -> Self {
        self.reader = options;
        self
    }

    pub fn with_writer_options(mut self, options: WriterOptions) -> Self {
        self.writer = options;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DispatcherConfig::default();
        assert!(config.local_execution);
        assert!(config.expose_system_methods);
        assert!(!config.writer.pretty_print);
    }

    #[test]
    fn test_partial_deserialization() {
        let config: DispatcherConfig =
            serde_json::from_str(r#"{"local_execution":false,"writer":{"pretty_print":true}}"#)
                .unwrap();
        assert!(!config.local_execution);
        assert!(config.expose_system_methods);
        assert!(config.writer.pretty_print);
        assert_eq!(config.writer.indent, "    ");
    }

    #[test]
    fn test_builder_methods() {
        let config = DispatcherConfig::default()
            .with_local_execution(false)
            .with_system_methods(false)
            .with_reader_options(ReaderOptions::default().with_max_depth(8));
        assert!(!config.expose_system_methods);
        assert_eq!(config.reader.max_depth, 8);
    }
}
