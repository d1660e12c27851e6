//! Log record export, the capability shipped with this crate
//!
//! Configure with `magpie.plugin.export.implementation`, e.g.
//! `MAGPIE_PLUGIN_EXPORT_IMPLEMENTATION=magpie.plugins.JsonExport`.

use crate::plugin::{Capability, Catalog, Plugin, PluginResolver, ResolvedSet};
use crate::types::Result;
use parking_lot::Mutex;
use serde::Serialize;
use std::io::{self, Write};
use std::sync::Arc;
use tracing::{debug, error, info, trace, warn};

pub const DEFAULT_EXPORT: &str = "magpie.plugins.DefaultExportImpl";
pub const JSON_EXPORT: &str = "magpie.plugins.JsonExport";

/// Receives every log record once it is final.
pub trait Export: Send + Sync {
    fn export(&self, record: &LogRecord) -> io::Result<()>;
}

impl Capability for dyn Export {
    const NAME: &'static str = "Export";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogRecord {
    pub timestamp: String,
    pub level: String,
    pub target: String,
    pub message: String,
}

impl LogRecord {
    pub fn new(level: impl Into<String>, target: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            level: level.into(),
            target: target.into(),
            message: message.into(),
        }
    }
}

/// Re-emits records through `tracing`.
#[derive(Debug, Default)]
pub struct DefaultExportImpl;

impl Export for DefaultExportImpl {
    fn export(&self, record: &LogRecord) -> io::Result<()> {
        let target = record.target.as_str();
        let message = record.message.as_str();
        match record.level.to_lowercase().as_str() {
            "trace" => trace!(target: "magpie::export", source = target, "{}", message),
            "debug" => debug!(target: "magpie::export", source = target, "{}", message),
            "warn" => warn!(target: "magpie::export", source = target, "{}", message),
            "error" => error!(target: "magpie::export", source = target, "{}", message),
            _ => info!(target: "magpie::export", source = target, "{}", message),
        }
        Ok(())
    }
}

/// Writes each record as one JSON line.
pub struct JsonExport {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl JsonExport {
    pub fn new(writer: impl Write + Send + 'static) -> Self {
        Self {
            writer: Mutex::new(Box::new(writer)),
        }
    }

    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl Export for JsonExport {
    fn export(&self, record: &LogRecord) -> io::Result<()> {
        let line = serde_json::to_string(record)?;
        let mut writer = self.writer.lock();
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()
    }
}

pub fn register_builtins(catalog: &mut Catalog) {
    catalog
        .register::<dyn Export, _>(DEFAULT_EXPORT, || Ok(Arc::new(DefaultExportImpl) as Arc<dyn Export>))
        .register::<dyn Export, _>(JSON_EXPORT, || Ok(Arc::new(JsonExport::stdout()) as Arc<dyn Export>));
}

impl ResolvedSet<dyn Export> {
    /// Hand `record` to every exporter, stopping at the first failure.
    pub fn export(&self, record: &LogRecord) -> io::Result<()> {
        for exporter in self.iter() {
            exporter.export(record)?;
        }
        Ok(())
    }
}

impl PluginResolver {
    pub fn log_exports(&self) -> Result<Arc<ResolvedSet<dyn Export>>> {
        self.resolve::<dyn Export>()
    }

    pub fn register_log_exports(&self, exports: Vec<Plugin<dyn Export>>) -> Result<Arc<ResolvedSet<dyn Export>>> {
        self.register::<dyn Export>(exports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PropertyMap;
    use crate::plugin::Origin;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_json_export_writes_one_line() {
        let buf = SharedBuf::default();
        let export = JsonExport::new(buf.clone());
        export
            .export(&LogRecord::new("info", "app", "hello"))
            .unwrap();

        let written = String::from_utf8(buf.0.lock().clone()).unwrap();
        assert!(written.ends_with('\n'));
        let value: serde_json::Value = serde_json::from_str(written.trim()).unwrap();
        assert_eq!(value["message"], "hello");
        assert_eq!(value["level"], "info");
    }

    #[test]
    fn test_builtin_default_export() {
        let resolver = PluginResolver::builder(Catalog::builtin())
            .system_source(PropertyMap::new())
            .file_source(PropertyMap::new())
            .build();

        let exports = resolver.log_exports().unwrap();
        assert_eq!(exports.origin(), Origin::Default);
        assert_eq!(exports.identifiers(), [DEFAULT_EXPORT]);
        exports
            .export(&LogRecord::new("debug", "test", "through tracing"))
            .unwrap();
    }

    #[test]
    fn test_registered_exports_receive_records() {
        let buf = SharedBuf::default();
        let resolver = PluginResolver::builder(Catalog::builtin())
            .system_source(PropertyMap::new())
            .file_source(PropertyMap::new())
            .build();

        let sink = Arc::new(JsonExport::new(buf.clone())) as Arc<dyn Export>;
        resolver
            .register_log_exports(vec![
                Plugin::new("test.First", Arc::clone(&sink)),
                Plugin::new("test.Second", sink),
            ])
            .unwrap();

        resolver
            .log_exports()
            .unwrap()
            .export(&LogRecord::new("warn", "test", "twice"))
            .unwrap();

        let written = String::from_utf8(buf.0.lock().clone()).unwrap();
        assert_eq!(written.lines().count(), 2);
    }
}
