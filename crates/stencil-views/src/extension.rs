use std::collections::HashMap;
use tera::{Tera, Value};

/// Adds filters, functions or testers to the engine
pub trait Extension: Send + Sync {
    /// Name shown in diagnostics
    fn name(&self) -> &str;

    /// Register everything this extension provides
    fn register(&self, tera: &mut Tera);
}

/// Debug helpers, enabled when the engine runs with `debug`
///
/// Provides the `dump` filter, which renders any value as pretty-printed JSON:
/// `{{ user | dump }}`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DebugExtension;

impl Extension for DebugExtension {
    fn name(&self) -> &str {
        "debug"
    }

    fn register(&self, tera: &mut Tera) {
        tera.register_filter("dump", dump);
    }
}

fn dump(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    serde_json::to_string_pretty(value)
        .map(Value::String)
        .map_err(|e| tera::Error::msg(format!("dump: {}", e)))
}
