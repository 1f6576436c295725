//! Connection normalizer.
//!
//! Turns untrusted input (a persisted settings blob, an environment map) into
//! a complete [`ConnectionDescriptor`]. Unknown engines fall back to MySQL,
//! missing ports take the engine default and the embedded engine always gets
//! port zero and a file path.

use crate::{ConnectionDescriptor, Engine, DEFAULT_SQLITE_PATH};
use serde_json::{Map, Value};
use std::path::PathBuf;

/// Default host for networked engines.
pub const DEFAULT_HOST: &str = "localhost";

/// Normalizes a raw descriptor.
///
/// Returns `None` only when `raw` is not a JSON object.
#[must_use]
pub fn normalize_descriptor(raw: &Value) -> Option<ConnectionDescriptor> {
    let fields = raw.as_object()?;

    let engine = text(fields, &["engine", "type", "driver"])
        .and_then(|value| Engine::from_alias(&value))
        .unwrap_or_default();

    let host = text(fields, &["host", "hostname"])
        .filter(|host| !host.is_empty())
        .unwrap_or_else(|| DEFAULT_HOST.to_string());

    let port = if engine.is_embedded() {
        0
    } else {
        port(fields).unwrap_or_else(|| engine.default_port())
    };

    let file_path = text(fields, &["filePath", "file_path", "file", "path"])
        .filter(|path| !path.is_empty())
        .map(PathBuf::from);
    let file_path = if engine.is_embedded() {
        Some(file_path.unwrap_or_else(|| PathBuf::from(DEFAULT_SQLITE_PATH)))
    } else {
        file_path
    };

    Some(ConnectionDescriptor {
        engine,
        host,
        port,
        user: text(fields, &["user", "username"]).unwrap_or_default(),
        password: raw_text(fields, &["password"]).unwrap_or_default(),
        database: text(fields, &["database", "name", "dbname"]).unwrap_or_default(),
        ssl: ssl(fields),
        file_path,
    })
}

fn lookup<'a>(fields: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| fields.get(*key).filter(|v| !v.is_null()))
}

/// Trimmed textual value. Numbers are accepted and rendered.
fn text(fields: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    raw_text(fields, keys).map(|value| value.trim().to_string())
}

/// Textual value as given. Passwords keep surrounding whitespace.
fn raw_text(fields: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    match lookup(fields, keys)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn port(fields: &Map<String, Value>) -> Option<u16> {
    let port = match lookup(fields, &["port"])? {
        Value::Number(n) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
        Value::String(s) => s.trim().parse::<u16>().ok(),
        _ => None,
    }?;
    (port != 0).then_some(port)
}

fn ssl(fields: &Map<String, Value>) -> bool {
    match lookup(fields, &["ssl", "tls"]) {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_u64() == Some(1),
        Some(Value::String(s)) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "true" | "1" | "yes" | "required"
        ),
        _ => false,
    }
}
