//! Environment fallback descriptor.

use crate::{normalize_descriptor, ConnectionDescriptor};
use serde_json::{Map, Value};

/// Variables read for the fallback descriptor, paired with normalizer keys.
const ENV_KEYS: [(&str, &str); 8] = [
    ("DB_ENGINE", "engine"),
    ("DB_HOST", "host"),
    ("DB_PORT", "port"),
    ("DB_USER", "user"),
    ("DB_PASSWORD", "password"),
    ("DB_NAME", "database"),
    ("DB_SSL", "ssl"),
    ("DB_FILE", "filePath"),
];

/// At least one of these must be set for a fallback descriptor to exist.
const SIGNIFICANT_KEYS: [&str; 4] = ["DB_ENGINE", "DB_HOST", "DB_NAME", "DB_FILE"];

/// Builds a descriptor from the process environment.
#[must_use]
pub fn descriptor_from_env() -> Option<ConnectionDescriptor> {
    descriptor_from_lookup(|key| std::env::var(key).ok())
}

/// Builds a descriptor from an arbitrary variable lookup.
///
/// Returns `None` unless one of `DB_ENGINE`, `DB_HOST`, `DB_NAME` or
/// `DB_FILE` is present and non-empty.
pub fn descriptor_from_lookup<F>(lookup: F) -> Option<ConnectionDescriptor>
where
    F: Fn(&str) -> Option<String>,
{
    let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

    if !SIGNIFICANT_KEYS.iter().any(|key| read(*key).is_some()) {
        return None;
    }

    let fields: Map<String, Value> = ENV_KEYS
        .iter()
        .filter_map(|(env_key, field)| read(*env_key).map(|value| ((*field).to_string(), Value::String(value))))
        .collect();

    normalize_descriptor(&Value::Object(fields))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Engine;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_no_significant_keys() {
        let lookup = lookup_from(&[("DB_USER", "hr"), ("DB_PASSWORD", "pw")]);
        assert!(descriptor_from_lookup(lookup).is_none());
    }

    #[test]
    fn test_blank_values_do_not_count() {
        let lookup = lookup_from(&[("DB_HOST", "  ")]);
        assert!(descriptor_from_lookup(lookup).is_none());
    }

    #[test]
    fn test_full_environment() {
        let lookup = lookup_from(&[
            ("DB_ENGINE", "postgresql"),
            ("DB_HOST", "pg.internal"),
            ("DB_PORT", "6432"),
            ("DB_USER", "hr"),
            ("DB_PASSWORD", "pw"),
            ("DB_NAME", "orangehrm"),
            ("DB_SSL", "1"),
        ]);
        let descriptor = descriptor_from_lookup(lookup).unwrap();
        assert_eq!(descriptor.engine, Engine::Postgres);
        assert_eq!(descriptor.host, "pg.internal");
        assert_eq!(descriptor.port, 6432);
        assert_eq!(descriptor.database, "orangehrm");
        assert!(descriptor.ssl);
    }

    #[test]
    fn test_file_only_without_engine_stays_mysql() {
        let lookup = lookup_from(&[("DB_FILE", "/tmp/hr.sqlite")]);
        let descriptor = descriptor_from_lookup(lookup).unwrap();
        assert_eq!(descriptor.engine, Engine::MySql);
    }

    #[test]
    fn test_sqlite_file() {
        let lookup = lookup_from(&[("DB_ENGINE", "sqlite"), ("DB_FILE", "/tmp/hr.sqlite")]);
        let descriptor = descriptor_from_lookup(lookup).unwrap();
        assert_eq!(descriptor.engine, Engine::Sqlite);
        assert_eq!(descriptor.target(), "/tmp/hr.sqlite");
    }
}
