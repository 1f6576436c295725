//! Engines and the connection descriptor.

use clockwork_core::{ClockworkError, ClockworkResult, ValidateExt};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use validator::{Validate, ValidationError};

/// Default location of the embedded database file.
pub const DEFAULT_SQLITE_PATH: &str = "data/clockwork.sqlite";

/// Supported backing stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    /// MySQL server.
    #[default]
    MySql,
    /// MariaDB server (MySQL wire protocol).
    MariaDb,
    /// PostgreSQL, the ANSI-style engine.
    Postgres,
    /// Embedded file database.
    Sqlite,
}

impl Engine {
    /// All engines, in display order.
    pub const ALL: [Self; 4] = [Self::MySql, Self::MariaDb, Self::Postgres, Self::Sqlite];

    /// Canonical lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MySql => "mysql",
            Self::MariaDb => "mariadb",
            Self::Postgres => "postgres",
            Self::Sqlite => "sqlite",
        }
    }

    /// Port used when none is supplied. Zero for the embedded engine.
    #[must_use]
    pub const fn default_port(self) -> u16 {
        match self {
            Self::MySql | Self::MariaDb => 3306,
            Self::Postgres => 5432,
            Self::Sqlite => 0,
        }
    }

    /// Whether the engine is file-based.
    #[must_use]
    pub const fn is_embedded(self) -> bool {
        matches!(self, Self::Sqlite)
    }

    /// Whether the engine speaks the MySQL protocol.
    #[must_use]
    pub const fn is_mysql_family(self) -> bool {
        matches!(self, Self::MySql | Self::MariaDb)
    }

    /// Accepts canonical names and common aliases, case-insensitively.
    #[must_use]
    pub fn from_alias(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "mysql" => Some(Self::MySql),
            "mariadb" | "maria" => Some(Self::MariaDb),
            "postgres" | "postgresql" | "pg" | "pgsql" => Some(Self::Postgres),
            "sqlite" | "sqlite3" | "file" => Some(Self::Sqlite),
            _ => None,
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Engine {
    type Err = ClockworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_alias(s)
            .ok_or_else(|| ClockworkError::validation(format!("unknown database engine '{s}'")))
    }
}

/// A complete description of how to reach one backing store.
///
/// Descriptors are built wholesale (by the normalizer or the environment
/// fallback) and replaced wholesale on reconnect.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_engine_requirements"))]
pub struct ConnectionDescriptor {
    pub engine: Engine,
    #[validate(length(max = 255, message = "host must be at most 255 characters"))]
    pub host: String,
    /// Always zero for the embedded engine.
    pub port: u16,
    #[validate(length(max = 128, message = "user must be at most 128 characters"))]
    pub user: String,
    pub password: String,
    #[validate(length(max = 128, message = "database must be at most 128 characters"))]
    pub database: String,
    pub ssl: bool,
    /// Database file for the embedded engine.
    pub file_path: Option<PathBuf>,
}

fn validate_engine_requirements(descriptor: &ConnectionDescriptor) -> Result<(), ValidationError> {
    let missing = |field: &'static str| {
        let mut error = ValidationError::new("required");
        error.message = Some(format!("{field} is required for {}", descriptor.engine).into());
        error
    };

    if descriptor.engine.is_embedded() {
        let has_path = descriptor
            .file_path
            .as_ref()
            .is_some_and(|p| !p.as_os_str().is_empty());
        if !has_path {
            return Err(missing("file path"));
        }
        return Ok(());
    }

    if descriptor.host.trim().is_empty() {
        return Err(missing("host"));
    }
    if descriptor.port == 0 {
        return Err(missing("port"));
    }
    if descriptor.user.trim().is_empty() {
        return Err(missing("user"));
    }
    if descriptor.database.trim().is_empty() {
        return Err(missing("database"));
    }
    Ok(())
}

impl ConnectionDescriptor {
    /// Descriptor for a networked engine.
    #[must_use]
    pub fn networked(
        engine: Engine,
        host: impl Into<String>,
        port: u16,
        user: impl Into<String>,
        password: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        Self {
            engine,
            host: host.into(),
            port,
            user: user.into(),
            password: password.into(),
            database: database.into(),
            ssl: false,
            file_path: None,
        }
    }

    /// Descriptor for the embedded engine.
    #[must_use]
    pub fn embedded(file_path: impl Into<PathBuf>) -> Self {
        Self {
            engine: Engine::Sqlite,
            host: String::new(),
            port: 0,
            user: String::new(),
            password: String::new(),
            database: String::new(),
            ssl: false,
            file_path: Some(file_path.into()),
        }
    }

    /// Checks the engine-specific invariants.
    pub fn ensure_valid(&self) -> ClockworkResult<()> {
        self.validate_request()
    }

    /// Database name, or the file path for the embedded engine.
    #[must_use]
    pub fn target(&self) -> String {
        if self.engine.is_embedded() {
            self.file_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default()
        } else {
            self.database.clone()
        }
    }

    /// `host:port` for networked engines.
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Debug for ConnectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionDescriptor")
            .field("engine", &self.engine)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .field("ssl", &self.ssl)
            .field("file_path", &self.file_path)
            .finish()
    }
}
