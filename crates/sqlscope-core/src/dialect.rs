//! SQL dialect resolution
//!
//! Maps the client-type string stored on a data source to the internal
//! `Dialect` value shared by the validator and the introspector. The mapping
//! is derived once per request and never changes mid-flight.

use serde::{Deserialize, Serialize};
use sqlparser::dialect::{
    Dialect as ParserDialect, GenericDialect, MsSqlDialect, MySqlDialect, PostgreSqlDialect,
    SQLiteDialect,
};

/// The SQL grammar/catalog variant a data source speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    Postgres,
    MySql,
    SqlServer,
    Sqlite,
    /// ANSI-ish fallback for engines without a native grammar. Oracle data
    /// sources resolve here; sqlparser has no Oracle grammar, so generic SQL
    /// is the nearest supported approximation.
    Generic,
}

impl Dialect {
    /// Resolve a stored client-type string to a dialect.
    ///
    /// Unknown client types resolve to `Generic` rather than erroring so a
    /// misconfigured data source still gets best-effort validation.
    pub fn from_client_type(client_type: &str) -> Self {
        match client_type.trim().to_ascii_lowercase().as_str() {
            "pg" | "postgres" | "postgresql" => Dialect::Postgres,
            "mysql" | "mariadb" => Dialect::MySql,
            "mssql" | "sqlserver" => Dialect::SqlServer,
            "sqlite3" | "sqlite" => Dialect::Sqlite,
            other => {
                if other != "oracledb" {
                    tracing::debug!(client_type = %other, "unknown client type, using generic dialect");
                }
                Dialect::Generic
            }
        }
    }

    /// Stable identifier used in logs and serialized output
    pub fn id(&self) -> &'static str {
        match self {
            Dialect::Postgres => "postgres",
            Dialect::MySql => "mysql",
            Dialect::SqlServer => "mssql",
            Dialect::Sqlite => "sqlite",
            Dialect::Generic => "generic",
        }
    }

    /// Display name for UI surfaces
    pub fn display_name(&self) -> &'static str {
        match self {
            Dialect::Postgres => "PostgreSQL",
            Dialect::MySql => "MySQL",
            Dialect::SqlServer => "SQL Server",
            Dialect::Sqlite => "SQLite",
            Dialect::Generic => "Generic SQL",
        }
    }

    /// Get the sqlparser dialect for this variant
    pub fn parser_dialect(&self) -> Box<dyn ParserDialect> {
        match self {
            Dialect::Postgres => Box::new(PostgreSqlDialect {}),
            Dialect::MySql => Box::new(MySqlDialect {}),
            Dialect::SqlServer => Box::new(MsSqlDialect {}),
            Dialect::Sqlite => Box::new(SQLiteDialect {}),
            Dialect::Generic => Box::new(GenericDialect {}),
        }
    }

    /// Quote an identifier for use in a catalog query against this engine
    pub fn quote_ident(&self, ident: &str) -> String {
        match self {
            Dialect::MySql => format!("`{}`", ident.replace('`', "``")),
            Dialect::SqlServer => format!("[{}]", ident.replace(']', "]]")),
            _ => format!("\"{}\"", ident.replace('"', "\"\"")),
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_client_type() {
        assert_eq!(Dialect::from_client_type("pg"), Dialect::Postgres);
        assert_eq!(Dialect::from_client_type("mysql"), Dialect::MySql);
        assert_eq!(Dialect::from_client_type("mssql"), Dialect::SqlServer);
        assert_eq!(Dialect::from_client_type("sqlite3"), Dialect::Sqlite);
        assert_eq!(Dialect::from_client_type("oracledb"), Dialect::Generic);
    }

    #[test]
    fn test_from_client_type_is_case_insensitive() {
        assert_eq!(Dialect::from_client_type(" PG "), Dialect::Postgres);
        assert_eq!(Dialect::from_client_type("MySQL"), Dialect::MySql);
    }

    #[test]
    fn test_unknown_client_type_falls_back_to_generic() {
        assert_eq!(Dialect::from_client_type("cockroach"), Dialect::Generic);
        assert_eq!(Dialect::from_client_type(""), Dialect::Generic);
    }

    #[test]
    fn test_quote_ident_per_engine() {
        assert_eq!(Dialect::Postgres.quote_ident("users"), "\"users\"");
        assert_eq!(Dialect::MySql.quote_ident("users"), "`users`");
        assert_eq!(Dialect::SqlServer.quote_ident("users"), "[users]");
        assert_eq!(Dialect::Postgres.quote_ident("we\"ird"), "\"we\"\"ird\"");
    }
}
