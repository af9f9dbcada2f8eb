use crate::config::SqliteConfig;
use crate::error::{Error, Result};
use crate::schema::Schema;
use crate::value::{SqlQuery, Value};
use log::{debug, info};
use rusqlite::types::ToSql;
use rusqlite::Connection;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const DEFAULT_CONNECTION: &str = "default";

/// Shared handle to one SQLite connection.
///
/// Cloning is cheap; every clone talks to the same connection. Setup
/// (pragmas, schema) happens once in [`Database::open`].
#[derive(Clone)]
pub struct Database {
    connection: Arc<Mutex<Connection>>,
    id_column: Arc<str>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("id_column", &self.id_column)
            .finish_non_exhaustive()
    }
}

impl Database {
    pub fn open(config: &SqliteConfig) -> Result<Self> {
        let connection = if config.is_memory() {
            Connection::open_in_memory()?
        } else {
            Connection::open(&config.db_path)?
        };
        info!("opened sqlite database at {}", config.db_path);

        connection.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
        if config.foreign_keys {
            connection.execute_batch("PRAGMA foreign_keys = ON;")?;
        }

        let database = Self {
            connection: Arc::new(Mutex::new(connection)),
            id_column: Arc::from(config.id_column.as_str()),
        };
        database.initialize_schema(&config.schema)?;
        Ok(database)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::open(&SqliteConfig::default())
    }

    /// Primary key column used by tables that don't name their own.
    pub fn id_column(&self) -> &str {
        &self.id_column
    }

    /// Run `f` with the connection locked.
    pub fn with_connection<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self
            .connection
            .lock()
            .map_err(|_| Error::ConnectionPoisoned)?;
        f(&conn)
    }

    pub fn initialize_schema(&self, schema: &Schema) -> Result<()> {
        if schema.tables.is_empty() {
            return Ok(());
        }
        let mut statements = Vec::new();
        for table in &schema.tables {
            statements.push(table.create_sql()?);
            for index in &table.indexes {
                statements.push(index.create_sql(&table.name)?);
            }
        }
        let batch = format!("{};", statements.join(";\n"));
        debug!("initializing schema:\n{}", batch);
        self.with_connection(|conn| Ok(conn.execute_batch(&batch)?))?;
        info!("schema ready ({} tables)", schema.tables.len());
        Ok(())
    }

    /// Run a raw statement with named parameters and collect every row.
    pub fn execute_sql(&self, query: &SqlQuery) -> Result<Vec<HashMap<String, Value>>> {
        debug!("raw query: {}", query.statement);
        self.with_connection(|conn| {
            let mut stmt = conn.prepare(&query.statement)?;
            let named = named_params(query);
            let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
            let mut rows = stmt.query(named.as_slice())?;
            let mut result = Vec::new();
            while let Some(row) = rows.next()? {
                let mut map = HashMap::with_capacity(columns.len());
                for (i, name) in columns.iter().enumerate() {
                    map.insert(name.clone(), Value::from(row.get_ref(i)?));
                }
                result.push(map);
            }
            Ok(result)
        })
    }

    /// Run a raw statement that returns no rows. Returns the number of rows changed.
    pub fn execute(&self, query: &SqlQuery) -> Result<usize> {
        debug!("raw execute: {}", query.statement);
        self.with_connection(|conn| {
            let named = named_params(query);
            Ok(conn.execute(&query.statement, named.as_slice())?)
        })
    }
}

fn named_params(query: &SqlQuery) -> Vec<(&str, &dyn ToSql)> {
    query
        .params
        .values
        .iter()
        .map(|(name, value)| (name.as_str(), value as &dyn ToSql))
        .collect()
}

/// Databases registered by name.
#[derive(Debug, Clone, Default)]
pub struct Connections {
    databases: HashMap<String, Database>,
}

impl Connections {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding `database` as the default connection.
    pub fn with_default(database: Database) -> Self {
        let mut connections = Self::new();
        connections.register(DEFAULT_CONNECTION, database);
        connections
    }

    /// Register `database` under `name`, replacing any earlier entry.
    pub fn register(&mut self, name: &str, database: Database) {
        self.databases.insert(name.to_string(), database);
    }

    pub fn get(&self, name: &str) -> Result<&Database> {
        self.databases
            .get(name)
            .ok_or_else(|| Error::UnknownConnection(name.to_string()))
    }

    pub fn default_connection(&self) -> Result<&Database> {
        self.get(DEFAULT_CONNECTION)
    }
}
