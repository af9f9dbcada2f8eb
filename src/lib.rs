//! Typed model layer over a table-scoped SQLite query builder.
//!
//! # Intention
//!
//! - Let callers query a table and get back their own model types instead of raw rows.
//! - Keep the SQL side small: a table query builder ([`Orm`]) producing [`Record`]s,
//!   and a wrapper ([`ModelQuery`]) that turns each record into a [`Model`].
//!
//! # Architectural Boundaries
//!
//! - Only SQLite/database code belongs here.
//! - Models own their business logic; this crate only binds rows to them.
//!
//! ```ignore
//! let db = Database::open(&SqliteConfig::load("db.toml")?)?;
//! let adults: Vec<User> = User::query(&db)
//!     .filter("adults", &[])?
//!     .order_by_asc("name")
//!     .find_many()?;
//! ```

pub mod config;
pub mod connection;
pub mod error;
pub mod model;
pub mod orm;
pub mod query;
pub mod record;
pub mod schema;
pub mod value;
pub mod wrapper;

pub use config::SqliteConfig;
pub use connection::{Connections, Database, DEFAULT_CONNECTION};
pub use error::{Error, Result};
pub use model::{Filter, FilterRegistry, Model};
pub use orm::Orm;
pub use query::{Query, QueryOperator};
pub use record::Record;
pub use schema::{
    ColumnConstraint, ColumnDefinition, DataType, DefaultValue, ForeignKey, ForeignKeyAction,
    IndexDefinition, Schema, TableDefinition,
};
pub use value::{Params, SqlQuery, Value};
pub use wrapper::ModelQuery;
