use crate::connection::Database;
use crate::error::{Error, Result};
use crate::query::quote_identifier;
use crate::value::Value;
use log::{debug, trace};
use rusqlite::params_from_iter;
use std::collections::{BTreeSet, HashMap};

/// One raw row of a table, fetched or newly created.
///
/// Field writes are tracked so that [`Record::save`] only touches what changed.
#[derive(Debug, Clone)]
pub struct Record {
    db: Database,
    table: String,
    id_column: String,
    data: HashMap<String, Value>,
    dirty: BTreeSet<String>,
    is_new: bool,
}

impl Record {
    pub(crate) fn fetched(
        db: Database,
        table: &str,
        id_column: &str,
        data: HashMap<String, Value>,
    ) -> Self {
        Self {
            db,
            table: table.to_string(),
            id_column: id_column.to_string(),
            data,
            dirty: BTreeSet::new(),
            is_new: false,
        }
    }

    pub(crate) fn new_unsaved(db: Database, table: &str, id_column: &str) -> Self {
        Self {
            is_new: true,
            ..Self::fetched(db, table, id_column, HashMap::new())
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn id_column(&self) -> &str {
        &self.id_column
    }

    /// Primary key, if set and an integer.
    pub fn id(&self) -> Option<i64> {
        self.id_value().and_then(Value::as_i64)
    }

    /// Primary key of any storage class, `None` when absent or `NULL`.
    pub fn id_value(&self) -> Option<&Value> {
        self.data.get(&self.id_column).filter(|v| !v.is_null())
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.data.get(field)
    }

    pub fn set(&mut self, field: &str, value: impl Into<Value>) {
        self.data.insert(field.to_string(), value.into());
        self.dirty.insert(field.to_string());
    }

    pub fn is_dirty(&self, field: &str) -> bool {
        self.dirty.contains(field)
    }

    /// True until the record has been inserted.
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    pub fn fields(&self) -> &HashMap<String, Value> {
        &self.data
    }

    /// Insert a new record or update the dirty fields of an existing one.
    pub fn save(&mut self) -> Result<()> {
        if self.is_new {
            self.insert()?;
        } else {
            self.update()?;
        }
        self.dirty.clear();
        Ok(())
    }

    fn insert(&mut self) -> Result<()> {
        let table = quote_identifier(&self.table)?;
        let mut columns = Vec::with_capacity(self.dirty.len());
        let mut values = Vec::with_capacity(self.dirty.len());
        for field in &self.dirty {
            columns.push(quote_identifier(field)?);
            values.push(self.data[field].clone());
        }

        let sql = if columns.is_empty() {
            format!("INSERT INTO {} DEFAULT VALUES", table)
        } else {
            format!(
                "INSERT INTO {} ({}) VALUES ({})",
                table,
                columns.join(", "),
                vec!["?"; columns.len()].join(", ")
            )
        };
        debug!("insert into {}: {}", self.table, sql);
        trace!("bind values: {:?}", values);

        let rowid = self.db.with_connection(|conn| {
            conn.execute(&sql, params_from_iter(values.iter()))?;
            Ok(conn.last_insert_rowid())
        })?;

        // rowid only stands in for a key the caller did not supply
        if self.id_value().is_none() {
            self.data.insert(self.id_column.clone(), Value::Integer(rowid));
        }
        self.is_new = false;
        Ok(())
    }

    fn update(&mut self) -> Result<()> {
        if self.dirty.is_empty() {
            return Ok(());
        }
        let id = self.require_id()?;
        let mut assignments = Vec::with_capacity(self.dirty.len());
        let mut values = Vec::with_capacity(self.dirty.len() + 1);
        for field in &self.dirty {
            assignments.push(format!("{} = ?", quote_identifier(field)?));
            values.push(self.data[field].clone());
        }
        values.push(id);

        let sql = format!(
            "UPDATE {} SET {} WHERE {} = ?",
            quote_identifier(&self.table)?,
            assignments.join(", "),
            quote_identifier(&self.id_column)?
        );
        debug!("update {}: {}", self.table, sql);
        trace!("bind values: {:?}", values);

        self.db.with_connection(|conn| {
            conn.execute(&sql, params_from_iter(values.iter()))?;
            Ok(())
        })
    }

    /// Delete this row by primary key.
    pub fn delete(&self) -> Result<()> {
        let id = self.require_id()?;
        let sql = format!(
            "DELETE FROM {} WHERE {} = ?",
            quote_identifier(&self.table)?,
            quote_identifier(&self.id_column)?
        );
        debug!("delete from {}: {}", self.table, sql);
        self.db.with_connection(|conn| {
            conn.execute(&sql, [&id])?;
            Ok(())
        })
    }

    fn require_id(&self) -> Result<Value> {
        self.id_value().cloned().ok_or_else(|| Error::MissingId {
            table: self.table.clone(),
        })
    }
}
