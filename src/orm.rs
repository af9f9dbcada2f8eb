//! Table-scoped query builder returning raw [`Record`]s.

use crate::connection::Database;
use crate::error::{Error, Result};
use crate::query::{is_valid_identifier, quote_identifier, Query, QueryOperator};
use crate::record::Record;
use crate::value::Value;
use log::{debug, trace};
use rusqlite::params_from_iter;
use std::collections::HashMap;

/// A query bound to one table of one database.
///
/// Builder methods take `self` by value so calls chain:
///
/// ```ignore
/// let adults = Orm::for_table(&db, "users")
///     .where_gte("age", 18)
///     .order_by_asc("name")
///     .find_many()?;
/// ```
#[derive(Debug, Clone)]
pub struct Orm {
    db: Database,
    table: String,
    id_column: String,
    query: Query,
    order_by: Vec<(String, bool)>, // (field, is_ascending)
    limit: Option<u32>,
    offset: Option<u32>,
}

impl Orm {
    pub fn for_table(db: &Database, table: &str) -> Self {
        Self {
            db: db.clone(),
            table: table.to_string(),
            id_column: db.id_column().to_string(),
            query: Query::new(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    pub fn with_id_column(mut self, id_column: &str) -> Self {
        self.id_column = id_column.to_string();
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn id_column(&self) -> &str {
        &self.id_column
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn where_op(mut self, field: &str, op: QueryOperator) -> Self {
        self.query = self.query.with_condition(field, op);
        self
    }

    pub fn where_eq(self, field: &str, value: impl Into<Value>) -> Self {
        self.where_op(field, QueryOperator::Equal(value.into()))
    }

    pub fn where_not_eq(self, field: &str, value: impl Into<Value>) -> Self {
        self.where_op(field, QueryOperator::NotEqual(value.into()))
    }

    pub fn where_gt(self, field: &str, value: impl Into<Value>) -> Self {
        self.where_op(field, QueryOperator::GreaterThan(value.into()))
    }

    pub fn where_gte(self, field: &str, value: impl Into<Value>) -> Self {
        self.where_op(field, QueryOperator::GreaterThanOrEqual(value.into()))
    }

    pub fn where_lt(self, field: &str, value: impl Into<Value>) -> Self {
        self.where_op(field, QueryOperator::LessThan(value.into()))
    }

    pub fn where_lte(self, field: &str, value: impl Into<Value>) -> Self {
        self.where_op(field, QueryOperator::LessThanOrEqual(value.into()))
    }

    pub fn where_like(self, field: &str, pattern: &str) -> Self {
        self.where_op(field, QueryOperator::Like(pattern.to_string()))
    }

    pub fn where_in<V: Into<Value>>(self, field: &str, values: impl IntoIterator<Item = V>) -> Self {
        let values = values.into_iter().map(Into::into).collect();
        self.where_op(field, QueryOperator::In(values))
    }

    pub fn where_null(self, field: &str) -> Self {
        self.where_op(field, QueryOperator::IsNull)
    }

    pub fn where_not_null(self, field: &str) -> Self {
        self.where_op(field, QueryOperator::IsNotNull)
    }

    pub fn order_by_asc(mut self, field: &str) -> Self {
        self.order_by.push((field.to_string(), true));
        self
    }

    pub fn order_by_desc(mut self, field: &str) -> Self {
        self.order_by.push((field.to_string(), false));
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Fetch the first matching row, optionally restricted to primary key `id`.
    pub fn find_one(&self, id: Option<i64>) -> Result<Option<Record>> {
        let mut orm = self.clone();
        if let Some(id) = id {
            let id_column = orm.id_column.clone();
            orm = orm.where_eq(&id_column, id);
        }
        let mut rows = orm.limit(1).run_select()?;
        Ok(rows.pop())
    }

    pub fn find_many(&self) -> Result<Vec<Record>> {
        self.run_select()
    }

    pub fn count(&self) -> Result<i64> {
        let mut params = Vec::new();
        let sql = format!(
            "SELECT COUNT(*) FROM {}{}",
            quote_identifier(&self.table)?,
            self.query.where_clause(&mut params)?
        );
        debug!("count on {}: {}", self.table, sql);
        trace!("bind values: {:?}", params);
        self.db.with_connection(|conn| {
            Ok(conn.query_row(&sql, params_from_iter(params.iter()), |row| row.get(0))?)
        })
    }

    /// A new, unsaved record for this table seeded with `data`.
    ///
    /// Every supplied field is marked dirty so [`Record::save`] inserts it.
    pub fn create(&self, data: Option<HashMap<String, Value>>) -> Result<Record> {
        quote_identifier(&self.table)?;
        let mut record = Record::new_unsaved(self.db.clone(), &self.table, &self.id_column);
        for (field, value) in data.unwrap_or_default() {
            if !is_valid_identifier(&field) {
                return Err(Error::InvalidIdentifier(field));
            }
            record.set(&field, value);
        }
        Ok(record)
    }

    /// Delete every row matching the current conditions.
    pub fn delete_many(&self) -> Result<usize> {
        let mut params = Vec::new();
        let sql = format!(
            "DELETE FROM {}{}",
            quote_identifier(&self.table)?,
            self.query.where_clause(&mut params)?
        );
        debug!("delete on {}: {}", self.table, sql);
        trace!("bind values: {:?}", params);
        self.db
            .with_connection(|conn| Ok(conn.execute(&sql, params_from_iter(params.iter()))?))
    }

    pub(crate) fn select_sql(&self, params: &mut Vec<Value>) -> Result<String> {
        let mut sql = format!(
            "SELECT * FROM {}{}",
            quote_identifier(&self.table)?,
            self.query.where_clause(params)?
        );
        if !self.order_by.is_empty() {
            let mut terms = Vec::with_capacity(self.order_by.len());
            for (field, ascending) in &self.order_by {
                let direction = if *ascending { "ASC" } else { "DESC" };
                terms.push(format!("{} {}", quote_identifier(field)?, direction));
            }
            sql.push_str(" ORDER BY ");
            sql.push_str(&terms.join(", "));
        }
        match (self.limit, self.offset) {
            (Some(limit), Some(offset)) => sql.push_str(&format!(" LIMIT {} OFFSET {}", limit, offset)),
            (Some(limit), None) => sql.push_str(&format!(" LIMIT {}", limit)),
            // SQLite requires a LIMIT before OFFSET
            (None, Some(offset)) => sql.push_str(&format!(" LIMIT -1 OFFSET {}", offset)),
            (None, None) => {}
        }
        Ok(sql)
    }

    fn run_select(&self) -> Result<Vec<Record>> {
        let mut params = Vec::new();
        let sql = self.select_sql(&mut params)?;
        debug!("select on {}: {}", self.table, sql);
        trace!("bind values: {:?}", params);

        let rows = self.db.with_connection(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
            let mut rows = stmt.query(params_from_iter(params.iter()))?;
            let mut result = Vec::new();
            while let Some(row) = rows.next()? {
                let mut data = HashMap::with_capacity(columns.len());
                for (i, name) in columns.iter().enumerate() {
                    data.insert(name.clone(), Value::from(row.get_ref(i)?));
                }
                result.push(data);
            }
            Ok(result)
        })?;

        Ok(rows
            .into_iter()
            .map(|data| Record::fetched(self.db.clone(), &self.table, &self.id_column, data))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_sql_orders_and_pages() {
        let db = Database::open_in_memory().unwrap();
        let orm = Orm::for_table(&db, "users")
            .where_eq("active", true)
            .order_by_desc("age")
            .order_by_asc("name")
            .offset(20);
        let mut params = Vec::new();
        let sql = orm.select_sql(&mut params).unwrap();
        assert_eq!(
            sql,
            r#"SELECT * FROM "users" WHERE "active" = ? ORDER BY "age" DESC, "name" ASC LIMIT -1 OFFSET 20"#
        );
        assert_eq!(params, vec![Value::Boolean(true)]);

        let sql = orm.limit(10).select_sql(&mut Vec::new()).unwrap();
        assert!(sql.ends_with("LIMIT 10 OFFSET 20"));
    }

    #[test]
    fn create_rejects_bad_field_names() {
        let db = Database::open_in_memory().unwrap();
        let mut data = HashMap::new();
        data.insert("bad name".to_string(), Value::Integer(1));
        let err = Orm::for_table(&db, "users").create(Some(data)).unwrap_err();
        assert!(matches!(err, Error::InvalidIdentifier(f) if f == "bad name"));
    }
}
