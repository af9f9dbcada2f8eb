//! Query chain that hands back model instances instead of raw records.

use crate::connection::{Connections, Database};
use crate::error::{Error, Result};
use crate::model::Model;
use crate::orm::Orm;
use crate::record::Record;
use crate::value::Value;
use log::warn;
use std::collections::HashMap;
use std::marker::PhantomData;

/// An [`Orm`] query whose results are wrapped in `M`.
pub struct ModelQuery<M> {
    orm: Orm,
    _model: PhantomData<fn() -> M>,
}

impl<M> Clone for ModelQuery<M> {
    fn clone(&self) -> Self {
        Self {
            orm: self.orm.clone(),
            _model: PhantomData,
        }
    }
}

impl<M> std::fmt::Debug for ModelQuery<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelQuery")
            .field("model", &std::any::type_name::<M>())
            .field("orm", &self.orm)
            .finish()
    }
}

impl<M: Model> ModelQuery<M> {
    /// Query over `M::table_name()`.
    pub fn new(db: &Database) -> Self {
        Self::for_table(db, M::table_name())
    }

    pub fn for_table(db: &Database, table: &str) -> Self {
        let mut orm = Orm::for_table(db, table);
        if let Some(id_column) = M::id_column() {
            orm = orm.with_id_column(id_column);
        }
        Self::from_orm(orm)
    }

    /// Like [`ModelQuery::for_table`] against a named connection.
    pub fn for_table_on(connections: &Connections, table: &str, connection: &str) -> Result<Self> {
        Ok(Self::for_table(connections.get(connection)?, table))
    }

    pub fn from_orm(orm: Orm) -> Self {
        Self {
            orm,
            _model: PhantomData,
        }
    }

    /// Keep this query chain but wrap results in `N` from now on.
    pub fn into_model<N: Model>(self) -> ModelQuery<N> {
        ModelQuery::from_orm(self.orm)
    }

    pub fn orm(&self) -> &Orm {
        &self.orm
    }

    /// Apply an arbitrary builder step to the underlying query.
    pub fn map_query(self, f: impl FnOnce(Orm) -> Orm) -> Self {
        Self::from_orm(f(self.orm))
    }

    /// Run the filter `M` registered as `name`, passing this query and `args`.
    pub fn filter(self, name: &str, args: &[Value]) -> Result<Self> {
        let filters = M::filters();
        match filters.get(name) {
            Some(filter) => filter(self, args),
            None => {
                let mut known: Vec<_> = filters.names().collect();
                known.sort_unstable();
                warn!(
                    "filter `{}` not registered on {} (known: {:?})",
                    name,
                    std::any::type_name::<M>(),
                    known
                );
                Err(Error::UnknownFilter {
                    model: std::any::type_name::<M>().to_string(),
                    filter: name.to_string(),
                })
            }
        }
    }

    pub fn find_one(&self, id: Option<i64>) -> Result<Option<M>> {
        Ok(self.orm.find_one(id)?.map(wrap))
    }

    pub fn find_many(&self) -> Result<Vec<M>> {
        Ok(self.orm.find_many()?.into_iter().map(wrap).collect())
    }

    /// A new, unsaved model seeded with `data`.
    pub fn create(&self, data: Option<HashMap<String, Value>>) -> Result<M> {
        self.orm.create(data).map(wrap)
    }

    pub fn count(&self) -> Result<i64> {
        self.orm.count()
    }

    pub fn delete_many(&self) -> Result<usize> {
        self.orm.delete_many()
    }

    pub fn where_eq(self, field: &str, value: impl Into<Value>) -> Self {
        self.map_query(|orm| orm.where_eq(field, value))
    }

    pub fn where_not_eq(self, field: &str, value: impl Into<Value>) -> Self {
        self.map_query(|orm| orm.where_not_eq(field, value))
    }

    pub fn where_gt(self, field: &str, value: impl Into<Value>) -> Self {
        self.map_query(|orm| orm.where_gt(field, value))
    }

    pub fn where_gte(self, field: &str, value: impl Into<Value>) -> Self {
        self.map_query(|orm| orm.where_gte(field, value))
    }

    pub fn where_lt(self, field: &str, value: impl Into<Value>) -> Self {
        self.map_query(|orm| orm.where_lt(field, value))
    }

    pub fn where_lte(self, field: &str, value: impl Into<Value>) -> Self {
        self.map_query(|orm| orm.where_lte(field, value))
    }

    pub fn where_like(self, field: &str, pattern: &str) -> Self {
        self.map_query(|orm| orm.where_like(field, pattern))
    }

    pub fn where_in<V: Into<Value>>(self, field: &str, values: impl IntoIterator<Item = V>) -> Self {
        self.map_query(|orm| orm.where_in(field, values))
    }

    pub fn where_null(self, field: &str) -> Self {
        self.map_query(|orm| orm.where_null(field))
    }

    pub fn where_not_null(self, field: &str) -> Self {
        self.map_query(|orm| orm.where_not_null(field))
    }

    pub fn order_by_asc(self, field: &str) -> Self {
        self.map_query(|orm| orm.order_by_asc(field))
    }

    pub fn order_by_desc(self, field: &str) -> Self {
        self.map_query(|orm| orm.order_by_desc(field))
    }

    pub fn limit(self, limit: u32) -> Self {
        self.map_query(|orm| orm.limit(limit))
    }

    pub fn offset(self, offset: u32) -> Self {
        self.map_query(|orm| orm.offset(offset))
    }
}

fn wrap<M: Model>(record: Record) -> M {
    M::from_record(record)
}
