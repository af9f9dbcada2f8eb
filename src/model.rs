use crate::connection::Database;
use crate::error::Result;
use crate::record::Record;
use crate::value::Value;
use crate::wrapper::ModelQuery;
use std::collections::HashMap;

/// A named query step: receives the query chain plus forwarded arguments and
/// returns the (possibly narrowed) chain.
pub type Filter<M> = fn(ModelQuery<M>, &[Value]) -> Result<ModelQuery<M>>;

/// Filters a model exposes to [`ModelQuery::filter`].
pub struct FilterRegistry<M> {
    filters: HashMap<&'static str, Filter<M>>,
}

impl<M> FilterRegistry<M> {
    pub fn new() -> Self {
        Self {
            filters: HashMap::new(),
        }
    }

    /// Register `filter` under `name`, replacing any earlier entry.
    pub fn with(mut self, name: &'static str, filter: Filter<M>) -> Self {
        self.filters.insert(name, filter);
        self
    }

    pub fn get(&self, name: &str) -> Option<Filter<M>> {
        self.filters.get(name).copied()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.filters.keys().copied()
    }
}

impl<M> Default for FilterRegistry<M> {
    fn default() -> Self {
        Self::new()
    }
}

/// A caller-defined type that represents one row of a table.
///
/// ```ignore
/// struct User { record: Record }
///
/// impl Model for User {
///     fn table_name() -> &'static str { "users" }
///     fn from_record(record: Record) -> Self { Self { record } }
///     fn record(&self) -> &Record { &self.record }
///     fn record_mut(&mut self) -> &mut Record { &mut self.record }
///     fn filters() -> FilterRegistry<Self> {
///         FilterRegistry::new().with("adults", |q, _| Ok(q.where_gte("age", 18)))
///     }
/// }
/// ```
pub trait Model: Sized {
    fn table_name() -> &'static str;

    /// Wrap a fetched or created record. Never called for a missing row.
    fn from_record(record: Record) -> Self;

    fn record(&self) -> &Record;

    fn record_mut(&mut self) -> &mut Record;

    /// Primary key column; `None` uses the database default.
    fn id_column() -> Option<&'static str> {
        None
    }

    fn filters() -> FilterRegistry<Self> {
        FilterRegistry::new()
    }

    fn query(db: &Database) -> ModelQuery<Self> {
        ModelQuery::new(db)
    }

    fn id(&self) -> Option<i64> {
        self.record().id()
    }

    fn get(&self, field: &str) -> Option<&Value> {
        self.record().get(field)
    }

    fn set(&mut self, field: &str, value: impl Into<Value>) {
        self.record_mut().set(field, value);
    }

    fn is_new(&self) -> bool {
        self.record().is_new()
    }

    fn is_dirty(&self, field: &str) -> bool {
        self.record().is_dirty(field)
    }

    fn save(&mut self) -> Result<()> {
        self.record_mut().save()
    }

    fn delete(&self) -> Result<()> {
        self.record().delete()
    }
}
