use crate::error::Result;
use crate::query::quote_identifier;
use serde::{Deserialize, Serialize};

/// Schema definition for the SQLite database
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(default)]
    pub tables: Vec<TableDefinition>,
}

impl Schema {
    pub fn new() -> Self {
        Self { tables: Vec::new() }
    }
    pub fn add_table(mut self, table: TableDefinition) -> Self {
        self.tables.push(table);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDefinition {
    pub name: String,
    pub columns: Vec<ColumnDefinition>,
    #[serde(default)]
    pub primary_key: Vec<String>,
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKey>,
    #[serde(default)]
    pub indexes: Vec<IndexDefinition>,
}

impl TableDefinition {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            columns: Vec::new(),
            primary_key: Vec::new(),
            foreign_keys: Vec::new(),
            indexes: Vec::new(),
        }
    }

    pub fn column(mut self, column: ColumnDefinition) -> Self {
        self.columns.push(column);
        self
    }

    pub fn primary_key(mut self, columns: &[&str]) -> Self {
        self.primary_key = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn foreign_key(mut self, fk: ForeignKey) -> Self {
        self.foreign_keys.push(fk);
        self
    }

    pub fn index(mut self, index: IndexDefinition) -> Self {
        self.indexes.push(index);
        self
    }

    /// `CREATE TABLE IF NOT EXISTS` statement for this table.
    ///
    /// The table-level `PRIMARY KEY (...)` is only emitted when no column
    /// carries its own `PRIMARY KEY` constraint.
    pub fn create_sql(&self) -> Result<String> {
        let mut defs = Vec::new();
        for column in &self.columns {
            defs.push(column.definition_sql()?);
        }

        let column_pk = self
            .columns
            .iter()
            .any(|c| c.constraints.contains(&ColumnConstraint::PrimaryKey));
        if !column_pk && !self.primary_key.is_empty() {
            defs.push(format!("PRIMARY KEY ({})", quote_list(&self.primary_key)?));
        }

        for fk in &self.foreign_keys {
            defs.push(format!(
                "FOREIGN KEY ({}) REFERENCES {} ({}) ON DELETE {} ON UPDATE {}",
                quote_identifier(&fk.column)?,
                quote_identifier(&fk.foreign_table)?,
                quote_identifier(&fk.foreign_column)?,
                fk.on_delete.as_sql(),
                fk.on_update.as_sql(),
            ));
        }

        Ok(format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            quote_identifier(&self.name)?,
            defs.join(", ")
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    pub name: String,
    pub data_type: DataType,
    #[serde(default)]
    pub constraints: Vec<ColumnConstraint>,
    #[serde(default)]
    pub default_value: Option<DefaultValue>,
}

impl ColumnDefinition {
    pub fn new(name: &str, data_type: DataType) -> Self {
        Self {
            name: name.to_string(),
            data_type,
            constraints: Vec::new(),
            default_value: None,
        }
    }

    pub fn constraint(mut self, constraint: ColumnConstraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn default_value(mut self, value: DefaultValue) -> Self {
        self.default_value = Some(value);
        self
    }

    fn definition_sql(&self) -> Result<String> {
        let mut sql = format!("{} {}", quote_identifier(&self.name)?, self.data_type.as_sql());
        for constraint in &self.constraints {
            sql.push(' ');
            sql.push_str(constraint.as_sql());
        }
        if let Some(default) = &self.default_value {
            sql.push_str(" DEFAULT ");
            sql.push_str(&default.as_sql());
        }
        Ok(sql)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    Integer,
    Text,
    Real,
    Blob,
}

impl DataType {
    pub fn as_sql(self) -> &'static str {
        match self {
            DataType::Integer => "INTEGER",
            DataType::Text => "TEXT",
            DataType::Real => "REAL",
            DataType::Blob => "BLOB",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnConstraint {
    PrimaryKey,
    NotNull,
    Unique,
}

impl ColumnConstraint {
    pub fn as_sql(self) -> &'static str {
        match self {
            ColumnConstraint::PrimaryKey => "PRIMARY KEY",
            ColumnConstraint::NotNull => "NOT NULL",
            ColumnConstraint::Unique => "UNIQUE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DefaultValue {
    Integer(i64),
    Text(String),
    Real(f64),
    Null,
    CurrentTimestamp,
}

impl DefaultValue {
    pub fn as_sql(&self) -> String {
        match self {
            DefaultValue::Integer(v) => v.to_string(),
            DefaultValue::Text(s) => format!("'{}'", s.replace('\'', "''")),
            DefaultValue::Real(v) => format!("{:?}", v),
            DefaultValue::Null => "NULL".to_string(),
            DefaultValue::CurrentTimestamp => "CURRENT_TIMESTAMP".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignKey {
    pub column: String,
    pub foreign_table: String,
    pub foreign_column: String,
    #[serde(default)]
    pub on_delete: ForeignKeyAction,
    #[serde(default)]
    pub on_update: ForeignKeyAction,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForeignKeyAction {
    #[default]
    NoAction,
    Cascade,
    SetNull,
    SetDefault,
    Restrict,
}

impl ForeignKeyAction {
    pub fn as_sql(self) -> &'static str {
        match self {
            ForeignKeyAction::NoAction => "NO ACTION",
            ForeignKeyAction::Cascade => "CASCADE",
            ForeignKeyAction::SetNull => "SET NULL",
            ForeignKeyAction::SetDefault => "SET DEFAULT",
            ForeignKeyAction::Restrict => "RESTRICT",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexDefinition {
    pub name: String,
    pub columns: Vec<String>,
    #[serde(default)]
    pub unique: bool,
}

impl IndexDefinition {
    pub fn create_sql(&self, table: &str) -> Result<String> {
        Ok(format!(
            "CREATE {}INDEX IF NOT EXISTS {} ON {} ({})",
            if self.unique { "UNIQUE " } else { "" },
            quote_identifier(&self.name)?,
            quote_identifier(table)?,
            quote_list(&self.columns)?
        ))
    }
}

fn quote_list(names: &[String]) -> Result<String> {
    let quoted = names
        .iter()
        .map(|n| quote_identifier(n))
        .collect::<Result<Vec<_>>>()?;
    Ok(quoted.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users() -> TableDefinition {
        TableDefinition::new("users")
            .column(
                ColumnDefinition::new("id", DataType::Integer)
                    .constraint(ColumnConstraint::PrimaryKey),
            )
            .column(
                ColumnDefinition::new("name", DataType::Text).constraint(ColumnConstraint::NotNull),
            )
            .column(
                ColumnDefinition::new("active", DataType::Integer)
                    .default_value(DefaultValue::Integer(1)),
            )
            .index(IndexDefinition {
                name: "idx_users_name".into(),
                columns: vec!["name".into()],
                unique: true,
            })
    }

    #[test]
    fn renders_create_table() {
        assert_eq!(
            users().create_sql().unwrap(),
            r#"CREATE TABLE IF NOT EXISTS "users" ("id" INTEGER PRIMARY KEY, "name" TEXT NOT NULL, "active" INTEGER DEFAULT 1)"#
        );
    }

    #[test]
    fn table_primary_key_only_without_column_pk() {
        let table = TableDefinition::new("memberships")
            .column(ColumnDefinition::new("user_id", DataType::Integer))
            .column(ColumnDefinition::new("group_id", DataType::Integer))
            .primary_key(&["user_id", "group_id"])
            .foreign_key(ForeignKey {
                column: "user_id".into(),
                foreign_table: "users".into(),
                foreign_column: "id".into(),
                on_delete: ForeignKeyAction::Cascade,
                on_update: ForeignKeyAction::NoAction,
            });
        let sql = table.create_sql().unwrap();
        assert!(sql.contains(r#"PRIMARY KEY ("user_id", "group_id")"#));
        assert!(sql.contains(
            r#"FOREIGN KEY ("user_id") REFERENCES "users" ("id") ON DELETE CASCADE ON UPDATE NO ACTION"#
        ));

        let with_column_pk = users().primary_key(&["id"]).create_sql().unwrap();
        assert!(!with_column_pk.contains("PRIMARY KEY ("));
    }

    #[test]
    fn renders_index_and_escapes_defaults() {
        let table = users();
        assert_eq!(
            table.indexes[0].create_sql(&table.name).unwrap(),
            r#"CREATE UNIQUE INDEX IF NOT EXISTS "idx_users_name" ON "users" ("name")"#
        );
        assert_eq!(DefaultValue::Text("it's".into()).as_sql(), "'it''s'");
        assert_eq!(DefaultValue::Real(1.0).as_sql(), "1.0");
    }
}
