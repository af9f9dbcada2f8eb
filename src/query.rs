use crate::error::{Error, Result};
use crate::value::Value;

/// Query operators for building advanced queries
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOperator {
    Equal(Value),
    NotEqual(Value),
    GreaterThan(Value),
    GreaterThanOrEqual(Value),
    LessThan(Value),
    LessThanOrEqual(Value),
    Like(String),
    In(Vec<Value>),
    IsNull,
    IsNotNull,
}

/// Query builder for composable, immutable queries.
///
/// Conditions are kept in the order they were added and joined with `AND`.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Query {
    pub conditions: Vec<(String, QueryOperator)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_condition(mut self, field: &str, op: QueryOperator) -> Self {
        self.conditions.push((field.to_string(), op));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Render ` WHERE ...` (with leading space) and push bind values onto `params`.
    /// Returns an empty string when there are no conditions.
    pub fn where_clause(&self, params: &mut Vec<Value>) -> Result<String> {
        if self.is_empty() {
            return Ok(String::new());
        }
        let mut parts = Vec::with_capacity(self.conditions.len());
        for (field, op) in &self.conditions {
            let column = quote_identifier(field)?;
            let part = match op {
                QueryOperator::Equal(v) => binary(&column, "=", v, params),
                QueryOperator::NotEqual(v) => binary(&column, "<>", v, params),
                QueryOperator::GreaterThan(v) => binary(&column, ">", v, params),
                QueryOperator::GreaterThanOrEqual(v) => binary(&column, ">=", v, params),
                QueryOperator::LessThan(v) => binary(&column, "<", v, params),
                QueryOperator::LessThanOrEqual(v) => binary(&column, "<=", v, params),
                QueryOperator::Like(pattern) => {
                    params.push(Value::Text(pattern.clone()));
                    format!("{} LIKE ?", column)
                }
                QueryOperator::In(values) if values.is_empty() => "0 = 1".to_string(),
                QueryOperator::In(values) => {
                    params.extend(values.iter().cloned());
                    let placeholders = vec!["?"; values.len()].join(", ");
                    format!("{} IN ({})", column, placeholders)
                }
                QueryOperator::IsNull => format!("{} IS NULL", column),
                QueryOperator::IsNotNull => format!("{} IS NOT NULL", column),
            };
            parts.push(part);
        }
        Ok(format!(" WHERE {}", parts.join(" AND ")))
    }
}

fn binary(column: &str, op: &str, value: &Value, params: &mut Vec<Value>) -> String {
    params.push(value.clone());
    format!("{} {} ?", column, op)
}

/// Whether `name` is usable as a bare SQL identifier.
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Validate and double-quote an identifier.
pub fn quote_identifier(name: &str) -> Result<String> {
    if is_valid_identifier(name) {
        Ok(format!("\"{}\"", name))
    } else {
        Err(Error::InvalidIdentifier(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_query_renders_nothing() {
        let mut params = Vec::new();
        assert_eq!(Query::new().where_clause(&mut params).unwrap(), "");
        assert!(params.is_empty());
    }

    #[test]
    fn conditions_keep_insertion_order() {
        let query = Query::new()
            .with_condition("name", QueryOperator::Like("J%".into()))
            .with_condition("age", QueryOperator::GreaterThanOrEqual(Value::Integer(18)))
            .with_condition("email", QueryOperator::IsNotNull);
        let mut params = Vec::new();
        let sql = query.where_clause(&mut params).unwrap();
        assert_eq!(
            sql,
            r#" WHERE "name" LIKE ? AND "age" >= ? AND "email" IS NOT NULL"#
        );
        assert_eq!(params, vec![Value::Text("J%".into()), Value::Integer(18)]);
    }

    #[test]
    fn in_expands_placeholders() {
        let query = Query::new().with_condition(
            "id",
            QueryOperator::In(vec![Value::Integer(1), Value::Integer(2), Value::Integer(3)]),
        );
        let mut params = Vec::new();
        let sql = query.where_clause(&mut params).unwrap();
        assert_eq!(sql, r#" WHERE "id" IN (?, ?, ?)"#);
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn empty_in_matches_nothing() {
        let query = Query::new().with_condition("id", QueryOperator::In(vec![]));
        let mut params = Vec::new();
        assert_eq!(query.where_clause(&mut params).unwrap(), " WHERE 0 = 1");
        assert!(params.is_empty());
    }

    #[test]
    fn rejects_bad_identifiers() {
        assert!(is_valid_identifier("_users2"));
        assert!(!is_valid_identifier(""));
        assert!(!is_valid_identifier("2users"));
        assert!(!is_valid_identifier("name; DROP TABLE users"));
        let query = Query::new().with_condition("a\"b", QueryOperator::IsNull);
        let err = query.where_clause(&mut Vec::new()).unwrap_err();
        assert!(matches!(err, Error::InvalidIdentifier(name) if name == "a\"b"));
    }
}
