//! Condition and bound-value types

use crate::temporal::Timestamp;
use duckdb::types::{TimeUnit, ToSql, ToSqlOutput, Value as DbValue};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// A value bound to one `?` placeholder
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    /// Bound as a native timestamp, never as text
    Timestamp(Timestamp),
}

impl SqlValue {
    /// Convert a JSON scalar
    ///
    /// Arrays and objects have no SQL counterpart and are bound as their
    /// JSON text.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Float(n.as_f64().unwrap_or_default()),
            },
            Value::String(s) => Self::Text(s.clone()),
            other => Self::Text(other.to_string()),
        }
    }

    fn to_db_value(&self) -> DbValue {
        match self {
            Self::Null => DbValue::Null,
            Self::Bool(b) => DbValue::Boolean(*b),
            Self::Int(i) => DbValue::BigInt(*i),
            Self::Float(f) => DbValue::Double(*f),
            Self::Text(s) => DbValue::Text(s.clone()),
            Self::Timestamp(ts) => DbValue::Timestamp(
                TimeUnit::Microsecond,
                ts.naive_local().and_utc().timestamp_micros(),
            ),
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => write!(f, "'{s}'"),
            Self::Timestamp(ts) => write!(f, "'{ts}'"),
        }
    }
}

impl ToSql for SqlValue {
    fn to_sql(&self) -> duckdb::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::Owned(self.to_db_value()))
    }
}

impl Serialize for SqlValue {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_none(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Int(i) => serializer.serialize_i64(*i),
            Self::Float(x) => serializer.serialize_f64(*x),
            Self::Text(s) => serializer.serialize_str(s),
            Self::Timestamp(ts) => ts.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for SqlValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(|v| Self::from_json(&v))
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for SqlValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Timestamp> for SqlValue {
    fn from(value: Timestamp) -> Self {
        Self::Timestamp(value)
    }
}

/// Supported predicate operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Gt,
    Lt,
    Le,
    Ge,
    /// `<>`
    Ne,
    /// `!=`
    NotEq,
    Like,
    In,
    Between,
}

impl Operator {
    /// SQL text of the operator
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Ge => ">=",
            Self::Ne => "<>",
            Self::NotEq => "!=",
            Self::Like => "LIKE",
            Self::In => "IN",
            Self::Between => "BETWEEN",
        }
    }
}

impl FromStr for Operator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "=" => Ok(Self::Eq),
            ">" => Ok(Self::Gt),
            "<" => Ok(Self::Lt),
            "<=" => Ok(Self::Le),
            ">=" => Ok(Self::Ge),
            "<>" => Ok(Self::Ne),
            "!=" => Ok(Self::NotEq),
            "LIKE" => Ok(Self::Like),
            "IN" => Ok(Self::In),
            "BETWEEN" => Ok(Self::Between),
            other => Err(format!("unknown operator '{other}'")),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// A single filter predicate
///
/// The operator is kept as text so callers can pass through user input;
/// it is validated at compile time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// Column name, optionally qualified (`t.col`)
    pub column: String,
    /// One of `=`, `>`, `<`, `<=`, `>=`, `<>`, `!=`, `LIKE`, `IN`, `BETWEEN`
    pub operator: String,
    /// Bound values, in placeholder order
    #[serde(default)]
    pub values: Vec<SqlValue>,
    /// Raw subquery for `IN`; trusted, not parameterized
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subquery: Option<String>,
}

impl Condition {
    /// Create a condition
    pub fn new(
        column: impl Into<String>,
        operator: impl Into<String>,
        values: Vec<SqlValue>,
    ) -> Self {
        Self {
            column: column.into(),
            operator: operator.into(),
            values,
            subquery: None,
        }
    }

    /// `column = value`
    pub fn eq(column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        Self::new(column, "=", vec![value.into()])
    }

    /// `column LIKE value`
    pub fn like(column: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::new(column, "LIKE", vec![SqlValue::Text(pattern.into())])
    }

    /// `column BETWEEN low AND high`
    pub fn between(
        column: impl Into<String>,
        low: impl Into<SqlValue>,
        high: impl Into<SqlValue>,
    ) -> Self {
        Self::new(column, "BETWEEN", vec![low.into(), high.into()])
    }

    /// `column IN (values...)`
    pub fn in_list(column: impl Into<String>, values: Vec<SqlValue>) -> Self {
        Self::new(column, "IN", values)
    }

    /// `column IN (subquery)`
    pub fn in_subquery(column: impl Into<String>, subquery: impl Into<String>) -> Self {
        Self {
            subquery: Some(subquery.into()),
            ..Self::new(column, "IN", Vec::new())
        }
    }
}

/// A compiled `WHERE` clause and the values for its placeholders
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompiledClause {
    /// Clause text, starting with `WHERE`
    pub sql: String,
    /// Values in placeholder order
    pub values: Vec<SqlValue>,
}

impl CompiledClause {
    /// Number of `?` placeholders in the clause
    pub fn placeholder_count(&self) -> usize {
        self.sql.matches('?').count()
    }
}
