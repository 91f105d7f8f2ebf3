//! Condition list to `WHERE` clause

use super::types::{CompiledClause, Condition, Operator, SqlValue};
use regex::Regex;
use std::sync::LazyLock;
use tracing::warn;

/// Plain or dotted SQL identifier
static IDENTIFIER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$").unwrap());

/// Compile conditions into a `WHERE` clause, AND-joined in input order
///
/// With no usable condition the clause is `WHERE 1 = ?` bound to `1`.
/// A `limit` greater than zero appends `LIMIT n`.
pub fn compile(conditions: &[Condition], limit: usize) -> CompiledClause {
    let mut fragments = Vec::with_capacity(conditions.len());
    let mut values = Vec::new();

    for condition in conditions {
        if let Some((fragment, bound)) = compile_one(condition) {
            fragments.push(fragment);
            values.extend(bound);
        }
    }

    let mut sql = if fragments.is_empty() {
        values.push(SqlValue::Int(1));
        "WHERE 1 = ?".to_string()
    } else {
        format!("WHERE {}", fragments.join(" AND "))
    };

    if limit > 0 {
        sql.push_str(&format!(" LIMIT {limit}"));
    }

    CompiledClause { sql, values }
}

/// Compile a single condition into its fragment and bound values
///
/// Returns `None` (after logging) when the condition is unusable.
pub fn compile_one(condition: &Condition) -> Option<(String, Vec<SqlValue>)> {
    let column = condition.column.trim();
    if !IDENTIFIER_REGEX.is_match(column) {
        warn!(column = %condition.column, "condition skipped: invalid column name");
        return None;
    }

    let operator: Operator = match condition.operator.parse() {
        Ok(op) => op,
        Err(reason) => {
            warn!(column, %reason, "condition skipped");
            return None;
        }
    };

    let values = &condition.values;
    let arity_error = |expected: &str| -> Option<(String, Vec<SqlValue>)> {
        warn!(
            column,
            operator = %operator,
            expected,
            got = values.len(),
            "condition skipped: wrong number of values"
        );
        None
    };

    match operator {
        Operator::In => match &condition.subquery {
            Some(subquery) => Some((format!("{column} IN ({subquery})"), Vec::new())),
            None if values.is_empty() => arity_error("at least one"),
            None => {
                let placeholders = vec!["?"; values.len()].join(", ");
                Some((format!("{column} IN ({placeholders})"), values.clone()))
            }
        },
        Operator::Between => {
            if values.len() != 2 {
                return arity_error("two");
            }
            Some((format!("{column} BETWEEN ? AND ?"), values.clone()))
        }
        _ => {
            if values.len() != 1 {
                return arity_error("one");
            }
            Some((format!("{column} {operator} ?"), values.clone()))
        }
    }
}
