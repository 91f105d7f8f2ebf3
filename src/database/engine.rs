//! DuckDB-based query engine over the relational mirror
//!
//! A live MySQL database is attached read-only through the DuckDB `mysql`
//! extension; a DuckDB file is attached directly. Every query is built with
//! the condition compiler and runs with positional `?` parameters.

use super::rows::{DbAccess, DbUser, PaymentSummary};
use crate::config::DatabaseConfig;
use crate::error::{Error, Result};
use crate::query::{compile, Condition, SqlValue};
use crate::temporal::Timestamp;
use crate::types::DatabaseKind;
use chrono::{NaiveDate, NaiveTime};
use duckdb::{params_from_iter, Connection, Row};
use std::collections::HashMap;
use tracing::debug;

/// Alias of the attached source database
const SOURCE_ALIAS: &str = "source_db";

/// Payment rows joined with their line items and user login
const PAYMENTS_SOURCE: &str = "SELECT ip.user_id AS user_id, u.login AS username, \
     ip.dattm AS dattm, ip.amount AS amount, \
     COALESCE(ip.refund_amount, 0) AS refund_amount, \
     ii.item_title AS item_title, ii.item_description AS item_description \
     FROM am_invoice_payment ip \
     LEFT JOIN am_invoice_item ii ON ii.invoice_id = ip.invoice_id \
     LEFT JOIN am_user u ON ip.user_id = u.user_id";

/// Refund rows whose line item mentions the title in its title or description
const REFUNDS_SOURCE: &str = "SELECT ip.user_id AS user_id, u.login AS username, \
     ip.refund_dattm AS refund_dattm, ip.refund_amount AS refund_amount \
     FROM am_invoice_payment ip \
     LEFT JOIN am_invoice_item ii ON ii.invoice_id = ip.invoice_id \
     LEFT JOIN am_user u ON ip.user_id = u.user_id \
     WHERE (ii.item_title LIKE ? OR ii.item_description LIKE ?)";

/// Read-only query engine for the relational mirror
pub struct DatabaseEngine {
    /// DuckDB connection
    conn: Connection,
    /// Database type
    kind: DatabaseKind,
    /// Connection string used (for logging)
    connection_string: String,
}

impl DatabaseEngine {
    /// Open the mirror described by `config`
    pub fn new(config: &DatabaseConfig) -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::config(format!("Failed to create DuckDB connection: {e}")))?;

        let engine = Self {
            conn,
            kind: config.engine,
            connection_string: config.connection_string(),
        };

        engine.attach_database()?;
        debug!(engine = %engine.kind, target = %engine.connection_info(), "database attached");

        Ok(engine)
    }

    /// Empty in-memory DuckDB mirror
    pub fn in_memory() -> Result<Self> {
        Self::new(&DatabaseConfig::duckdb(":memory:"))
    }

    /// Attach the source database and make it the default catalog
    fn attach_database(&self) -> Result<()> {
        let target = self.connection_string.replace('\'', "''");

        match self.kind {
            DatabaseKind::Mysql => {
                self.conn
                    .execute_batch("INSTALL mysql; LOAD mysql;")
                    .map_err(|e| Error::config(format!("Failed to load mysql extension: {e}")))?;

                let attach_sql = format!(
                    "ATTACH '{target}' AS {SOURCE_ALIAS} (TYPE MYSQL, READ_ONLY); USE {SOURCE_ALIAS};"
                );
                self.conn
                    .execute_batch(&attach_sql)
                    .map_err(|e| Error::config(format!("Failed to attach MySQL: {e}")))?;
            }
            DatabaseKind::Duckdb => {
                if self.connection_string != ":memory:" {
                    let attach_sql = format!(
                        "ATTACH '{target}' AS {SOURCE_ALIAS} (READ_ONLY); USE {SOURCE_ALIAS};"
                    );
                    self.conn
                        .execute_batch(&attach_sql)
                        .map_err(|e| Error::config(format!("Failed to attach DuckDB: {e}")))?;
                }
            }
        }

        Ok(())
    }

    /// Liveness probe run before every query
    pub fn check_connection(&self) -> Result<()> {
        let query = match self.kind {
            DatabaseKind::Mysql => {
                "SELECT 1 FROM source_db.information_schema.tables LIMIT 1"
            }
            DatabaseKind::Duckdb => "SELECT 1",
        };

        self.conn
            .query_row(query, [], |_| Ok(()))
            .map_err(|e| Error::connection_check(e.to_string()))
    }

    /// Run setup statements against the default catalog
    ///
    /// Only writable for an in-memory mirror; attached sources are read-only.
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    /// Users matching every condition
    pub fn users_where(&self, conditions: &[Condition], limit: usize) -> Result<Vec<DbUser>> {
        let clause = compile(conditions, limit);
        let sql = format!("SELECT {} FROM am_user {}", DbUser::COLUMNS, clause.sql);
        self.query_rows(&sql, &clause.values, DbUser::from_row)
    }

    /// Access grants matching every condition
    pub fn accesses_where(&self, conditions: &[Condition], limit: usize) -> Result<Vec<DbAccess>> {
        let clause = compile(conditions, limit);
        let sql = format!("SELECT {} FROM am_access {}", DbAccess::COLUMNS, clause.sql);
        self.query_rows(&sql, &clause.values, DbAccess::from_row)
    }

    /// Paid, non-refunded payments made on `day`, keyed by username
    ///
    /// Line items must contain `item_title` in their title and
    /// `item_description` in their description. A later row for the same
    /// username replaces the earlier one.
    pub fn payments_by_date(
        &self,
        day: NaiveDate,
        item_title: &str,
        item_description: &str,
    ) -> Result<HashMap<String, PaymentSummary>> {
        let (from, to) = day_window(day);
        let clause = compile(
            &[
                Condition::new("amount", ">", vec![SqlValue::Float(0.0)]),
                Condition::eq("refund_amount", SqlValue::Float(0.0)),
                Condition::between("dattm", from, to),
                Condition::like("item_title", contains(item_title)),
                Condition::like("item_description", contains(item_description)),
            ],
            0,
        );

        let sql = format!(
            "SELECT user_id, username, dattm, amount FROM ({PAYMENTS_SOURCE}) p {}",
            clause.sql
        );
        let rows = self.query_rows(&sql, &clause.values, PaymentSummary::payment_from_row)?;
        Ok(key_by_username(rows))
    }

    /// Refunds issued on `day`, keyed by username
    ///
    /// A refund matches when `item_title` appears in the line item's title
    /// or description.
    pub fn refunds_by_date(
        &self,
        day: NaiveDate,
        item_title: &str,
    ) -> Result<HashMap<String, PaymentSummary>> {
        let (from, to) = day_window(day);
        let clause = compile(
            &[
                Condition::new("refund_amount", ">", vec![SqlValue::Float(0.0)]),
                Condition::between("refund_dattm", from, to),
            ],
            0,
        );

        let sql = format!(
            "SELECT user_id, username, refund_dattm, refund_amount FROM ({REFUNDS_SOURCE}) r {}",
            clause.sql
        );

        let pattern = contains(item_title);
        let mut values = vec![SqlValue::Text(pattern.clone()), SqlValue::Text(pattern)];
        values.extend(clause.values);

        let rows = self.query_rows(&sql, &values, PaymentSummary::refund_from_row)?;
        Ok(key_by_username(rows))
    }

    fn query_rows<T>(
        &self,
        sql: &str,
        values: &[SqlValue],
        read: impl Fn(&Row<'_>) -> duckdb::Result<T>,
    ) -> Result<Vec<T>> {
        self.check_connection()?;
        debug!(sql, params = values.len(), "executing query");

        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params_from_iter(values.iter()))?;

        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(read(row)?);
        }
        Ok(out)
    }

    /// Get database type
    pub fn kind(&self) -> DatabaseKind {
        self.kind
    }

    /// Get connection string (for logging - password masked)
    pub fn connection_info(&self) -> String {
        mask_password(&self.connection_string)
    }
}

impl std::fmt::Debug for DatabaseEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseEngine")
            .field("kind", &self.kind)
            .field("connection", &self.connection_info())
            .finish_non_exhaustive()
    }
}

/// `day 00:00:01` through `day 23:59:59`
fn day_window(day: NaiveDate) -> (Timestamp, Timestamp) {
    let from = NaiveTime::from_hms_opt(0, 0, 1).unwrap_or(NaiveTime::MIN);
    let to = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);
    (
        Timestamp::from_naive_utc(day.and_time(from)),
        Timestamp::from_naive_utc(day.and_time(to)),
    )
}

fn contains(fragment: &str) -> String {
    format!("%{fragment}%")
}

fn key_by_username(rows: Vec<PaymentSummary>) -> HashMap<String, PaymentSummary> {
    rows.into_iter()
        .map(|row| (row.username.clone().unwrap_or_default(), row))
        .collect()
}

fn mask_password(connection_string: &str) -> String {
    if let Some(at_pos) = connection_string.rfind('@') {
        if let Some(colon_pos) = connection_string[..at_pos].rfind(':') {
            let before_pass = &connection_string[..=colon_pos];
            if before_pass.ends_with("//") || before_pass.ends_with(":/") {
                return connection_string.to_string();
            }
            let after_at = &connection_string[at_pos..];
            return format!("{before_pass}****{after_at}");
        }
    }
    connection_string.to_string()
}
