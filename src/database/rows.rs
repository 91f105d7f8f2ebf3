//! Mirror row shapes and DuckDB value conversion
//!
//! Every column is an `Option`: SQL NULL is "no value", never a silent zero.

use crate::temporal::{parse_timestamp, Timestamp};
use chrono::{DateTime, NaiveDate};
use duckdb::types::{TimeUnit, Value};
use duckdb::Row;
use serde::Serialize;

/// A row of `am_user`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DbUser {
    pub user_id: Option<i64>,
    pub login: Option<String>,
    pub email: Option<String>,
    pub name_f: Option<String>,
    pub name_l: Option<String>,
    pub status: Option<i64>,
    pub added: Option<Timestamp>,
    pub last_login: Option<Timestamp>,
}

impl DbUser {
    /// Columns selected for this shape, in read order
    pub const COLUMNS: &'static str =
        "user_id, login, email, name_f, name_l, status, added, last_login";

    pub(crate) fn from_row(row: &Row<'_>) -> duckdb::Result<Self> {
        Ok(Self {
            user_id: as_i64(row.get(0)?),
            login: as_text(row.get(1)?),
            email: as_text(row.get(2)?),
            name_f: as_text(row.get(3)?),
            name_l: as_text(row.get(4)?),
            status: as_i64(row.get(5)?),
            added: as_timestamp(row.get(6)?),
            last_login: as_timestamp(row.get(7)?),
        })
    }
}

/// A row of `am_access`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DbAccess {
    pub access_id: Option<i64>,
    pub user_id: Option<i64>,
    pub product_id: Option<i64>,
    pub invoice_id: Option<i64>,
    pub begin_date: Option<Timestamp>,
    pub expire_date: Option<Timestamp>,
    pub qty: Option<i64>,
}

impl DbAccess {
    /// Columns selected for this shape, in read order
    pub const COLUMNS: &'static str =
        "access_id, user_id, product_id, invoice_id, begin_date, expire_date, qty";

    pub(crate) fn from_row(row: &Row<'_>) -> duckdb::Result<Self> {
        Ok(Self {
            access_id: as_i64(row.get(0)?),
            user_id: as_i64(row.get(1)?),
            product_id: as_i64(row.get(2)?),
            invoice_id: as_i64(row.get(3)?),
            begin_date: as_timestamp(row.get(4)?),
            expire_date: as_timestamp(row.get(5)?),
            qty: as_i64(row.get(6)?),
        })
    }
}

/// One payment or refund, keyed by username in date reports
///
/// Payment reports fill `dattm`/`amount`, refund reports fill
/// `refund_dattm`/`refund_amount`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PaymentSummary {
    pub user_id: Option<i64>,
    pub username: Option<String>,
    pub dattm: Option<Timestamp>,
    pub amount: Option<f64>,
    pub refund_dattm: Option<Timestamp>,
    pub refund_amount: Option<f64>,
}

impl PaymentSummary {
    /// Read `(user_id, username, dattm, amount)`
    pub(crate) fn payment_from_row(row: &Row<'_>) -> duckdb::Result<Self> {
        Ok(Self {
            user_id: as_i64(row.get(0)?),
            username: as_text(row.get(1)?),
            dattm: as_timestamp(row.get(2)?),
            amount: as_f64(row.get(3)?),
            ..Self::default()
        })
    }

    /// Read `(user_id, username, refund_dattm, refund_amount)`
    pub(crate) fn refund_from_row(row: &Row<'_>) -> duckdb::Result<Self> {
        Ok(Self {
            user_id: as_i64(row.get(0)?),
            username: as_text(row.get(1)?),
            refund_dattm: as_timestamp(row.get(2)?),
            refund_amount: as_f64(row.get(3)?),
            ..Self::default()
        })
    }
}

// ============================================================================
// Value conversion
// ============================================================================

pub(crate) fn as_i64(value: Value) -> Option<i64> {
    match value {
        Value::TinyInt(i) => Some(i.into()),
        Value::SmallInt(i) => Some(i.into()),
        Value::Int(i) => Some(i.into()),
        Value::BigInt(i) => Some(i),
        Value::HugeInt(i) => i64::try_from(i).ok(),
        Value::UTinyInt(i) => Some(i.into()),
        Value::USmallInt(i) => Some(i.into()),
        Value::UInt(i) => Some(i.into()),
        Value::UBigInt(i) => i64::try_from(i).ok(),
        Value::Boolean(b) => Some(i64::from(b)),
        Value::Text(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub(crate) fn as_f64(value: Value) -> Option<f64> {
    match value {
        Value::Float(f) => Some(f.into()),
        Value::Double(f) => Some(f),
        Value::Decimal(d) => d.to_string().parse().ok(),
        Value::Text(s) => s.trim().parse().ok(),
        other => as_i64(other).map(|i| i as f64),
    }
}

pub(crate) fn as_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Text(s) => Some(s),
        other => as_i64(other).map(|i| i.to_string()),
    }
}

pub(crate) fn as_timestamp(value: Value) -> Option<Timestamp> {
    match value {
        Value::Timestamp(unit, v) => {
            let micros = match unit {
                TimeUnit::Second => v.checked_mul(1_000_000)?,
                TimeUnit::Millisecond => v.checked_mul(1_000)?,
                TimeUnit::Microsecond => v,
                TimeUnit::Nanosecond => v / 1_000,
            };
            DateTime::from_timestamp_micros(micros).map(|dt| Timestamp::from_naive_utc(dt.naive_utc()))
        }
        Value::Date32(days) => NaiveDate::from_num_days_from_ce_opt(days + 719_163)
            .map(Timestamp::from_date),
        Value::Text(s) if !s.is_empty() => parse_timestamp(&s).ok(),
        _ => None,
    }
}
