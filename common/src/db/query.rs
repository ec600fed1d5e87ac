//! Single chokepoint for every statement the ledger issues.
//!
//! A [`Query`] carries the SQL text and its positional parameters so that both
//! can be logged next to the duration and outcome of the call. Rows are mapped
//! into typed records through `sqlx::FromRow`.

use std::fmt;
use std::time::Instant;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::{Arguments, Executor, FromRow, Postgres};
use tracing::{error, info};

use crate::error::LedgerResult;

/// A positional bind value. Kept as an owned enum so it can be logged after binding.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Int(i32),
    BigInt(i64),
    Text(String),
    OptText(Option<String>),
    Bool(bool),
    Decimal(Decimal),
    OptDecimal(Option<Decimal>),
    Timestamp(DateTime<Utc>),
    /// Bound like `Text`, rendered as `***` in logs.
    Secret(String),
}

impl SqlParam {
    pub fn secret(value: impl Into<String>) -> Self {
        SqlParam::Secret(value.into())
    }

    fn add_to(self, args: &mut PgArguments) {
        match self {
            SqlParam::Int(v) => args.add(v),
            SqlParam::BigInt(v) => args.add(v),
            SqlParam::Text(v) | SqlParam::Secret(v) => args.add(v),
            SqlParam::OptText(v) => args.add(v),
            SqlParam::Bool(v) => args.add(v),
            SqlParam::Decimal(v) => args.add(v),
            SqlParam::OptDecimal(v) => args.add(v),
            SqlParam::Timestamp(v) => args.add(v),
        }
    }
}

impl fmt::Display for SqlParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlParam::Int(v) => write!(f, "{}", v),
            SqlParam::BigInt(v) => write!(f, "{}", v),
            SqlParam::Text(v) => write!(f, "{:?}", v),
            SqlParam::OptText(Some(v)) => write!(f, "{:?}", v),
            SqlParam::Bool(v) => write!(f, "{}", v),
            SqlParam::Decimal(v) => write!(f, "{}", v),
            SqlParam::OptDecimal(Some(v)) => write!(f, "{}", v),
            SqlParam::Timestamp(v) => write!(f, "{}", v.to_rfc3339()),
            SqlParam::OptText(None) | SqlParam::OptDecimal(None) => f.write_str("NULL"),
            SqlParam::Secret(_) => f.write_str("***"),
        }
    }
}

impl From<i32> for SqlParam {
    fn from(v: i32) -> Self {
        SqlParam::Int(v)
    }
}

impl From<i64> for SqlParam {
    fn from(v: i64) -> Self {
        SqlParam::BigInt(v)
    }
}

impl From<String> for SqlParam {
    fn from(v: String) -> Self {
        SqlParam::Text(v)
    }
}

impl From<&str> for SqlParam {
    fn from(v: &str) -> Self {
        SqlParam::Text(v.to_string())
    }
}

impl From<&String> for SqlParam {
    fn from(v: &String) -> Self {
        SqlParam::Text(v.clone())
    }
}

impl From<Option<String>> for SqlParam {
    fn from(v: Option<String>) -> Self {
        SqlParam::OptText(v)
    }
}

impl From<Option<&str>> for SqlParam {
    fn from(v: Option<&str>) -> Self {
        SqlParam::OptText(v.map(str::to_string))
    }
}

impl From<bool> for SqlParam {
    fn from(v: bool) -> Self {
        SqlParam::Bool(v)
    }
}

impl From<Decimal> for SqlParam {
    fn from(v: Decimal) -> Self {
        SqlParam::Decimal(v)
    }
}

impl From<Option<Decimal>> for SqlParam {
    fn from(v: Option<Decimal>) -> Self {
        SqlParam::OptDecimal(v)
    }
}

impl From<DateTime<Utc>> for SqlParam {
    fn from(v: DateTime<Utc>) -> Self {
        SqlParam::Timestamp(v)
    }
}

/// Rows returned by [`Query::fetch_all`] together with their count.
#[derive(Debug)]
pub struct QueryOutput<T> {
    pub rows: Vec<T>,
    pub row_count: u64,
}

#[derive(Debug, Clone)]
pub struct Query {
    sql: &'static str,
    params: Vec<SqlParam>,
}

impl Query {
    pub fn new(sql: &'static str) -> Self {
        Self {
            sql,
            params: Vec::new(),
        }
    }

    pub fn bind(mut self, param: impl Into<SqlParam>) -> Self {
        self.params.push(param.into());
        self
    }

    pub fn params(&self) -> &[SqlParam] {
        &self.params
    }

    fn arguments(&self) -> PgArguments {
        let mut args = PgArguments::default();
        for param in self.params.iter().cloned() {
            param.add_to(&mut args);
        }
        args
    }

    pub async fn fetch_all<'c, T, E>(self, executor: E) -> LedgerResult<QueryOutput<T>>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
        E: Executor<'c, Database = Postgres>,
    {
        let start = Instant::now();
        let result = sqlx::query_as_with::<_, T, _>(self.sql, self.arguments())
            .fetch_all(executor)
            .await;

        match result {
            Ok(rows) => {
                let row_count = rows.len() as u64;
                self.log_success(start, row_count);
                Ok(QueryOutput { rows, row_count })
            }
            Err(e) => {
                self.log_failure(start, &e);
                Err(e.into())
            }
        }
    }

    pub async fn fetch_optional<'c, T, E>(self, executor: E) -> LedgerResult<Option<T>>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
        E: Executor<'c, Database = Postgres>,
    {
        let start = Instant::now();
        let result = sqlx::query_as_with::<_, T, _>(self.sql, self.arguments())
            .fetch_optional(executor)
            .await;

        match result {
            Ok(row) => {
                self.log_success(start, u64::from(row.is_some()));
                Ok(row)
            }
            Err(e) => {
                self.log_failure(start, &e);
                Err(e.into())
            }
        }
    }

    pub async fn fetch_one<'c, T, E>(self, executor: E) -> LedgerResult<T>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
        E: Executor<'c, Database = Postgres>,
    {
        let start = Instant::now();
        let result = sqlx::query_as_with::<_, T, _>(self.sql, self.arguments())
            .fetch_one(executor)
            .await;

        match result {
            Ok(row) => {
                self.log_success(start, 1);
                Ok(row)
            }
            Err(e) => {
                self.log_failure(start, &e);
                Err(e.into())
            }
        }
    }

    /// Runs a statement that returns no rows and reports how many it touched.
    pub async fn execute<'c, E>(self, executor: E) -> LedgerResult<u64>
    where
        E: Executor<'c, Database = Postgres>,
    {
        let start = Instant::now();
        let result = sqlx::query_with(self.sql, self.arguments())
            .execute(executor)
            .await;

        match result {
            Ok(done) => {
                let row_count = done.rows_affected();
                self.log_success(start, row_count);
                Ok(row_count)
            }
            Err(e) => {
                self.log_failure(start, &e);
                Err(e.into())
            }
        }
    }

    fn log_success(&self, start: Instant, rows: u64) {
        info!(
            sql = %compact_sql(self.sql),
            params = %render_params(&self.params),
            duration_ms = %start.elapsed().as_millis(),
            rows,
            "Executed query"
        );
    }

    fn log_failure(&self, start: Instant, err: &sqlx::Error) {
        error!(
            sql = %compact_sql(self.sql),
            params = %render_params(&self.params),
            duration_ms = %start.elapsed().as_millis(),
            error = %err,
            "Database query error"
        );
    }
}

/// Collapses the indentation of multi-line SQL literals onto one log line.
fn compact_sql(sql: &str) -> String {
    sql.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn render_params(params: &[SqlParam]) -> String {
    let rendered: Vec<String> = params.iter().map(ToString::to_string).collect();
    format!("[{}]", rendered.join(", "))
}
