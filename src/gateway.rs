//! Parameterized query execution and bulk insert against the relational
//! store.
//!
//! Queries use `@Name` placeholders; values carry their own SQL type via
//! [`SqlParam`], so binding is inferred from the supplied value. Result rows
//! come back as JSON records keyed by storage-convention column names; the
//! record mapper translates them into domain records.

use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};
use sqlx::postgres::PgRow;
use sqlx::{Column, PgPool, Postgres, QueryBuilder, Row, TypeInfo, ValueRef};

use crate::errors::AppError;

/// A typed query parameter. The variant decides the bind type.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Int(i64),
    Double(f64),
    Bool(bool),
    Text(String),
    Timestamp(DateTime<Utc>),
    Null,
}

impl From<i64> for SqlParam {
    fn from(v: i64) -> Self {
        SqlParam::Int(v)
    }
}

impl From<i32> for SqlParam {
    fn from(v: i32) -> Self {
        SqlParam::Int(v as i64)
    }
}

impl From<f64> for SqlParam {
    fn from(v: f64) -> Self {
        SqlParam::Double(v)
    }
}

impl From<bool> for SqlParam {
    fn from(v: bool) -> Self {
        SqlParam::Bool(v)
    }
}

impl From<&str> for SqlParam {
    fn from(v: &str) -> Self {
        SqlParam::Text(v.to_string())
    }
}

impl From<String> for SqlParam {
    fn from(v: String) -> Self {
        SqlParam::Text(v)
    }
}

impl From<DateTime<Utc>> for SqlParam {
    fn from(v: DateTime<Utc>) -> Self {
        SqlParam::Timestamp(v)
    }
}

impl<T> From<Option<T>> for SqlParam
where
    T: Into<SqlParam>,
{
    fn from(v: Option<T>) -> Self {
        match v {
            Some(inner) => inner.into(),
            None => SqlParam::Null,
        }
    }
}

/// Rewrite `@Name` placeholders to positional `$n` binds.
///
/// Each distinct name gets one bind slot; repeated occurrences reuse it.
/// Unknown names are an error rather than a silent NULL.
fn expand_named(
    sql: &str,
    params: &[(&str, SqlParam)],
) -> Result<(String, Vec<SqlParam>), AppError> {
    let mut rewritten = String::with_capacity(sql.len());
    let mut order: Vec<String> = Vec::new();
    let mut chars = sql.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '@' {
            rewritten.push(c);
            continue;
        }
        let mut name = String::new();
        while let Some(&next) = chars.peek() {
            if next.is_ascii_alphanumeric() || next == '_' {
                name.push(next);
                chars.next();
            } else {
                break;
            }
        }
        if name.is_empty() {
            rewritten.push('@');
            continue;
        }
        let position = match order.iter().position(|n| *n == name) {
            Some(idx) => idx,
            None => {
                if !params.iter().any(|(key, _)| *key == name) {
                    return Err(AppError::BadRequest(format!(
                        "Unbound query parameter: @{name}"
                    )));
                }
                order.push(name);
                order.len() - 1
            }
        };
        rewritten.push('$');
        rewritten.push_str(&(position + 1).to_string());
    }

    let binds = order
        .iter()
        .map(|name| {
            params
                .iter()
                .find(|(key, _)| *key == name.as_str())
                .map(|(_, value)| value.clone())
                .expect("ordered names come from params")
        })
        .collect();

    Ok((rewritten, binds))
}

fn bind_param<'q>(
    query: sqlx::query::Query<'q, Postgres, sqlx::postgres::PgArguments>,
    param: SqlParam,
) -> sqlx::query::Query<'q, Postgres, sqlx::postgres::PgArguments> {
    match param {
        SqlParam::Int(v) => query.bind(v),
        SqlParam::Double(v) => query.bind(v),
        SqlParam::Bool(v) => query.bind(v),
        SqlParam::Text(v) => query.bind(v),
        SqlParam::Timestamp(v) => query.bind(v),
        SqlParam::Null => query.bind(Option::<String>::None),
    }
}

fn row_to_record(row: &PgRow) -> Result<Map<String, Value>, AppError> {
    let mut record = Map::new();
    for (i, col) in row.columns().iter().enumerate() {
        let value = if row.try_get_raw(i)?.is_null() {
            Value::Null
        } else {
            match col.type_info().name() {
                "INT2" => json!(row.try_get::<i16, _>(i)?),
                "INT4" => json!(row.try_get::<i32, _>(i)?),
                "INT8" => json!(row.try_get::<i64, _>(i)?),
                "FLOAT4" => json!(row.try_get::<f32, _>(i)?),
                "FLOAT8" => json!(row.try_get::<f64, _>(i)?),
                "BOOL" => json!(row.try_get::<bool, _>(i)?),
                "TIMESTAMPTZ" => {
                    json!(row.try_get::<DateTime<Utc>, _>(i)?.to_rfc3339())
                }
                "JSON" | "JSONB" => row.try_get::<Value, _>(i)?,
                _ => json!(row.try_get::<String, _>(i)?),
            }
        };
        record.insert(col.name().to_string(), value);
    }
    Ok(record)
}

/// Run a query and return all rows as storage-keyed JSON records.
pub async fn execute_query(
    pool: &PgPool,
    sql: &str,
    params: &[(&str, SqlParam)],
) -> Result<Vec<Map<String, Value>>, AppError> {
    let (rewritten, binds) = expand_named(sql, params)?;
    let mut query = sqlx::query(&rewritten);
    for param in binds {
        query = bind_param(query, param);
    }
    let rows = query.fetch_all(pool).await?;
    rows.iter().map(row_to_record).collect()
}

/// Run a mutating statement and return the affected row count.
pub async fn execute(
    pool: &PgPool,
    sql: &str,
    params: &[(&str, SqlParam)],
) -> Result<u64, AppError> {
    let (rewritten, binds) = expand_named(sql, params)?;
    let mut query = sqlx::query(&rewritten);
    for param in binds {
        query = bind_param(query, param);
    }
    let result = query.execute(pool).await?;
    Ok(result.rows_affected())
}

/// Declared column type for bulk inserts; values are validated against it
/// before anything is sent to the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    BigInt,
    Double,
    Bool,
    Text,
    Timestamp,
}

#[derive(Debug, Clone)]
pub struct ColumnSpec {
    pub name: String,
    pub column_type: ColumnType,
    pub nullable: bool,
}

impl ColumnSpec {
    pub fn new(name: &str, column_type: ColumnType, nullable: bool) -> Self {
        ColumnSpec {
            name: name.to_string(),
            column_type,
            nullable,
        }
    }
}

fn validate_row(columns: &[ColumnSpec], row: &[SqlParam]) -> Result<(), AppError> {
    if row.len() != columns.len() {
        return Err(AppError::BadRequest(format!(
            "Bulk insert row has {} values, expected {}",
            row.len(),
            columns.len()
        )));
    }
    for (spec, value) in columns.iter().zip(row) {
        let matches = match value {
            SqlParam::Null => spec.nullable,
            SqlParam::Int(_) => spec.column_type == ColumnType::BigInt,
            SqlParam::Double(_) => spec.column_type == ColumnType::Double,
            SqlParam::Bool(_) => spec.column_type == ColumnType::Bool,
            SqlParam::Text(_) => spec.column_type == ColumnType::Text,
            SqlParam::Timestamp(_) => spec.column_type == ColumnType::Timestamp,
        };
        if !matches {
            return Err(AppError::BadRequest(format!(
                "Bulk insert value for column '{}' has the wrong type",
                spec.name
            )));
        }
    }
    Ok(())
}

/// Multi-row insert, used for wholesale replacement of lookup tables.
pub async fn bulk_insert(
    pool: &PgPool,
    table: &str,
    columns: &[ColumnSpec],
    rows: &[Vec<SqlParam>],
) -> Result<(), AppError> {
    if rows.is_empty() {
        return Ok(());
    }
    for row in rows {
        validate_row(columns, row)?;
    }

    let column_list = columns
        .iter()
        .map(|c| format!("\"{}\"", c.name))
        .collect::<Vec<_>>()
        .join(", ");
    let mut builder: QueryBuilder<Postgres> =
        QueryBuilder::new(format!("INSERT INTO \"{table}\" ({column_list}) "));
    builder.push_values(rows.iter(), |mut b, row| {
        for value in row {
            match value {
                SqlParam::Int(v) => b.push_bind(*v),
                SqlParam::Double(v) => b.push_bind(*v),
                SqlParam::Bool(v) => b.push_bind(*v),
                SqlParam::Text(v) => b.push_bind(v.clone()),
                SqlParam::Timestamp(v) => b.push_bind(*v),
                SqlParam::Null => b.push_bind(Option::<String>::None),
            };
        }
    });
    builder.build().execute(pool).await?;
    Ok(())
}
