//! Parameterized row mutation statements

use rusqlite::types::Value as SqlValue;
use sqlyard_core::{PrimaryKey, Result, RowData, SqlyardError, Value, unquote_identifier};

/// Double-quote an identifier, escaping embedded quotes
pub(crate) fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Quote every part of a possibly schema-qualified table name
pub(crate) fn quote_table_name(table: &str) -> String {
    unquote_identifier(table)
        .split('.')
        .map(quote_identifier)
        .collect::<Vec<_>>()
        .join(".")
}

pub(crate) fn to_sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => SqlValue::Integer(i),
            (None, Some(f)) => SqlValue::Real(f),
            (None, None) => SqlValue::Text(n.to_string()),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        Value::Json(json) => SqlValue::Text(json.to_string()),
    }
}

pub(crate) fn insert_statement(table: &str, data: &RowData) -> (String, Vec<SqlValue>) {
    let table = quote_table_name(table);
    if data.is_empty() {
        return (format!("INSERT INTO {} DEFAULT VALUES", table), Vec::new());
    }

    let columns: Vec<String> = data.keys().map(|c| quote_identifier(c)).collect();
    let placeholders: Vec<String> = (1..=data.len()).map(|i| format!("?{}", i)).collect();
    let params = data.values().map(to_sql_value).collect();

    (
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table,
            columns.join(", "),
            placeholders.join(", ")
        ),
        params,
    )
}

pub(crate) fn update_statement(
    table: &str,
    primary_key: &PrimaryKey,
    data: &RowData,
) -> Result<(String, Vec<SqlValue>)> {
    if data.is_empty() {
        return Err(SqlyardError::Query(format!(
            "update on {} has no columns to set",
            table
        )));
    }

    let mut params: Vec<SqlValue> = data.values().map(to_sql_value).collect();
    let assignments: Vec<String> = data
        .keys()
        .enumerate()
        .map(|(i, column)| format!("{} = ?{}", quote_identifier(column), i + 1))
        .collect();
    let condition = where_clause(table, primary_key, &mut params)?;

    Ok((
        format!(
            "UPDATE {} SET {} WHERE {}",
            quote_table_name(table),
            assignments.join(", "),
            condition
        ),
        params,
    ))
}

pub(crate) fn delete_statement(
    table: &str,
    primary_key: &PrimaryKey,
) -> Result<(String, Vec<SqlValue>)> {
    let mut params = Vec::new();
    let condition = where_clause(table, primary_key, &mut params)?;
    Ok((
        format!("DELETE FROM {} WHERE {}", quote_table_name(table), condition),
        params,
    ))
}

/// `pk1 IS ?n AND pk2 IS ?m`, appending the key values to `params`.
/// `IS` so a NULL key value still matches.
fn where_clause(table: &str, primary_key: &PrimaryKey, params: &mut Vec<SqlValue>) -> Result<String> {
    if primary_key.is_empty() {
        return Err(SqlyardError::Query(format!(
            "refusing to modify {} without a primary key",
            table
        )));
    }

    let mut conditions = Vec::with_capacity(primary_key.len());
    for (column, value) in primary_key {
        params.push(to_sql_value(value));
        conditions.push(format!("{} IS ?{}", quote_identifier(column), params.len()));
    }
    Ok(conditions.join(" AND "))
}
