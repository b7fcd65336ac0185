//! Checks a staged change against the table's cached schema

use sqlyard_core::{ChangeKind, PendingChange, TableSchema};

use crate::error::{ServiceError, ServiceResult};

/// Reject changes the backend would certainly refuse: unknown columns, NULL
/// in a NOT NULL column, an incomplete primary key on update/delete, and an
/// update without data.
pub fn validate_change(change: &PendingChange, schema: &TableSchema) -> ServiceResult<()> {
    let table = &change.table_name;

    for column in change.primary_key.keys() {
        if schema.column(column).is_none() {
            return Err(ServiceError::InvalidChange(format!(
                "unknown primary key column `{}` in table `{}`",
                column, table
            )));
        }
    }

    if let Some(data) = &change.new_data {
        for (column, value) in data {
            let Some(descriptor) = schema.column(column) else {
                return Err(ServiceError::InvalidChange(format!(
                    "unknown column `{}` in table `{}`",
                    column, table
                )));
            };
            if value.is_null() && !descriptor.nullable {
                return Err(ServiceError::InvalidChange(format!(
                    "column `{}` of table `{}` does not accept NULL",
                    descriptor.name, table
                )));
            }
        }
    }

    if matches!(change.kind, ChangeKind::Update | ChangeKind::Delete) {
        for pk_column in schema.primary_key_columns() {
            let present = change
                .primary_key
                .keys()
                .any(|column| column.eq_ignore_ascii_case(&pk_column.name));
            if !present {
                return Err(ServiceError::InvalidChange(format!(
                    "{} on `{}` is missing primary key column `{}`",
                    change.kind, table, pk_column.name
                )));
            }
        }
    }

    if change.kind == ChangeKind::Update
        && change.new_data.as_ref().is_none_or(|data| data.is_empty())
    {
        return Err(ServiceError::InvalidChange(format!(
            "update on `{}` carries no data",
            table
        )));
    }

    Ok(())
}
