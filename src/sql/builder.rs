//! Statement assembly for the table CRUD tools.
//!
//! Each builder validates every identifier, collects parameters in placeholder
//! order and returns plain SQL text. Nothing here touches a connection, so a
//! rejected request never reaches the driver.

use crate::error::{DbError, DbResult};
use crate::models::SqlValue;
use crate::sql::filter::{self, WhereClause};
use crate::sql::ident::{self, IdentKind};
use crate::sql::order::{self, NEUTRAL_ORDER};
use serde_json::{Map, Value as JsonValue};
use tracing::warn;

/// Advisory attached to reads that paginate without an explicit order.
pub const UNORDERED_PAGINATION_ADVISORY: &str =
    "Using limit/offset without specifying order_by. Pagination results may be unpredictable.";

/// SQL text plus the values for its `?` placeholders, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

/// One statement executed once per parameter row.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledBatch {
    pub sql: String,
    pub rows: Vec<Vec<SqlValue>>,
}

/// A compiled SELECT and any non-fatal advisories raised while building it.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadQuery {
    pub query: CompiledQuery,
    pub advisories: Vec<String>,
}

/// Builder for the `read_rows` SELECT statement.
#[derive(Debug, Clone, Default)]
pub struct SelectBuilder<'a> {
    table: &'a str,
    columns: &'a [String],
    filters: Option<&'a Map<String, JsonValue>>,
    order_by: Option<&'a Map<String, JsonValue>>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl<'a> SelectBuilder<'a> {
    pub fn new(table: &'a str) -> Self {
        Self {
            table,
            ..Default::default()
        }
    }

    /// Columns to select. Empty means `*`.
    pub fn columns(mut self, columns: &'a [String]) -> Self {
        self.columns = columns;
        self
    }

    pub fn filters(mut self, filters: Option<&'a Map<String, JsonValue>>) -> Self {
        self.filters = filters;
        self
    }

    pub fn order_by(mut self, order_by: Option<&'a Map<String, JsonValue>>) -> Self {
        self.order_by = order_by;
        self
    }

    pub fn limit(mut self, limit: Option<u64>) -> Self {
        self.limit = limit;
        self
    }

    pub fn offset(mut self, offset: Option<u64>) -> Self {
        self.offset = offset;
        self
    }

    pub fn build(self) -> DbResult<ReadQuery> {
        let table = ident::quote(self.table, IdentKind::Table)?;
        let select_list = select_list(self.columns)?;

        let where_clause = match self.filters {
            Some(filters) => filter::compile_filters(filters)?,
            None => WhereClause::default(),
        };

        let mut advisories = Vec::new();
        let paginating = self.limit.is_some() || self.offset.is_some();
        let order_clause = match self.order_by.map(order::compile_order).transpose()?.flatten() {
            Some(clause) => Some(clause),
            None if paginating => {
                warn!(table = %self.table, "{}", UNORDERED_PAGINATION_ADVISORY);
                advisories.push(UNORDERED_PAGINATION_ADVISORY.to_string());
                Some(NEUTRAL_ORDER.to_string())
            }
            None => None,
        };

        let pagination = order::compile_pagination(self.limit, self.offset, order_clause.is_some())?;

        let mut sql = format!("SELECT {select_list} FROM {table}");
        let fragments = [
            where_clause.to_sql(),
            order_clause,
            pagination.offset,
            pagination.fetch,
        ];
        for fragment in fragments.into_iter().flatten() {
            sql.push(' ');
            sql.push_str(&fragment);
        }

        Ok(ReadQuery {
            query: CompiledQuery {
                sql,
                params: where_clause.params,
            },
            advisories,
        })
    }
}

fn select_list(columns: &[String]) -> DbResult<String> {
    if columns.is_empty() {
        return Ok("*".to_string());
    }
    let quoted = columns
        .iter()
        .map(|c| ident::quote(c, IdentKind::Column))
        .collect::<DbResult<Vec<_>>>()?;
    Ok(quoted.join(", "))
}

/// Build one parameterized INSERT and a parameter row per record.
///
/// Columns follow the key order of the first record; every record must carry
/// exactly the same set of keys.
pub fn build_insert(table: &str, records: &[Map<String, JsonValue>]) -> DbResult<CompiledBatch> {
    let table = ident::quote(table, IdentKind::Table)?;
    let Some(first) = records.first() else {
        return Err(DbError::invalid_input("Records list cannot be empty"));
    };
    if first.is_empty() {
        return Err(DbError::invalid_input("Records must contain at least one column"));
    }

    for (index, record) in records.iter().enumerate().skip(1) {
        let same_keys = record.len() == first.len() && first.keys().all(|k| record.contains_key(k));
        if !same_keys {
            return Err(DbError::InconsistentRecordShape { index });
        }
    }

    let columns: Vec<&String> = first.keys().collect();
    let column_list = columns
        .iter()
        .map(|c| ident::quote(c, IdentKind::Column))
        .collect::<DbResult<Vec<_>>>()?
        .join(", ");

    let rows = records
        .iter()
        .map(|record| {
            columns
                .iter()
                .map(|c| SqlValue::scalar_from_json(c, &record[c.as_str()]))
                .collect::<DbResult<Vec<_>>>()
        })
        .collect::<DbResult<Vec<_>>>()?;

    Ok(CompiledBatch {
        sql: format!(
            "INSERT INTO {table} ({column_list}) VALUES ({})",
            filter::placeholders(columns.len())
        ),
        rows,
    })
}

/// Build `UPDATE [t] SET [a] = ?, ... WHERE [k] = ? AND ...`.
///
/// Both mappings must be non-empty: there is no way to update every row.
pub fn build_update(
    table: &str,
    updates: &Map<String, JsonValue>,
    filters: &Map<String, JsonValue>,
) -> DbResult<CompiledQuery> {
    let table = ident::quote(table, IdentKind::Table)?;
    if updates.is_empty() {
        return Err(DbError::EmptyUpdate);
    }
    if filters.is_empty() {
        return Err(DbError::EmptyFilter { operation: "update" });
    }

    let mut assignments = Vec::with_capacity(updates.len());
    let mut params = Vec::with_capacity(updates.len() + filters.len());
    for (column, value) in updates {
        let quoted = ident::quote(column, IdentKind::UpdateColumn)?;
        assignments.push(format!("{quoted} = ?"));
        params.push(SqlValue::scalar_from_json(column, value)?);
    }

    let where_clause = filter::compile_equality_filters(filters)?;
    let where_sql = required_where(&where_clause, "update")?;
    params.extend(where_clause.params);

    Ok(CompiledQuery {
        sql: format!("UPDATE {table} SET {} {where_sql}", assignments.join(", ")),
        params,
    })
}

/// Build `DELETE FROM [t] WHERE [k] = ? AND ...`. Filters must be non-empty.
pub fn build_delete(table: &str, filters: &Map<String, JsonValue>) -> DbResult<CompiledQuery> {
    let table = ident::quote(table, IdentKind::Table)?;
    if filters.is_empty() {
        return Err(DbError::EmptyFilter { operation: "delete" });
    }

    let where_clause = filter::compile_equality_filters(filters)?;
    let where_sql = required_where(&where_clause, "delete")?;

    Ok(CompiledQuery {
        sql: format!("DELETE FROM {table} {where_sql}"),
        params: where_clause.params,
    })
}

fn required_where(clause: &WhereClause, operation: &'static str) -> DbResult<String> {
    clause.to_sql().ok_or(DbError::EmptyFilter { operation })
}
