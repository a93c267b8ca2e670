//! Row reading tool.
//!
//! This module implements the `read_rows` MCP tool: a structured SELECT with
//! filters, ordering and OFFSET/FETCH pagination.

use crate::db::QueryExecutor;
use crate::error::DbResult;
use crate::sql::SelectBuilder;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::sync::Arc;
use tracing::info;

/// Input for the read_rows tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ReadRowsInput {
    /// Saved connection profile to use (see list_profiles)
    pub profile_name: String,
    /// Table to read from
    pub table_name: String,
    /// Columns to return. Omit or pass an empty list for all columns.
    #[serde(default)]
    pub columns: Option<Vec<String>>,
    /// Conditions joined with AND, keyed by column:
    /// {"Age": {"operator": ">", "value": 30}, "Status": {"operator": "IN", "value": ["Active", "Pending"]}}.
    /// Operators: =, >, <, >=, <=, LIKE, IN.
    #[serde(default)]
    pub filters: Option<Map<String, JsonValue>>,
    /// Maximum number of rows to return
    #[serde(default)]
    pub limit: Option<u64>,
    /// Number of rows to skip
    #[serde(default)]
    pub offset: Option<u64>,
    /// Sort order keyed by column: {"RegistrationDate": "DESC", "Name": "ASC"}
    #[serde(default)]
    pub order_by: Option<Map<String, JsonValue>>,
}

/// Output from the read_rows tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ReadRowsOutput {
    /// One object per row, keyed by column name
    pub rows: Vec<Map<String, JsonValue>>,
    pub row_count: usize,
    /// Non-fatal advisories, e.g. pagination without an explicit order
    pub warnings: Vec<String>,
}

pub struct ReadToolHandler {
    executor: Arc<QueryExecutor>,
}

impl ReadToolHandler {
    pub fn new(executor: Arc<QueryExecutor>) -> Self {
        Self { executor }
    }

    pub async fn read_rows(&self, input: ReadRowsInput) -> DbResult<ReadRowsOutput> {
        let columns = input.columns.unwrap_or_default();
        let read = SelectBuilder::new(&input.table_name)
            .columns(&columns)
            .filters(input.filters.as_ref())
            .order_by(input.order_by.as_ref())
            .limit(input.limit)
            .offset(input.offset)
            .build()?;

        info!(
            profile = %input.profile_name,
            table = %input.table_name,
            "Reading rows"
        );

        let rows = self.executor.read(&input.profile_name, read.query).await?;
        let row_count = rows.row_count();

        info!(
            profile = %input.profile_name,
            table = %input.table_name,
            row_count = row_count,
            "Read complete"
        );

        Ok(ReadRowsOutput {
            rows: rows.into_json_rows(),
            row_count,
            warnings: read.advisories,
        })
    }
}
