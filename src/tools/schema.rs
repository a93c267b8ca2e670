//! Schema introspection tools.
//!
//! This module implements the `get_table_schema` and `list_tables` MCP tools
//! on top of the driver's catalog functions.

use crate::db::QueryExecutor;
use crate::error::DbResult;
use crate::models::ColumnInfo;
use crate::sql::ident::{self, IdentKind};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Input for the get_table_schema tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GetTableSchemaInput {
    /// Saved connection profile to use (see list_profiles)
    pub profile_name: String,
    /// Table to describe
    pub table_name: String,
    /// Schema to look in (e.g. "dbo"). Omit to search every schema.
    #[serde(default)]
    pub schema: Option<String>,
}

/// Output from the get_table_schema tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct GetTableSchemaOutput {
    pub columns: Vec<ColumnInfo>,
    pub count: usize,
}

/// Input for the list_tables tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ListTablesInput {
    /// Saved connection profile to use (see list_profiles)
    pub profile_name: String,
    /// Only list tables in this schema (e.g. "dbo")
    #[serde(default)]
    pub schema: Option<String>,
}

/// Output from the list_tables tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ListTablesOutput {
    /// Base table names
    pub tables: Vec<String>,
    pub count: usize,
}

pub struct SchemaToolHandler {
    executor: Arc<QueryExecutor>,
}

impl SchemaToolHandler {
    pub fn new(executor: Arc<QueryExecutor>) -> Self {
        Self { executor }
    }

    pub async fn get_table_schema(
        &self,
        input: GetTableSchemaInput,
    ) -> DbResult<GetTableSchemaOutput> {
        ident::validate(&input.table_name, IdentKind::Table)?;
        if let Some(schema) = &input.schema {
            ident::validate(schema, IdentKind::Schema)?;
        }

        info!(
            profile = %input.profile_name,
            table = %input.table_name,
            schema = input.schema.as_deref().unwrap_or("default"),
            "Fetching table schema"
        );

        let columns = self
            .executor
            .columns(
                &input.profile_name,
                &input.table_name,
                input.schema.as_deref(),
            )
            .await?;

        info!(table = %input.table_name, count = columns.len(), "Schema fetched");
        Ok(GetTableSchemaOutput {
            count: columns.len(),
            columns,
        })
    }

    pub async fn list_tables(&self, input: ListTablesInput) -> DbResult<ListTablesOutput> {
        if let Some(schema) = &input.schema {
            ident::validate(schema, IdentKind::Schema)?;
        }

        info!(
            profile = %input.profile_name,
            schema = input.schema.as_deref().unwrap_or("default"),
            "Listing tables"
        );

        let tables = self
            .executor
            .tables(&input.profile_name, input.schema.as_deref())
            .await?;

        info!(count = tables.len(), "Tables listed");
        Ok(ListTablesOutput {
            count: tables.len(),
            tables,
        })
    }
}
