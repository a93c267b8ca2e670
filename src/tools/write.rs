//! Write operation tools.
//!
//! This module implements the `create_records`, `update_records` and
//! `delete_records` MCP tools. Each call runs in its own transaction that is
//! committed on success and rolled back on any failure.

use crate::db::{Mutation, QueryExecutor};
use crate::error::DbResult;
use crate::sql::{build_delete, build_insert, build_update};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::sync::Arc;
use tracing::info;

const SUCCESS: &str = "success";

/// Input for the create_records tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct CreateRecordsInput {
    /// Saved connection profile to use (see list_profiles)
    pub profile_name: String,
    /// Table to insert into
    pub table_name: String,
    /// Rows to insert. Every record must have the same set of keys.
    pub records: Vec<Map<String, JsonValue>>,
}

/// Input for the update_records tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct UpdateRecordsInput {
    /// Saved connection profile to use (see list_profiles)
    pub profile_name: String,
    /// Table to update
    pub table_name: String,
    /// New values keyed by column: {"Status": "Inactive"}
    pub updates: Map<String, JsonValue>,
    /// Equality conditions joined with AND: {"CustomerID": 42}. Must not be empty.
    pub filters: Map<String, JsonValue>,
}

/// Input for the delete_records tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct DeleteRecordsInput {
    /// Saved connection profile to use (see list_profiles)
    pub profile_name: String,
    /// Table to delete from
    pub table_name: String,
    /// Equality conditions joined with AND: {"CustomerID": 42}. Must not be empty.
    pub filters: Map<String, JsonValue>,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct CreateRecordsOutput {
    pub status: String,
    pub records_inserted: u64,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct UpdateRecordsOutput {
    pub status: String,
    /// Rows reported by the driver; 0 when the driver does not report a count
    pub records_updated: u64,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct DeleteRecordsOutput {
    pub status: String,
    /// Rows reported by the driver; 0 when the driver does not report a count
    pub records_deleted: u64,
}

pub struct WriteToolHandler {
    executor: Arc<QueryExecutor>,
}

impl WriteToolHandler {
    pub fn new(executor: Arc<QueryExecutor>) -> Self {
        Self { executor }
    }

    pub async fn create_records(&self, input: CreateRecordsInput) -> DbResult<CreateRecordsOutput> {
        let batch = build_insert(&input.table_name, &input.records)?;
        info!(
            profile = %input.profile_name,
            table = %input.table_name,
            records = batch.rows.len(),
            "Inserting records"
        );

        let records_inserted = self
            .executor
            .mutate(&input.profile_name, Mutation::Batch(batch))
            .await?;

        info!(
            profile = %input.profile_name,
            table = %input.table_name,
            rows_affected = records_inserted,
            "Insert committed"
        );
        Ok(CreateRecordsOutput {
            status: SUCCESS.to_string(),
            records_inserted,
        })
    }

    pub async fn update_records(&self, input: UpdateRecordsInput) -> DbResult<UpdateRecordsOutput> {
        let query = build_update(&input.table_name, &input.updates, &input.filters)?;
        info!(profile = %input.profile_name, table = %input.table_name, "Updating records");

        let records_updated = self
            .executor
            .mutate(&input.profile_name, Mutation::Single(query))
            .await?;

        info!(
            profile = %input.profile_name,
            table = %input.table_name,
            rows_affected = records_updated,
            "Update committed"
        );
        Ok(UpdateRecordsOutput {
            status: SUCCESS.to_string(),
            records_updated,
        })
    }

    pub async fn delete_records(&self, input: DeleteRecordsInput) -> DbResult<DeleteRecordsOutput> {
        let query = build_delete(&input.table_name, &input.filters)?;
        info!(profile = %input.profile_name, table = %input.table_name, "Deleting records");

        let records_deleted = self
            .executor
            .mutate(&input.profile_name, Mutation::Single(query))
            .await?;

        info!(
            profile = %input.profile_name,
            table = %input.table_name,
            rows_affected = records_deleted,
            "Delete committed"
        );
        Ok(DeleteRecordsOutput {
            status: SUCCESS.to_string(),
            records_deleted,
        })
    }
}
