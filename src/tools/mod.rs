//! MCP tool implementations.
//!
//! This module contains all tool handlers:
//! - `profile`: add / list / remove connection profiles
//! - `read`: structured SELECT with filters, ordering and pagination
//! - `write`: insert, update and delete records
//! - `schema`: table listing and column metadata

pub mod profile;
pub mod read;
pub mod schema;
pub mod write;

pub use profile::{
    AddProfileInput, ListProfilesOutput, ProfileStatus, ProfileStatusOutput, ProfileToolHandler,
    RemoveProfileInput,
};
pub use read::{ReadRowsInput, ReadRowsOutput, ReadToolHandler};
pub use schema::{
    GetTableSchemaInput, GetTableSchemaOutput, ListTablesInput, ListTablesOutput,
    SchemaToolHandler,
};
pub use write::{
    CreateRecordsInput, CreateRecordsOutput, DeleteRecordsInput, DeleteRecordsOutput,
    UpdateRecordsInput, UpdateRecordsOutput, WriteToolHandler,
};
