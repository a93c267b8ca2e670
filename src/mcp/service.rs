//! MCP service implementation using rmcp.
//!
//! This module defines the OdbcService struct with every tool exposed via the
//! MCP protocol using the rmcp framework's macros.

use crate::db::{Connector, ODBC_ENABLED, QueryExecutor};
use crate::tools::profile::{
    AddProfileInput, ListProfilesOutput, ProfileStatusOutput, ProfileToolHandler,
    RemoveProfileInput,
};
use crate::tools::read::{ReadRowsInput, ReadRowsOutput, ReadToolHandler};
use crate::tools::schema::{
    GetTableSchemaInput, GetTableSchemaOutput, ListTablesInput, ListTablesOutput,
    SchemaToolHandler,
};
use crate::tools::write::{
    CreateRecordsInput, CreateRecordsOutput, DeleteRecordsInput, DeleteRecordsOutput,
    UpdateRecordsInput, UpdateRecordsOutput, WriteToolHandler,
};
use rmcp::Json;
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::{Implementation, ProtocolVersion, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct OdbcService {
    profiles: Arc<ProfileToolHandler>,
    reader: Arc<ReadToolHandler>,
    writer: Arc<WriteToolHandler>,
    schema: Arc<SchemaToolHandler>,
    /// Tool router for MCP tool dispatch (auto-generated)
    tool_router: ToolRouter<Self>,
}

impl OdbcService {
    /// Create a service whose tools share one connector.
    pub fn new(connector: Connector) -> Self {
        let profiles = Arc::new(ProfileToolHandler::new(
            Arc::clone(connector.profiles()),
            Arc::clone(connector.secrets()),
        ));
        let executor = Arc::new(QueryExecutor::new(connector));
        Self {
            profiles,
            reader: Arc::new(ReadToolHandler::new(Arc::clone(&executor))),
            writer: Arc::new(WriteToolHandler::new(Arc::clone(&executor))),
            schema: Arc::new(SchemaToolHandler::new(executor)),
            tool_router: Self::tool_router(),
        }
    }

    /// Validate profile name - ensure it is provided and non-empty.
    ///
    /// Returns the trimmed name if valid, otherwise returns an error guiding
    /// the caller to list_profiles.
    fn validate_profile_name(&self, provided: &str) -> Result<String, McpError> {
        let trimmed = provided.trim();
        if trimmed.is_empty() {
            Err(McpError::invalid_params(
                "profile_name is required. Call list_profiles first to see saved profiles.",
                None,
            ))
        } else {
            Ok(trimmed.to_string())
        }
    }
}

#[tool_router]
impl OdbcService {
    #[tool(
        description = "Add or update a connection profile.\nNon-secret details are saved to the profile file; the password is stored in the OS keychain.\nThe profile name must contain only letters, digits and underscores."
    )]
    async fn add_profile(
        &self,
        Parameters(input): Parameters<AddProfileInput>,
    ) -> Json<ProfileStatusOutput> {
        Json(self.profiles.add_profile(input).await)
    }

    #[tool(description = "List the names of all saved connection profiles.")]
    async fn list_profiles(&self) -> Result<Json<ListProfilesOutput>, McpError> {
        self.profiles
            .list_profiles()
            .await
            .map(Json)
            .map_err(McpError::from)
    }

    #[tool(
        description = "Remove a connection profile and its stored password.\nReturns status not_found when no such profile exists."
    )]
    async fn remove_profile(
        &self,
        Parameters(input): Parameters<RemoveProfileInput>,
    ) -> Json<ProfileStatusOutput> {
        Json(self.profiles.remove_profile(input).await)
    }

    #[tool(
        description = "Read rows from a table.\nfilters: {\"Age\": {\"operator\": \">\", \"value\": 30}}; operators =, >, <, >=, <=, LIKE, IN (IN takes a list).\norder_by: {\"Name\": \"ASC\"}.\nlimit/offset page through results; without order_by an arbitrary order is used and a warning is returned."
    )]
    async fn read_rows(
        &self,
        Parameters(input): Parameters<ReadRowsInput>,
    ) -> Result<Json<ReadRowsOutput>, McpError> {
        let mut input = input;
        input.profile_name = self.validate_profile_name(&input.profile_name)?;
        self.reader
            .read_rows(input)
            .await
            .map(Json)
            .map_err(McpError::from)
    }

    #[tool(
        description = "Insert records into a table in a single transaction.\nEvery record must have the same set of columns."
    )]
    async fn create_records(
        &self,
        Parameters(input): Parameters<CreateRecordsInput>,
    ) -> Result<Json<CreateRecordsOutput>, McpError> {
        let mut input = input;
        input.profile_name = self.validate_profile_name(&input.profile_name)?;
        self.writer
            .create_records(input)
            .await
            .map(Json)
            .map_err(McpError::from)
    }

    #[tool(
        description = "Update records matching equality filters, e.g. updates {\"Status\": \"Inactive\"} with filters {\"CustomerID\": 42}.\nFilters are required; updating every row is refused."
    )]
    async fn update_records(
        &self,
        Parameters(input): Parameters<UpdateRecordsInput>,
    ) -> Result<Json<UpdateRecordsOutput>, McpError> {
        let mut input = input;
        input.profile_name = self.validate_profile_name(&input.profile_name)?;
        self.writer
            .update_records(input)
            .await
            .map(Json)
            .map_err(McpError::from)
    }

    #[tool(
        description = "Delete records matching equality filters, e.g. {\"CustomerID\": 42}.\nFilters are required; deleting every row is refused."
    )]
    async fn delete_records(
        &self,
        Parameters(input): Parameters<DeleteRecordsInput>,
    ) -> Result<Json<DeleteRecordsOutput>, McpError> {
        let mut input = input;
        input.profile_name = self.validate_profile_name(&input.profile_name)?;
        self.writer
            .delete_records(input)
            .await
            .map(Json)
            .map_err(McpError::from)
    }

    #[tool(
        description = "Get column metadata for a table: name, ODBC type code, type name, size, decimal digits and nullability."
    )]
    async fn get_table_schema(
        &self,
        Parameters(input): Parameters<GetTableSchemaInput>,
    ) -> Result<Json<GetTableSchemaOutput>, McpError> {
        let mut input = input;
        input.profile_name = self.validate_profile_name(&input.profile_name)?;
        self.schema
            .get_table_schema(input)
            .await
            .map(Json)
            .map_err(McpError::from)
    }

    #[tool(description = "List base tables, optionally within one schema (e.g. \"dbo\").")]
    async fn list_tables(
        &self,
        Parameters(input): Parameters<ListTablesInput>,
    ) -> Result<Json<ListTablesOutput>, McpError> {
        let mut input = input;
        input.profile_name = self.validate_profile_name(&input.profile_name)?;
        self.schema
            .list_tables(input)
            .await
            .map(Json)
            .map_err(McpError::from)
    }
}

#[tool_handler]
impl ServerHandler for OdbcService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_03_26,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "odbc-mcp-server".to_owned(),
                title: Some("ODBC MCP Server".to_owned()),
                version: env!("CARGO_PKG_VERSION").to_owned(),
                icons: None,
                website_url: None,
            },
            instructions: Some(server_instructions()),
        }
    }
}

const BASE_INSTRUCTIONS: &str = "Table tools for a SQL Server database reached through ODBC.\n\
    \n\
    ## Workflow\n\
    1. Call `list_profiles` to see saved connection profiles\n\
    2. If none fits, create one with `add_profile`\n\
    3. Pass the `profile_name` to every other tool\n\
    \n\
    ## Tools\n\
    - Discovery: `list_tables`, `get_table_schema`\n\
    - Reading: `read_rows` with `filters`, `order_by`, `limit`, `offset`\n\
    - Writing: `create_records`, `update_records`, `delete_records`\n\
    \n\
    ## Notes\n\
    - Table, column and schema names must be plain identifiers (letters, digits, underscores).\n\
    - Update and delete require at least one filter.\n\
    - Pagination without `order_by` returns rows in an arbitrary order.";

const NO_BACKEND_NOTICE: &str = "\n\n## Unavailable in this build\n\
    This server was built without ODBC support (`--features odbc`). Profile tools work, \
    but every table and schema tool will fail with a connection error.";

fn server_instructions() -> String {
    if ODBC_ENABLED {
        BASE_INSTRUCTIONS.to_string()
    } else {
        format!("{BASE_INSTRUCTIONS}{NO_BACKEND_NOTICE}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DisabledDriver;
    use crate::store::{JsonFileProfileStore, MemorySecretStore};

    fn create_test_service() -> OdbcService {
        let connector = Connector::new(
            Arc::new(JsonFileProfileStore::new("does-not-exist/profiles.json")),
            Arc::new(MemorySecretStore::new()),
            Arc::new(DisabledDriver::new("no driver in tests")),
        );
        OdbcService::new(connector)
    }

    #[test]
    fn test_service_creation() {
        let _service = create_test_service();
    }

    #[test]
    fn test_validate_profile_name_trims_whitespace() {
        let service = create_test_service();
        assert_eq!(service.validate_profile_name("  prod  ").unwrap(), "prod");
    }

    #[test]
    fn test_validate_profile_name_rejects_blank() {
        let service = create_test_service();
        let err = service.validate_profile_name("   ").unwrap_err();
        assert!(err.to_string().contains("profile_name is required"));
    }

    #[test]
    fn test_server_info() {
        let service = create_test_service();
        let info = service.get_info();
        assert_eq!(info.server_info.name, "odbc-mcp-server");
        assert!(info.capabilities.tools.is_some());
    }

    #[test]
    fn test_instructions_flag_missing_backend() {
        let instructions = create_test_service().get_info().instructions.unwrap();
        assert!(instructions.contains("list_profiles"));
        assert_eq!(
            instructions.contains("built without ODBC support"),
            !ODBC_ENABLED
        );
    }

    #[test]
    fn test_all_tools_registered() {
        let service = create_test_service();
        let mut names: Vec<String> = service
            .tool_router
            .list_all()
            .into_iter()
            .map(|tool| tool.name.to_string())
            .collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                "add_profile",
                "create_records",
                "delete_records",
                "get_table_schema",
                "list_profiles",
                "list_tables",
                "read_rows",
                "remove_profile",
                "update_records",
            ]
        );
    }
}
