//! Error types for the ODBC MCP Server.
//!
//! This module defines all error types using `thiserror` for ergonomic error handling.
//! Each error variant provides actionable messages to help AI assistants understand
//! and recover from error conditions.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Invalid {kind} name '{name}': only ASCII letters, digits and underscores are allowed, and it must not start with a digit")]
    InvalidIdentifier { kind: &'static str, name: String },

    #[error("Malformed filter for column '{column}': {message}")]
    MalformedFilter { column: String, message: String },

    #[error("Unsupported filter operator '{operator}' for column '{column}'. Supported: =, >, <, >=, <=, LIKE, IN")]
    UnsupportedOperator { column: String, operator: String },

    #[error("Type mismatch for column '{column}': expected {expected}, got {found}")]
    TypeMismatch {
        column: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Record {index} has a different set of columns than the first record; all records must share the same keys")]
    InconsistentRecordShape { index: usize },

    #[error("Updates cannot be empty")]
    EmptyUpdate,

    #[error("Filters cannot be empty for {operation}; refusing to touch every row")]
    EmptyFilter { operation: &'static str },

    #[error("Invalid order_by direction '{direction}' for column '{column}'. Must be 'ASC' or 'DESC'")]
    InvalidDirection { column: String, direction: String },

    #[error("{clause} requires an ORDER BY clause")]
    MissingOrderBy { clause: &'static str },

    #[error("Connection profile '{profile}' not found")]
    ProfileNotFound { profile: String },

    #[error("Profile '{profile}' is missing required keys: {}", fields.join(", "))]
    MissingProfileField { profile: String, fields: Vec<String> },

    #[error("Password for profile '{profile}' (user: {username}) not found in the secret store. Please add the profile again")]
    SecretNotFound { profile: String, username: String },

    #[error("Connection failed: {message}")]
    Connection { message: String, suggestion: String },

    #[error("Database error: {message}")]
    Database {
        message: String,
        /// e.g., "42S02" for invalid object name
        sql_state: Option<String>,
        suggestion: String,
    },

    #[error("Profile store error: {message}")]
    Persistence { message: String },

    #[error("Secret store error: {message}")]
    SecretStore { message: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DbError {
    pub fn invalid_identifier(kind: &'static str, name: impl Into<String>) -> Self {
        Self::InvalidIdentifier {
            kind,
            name: name.into(),
        }
    }

    pub fn malformed_filter(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedFilter {
            column: column.into(),
            message: message.into(),
        }
    }

    pub fn unsupported_operator(column: impl Into<String>, operator: impl Into<String>) -> Self {
        Self::UnsupportedOperator {
            column: column.into(),
            operator: operator.into(),
        }
    }

    pub fn type_mismatch(
        column: impl Into<String>,
        expected: &'static str,
        found: &'static str,
    ) -> Self {
        Self::TypeMismatch {
            column: column.into(),
            expected,
            found,
        }
    }

    pub fn invalid_direction(column: impl Into<String>, direction: impl Into<String>) -> Self {
        Self::InvalidDirection {
            column: column.into(),
            direction: direction.into(),
        }
    }

    pub fn profile_not_found(profile: impl Into<String>) -> Self {
        Self::ProfileNotFound {
            profile: profile.into(),
        }
    }

    pub fn secret_not_found(profile: impl Into<String>, username: impl Into<String>) -> Self {
        Self::SecretNotFound {
            profile: profile.into(),
            username: username.into(),
        }
    }

    /// Create a connection error with a helpful suggestion.
    pub fn connection(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Create a database error with optional SQL state.
    pub fn database(
        message: impl Into<String>,
        sql_state: Option<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self::Database {
            message: message.into(),
            sql_state,
            suggestion: suggestion.into(),
        }
    }

    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence {
            message: message.into(),
        }
    }

    pub fn secret_store(message: impl Into<String>) -> Self {
        Self::SecretStore {
            message: message.into(),
        }
    }

    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Get the suggestion for this error, if available.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Connection { suggestion, .. } => Some(suggestion),
            Self::Database { suggestion, .. } => Some(suggestion),
            Self::ProfileNotFound { .. } => {
                Some("Call list_profiles to see saved profiles, or add one with add_profile")
            }
            Self::MissingProfileField { .. } | Self::SecretNotFound { .. } => {
                Some("Re-add the profile with add_profile to restore its details")
            }
            _ => None,
        }
    }

    /// True for errors raised by the query grammar before any I/O happens.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidIdentifier { .. }
                | Self::MalformedFilter { .. }
                | Self::UnsupportedOperator { .. }
                | Self::TypeMismatch { .. }
                | Self::InconsistentRecordShape { .. }
                | Self::EmptyUpdate
                | Self::EmptyFilter { .. }
                | Self::InvalidDirection { .. }
                | Self::MissingOrderBy { .. }
                | Self::InvalidInput { .. }
        )
    }
}

/// Result type alias for database operations.
pub type DbResult<T> = Result<T, DbError>;

/// Build suggestion data as JSON value.
fn suggestion_data(suggestion: Option<&str>) -> Option<serde_json::Value> {
    suggestion.map(|s| serde_json::json!({ "suggestion": s }))
}

/// Convert DbError to MCP ErrorData for semantic error categorization.
/// Includes the suggestion field in the `data` object when available.
impl From<DbError> for rmcp::ErrorData {
    fn from(err: DbError) -> Self {
        let data = suggestion_data(err.suggestion());
        match &err {
            e if e.is_validation() => rmcp::ErrorData::invalid_params(err.to_string(), data),

            DbError::ProfileNotFound { .. } | DbError::SecretNotFound { .. } => {
                rmcp::ErrorData::resource_not_found(err.to_string(), data)
            }
            DbError::MissingProfileField { .. } => {
                rmcp::ErrorData::invalid_params(err.to_string(), data)
            }

            DbError::Database {
                message, sql_state, ..
            } => {
                let msg = match sql_state {
                    Some(code) => format!("Database error: {} (SQLSTATE: {})", message, code),
                    None => err.to_string(),
                };
                rmcp::ErrorData::internal_error(msg, data)
            }

            _ => rmcp::ErrorData::internal_error(err.to_string(), data),
        }
    }
}
