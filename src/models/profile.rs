//! Connection profile models.
//!
//! A profile is the non-secret half of a connection: which ODBC driver to load
//! and where the database lives. The password is kept in the secret store.

use crate::error::{DbError, DbResult};
use serde::{Deserialize, Serialize};

/// Profile exactly as persisted in the profile file.
///
/// Every field is optional so that a hand-edited file with a missing key is
/// reported as `MissingProfileField` instead of failing to load altogether.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl From<&ConnectionProfile> for StoredProfile {
    fn from(profile: &ConnectionProfile) -> Self {
        Self {
            driver: Some(profile.driver.clone()),
            server: Some(profile.server.clone()),
            database: Some(profile.database.clone()),
            username: Some(profile.username.clone()),
        }
    }
}

/// A complete connection profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionProfile {
    pub name: String,
    /// ODBC driver name, e.g. `{ODBC Driver 18 for SQL Server}`
    pub driver: String,
    pub server: String,
    pub database: String,
    pub username: String,
}

impl ConnectionProfile {
    pub fn new(
        name: impl Into<String>,
        driver: impl Into<String>,
        server: impl Into<String>,
        database: impl Into<String>,
        username: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            driver: driver.into(),
            server: server.into(),
            database: database.into(),
            username: username.into(),
        }
    }

    /// Build a complete profile from its stored form, listing every missing key.
    pub fn from_stored(name: &str, stored: StoredProfile) -> DbResult<Self> {
        let mut missing = Vec::new();
        let mut take = |field: Option<String>, key: &str| -> String {
            match field {
                Some(value) => value,
                None => {
                    missing.push(key.to_string());
                    String::new()
                }
            }
        };

        let driver = take(stored.driver, "driver");
        let server = take(stored.server, "server");
        let database = take(stored.database, "database");
        let username = take(stored.username, "username");

        if !missing.is_empty() {
            return Err(DbError::MissingProfileField {
                profile: name.to_string(),
                fields: missing,
            });
        }

        Ok(Self::new(name, driver, server, database, username))
    }
}
