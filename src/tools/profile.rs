//! Connection profile management tools.
//!
//! This module implements the `add_profile`, `list_profiles` and
//! `remove_profile` MCP tools. Failures the caller can correct (bad name,
//! empty password, keychain refusal) come back as `status: "error"` results
//! rather than protocol errors.

use crate::db::executor::blocking;
use crate::error::{DbError, DbResult};
use crate::models::{ConnectionProfile, StoredProfile};
use crate::sql::ident::{self, IdentKind};
use crate::store::{ProfileStore, SecretKey, SecretStore};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Input for the add_profile tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct AddProfileInput {
    /// Unique profile name (letters, digits and underscores; must not start with a digit)
    pub profile_name: String,
    /// Exact ODBC driver name, e.g. "{ODBC Driver 18 for SQL Server}"
    pub driver: String,
    /// Server address or hostname, optionally with ",port"
    pub server: String,
    /// Database name
    pub database: String,
    /// SQL Server login name
    pub username: String,
    /// Login password. Stored in the OS keychain, never in the profile file.
    pub password: String,
}

/// Input for the remove_profile tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct RemoveProfileInput {
    /// Name of the profile to remove
    pub profile_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProfileStatus {
    Success,
    NotFound,
    Error,
}

/// Result of add_profile and remove_profile.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ProfileStatusOutput {
    pub status: ProfileStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_name: Option<String>,
    /// Explanation when status is not success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Non-fatal problem encountered on the success path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl ProfileStatusOutput {
    fn success(profile_name: &str) -> Self {
        Self {
            status: ProfileStatus::Success,
            profile_name: Some(profile_name.to_string()),
            message: None,
            warning: None,
        }
    }

    fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warning = Some(warning.into());
        self
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: ProfileStatus::NotFound,
            profile_name: None,
            message: Some(message.into()),
            warning: None,
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            status: ProfileStatus::Error,
            profile_name: None,
            message: Some(message.into()),
            warning: None,
        }
    }
}

/// Output from the list_profiles tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ListProfilesOutput {
    /// Saved profile names, sorted
    pub profiles: Vec<String>,
    pub count: usize,
}

pub struct ProfileToolHandler {
    profiles: Arc<dyn ProfileStore>,
    secrets: Arc<dyn SecretStore>,
}

impl ProfileToolHandler {
    pub fn new(profiles: Arc<dyn ProfileStore>, secrets: Arc<dyn SecretStore>) -> Self {
        Self { profiles, secrets }
    }

    /// Store the password, then the profile. Re-adding replaces both.
    pub async fn add_profile(&self, input: AddProfileInput) -> ProfileStatusOutput {
        info!(profile = %input.profile_name, "Adding profile");

        if let Err(e) = ident::validate(&input.profile_name, IdentKind::Profile) {
            error!(profile = %input.profile_name, "Rejected profile name");
            return ProfileStatusOutput::error(e.to_string());
        }
        let missing: Vec<&str> = [
            ("driver", &input.driver),
            ("server", &input.server),
            ("database", &input.database),
            ("username", &input.username),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(key, _)| key)
        .collect();
        if !missing.is_empty() {
            return ProfileStatusOutput::error(format!(
                "Required fields are empty: {}",
                missing.join(", ")
            ));
        }
        if input.password.is_empty() {
            return ProfileStatusOutput::error("Password cannot be empty.");
        }

        let profiles = Arc::clone(&self.profiles);
        let secrets = Arc::clone(&self.secrets);
        let outcome = blocking(move || save_profile(profiles.as_ref(), secrets.as_ref(), input))
            .await
            .and_then(|r| r);

        match outcome {
            Ok(output) => {
                info!(profile = ?output.profile_name, "Profile saved");
                output
            }
            Err(e) => {
                error!(error = %e, "Failed to add profile");
                ProfileStatusOutput::error(describe_failure(&e))
            }
        }
    }

    pub async fn list_profiles(&self) -> DbResult<ListProfilesOutput> {
        let store = Arc::clone(&self.profiles);
        let profiles: Vec<String> = blocking(move || store.list())
            .await??
            .into_keys()
            .collect();

        info!(count = profiles.len(), "Listed profiles");
        Ok(ListProfilesOutput {
            count: profiles.len(),
            profiles,
        })
    }

    /// Delete the profile, then its password. A missing password is only a warning.
    pub async fn remove_profile(&self, input: RemoveProfileInput) -> ProfileStatusOutput {
        info!(profile = %input.profile_name, "Removing profile");

        let profiles = Arc::clone(&self.profiles);
        let secrets = Arc::clone(&self.secrets);
        let name = input.profile_name;
        let outcome = blocking(move || delete_profile(profiles.as_ref(), secrets.as_ref(), &name))
            .await
            .and_then(|r| r);

        match outcome {
            Ok(output) => output,
            Err(e) => {
                error!(error = %e, "Failed to remove profile");
                ProfileStatusOutput::error(describe_failure(&e))
            }
        }
    }
}

fn save_profile(
    profiles: &dyn ProfileStore,
    secrets: &dyn SecretStore,
    input: AddProfileInput,
) -> DbResult<ProfileStatusOutput> {
    let profile = ConnectionProfile::new(
        input.profile_name,
        input.driver,
        input.server,
        input.database,
        input.username,
    );

    secrets.set(&SecretKey::new(&profile.name, &profile.username), &input.password)?;
    let previous = profiles.upsert(&profile.name, StoredProfile::from(&profile))?;

    let mut output = ProfileStatusOutput::success(&profile.name);

    // A changed username leaves the old password behind under the old key.
    if let Some(old_user) = previous.and_then(|p| p.username)
        && old_user != profile.username
    {
        let stale = SecretKey::new(&profile.name, &old_user);
        if let Err(e) = secrets.delete(&stale) {
            warn!(profile = %profile.name, error = %e, "Failed to delete previous password");
            output = output.with_warning(format!(
                "Previous password for user '{old_user}' could not be removed: {e}"
            ));
        }
    }

    Ok(output)
}

fn delete_profile(
    profiles: &dyn ProfileStore,
    secrets: &dyn SecretStore,
    name: &str,
) -> DbResult<ProfileStatusOutput> {
    let Some(removed) = profiles.remove(name)? else {
        let message = format!("Profile '{name}' not found.");
        warn!(profile = %name, "{}", message);
        return Ok(ProfileStatusOutput::not_found(message));
    };

    let key = match removed.username {
        Some(username) => SecretKey::new(name, username),
        None => SecretKey::profile_only(name),
    };

    let output = ProfileStatusOutput::success(name);
    if secrets.delete(&key)? {
        info!(profile = %name, "Profile and password removed");
        Ok(output)
    } else {
        warn!(profile = %name, key = %key, "Password not found in secret store, profile removed anyway");
        Ok(output.with_warning("Password not found in secure storage, but profile removed."))
    }
}

fn describe_failure(err: &DbError) -> String {
    match err {
        DbError::Persistence { message } => format!("Failed to save profile file: {message}"),
        DbError::SecretStore { message } => {
            format!("Failed to access secure password storage: {message}")
        }
        other => format!("An unexpected error occurred: {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serialization() {
        let out = ProfileStatusOutput::success("prod").with_warning("careful");
        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["profile_name"], "prod");
        assert_eq!(json["warning"], "careful");
        assert!(json.get("message").is_none());

        let json = serde_json::to_value(ProfileStatusOutput::not_found("gone")).unwrap();
        assert_eq!(json["status"], "not_found");
    }

    #[test]
    fn test_describe_failure() {
        let msg = describe_failure(&DbError::persistence("disk full"));
        assert!(msg.starts_with("Failed to save profile file"));
        let msg = describe_failure(&DbError::secret_store("locked"));
        assert!(msg.contains("locked"));
    }
}
