//! Integration tests for profile management.
//!
//! Profiles land in a real JSON file under a temp dir; passwords go to the
//! in-memory secret store.

mod common;

use common::Fixture;
use odbc_mcp_server::store::{JsonFileProfileStore, ProfileStore, SecretKey, SecretStore};
use odbc_mcp_server::tools::{
    AddProfileInput, ProfileStatus, ProfileToolHandler, RemoveProfileInput,
};
use std::sync::Arc;

fn handler(fixture: &Fixture) -> ProfileToolHandler {
    ProfileToolHandler::new(fixture.profiles.clone(), fixture.secrets.clone())
}

fn add_input(name: &str, username: &str) -> AddProfileInput {
    AddProfileInput {
        profile_name: name.to_string(),
        driver: "{ODBC Driver 18 for SQL Server}".to_string(),
        server: "sql01,1433".to_string(),
        database: "Inventory".to_string(),
        username: username.to_string(),
        password: "hunter2".to_string(),
    }
}

fn remove_input(name: &str) -> RemoveProfileInput {
    RemoveProfileInput {
        profile_name: name.to_string(),
    }
}

#[tokio::test]
async fn test_add_profile_stores_password_outside_profile_file() {
    let fixture = Fixture::empty();
    let output = handler(&fixture).add_profile(add_input("inventory", "sa")).await;

    assert_eq!(output.status, ProfileStatus::Success);
    assert_eq!(output.profile_name.as_deref(), Some("inventory"));
    assert!(output.warning.is_none());

    let text = std::fs::read_to_string(fixture.profiles.path()).unwrap();
    assert!(!text.contains("hunter2"));
    let on_disk: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(on_disk["inventory"]["server"], "sql01,1433");
    assert_eq!(on_disk["inventory"]["username"], "sa");

    assert_eq!(
        fixture
            .secrets
            .get(&SecretKey::new("inventory", "sa"))
            .unwrap()
            .as_deref(),
        Some("hunter2")
    );
}

#[tokio::test]
async fn test_added_profile_survives_a_new_store() {
    let fixture = Fixture::empty();
    handler(&fixture).add_profile(add_input("inventory", "sa")).await;

    let reopened = JsonFileProfileStore::new(fixture.profiles.path());
    let stored = reopened.get("inventory").unwrap().unwrap();
    assert_eq!(stored.database.as_deref(), Some("Inventory"));
}

#[tokio::test]
async fn test_add_profile_rejects_invalid_name() {
    let fixture = Fixture::empty();
    let output = handler(&fixture)
        .add_profile(add_input("prod db", "sa"))
        .await;

    assert_eq!(output.status, ProfileStatus::Error);
    assert!(output.message.unwrap().contains("prod db"));
    assert!(fixture.secrets.is_empty());
    assert!(!fixture.profiles.path().exists());
}

#[tokio::test]
async fn test_add_profile_rejects_empty_password() {
    let fixture = Fixture::empty();
    let output = handler(&fixture)
        .add_profile(AddProfileInput {
            password: String::new(),
            ..add_input("inventory", "sa")
        })
        .await;

    assert_eq!(output.status, ProfileStatus::Error);
    assert_eq!(output.message.as_deref(), Some("Password cannot be empty."));
    assert!(fixture.secrets.is_empty());
}

#[tokio::test]
async fn test_add_profile_rejects_blank_fields() {
    let fixture = Fixture::empty();
    let output = handler(&fixture)
        .add_profile(AddProfileInput {
            server: "  ".to_string(),
            database: String::new(),
            ..add_input("inventory", "sa")
        })
        .await;

    assert_eq!(output.status, ProfileStatus::Error);
    let message = output.message.unwrap();
    assert!(message.contains("server"));
    assert!(message.contains("database"));
}

#[tokio::test]
async fn test_readding_with_new_username_drops_old_password() {
    let fixture = Fixture::empty();
    let handler = handler(&fixture);
    handler.add_profile(add_input("inventory", "sa")).await;
    let output = handler.add_profile(add_input("inventory", "reporter")).await;

    assert_eq!(output.status, ProfileStatus::Success);
    assert!(
        fixture
            .secrets
            .get(&SecretKey::new("inventory", "sa"))
            .unwrap()
            .is_none()
    );
    assert!(
        fixture
            .secrets
            .get(&SecretKey::new("inventory", "reporter"))
            .unwrap()
            .is_some()
    );
    assert_eq!(fixture.secrets.len(), 1);
}

#[tokio::test]
async fn test_list_profiles_is_sorted() {
    let fixture = Fixture::empty();
    let handler = handler(&fixture);
    for name in ["warehouse", "accounting", "marketing"] {
        handler.add_profile(add_input(name, "sa")).await;
    }

    let output = handler.list_profiles().await.unwrap();
    assert_eq!(output.profiles, vec!["accounting", "marketing", "warehouse"]);
    assert_eq!(output.count, 3);
}

#[tokio::test]
async fn test_list_profiles_without_file_is_empty() {
    let fixture = Fixture::empty();
    let output = handler(&fixture).list_profiles().await.unwrap();
    assert!(output.profiles.is_empty());
    assert_eq!(output.count, 0);
}

#[tokio::test]
async fn test_list_profiles_fails_on_corrupt_file() {
    let fixture = Fixture::empty();
    std::fs::write(fixture.profiles.path(), "{ not json").unwrap();
    assert!(handler(&fixture).list_profiles().await.is_err());
}

#[tokio::test]
async fn test_remove_profile_deletes_profile_and_password() {
    let fixture = Fixture::empty();
    let handler = handler(&fixture);
    handler.add_profile(add_input("inventory", "sa")).await;

    let output = handler.remove_profile(remove_input("inventory")).await;
    assert_eq!(output.status, ProfileStatus::Success);
    assert!(output.warning.is_none());
    assert!(fixture.secrets.is_empty());
    assert!(fixture.profiles.get("inventory").unwrap().is_none());
}

#[tokio::test]
async fn test_remove_profile_without_password_warns() {
    let fixture = Fixture::empty();
    let handler = handler(&fixture);
    handler.add_profile(add_input("inventory", "sa")).await;
    fixture
        .secrets
        .delete(&SecretKey::new("inventory", "sa"))
        .unwrap();

    let output = handler.remove_profile(remove_input("inventory")).await;
    assert_eq!(output.status, ProfileStatus::Success);
    assert_eq!(
        output.warning.as_deref(),
        Some("Password not found in secure storage, but profile removed.")
    );
    assert!(fixture.profiles.get("inventory").unwrap().is_none());
}

#[tokio::test]
async fn test_remove_unknown_profile() {
    let fixture = Fixture::empty();
    let output = handler(&fixture).remove_profile(remove_input("ghost")).await;

    assert_eq!(output.status, ProfileStatus::NotFound);
    assert_eq!(output.message.as_deref(), Some("Profile 'ghost' not found."));
}

#[tokio::test]
async fn test_status_serializes_snake_case() {
    let fixture = Fixture::empty();
    let output = handler(&fixture).remove_profile(remove_input("ghost")).await;
    let json = serde_json::to_value(&output).unwrap();
    assert_eq!(json["status"], "not_found");
    assert!(json.get("warning").is_none());
}

#[tokio::test]
async fn test_profiles_written_by_tool_are_usable_by_connector() {
    let fixture = Fixture::empty();
    let profiles: Arc<dyn ProfileStore> = fixture.profiles.clone();
    ProfileToolHandler::new(profiles, fixture.secrets.clone())
        .add_profile(add_input("inventory", "sa"))
        .await;

    let conn_str = fixture.connector.connection_string("inventory").unwrap();
    let rendered = conn_str.render();
    assert!(rendered.contains("SERVER=sql01,1433;"));
    assert!(rendered.contains("PWD=hunter2;"));
    assert!(!format!("{conn_str:?}").contains("hunter2"));
}
