//! Integration tests for read_rows.

mod common;

use common::{Fixture, PROFILE, map};
use odbc_mcp_server::error::DbError;
use odbc_mcp_server::models::{RowSet, SqlValue};
use odbc_mcp_server::sql::UNORDERED_PAGINATION_ADVISORY;
use odbc_mcp_server::tools::{ReadRowsInput, ReadToolHandler};
use serde_json::json;

fn input(table: &str) -> ReadRowsInput {
    ReadRowsInput {
        profile_name: PROFILE.to_string(),
        table_name: table.to_string(),
        columns: None,
        filters: None,
        limit: None,
        offset: None,
        order_by: None,
    }
}

#[tokio::test]
async fn test_rows_are_keyed_by_column_name() {
    let fixture = Fixture::new();
    fixture.driver.set_result(RowSet::new(
        vec!["id".to_string(), "name".to_string(), "note".to_string()],
        vec![
            vec![SqlValue::Int(1), SqlValue::from("Ada"), SqlValue::Null],
            vec![SqlValue::Int(2), SqlValue::from("Grace"), SqlValue::from("admiral")],
        ],
    ));

    let output = ReadToolHandler::new(fixture.executor())
        .read_rows(input("Users"))
        .await
        .unwrap();

    assert_eq!(output.row_count, 2);
    assert!(output.warnings.is_empty());
    assert_eq!(
        serde_json::to_value(&output.rows).unwrap(),
        json!([
            {"id": 1, "name": "Ada", "note": null},
            {"id": 2, "name": "Grace", "note": "admiral"}
        ])
    );

    let calls = fixture.driver.calls();
    assert_eq!(calls.executed[0].0, "SELECT * FROM [Users]");
    assert_eq!(calls.commits, 0);
    assert_eq!(calls.rollbacks, 0);
}

#[tokio::test]
async fn test_column_order_is_preserved_in_output() {
    let fixture = Fixture::new();
    fixture.driver.set_result(RowSet::new(
        vec!["zeta".to_string(), "alpha".to_string()],
        vec![vec![SqlValue::Int(1), SqlValue::Int(2)]],
    ));

    let output = ReadToolHandler::new(fixture.executor())
        .read_rows(input("T"))
        .await
        .unwrap();
    let keys: Vec<&String> = output.rows[0].keys().collect();
    assert_eq!(keys, vec!["zeta", "alpha"]);
}

#[tokio::test]
async fn test_canonical_filtered_page() {
    let fixture = Fixture::new();
    let request = ReadRowsInput {
        columns: Some(vec!["Name".to_string(), "Age".to_string()]),
        filters: Some(map(json!({
            "Age": {"operator": ">", "value": 30},
            "Status": {"operator": "IN", "value": ["Active", "Pending"]}
        }))),
        order_by: Some(map(json!({"Name": "asc"}))),
        limit: Some(10),
        offset: Some(20),
        ..input("Customers")
    };

    let output = ReadToolHandler::new(fixture.executor())
        .read_rows(request)
        .await
        .unwrap();
    assert!(output.warnings.is_empty());

    let calls = fixture.driver.calls();
    let (sql, params) = &calls.executed[0];
    assert_eq!(
        sql,
        "SELECT [Name], [Age] FROM [Customers] WHERE [Age] > ? AND [Status] IN (?, ?) ORDER BY [Name] ASC OFFSET 20 ROWS FETCH NEXT 10 ROWS ONLY"
    );
    assert_eq!(
        params,
        &vec![SqlValue::Int(30), SqlValue::from("Active"), SqlValue::from("Pending")]
    );
}

#[tokio::test]
async fn test_pagination_without_order_warns() {
    let fixture = Fixture::new();
    let output = ReadToolHandler::new(fixture.executor())
        .read_rows(ReadRowsInput {
            limit: Some(5),
            ..input("Users")
        })
        .await
        .unwrap();

    assert_eq!(output.warnings, vec![UNORDERED_PAGINATION_ADVISORY.to_string()]);
    assert!(
        fixture.driver.calls().executed[0]
            .0
            .contains("ORDER BY (SELECT NULL) OFFSET 0 ROWS FETCH NEXT 5 ROWS ONLY")
    );
}

#[tokio::test]
async fn test_empty_in_list_matches_nothing() {
    let fixture = Fixture::new();
    ReadToolHandler::new(fixture.executor())
        .read_rows(ReadRowsInput {
            filters: Some(map(json!({"Status": {"operator": "in", "value": []}}))),
            ..input("Users")
        })
        .await
        .unwrap();

    let calls = fixture.driver.calls();
    assert_eq!(calls.executed[0].0, "SELECT * FROM [Users] WHERE 1 = 0");
    assert!(calls.executed[0].1.is_empty());
}

#[tokio::test]
async fn test_bad_requests_are_rejected_before_connecting() {
    let fixture = Fixture::new();
    let handler = ReadToolHandler::new(fixture.executor());

    let err = handler
        .read_rows(input("Users]; DROP TABLE Users; --"))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::InvalidIdentifier { kind: "table", .. }));

    let err = handler
        .read_rows(ReadRowsInput {
            filters: Some(map(json!({"Age": {"operator": "BETWEEN", "value": [1, 2]}}))),
            ..input("Users")
        })
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::UnsupportedOperator { .. }));

    let err = handler
        .read_rows(ReadRowsInput {
            filters: Some(map(json!({"Age": 30}))),
            ..input("Users")
        })
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::MalformedFilter { .. }));

    let err = handler
        .read_rows(ReadRowsInput {
            order_by: Some(map(json!({"Name": "sideways"}))),
            ..input("Users")
        })
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::InvalidDirection { .. }));

    let err = handler
        .read_rows(ReadRowsInput {
            filters: Some(map(json!({"Status": {"operator": "IN", "value": "Active"}}))),
            ..input("Users")
        })
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::TypeMismatch { .. }));

    assert_eq!(fixture.driver.calls().connects(), 0);
}

#[tokio::test]
async fn test_unknown_profile_is_reported() {
    let fixture = Fixture::new();
    let err = ReadToolHandler::new(fixture.executor())
        .read_rows(ReadRowsInput {
            profile_name: "nope".to_string(),
            ..input("Users")
        })
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::ProfileNotFound { .. }));
}
