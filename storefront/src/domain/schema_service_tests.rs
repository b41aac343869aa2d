//! Tests for the schema service.

use std::sync::{Arc, Mutex};

use rstest::rstest;

use super::*;
use crate::domain::ErrorCode;
use crate::domain::ports::MockSchemaRepository;

fn unknown() -> SchemaRepositoryError {
    SchemaRepositoryError::unknown_schema("storefront")
}

#[rstest]
#[tokio::test]
async fn exists_is_true_when_schema_can_be_selected() {
    let mut repo = MockSchemaRepository::new();
    repo.expect_select_schema().times(1).return_once(|| Ok(()));

    let service = SchemaService::new(Arc::new(repo));

    assert!(service.exists().await.expect("selection succeeds"));
}

#[rstest]
#[tokio::test]
async fn exists_is_false_for_unknown_schema() {
    let mut repo = MockSchemaRepository::new();
    repo.expect_select_schema()
        .times(1)
        .return_once(|| Err(unknown()));

    let service = SchemaService::new(Arc::new(repo));

    assert!(!service.exists().await.expect("selection succeeds"));
}

#[rstest]
#[tokio::test]
async fn exists_propagates_unrelated_failures() {
    let mut repo = MockSchemaRepository::new();
    repo.expect_select_schema()
        .times(1)
        .return_once(|| Err(SchemaRepositoryError::query("[1045/28000] access denied")));

    let service = SchemaService::new(Arc::new(repo));
    let error = service.exists().await.expect_err("selection fails");

    assert_eq!(error.code(), ErrorCode::InternalError);
    assert!(error.message().contains("access denied"));
}

#[rstest]
#[tokio::test]
async fn exists_maps_connection_loss_to_service_unavailable() {
    let mut repo = MockSchemaRepository::new();
    repo.expect_select_schema()
        .times(1)
        .return_once(|| Err(SchemaRepositoryError::connection("broken pipe")));

    let service = SchemaService::new(Arc::new(repo));
    let error = service.exists().await.expect_err("selection fails");

    assert_eq!(error.code(), ErrorCode::ServiceUnavailable);
}

#[rstest]
#[tokio::test]
async fn ensure_skips_ddl_when_schema_exists() {
    let mut repo = MockSchemaRepository::new();
    repo.expect_select_schema().times(1).return_once(|| Ok(()));
    repo.expect_create_schema().times(0);
    repo.expect_create_order_table().times(0);
    repo.expect_create_order_details_table().times(0);

    let service = SchemaService::new(Arc::new(repo));

    assert_eq!(
        service.ensure().await.expect("ensure succeeds"),
        SchemaStatus::AlreadyPresent
    );
}

#[rstest]
#[tokio::test]
async fn ensure_provisions_schema_then_tables_in_order() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let mut repo = MockSchemaRepository::new();

    let log = Arc::clone(&calls);
    repo.expect_select_schema().times(2).returning(move || {
        let mut log = log.lock().expect("call log");
        log.push("select");
        if log.iter().filter(|call| **call == "select").count() == 1 {
            Err(unknown())
        } else {
            Ok(())
        }
    });
    let log = Arc::clone(&calls);
    repo.expect_create_schema().times(1).returning(move || {
        log.lock().expect("call log").push("create_schema");
        Ok(())
    });
    let log = Arc::clone(&calls);
    repo.expect_create_order_table().times(1).returning(move || {
        log.lock().expect("call log").push("create_order");
        Ok(())
    });
    let log = Arc::clone(&calls);
    repo.expect_create_order_details_table()
        .times(1)
        .returning(move || {
            log.lock().expect("call log").push("create_order_details");
            Ok(())
        });

    let service = SchemaService::new(Arc::new(repo));

    assert_eq!(
        service.ensure().await.expect("ensure succeeds"),
        SchemaStatus::Provisioned
    );
    assert_eq!(
        *calls.lock().expect("call log"),
        [
            "select",
            "create_schema",
            "select",
            "create_order",
            "create_order_details"
        ]
    );
}

#[rstest]
#[tokio::test]
async fn provision_aborts_when_schema_stays_missing() {
    let mut repo = MockSchemaRepository::new();
    repo.expect_create_schema().times(1).return_once(|| Ok(()));
    repo.expect_select_schema()
        .times(1)
        .return_once(|| Err(unknown()));
    repo.expect_create_order_table().times(0);
    repo.expect_create_order_details_table().times(0);

    let service = SchemaService::new(Arc::new(repo));
    let error = service.provision().await.expect_err("provision aborts");

    assert_eq!(error.code(), ErrorCode::InternalError);
}

#[rstest]
#[tokio::test]
async fn provision_aborts_on_table_failure() {
    let mut repo = MockSchemaRepository::new();
    repo.expect_create_schema().times(1).return_once(|| Ok(()));
    repo.expect_select_schema().times(1).return_once(|| Ok(()));
    repo.expect_create_order_table()
        .times(1)
        .return_once(|| Err(SchemaRepositoryError::query("[1050/42S01] table exists")));
    repo.expect_create_order_details_table().times(0);

    let service = SchemaService::new(Arc::new(repo));
    let error = service.provision().await.expect_err("provision aborts");

    assert!(error.message().contains("table exists"));
}
