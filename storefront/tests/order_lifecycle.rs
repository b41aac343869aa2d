//! End-to-end behaviour of a storefront run against in-memory stores.

use rstest::{fixture, rstest};
use storefront::app::{CommandOutcome, StorefrontCommand, StorefrontError};
use storefront::domain::{ErrorCode, OrderId, SchemaStatus};
use storefront::test_support::{InMemoryOrderRepository, InMemorySchemaRepository, Tables};

mod support;

use support::{in_memory_storefront, items, placed_at};

#[fixture]
fn schema() -> InMemorySchemaRepository {
    InMemorySchemaRepository::new("storefront")
}

#[fixture]
fn orders() -> InMemoryOrderRepository {
    InMemoryOrderRepository::new()
}

fn order_error(result: Result<CommandOutcome, StorefrontError>) -> ErrorCode {
    match result {
        Err(StorefrontError::Order(err)) => err.code(),
        other => panic!("expected order failure, got {other:?}"),
    }
}

#[rstest]
#[case(&["shoes", "shirt", "socks"])]
#[case(&["lamp"])]
#[case(&["socks", "socks"])]
#[case(&[""])]
#[tokio::test]
async fn created_order_details_match_submitted_items(
    schema: InMemorySchemaRepository,
    orders: InMemoryOrderRepository,
    #[case] submitted: &[&str],
) {
    let app = in_memory_storefront(&schema, &orders);

    let outcome = app
        .run(&StorefrontCommand::CreateOrder(items(submitted)))
        .await
        .expect("create succeeds");

    let CommandOutcome::Created { order, .. } = outcome else {
        panic!("expected created outcome, got {outcome:?}");
    };
    assert!(order.order_id.get() > 0);
    assert_eq!(orders.snapshot().details_for(order.order_id), submitted);
}

#[rstest]
#[tokio::test]
async fn schema_guard_flips_after_first_run(
    schema: InMemorySchemaRepository,
    orders: InMemoryOrderRepository,
) {
    let app = in_memory_storefront(&schema, &orders);

    let first = app
        .run(&StorefrontCommand::Provision)
        .await
        .expect("provision succeeds");
    let second = app
        .run(&StorefrontCommand::Provision)
        .await
        .expect("provision succeeds");

    assert_eq!(first.schema_status(), SchemaStatus::Provisioned);
    assert_eq!(second.schema_status(), SchemaStatus::AlreadyPresent);
    assert_eq!(schema.create_schema_calls(), 1);
    assert_eq!(schema.tables(), ["order", "order_details"]);
}

#[rstest]
#[tokio::test]
async fn deleting_twice_reports_not_found_and_changes_nothing(
    schema: InMemorySchemaRepository,
    orders: InMemoryOrderRepository,
) {
    let app = in_memory_storefront(&schema, &orders);
    let keep = orders.seed_order(placed_at(), &["lamp"]);
    let target = orders.seed_order(placed_at(), &["shoes", "shirt"]);

    app.run(&StorefrontCommand::DeleteOrder(target))
        .await
        .expect("first delete succeeds");
    let after_first = orders.snapshot();
    let code = order_error(app.run(&StorefrontCommand::DeleteOrder(target)).await);

    assert_eq!(code, ErrorCode::NotFound);
    assert_eq!(orders.snapshot(), after_first);
    assert_eq!(after_first.orders.len(), 1);
    assert_eq!(after_first.details_for(keep), ["lamp"]);
}

#[rstest]
#[tokio::test]
async fn deleting_order_six_on_empty_store_rolls_back(
    schema: InMemorySchemaRepository,
    orders: InMemoryOrderRepository,
) {
    let app = in_memory_storefront(&schema, &orders);
    let missing = OrderId::new(6).expect("id");

    let code = order_error(app.run(&StorefrontCommand::DeleteOrder(missing)).await);

    assert_eq!(code, ErrorCode::NotFound);
    assert_eq!(orders.snapshot(), Tables::default());
    let (begun, committed, rolled_back) = orders.transaction_counts();
    assert_eq!((begun, committed, rolled_back), (1, 0, 1));
}

#[rstest]
#[tokio::test]
async fn ambiguous_description_rolls_back_the_whole_batch(schema: InMemorySchemaRepository) {
    let orders = InMemoryOrderRepository::new();
    orders.seed_order(placed_at(), &["hat"]);
    orders.seed_order(placed_at(), &["shoes"]);
    orders.seed_order(placed_at(), &["shoes", "belt"]);
    let before = orders.snapshot();
    let app = in_memory_storefront(&schema, &orders);

    let code = order_error(
        app.run(&StorefrontCommand::RemoveOrders(items(&["hat", "shoes"])))
            .await,
    );

    assert_eq!(code, ErrorCode::Conflict);
    assert_eq!(orders.snapshot(), before);
}

#[rstest]
#[tokio::test]
async fn delete_by_id_clears_details_without_cascade(schema: InMemorySchemaRepository) {
    let orders = InMemoryOrderRepository::new().without_cascade();
    let target = orders.seed_order(placed_at(), &["shoes", "shirt", "socks"]);
    let app = in_memory_storefront(&schema, &orders);

    let outcome = app
        .run(&StorefrontCommand::DeleteOrder(target))
        .await
        .expect("delete succeeds");

    let CommandOutcome::Deleted { summary, .. } = outcome else {
        panic!("expected deleted outcome, got {outcome:?}");
    };
    assert_eq!(summary.details_removed, 3);
    assert_eq!(orders.snapshot(), Tables::default());
}

#[rstest]
#[tokio::test]
async fn created_order_can_be_removed_by_description(
    schema: InMemorySchemaRepository,
    orders: InMemoryOrderRepository,
) {
    let app = in_memory_storefront(&schema, &orders);
    let outcome = app
        .run(&StorefrontCommand::CreateOrder(items(&["shoes", "shirt", "socks"])))
        .await
        .expect("create succeeds");
    let CommandOutcome::Created { order, .. } = outcome else {
        panic!("expected created outcome, got {outcome:?}");
    };

    let outcome = app
        .run(&StorefrontCommand::RemoveOrders(items(&["shirt"])))
        .await
        .expect("removal succeeds");

    let CommandOutcome::Removed { report, .. } = outcome else {
        panic!("expected removed outcome, got {outcome:?}");
    };
    assert_eq!(report.removed_order_ids(), vec![order.order_id]);
    assert_eq!(orders.snapshot(), Tables::default());
}
