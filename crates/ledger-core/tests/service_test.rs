//! Integration tests for the use-case handlers, query dispatch and the
//! ledger tools.

use rust_decimal_macros::dec;
use serde_json::{Value, json};

use ledger_core::{EntityKind, LedgerError, LedgerService, QueryRequest, ToolRegistry};
use ledger_test_utils::{create_test_db, drop_test_db};

fn lunch() -> Value {
    json!({
        "transaction_date": "2025-06-20",
        "category": "food",
        "description": "lunch",
        "amount_inr": 50,
        "type": "expense",
        "location": "hyd"
    })
}

fn query(value: Value) -> QueryRequest {
    serde_json::from_value(value).expect("valid query envelope")
}

#[tokio::test]
async fn add_requires_a_payload() {
    let (pool, db_name) = create_test_db().await;
    let service = LedgerService::new(pool.clone());

    for payload in [None, Some(Value::Null), Some(json!({}))] {
        let err = service
            .handle_add(EntityKind::Transaction, payload)
            .await
            .unwrap_err();
        assert!(err.is_validation(), "got {err:?}");
        assert_eq!(
            err.to_string(),
            "validation error: payload is required for add operation"
        );
    }

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn malformed_payloads_are_validation_errors() {
    let (pool, db_name) = create_test_db().await;
    let service = LedgerService::new(pool.clone());

    let cases = [
        (EntityKind::CategoryBudget, json!({ "budget_inr": 100 })),
        (EntityKind::CategoryBudget, json!({ "category": "food", "budget_inr": "lots" })),
        (EntityKind::Transaction, json!({ "category": "food" })),
        (
            EntityKind::Transaction,
            json!({
                "transaction_date": "2025-06-20",
                "category": "food",
                "amount_inr": 10,
                "type": "transfer"
            }),
        ),
        (
            EntityKind::Transaction,
            json!({
                "transaction_date": "2025-06-20",
                "category": "food",
                "amount_inr": -10,
                "type": "expense"
            }),
        ),
    ];
    for (kind, payload) in cases {
        let err = service
            .handle_add(kind, Some(payload.clone()))
            .await
            .unwrap_err();
        assert!(err.is_validation(), "{payload} should fail validation, got {err:?}");
    }

    assert!(service.handle_get_all(EntityKind::Transaction).await.unwrap().is_empty());

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn missing_ids_are_not_found() {
    let (pool, db_name) = create_test_db().await;
    let service = LedgerService::new(pool.clone());

    for kind in EntityKind::ALL {
        let err = service.handle_get_one(kind, 999).await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), format!("{kind} item not found"));

        let err = service
            .handle_update(kind, 999, json!({ "category": "x" }))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(
            err.to_string(),
            format!("{kind} item not found or no changes made")
        );

        let err = service.handle_delete(kind, 999).await.unwrap_err();
        assert!(err.is_not_found());
    }

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn delete_returns_confirmation() {
    let (pool, db_name) = create_test_db().await;
    let service = LedgerService::new(pool.clone());

    let record = service
        .handle_add(EntityKind::Transaction, Some(lunch()))
        .await
        .unwrap();
    let outcome = service
        .handle_delete(EntityKind::Transaction, record.id())
        .await
        .unwrap();
    assert_eq!(outcome.id, record.id());
    assert_eq!(outcome.message, "transaction_details item deleted successfully");

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn dispatch_runs_full_lifecycle() {
    let (pool, db_name) = create_test_db().await;
    let service = LedgerService::new(pool.clone());

    let created = service
        .dispatch(query(json!({ "query_type": "create_tables" })))
        .await
        .unwrap();
    assert_eq!(created["message"], "Tables created successfully");

    let budget = service
        .dispatch(query(json!({
            "table": "category_budget_overview",
            "query_type": "add",
            "payload": { "category": "food", "budget_inr": 1000 }
        })))
        .await
        .unwrap();
    assert_eq!(budget["remaining_budget_inr"], json!(1000.0));

    let txn = service
        .dispatch(query(json!({
            "table": "transaction_details",
            "query_type": "add",
            "payload": lunch()
        })))
        .await
        .unwrap();
    let txn_id = txn["id"].as_i64().unwrap();
    assert_eq!(txn["type"], "expense");
    assert_eq!(txn["transaction_date"], "2025-06-20");

    let fetched = service
        .dispatch(query(json!({
            "table": "category_budget_overview",
            "query_type": "get_one",
            "payload": { "id": budget["id"] }
        })))
        .await
        .unwrap();
    assert_eq!(fetched["total_spent_inr"], json!(50.0));
    assert_eq!(fetched["remaining_budget_inr"], json!(950.0));

    let updated = service
        .dispatch(query(json!({
            "table": "transaction_details",
            "query_type": "update",
            "payload": { "id": txn_id, "update_data": { "amount_inr": 80 } }
        })))
        .await
        .unwrap();
    assert_eq!(updated["amount_inr"], json!(80.0));

    let all = service
        .dispatch(query(json!({
            "table": "category_budget_overview",
            "query_type": "get_all"
        })))
        .await
        .unwrap();
    assert_eq!(all[0]["total_spent_inr"], json!(80.0));

    let deleted = service
        .dispatch(query(json!({
            "table": "transaction_details",
            "query_type": "delete",
            "payload": { "id": txn_id }
        })))
        .await
        .unwrap();
    assert_eq!(
        deleted,
        json!({ "message": "transaction_details item deleted successfully", "id": txn_id })
    );

    let budgets = service.handle_get_all(EntityKind::CategoryBudget).await.unwrap();
    let food = budgets[0].as_category_budget().unwrap();
    assert_eq!(food.total_spent_inr, dec!(0));

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn dispatch_rejects_incomplete_envelopes() {
    let (pool, db_name) = create_test_db().await;
    let service = LedgerService::new(pool.clone());

    let cases = [
        json!({ "query_type": "get_all" }),
        json!({ "table": "transaction_details", "query_type": "get_one" }),
        json!({ "table": "transaction_details", "query_type": "delete", "payload": {} }),
        json!({ "table": "transaction_details", "query_type": "update", "payload": { "id": 1 } }),
    ];
    for case in cases {
        let err = service.dispatch(query(case.clone())).await.unwrap_err();
        assert!(
            matches!(err, LedgerError::Validation(_)),
            "{case} should fail validation, got {err:?}"
        );
    }

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn tools_drive_the_same_operations() {
    let (pool, db_name) = create_test_db().await;
    let service = LedgerService::new(pool.clone());
    let registry = ToolRegistry::with_ledger_tools(&service);

    assert_eq!(
        registry.list(),
        vec![
            "add_category_budget",
            "add_transaction",
            "delete_category_budget",
            "delete_transaction",
            "get_all_category_budgets",
            "get_all_transactions",
            "get_category_budget",
            "get_transaction",
            "update_category_budget",
            "update_transaction",
        ]
    );

    let budget = registry
        .call(
            "add_category_budget",
            json!({ "payload": { "category": "food", "budget_inr": 500 } }),
        )
        .await
        .unwrap();
    let budget_id = budget["id"].clone();

    let txn = registry
        .call("add_transaction", json!({ "payload": lunch() }))
        .await
        .unwrap();

    let fetched = registry
        .call("get_category_budget", json!({ "item_id": budget_id }))
        .await
        .unwrap();
    assert_eq!(fetched["remaining_budget_inr"], json!(450.0));

    let updated = registry
        .call(
            "update_transaction",
            json!({ "item_id": txn["id"], "update_data": { "description": null } }),
        )
        .await
        .unwrap();
    assert_eq!(updated["description"], Value::Null);

    let all = registry
        .call("get_all_transactions", json!({}))
        .await
        .unwrap();
    assert_eq!(all.as_array().map(Vec::len), Some(1));

    let deleted = registry
        .call("delete_transaction", json!({ "item_id": txn["id"] }))
        .await
        .unwrap();
    assert_eq!(deleted["message"], "transaction_details item deleted successfully");

    let err = registry
        .call("get_transaction", json!({ "id": 1 }))
        .await
        .unwrap_err();
    assert!(err.is_validation());

    let err = registry
        .call("get_transaction", json!({ "item_id": 12345 }))
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn tool_specs_describe_arguments() {
    let (pool, db_name) = create_test_db().await;
    let service = LedgerService::new(pool.clone());
    let registry = ToolRegistry::with_ledger_tools(&service);

    let specs = registry.specs();
    assert_eq!(specs.len(), 10);

    let update = specs
        .iter()
        .find(|s| s.name == "update_category_budget")
        .unwrap();
    assert_eq!(update.parameters["required"], json!(["item_id", "update_data"]));

    let add = specs.iter().find(|s| s.name == "add_transaction").unwrap();
    assert_eq!(
        add.parameters["properties"]["payload"]["required"],
        json!(["transaction_date", "category", "amount_inr", "type"])
    );

    pool.close().await;
    drop_test_db(&db_name).await;
}
