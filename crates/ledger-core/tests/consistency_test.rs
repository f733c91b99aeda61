//! Integration tests for spend tracking: every transaction add, update and
//! delete keeps the category aggregates in step.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::json;
use sqlx::PgPool;

use ledger_core::{EntityKind, LedgerRepository, Record};
use ledger_db::models::{CategoryBudget, TransactionDetail, ValidationError};
use ledger_test_utils::{create_test_db, drop_test_db};

async fn add_budget(
    repo: &LedgerRepository,
    category: &str,
    budget: Decimal,
    spent: Decimal,
) -> CategoryBudget {
    let record = repo
        .add(
            EntityKind::CategoryBudget,
            json!({ "category": category, "budget_inr": budget, "total_spent_inr": spent }),
        )
        .await
        .expect("add budget");
    record
        .as_category_budget()
        .cloned()
        .expect("category budget record")
}

async fn add_txn(
    repo: &LedgerRepository,
    category: &str,
    amount: Decimal,
    ty: &str,
) -> TransactionDetail {
    let record = repo
        .add(
            EntityKind::Transaction,
            json!({
                "transaction_date": "2025-06-20",
                "category": category,
                "description": "test",
                "amount_inr": amount,
                "type": ty,
                "location": "hyd"
            }),
        )
        .await
        .expect("add transaction");
    record.as_transaction().cloned().expect("transaction record")
}

async fn budget(repo: &LedgerRepository, id: i64) -> CategoryBudget {
    repo.get_category_budget(id)
        .await
        .expect("get budget")
        .expect("budget exists")
}

fn assert_invariant(b: &CategoryBudget) {
    assert_eq!(
        b.remaining_budget_inr,
        b.budget_inr - b.total_spent_inr,
        "remaining must equal budget - spent for {b:?}"
    );
}

async fn setup() -> (PgPool, String, LedgerRepository) {
    let (pool, db_name) = create_test_db().await;
    let repo = LedgerRepository::new(pool.clone());
    (pool, db_name, repo)
}

#[tokio::test]
async fn expense_insert_adds_to_spend() {
    let (pool, db_name, repo) = setup().await;

    let food = add_budget(&repo, "food", dec!(1000), dec!(0)).await;
    add_txn(&repo, "food", dec!(50), "expense").await;

    let food = budget(&repo, food.id).await;
    assert_eq!(food.total_spent_inr, dec!(50));
    assert_eq!(food.remaining_budget_inr, dec!(950));

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn income_never_touches_spend() {
    let (pool, db_name, repo) = setup().await;

    let salary = add_budget(&repo, "salary", dec!(0), dec!(0)).await;
    let t = add_txn(&repo, "salary", dec!(5000), "Income").await;
    assert_eq!(budget(&repo, salary.id).await.total_spent_inr, dec!(0));

    repo.update(EntityKind::Transaction, t.id, json!({ "amount_inr": 6000 }))
        .await
        .unwrap();
    assert_eq!(budget(&repo, salary.id).await.total_spent_inr, dec!(0));

    assert!(repo.delete(EntityKind::Transaction, t.id).await.unwrap());
    assert_eq!(budget(&repo, salary.id).await.total_spent_inr, dec!(0));

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn amount_update_applies_net_delta() {
    let (pool, db_name, repo) = setup().await;

    let food = add_budget(&repo, "food", dec!(1000), dec!(0)).await;
    let t = add_txn(&repo, "food", dec!(100), "expense").await;

    repo.update(EntityKind::Transaction, t.id, json!({ "amount_inr": 130 }))
        .await
        .unwrap()
        .expect("transaction exists");

    let food = budget(&repo, food.id).await;
    assert_eq!(food.total_spent_inr, dec!(130));
    assert_invariant(&food);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn type_flip_moves_contribution_in_and_out() {
    let (pool, db_name, repo) = setup().await;

    let food = add_budget(&repo, "food", dec!(1000), dec!(0)).await;
    let t = add_txn(&repo, "food", dec!(100), "expense").await;

    repo.update(EntityKind::Transaction, t.id, json!({ "type": "income" }))
        .await
        .unwrap();
    assert_eq!(budget(&repo, food.id).await.total_spent_inr, dec!(0));

    repo.update(EntityKind::Transaction, t.id, json!({ "type": "expense" }))
        .await
        .unwrap();
    assert_eq!(budget(&repo, food.id).await.total_spent_inr, dec!(100));

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn category_change_moves_spend_between_budgets() {
    let (pool, db_name, repo) = setup().await;

    // A starts at 100; the expense brings it to 200.
    let a = add_budget(&repo, "A", dec!(1000), dec!(100)).await;
    let b = add_budget(&repo, "B", dec!(500), dec!(0)).await;
    let t = add_txn(&repo, "A", dec!(100), "expense").await;
    assert_eq!(budget(&repo, a.id).await.total_spent_inr, dec!(200));

    let updated = repo
        .update(EntityKind::Transaction, t.id, json!({ "category": "B" }))
        .await
        .unwrap()
        .expect("transaction exists");
    assert_eq!(updated.as_transaction().unwrap().category, "B");

    let a = budget(&repo, a.id).await;
    let b = budget(&repo, b.id).await;
    assert_eq!(a.total_spent_inr, dec!(100));
    assert_eq!(a.remaining_budget_inr, dec!(900));
    assert_eq!(b.total_spent_inr, dec!(100));
    assert_eq!(b.remaining_budget_inr, dec!(400));

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn delete_reverses_expense() {
    let (pool, db_name, repo) = setup().await;

    let food = add_budget(&repo, "food", dec!(1000), dec!(0)).await;
    let t = add_txn(&repo, "food", dec!(50), "expense").await;
    assert_eq!(budget(&repo, food.id).await.total_spent_inr, dec!(50));

    assert!(repo.delete(EntityKind::Transaction, t.id).await.unwrap());
    let food = budget(&repo, food.id).await;
    assert_eq!(food.total_spent_inr, dec!(0));
    assert_eq!(food.remaining_budget_inr, dec!(1000));

    // A second delete finds nothing and changes nothing.
    assert!(!repo.delete(EntityKind::Transaction, t.id).await.unwrap());
    assert_eq!(budget(&repo, food.id).await.total_spent_inr, dec!(0));

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn unknown_category_is_tolerated() {
    let (pool, db_name, repo) = setup().await;

    let food = add_budget(&repo, "food", dec!(1000), dec!(0)).await;
    let t = add_txn(&repo, "travel", dec!(75), "expense").await;

    let stored = repo.get_by_id(EntityKind::Transaction, t.id).await.unwrap();
    assert_eq!(stored, Some(Record::Transaction(t)));

    let budgets = repo.get_all(EntityKind::CategoryBudget).await.unwrap();
    assert_eq!(budgets.len(), 1, "no budget row is created");
    assert_eq!(budget(&repo, food.id).await.total_spent_inr, dec!(0));

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn empty_patch_is_a_no_op() {
    let (pool, db_name, repo) = setup().await;

    let food = add_budget(&repo, "food", dec!(1000), dec!(0)).await;
    let t = add_txn(&repo, "food", dec!(50), "expense").await;

    let unchanged = repo
        .update(EntityKind::Transaction, t.id, json!({}))
        .await
        .unwrap();
    assert_eq!(unchanged, Some(Record::Transaction(t)));

    let unchanged = repo
        .update(EntityKind::CategoryBudget, food.id, json!({}))
        .await
        .unwrap();
    assert_eq!(
        unchanged
            .and_then(|r| r.as_category_budget().cloned())
            .map(|b| b.total_spent_inr),
        Some(dec!(50))
    );

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn budget_patch_recomputes_remaining() {
    let (pool, db_name, repo) = setup().await;

    let food = add_budget(&repo, "food", dec!(1000), dec!(200)).await;

    let updated = repo
        .update(EntityKind::CategoryBudget, food.id, json!({ "budget_inr": 1500 }))
        .await
        .unwrap()
        .expect("budget exists");
    let updated = updated.as_category_budget().unwrap();
    assert_eq!(updated.remaining_budget_inr, dec!(1300));

    // Renaming alone leaves the aggregates as they were.
    let renamed = repo
        .update(EntityKind::CategoryBudget, food.id, json!({ "category": "groceries" }))
        .await
        .unwrap()
        .expect("budget exists");
    let renamed = renamed.as_category_budget().unwrap();
    assert_eq!(renamed.category, "groceries");
    assert_eq!(renamed.remaining_budget_inr, dec!(1300));

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn invariant_holds_across_mixed_sequence() {
    let (pool, db_name, repo) = setup().await;

    let food = add_budget(&repo, "food", dec!(1000), dec!(0)).await;
    let rent = add_budget(&repo, "rent", dec!(20000), dec!(0)).await;

    let t1 = add_txn(&repo, "food", dec!(120.50), "expense").await;
    let t2 = add_txn(&repo, "rent", dec!(15000), "expense").await;
    let t3 = add_txn(&repo, "food", dec!(40), "expense").await;

    repo.update(EntityKind::Transaction, t1.id, json!({ "amount_inr": "99.25" }))
        .await
        .unwrap();
    repo.update(
        EntityKind::Transaction,
        t3.id,
        json!({ "category": "rent", "amount_inr": 60 }),
    )
    .await
    .unwrap();
    repo.delete(EntityKind::Transaction, t2.id).await.unwrap();

    let food = budget(&repo, food.id).await;
    let rent = budget(&repo, rent.id).await;
    assert_invariant(&food);
    assert_invariant(&rent);
    assert_eq!(food.total_spent_inr, dec!(99.25));
    assert_eq!(rent.total_spent_inr, dec!(60));

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn failed_update_rolls_back() {
    let (pool, db_name, repo) = setup().await;

    let food = add_budget(&repo, "food", dec!(1000), dec!(0)).await;
    let t = add_txn(&repo, "food", dec!(50), "expense").await;

    let res = repo
        .update(EntityKind::Transaction, t.id, json!({ "amount_inr": -5 }))
        .await;
    assert!(res.is_err());

    let stored = repo.get_transaction(t.id).await.unwrap().unwrap();
    assert_eq!(stored.amount_inr, dec!(50));
    assert_eq!(budget(&repo, food.id).await.total_spent_inr, dec!(50));

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn sub_paise_amounts_are_rejected_before_writing() {
    let (pool, db_name, repo) = setup().await;

    let err = repo
        .add(
            EntityKind::CategoryBudget,
            json!({ "category": "food", "budget_inr": "1.005", "total_spent_inr": "0.004" }),
        )
        .await
        .unwrap_err();
    assert!(
        matches!(
            err.downcast_ref::<ValidationError>(),
            Some(ValidationError::Precision { .. })
        ),
        "got: {err:#}"
    );
    assert!(repo.list_category_budgets().await.unwrap().is_empty());

    let food = add_budget(&repo, "food", dec!(1000), dec!(0)).await;
    let err = repo
        .add(
            EntityKind::Transaction,
            json!({
                "transaction_date": "2025-06-20",
                "category": "food",
                "amount_inr": "10.125",
                "type": "expense"
            }),
        )
        .await
        .unwrap_err();
    assert!(err.downcast_ref::<ValidationError>().is_some(), "got: {err:#}");
    assert!(repo.list_transactions().await.unwrap().is_empty());

    let res = repo
        .update(EntityKind::CategoryBudget, food.id, json!({ "budget_inr": "999.999" }))
        .await;
    assert!(res.is_err());

    let food = budget(&repo, food.id).await;
    assert_eq!(food.budget_inr, dec!(1000));
    assert_eq!(food.total_spent_inr, dec!(0));
    assert_invariant(&food);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_expenses_on_one_category_all_count() {
    let (pool, db_name, repo) = setup().await;

    let food = add_budget(&repo, "food", dec!(1000), dec!(0)).await;

    let handles: Vec<_> = (0..20)
        .map(|_| {
            let repo = repo.clone();
            tokio::spawn(async move { add_txn(&repo, "food", dec!(12.25), "expense").await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap();
    }

    let food = budget(&repo, food.id).await;
    assert_eq!(food.total_spent_inr, dec!(245));
    assert_eq!(food.remaining_budget_inr, dec!(755));
    assert_invariant(&food);
    assert_eq!(repo.list_transactions().await.unwrap().len(), 20);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn opposite_category_moves_do_not_deadlock() {
    let (pool, db_name, repo) = setup().await;

    let a = add_budget(&repo, "A", dec!(1000), dec!(0)).await;
    let b = add_budget(&repo, "B", dec!(1000), dec!(0)).await;
    let t1 = add_txn(&repo, "A", dec!(10), "expense").await.id;
    let t2 = add_txn(&repo, "B", dec!(20), "expense").await.id;

    // t1 and t2 swap categories every round, always in opposite directions.
    for round in 0..25 {
        let (t1_to, t2_to) = if round % 2 == 0 { ("B", "A") } else { ("A", "B") };

        let r1 = repo.clone();
        let h1 = tokio::spawn(async move {
            r1.update(EntityKind::Transaction, t1, json!({ "category": t1_to }))
                .await
        });
        let r2 = repo.clone();
        let h2 = tokio::spawn(async move {
            r2.update(EntityKind::Transaction, t2, json!({ "category": t2_to }))
                .await
        });

        let (res1, res2) = (h1.await.unwrap(), h2.await.unwrap());
        assert!(res1.is_ok(), "round {round}: {:#}", res1.unwrap_err());
        assert!(res2.is_ok(), "round {round}: {:#}", res2.unwrap_err());
    }

    // After an odd number of swaps t1 sits in B and t2 in A.
    let a = budget(&repo, a.id).await;
    let b = budget(&repo, b.id).await;
    assert_eq!(a.total_spent_inr, dec!(20));
    assert_eq!(b.total_spent_inr, dec!(10));
    assert_invariant(&a);
    assert_invariant(&b);

    pool.close().await;
    drop_test_db(&db_name).await;
}
