//! CLI handlers for `ledger category` and `ledger transaction` subcommands.
//!
//! Arguments are assembled into the same JSON payloads the HTTP and tool
//! surfaces accept, so every path shares the service's validation.

use anyhow::Result;
use serde_json::{Map, Value, json};

use ledger_core::{EntityKind, LedgerService, Record};
use ledger_db::models::{CategoryBudget, TransactionDetail};

use crate::{CategoryCommands, TransactionCommands};

// -----------------------------------------------------------------------
// ledger category
// -----------------------------------------------------------------------

pub async fn run_category_command(
    command: CategoryCommands,
    service: &LedgerService,
) -> Result<()> {
    let kind = EntityKind::CategoryBudget;
    match command {
        CategoryCommands::Add {
            category,
            budget,
            spent,
        } => {
            let payload = json!({
                "category": category,
                "budget_inr": budget.to_string(),
                "total_spent_inr": spent.to_string(),
            });
            let record = service.handle_add(kind, Some(payload)).await?;
            println!("Category budget created:");
            print_record(&record);
        }
        CategoryCommands::Show { id: Some(id) } => {
            let record = service.handle_get_one(kind, id).await?;
            print_record(&record);
        }
        CategoryCommands::Show { id: None } => {
            let records = service.handle_get_all(kind).await?;
            let budgets: Vec<&CategoryBudget> =
                records.iter().filter_map(Record::as_category_budget).collect();
            print_budget_table(&budgets);
        }
        CategoryCommands::Update {
            id,
            category,
            budget,
            spent,
        } => {
            let mut patch = Map::new();
            if let Some(category) = category {
                patch.insert("category".into(), category.into());
            }
            if let Some(budget) = budget {
                patch.insert("budget_inr".into(), budget.to_string().into());
            }
            if let Some(spent) = spent {
                patch.insert("total_spent_inr".into(), spent.to_string().into());
            }
            let record = service.handle_update(kind, id, Value::Object(patch)).await?;
            println!("Category budget updated:");
            print_record(&record);
        }
        CategoryCommands::Delete { id } => {
            let outcome = service.handle_delete(kind, id).await?;
            println!("{} (id {})", outcome.message, outcome.id);
        }
    }
    Ok(())
}

// -----------------------------------------------------------------------
// ledger transaction
// -----------------------------------------------------------------------

pub async fn run_transaction_command(
    command: TransactionCommands,
    service: &LedgerService,
) -> Result<()> {
    let kind = EntityKind::Transaction;
    match command {
        TransactionCommands::Add {
            category,
            amount,
            date,
            transaction_type,
            description,
            location,
        } => {
            let payload = json!({
                "transaction_date": date,
                "category": category,
                "description": description,
                "amount_inr": amount.to_string(),
                "type": transaction_type,
                "location": location,
            });
            let record = service.handle_add(kind, Some(payload)).await?;
            println!("Transaction recorded:");
            print_record(&record);
        }
        TransactionCommands::Show { id: Some(id) } => {
            let record = service.handle_get_one(kind, id).await?;
            print_record(&record);
        }
        TransactionCommands::Show { id: None } => {
            let records = service.handle_get_all(kind).await?;
            let transactions: Vec<&TransactionDetail> =
                records.iter().filter_map(Record::as_transaction).collect();
            print_transaction_table(&transactions);
        }
        TransactionCommands::Update {
            id,
            category,
            amount,
            date,
            transaction_type,
            description,
            location,
            clear_description,
            clear_location,
        } => {
            let mut patch = Map::new();
            if let Some(category) = category {
                patch.insert("category".into(), category.into());
            }
            if let Some(amount) = amount {
                patch.insert("amount_inr".into(), amount.to_string().into());
            }
            if let Some(date) = date {
                patch.insert("transaction_date".into(), date.to_string().into());
            }
            if let Some(ty) = transaction_type {
                patch.insert("type".into(), ty.to_string().into());
            }
            if clear_description {
                patch.insert("description".into(), Value::Null);
            } else if let Some(description) = description {
                patch.insert("description".into(), description.into());
            }
            if clear_location {
                patch.insert("location".into(), Value::Null);
            } else if let Some(location) = location {
                patch.insert("location".into(), location.into());
            }
            let record = service.handle_update(kind, id, Value::Object(patch)).await?;
            println!("Transaction updated:");
            print_record(&record);
        }
        TransactionCommands::Delete { id } => {
            let outcome = service.handle_delete(kind, id).await?;
            println!("{} (id {})", outcome.message, outcome.id);
        }
    }
    Ok(())
}

// -----------------------------------------------------------------------
// Output
// -----------------------------------------------------------------------

fn print_record(record: &Record) {
    match record {
        Record::CategoryBudget(b) => {
            println!("  ID:        {}", b.id);
            println!("  Category:  {}", b.category);
            println!("  Budget:    {}", b.budget_inr);
            println!("  Spent:     {}", b.total_spent_inr);
            println!("  Remaining: {}", b.remaining_budget_inr);
        }
        Record::Transaction(t) => {
            println!("  ID:          {}", t.id);
            println!("  Date:        {}", t.transaction_date);
            println!("  Category:    {}", t.category);
            println!("  Type:        {}", t.transaction_type);
            println!("  Amount:      {}", t.amount_inr);
            if let Some(desc) = &t.description {
                println!("  Description: {desc}");
            }
            if let Some(loc) = &t.location {
                println!("  Location:    {loc}");
            }
        }
    }
}

fn print_budget_table(budgets: &[&CategoryBudget]) {
    if budgets.is_empty() {
        println!("No category budgets found. Use `ledger category add` to create one.");
        return;
    }

    let cat_w = budgets
        .iter()
        .map(|b| b.category.len())
        .max()
        .unwrap_or(8)
        .max(8);

    println!(
        "{:>6}  {:<cat_w$}  {:>12}  {:>12}  {:>12}",
        "ID", "CATEGORY", "BUDGET", "SPENT", "REMAINING",
    );
    for b in budgets {
        println!(
            "{:>6}  {:<cat_w$}  {:>12}  {:>12}  {:>12}",
            b.id, b.category, b.budget_inr, b.total_spent_inr, b.remaining_budget_inr,
        );
    }
}

fn print_transaction_table(transactions: &[&TransactionDetail]) {
    if transactions.is_empty() {
        println!("No transactions found. Use `ledger transaction add` to record one.");
        return;
    }

    let cat_w = transactions
        .iter()
        .map(|t| t.category.len())
        .max()
        .unwrap_or(8)
        .max(8);

    println!(
        "{:>6}  {:<10}  {:<cat_w$}  {:<7}  {:>12}  DESCRIPTION",
        "ID", "DATE", "CATEGORY", "TYPE", "AMOUNT",
    );
    for t in transactions {
        println!(
            "{:>6}  {:<10}  {:<cat_w$}  {:<7}  {:>12}  {}",
            t.id,
            t.transaction_date.to_string(),
            t.category,
            t.transaction_type.to_string(),
            t.amount_inr,
            t.description.as_deref().unwrap_or("-"),
        );
    }
}
