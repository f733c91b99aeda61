pub mod category_budgets;
pub mod transactions;
