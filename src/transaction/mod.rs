//! Transaction records and the queries over them.
//!
//! This module contains:
//! - The `Transaction` model and the functions for storing it in SQLite
//! - The filter builder shared by the search and report queries
//! - The paged search route handler

mod core;
mod query;
mod search;
#[cfg(test)]
pub(crate) mod test_utils;

pub use self::core::{
    Transaction, count_transactions, create_transaction_table, delete_all_transactions,
    insert_transaction,
};
pub use query::{MonthRange, TransactionFilter, parse_month};
pub(crate) use self::core::get_count;
pub(crate) use query::WhereClause;
pub use search::{get_transactions_endpoint, search_transactions};
