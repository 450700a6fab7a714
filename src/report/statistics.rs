//! Total sale amount and sold/unsold counts.

use axum::{
    Json,
    extract::{Query, State},
};
use rusqlite::{Connection, params_from_iter, types::Value};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    db::lock_connection,
    transaction::{TransactionFilter, WhereClause, get_count},
};

use super::{ReportQuery, ReportState};

/// Summary statistics for the transactions matching a filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    /// The sum of the price of every matching transaction, sold or not.
    pub total_sale_amount: f64,
    /// The number of matching transactions that sold.
    pub total_sold_items: u64,
    /// The number of matching transactions that did not sell.
    pub total_not_sold_items: u64,
}

/// Get the sale statistics for the month in the query.
pub async fn get_statistics_endpoint(
    State(state): State<ReportState>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<Statistics>, Error> {
    let filter = state.filter(&query)?;
    let connection = lock_connection(&state.db_connection)?;

    get_statistics(&filter, &connection)
        .inspect_err(|error| tracing::error!("could not get statistics: {error}"))
        .map(Json)
}

/// Calculate the [Statistics] for the transactions matching `filter`.
///
/// The total and the two counts are three independent queries.
///
/// # Errors
/// Returns [Error::SqlError] if any of the queries fail.
pub fn get_statistics(
    filter: &TransactionFilter,
    connection: &Connection,
) -> Result<Statistics, Error> {
    let clause = filter.to_where_clause();

    let total_sale_amount = connection.query_row(
        &format!(
            "SELECT COALESCE(SUM(price), 0.0) FROM \"transaction\"{}",
            clause.sql()
        ),
        params_from_iter(clause.params()),
        |row| row.get(0),
    )?;

    let total_sold_items = count_where(&clause.with("sold = ?", [Value::Integer(1)]), connection)?;
    let total_not_sold_items =
        count_where(&clause.with("sold = ?", [Value::Integer(0)]), connection)?;

    Ok(Statistics {
        total_sale_amount,
        total_sold_items,
        total_not_sold_items,
    })
}

/// Count the transactions matching `clause`.
pub(super) fn count_where(clause: &WhereClause, connection: &Connection) -> Result<u64, Error> {
    connection
        .query_row(
            &format!("SELECT COUNT(*) FROM \"transaction\"{}", clause.sql()),
            params_from_iter(clause.params()),
            |row| get_count(row, 0),
        )
        .map_err(|error| error.into())
}
