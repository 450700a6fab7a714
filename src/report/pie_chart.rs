//! Counts of transactions per category.

use axum::{
    Json,
    extract::{Query, State},
};
use rusqlite::{Connection, params_from_iter};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    db::lock_connection,
    transaction::{TransactionFilter, get_count},
};

use super::{ReportQuery, ReportState};

/// The number of transactions in one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    /// The category label.
    #[serde(rename = "_id")]
    pub category: String,
    /// The number of matching transactions in the category.
    pub count: u64,
}

/// Get the category breakdown for the month in the query.
pub async fn get_pie_chart_endpoint(
    State(state): State<ReportState>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<Vec<CategoryCount>>, Error> {
    let filter = state.filter(&query)?;
    let connection = lock_connection(&state.db_connection)?;

    get_pie_chart(&filter, &connection)
        .inspect_err(|error| tracing::error!("could not get pie chart data: {error}"))
        .map(Json)
}

/// Count the transactions matching `filter` in each category, ordered by category.
///
/// Only categories with at least one matching transaction are included.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub fn get_pie_chart(
    filter: &TransactionFilter,
    connection: &Connection,
) -> Result<Vec<CategoryCount>, Error> {
    let clause = filter.to_where_clause();
    let query = format!(
        "SELECT category, COUNT(*) FROM \"transaction\"{} \
        GROUP BY category ORDER BY category ASC",
        clause.sql()
    );

    connection
        .prepare(&query)?
        .query_map(params_from_iter(clause.params()), |row| {
            Ok(CategoryCount {
                category: row.get(0)?,
                count: get_count(row, 1)?,
            })
        })?
        .map(|count_result| count_result.map_err(Error::from))
        .collect()
}
