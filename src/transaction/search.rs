//! Defines the paged search over transactions and its route handler.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Query, State},
};
use rusqlite::{Connection, params_from_iter, types::Value};
use serde::Deserialize;

use crate::{
    AppState, Error,
    db::lock_connection,
    pagination::{Page, PaginationConfig},
};

use super::{
    core::{TRANSACTION_COLUMNS, Transaction, map_transaction_row},
    query::TransactionFilter,
};

/// The query parameters for searching transactions.
///
/// Pagination values are kept as strings so that malformed values fall back
/// to defaults instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct TransactionsQuery {
    /// Text to look for in the title or description, or an exact price.
    pub search: Option<String>,
    /// The 1-indexed page number.
    pub page: Option<String>,
    /// The number of transactions per page.
    #[serde(rename = "perPage")]
    pub per_page: Option<String>,
    /// The English name of the month to filter by, e.g. "March".
    pub month: Option<String>,
    /// The year `month` falls in. Defaults to the current year.
    pub year: Option<String>,
}

/// The state needed for searching transactions.
#[derive(Debug, Clone)]
pub struct SearchState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    /// The default page number and size.
    pub pagination_config: PaginationConfig,
}

impl FromRef<AppState> for SearchState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
            pagination_config: state.pagination_config.clone(),
        }
    }
}

/// Return one page of the transactions matching the search and month filters.
pub async fn get_transactions_endpoint(
    State(state): State<SearchState>,
    Query(query): Query<TransactionsQuery>,
) -> Result<Json<Vec<Transaction>>, Error> {
    let filter = TransactionFilter::from_params(
        query.search.as_deref(),
        query.month.as_deref(),
        query.year.as_deref(),
        &state.local_timezone,
    )?;
    let page = state
        .pagination_config
        .resolve(query.page.as_deref(), query.per_page.as_deref());

    let connection = lock_connection(&state.db_connection)?;
    let transactions = search_transactions(&filter, page, &connection)
        .inspect_err(|error| tracing::error!("could not search transactions: {error}"))?;

    Ok(Json(transactions))
}

/// Get the transactions on `page` of the transactions matching `filter`.
///
/// Transactions are returned in the order they were inserted.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails or a row cannot be mapped.
pub fn search_transactions(
    filter: &TransactionFilter,
    page: Page,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let clause = filter.to_where_clause();
    let query = format!(
        "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\"{} ORDER BY row_id ASC LIMIT ? OFFSET ?",
        clause.sql()
    );

    let params = clause
        .params()
        .iter()
        .cloned()
        .chain([Value::Integer(page.limit()), Value::Integer(page.offset())]);

    connection
        .prepare(&query)?
        .query_map(params_from_iter(params), map_transaction_row)?
        .map(|transaction_result| transaction_result.map_err(Error::from))
        .collect()
}


#[cfg(test)]
mod endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Router, http::StatusCode, routing::get};
    use axum_test::TestServer;
    use time::macros::datetime;

    use crate::{
        pagination::PaginationConfig,
        transaction::{
            Transaction, insert_transaction,
            test_utils::{get_test_connection, sample_transaction},
        },
    };

    use super::{SearchState, get_transactions_endpoint};

    fn get_test_server(transaction_count: i64) -> TestServer {
        let conn = get_test_connection();
        for i in 1..=transaction_count {
            insert_transaction(
                &sample_transaction(i, i as f64, datetime!(2022-03-10 12:00 UTC)),
                &conn,
            )
            .unwrap();
        }

        let state = SearchState {
            db_connection: Arc::new(Mutex::new(conn)),
            local_timezone: "Etc/UTC".to_owned(),
            pagination_config: PaginationConfig::default(),
        };
        let app = Router::new()
            .route("/transactions", get(get_transactions_endpoint))
            .with_state(state);

        TestServer::new(app)
    }

    #[tokio::test]
    async fn defaults_to_first_page_of_ten() {
        let server = get_test_server(15);

        let response = server.get("/transactions").await;

        response.assert_status_ok();
        let got = response.json::<Vec<Transaction>>();
        assert_eq!(got.len(), 10);
        assert_eq!(got[0].id, 1);
    }

    #[tokio::test]
    async fn returns_requested_page() {
        let server = get_test_server(15);

        let response = server
            .get("/transactions")
            .add_query_param("page", 2)
            .add_query_param("perPage", 4)
            .await;

        response.assert_status_ok();
        let got: Vec<i64> = response
            .json::<Vec<Transaction>>()
            .iter()
            .map(|transaction| transaction.id)
            .collect();
        assert_eq!(got, vec![5, 6, 7, 8]);
    }

    #[tokio::test]
    async fn malformed_pagination_falls_back_to_defaults() {
        let server = get_test_server(15);

        let response = server
            .get("/transactions")
            .add_query_param("page", "abc")
            .add_query_param("perPage", "0")
            .await;

        response.assert_status_ok();
        assert_eq!(response.json::<Vec<Transaction>>().len(), 10);
    }

    #[tokio::test]
    async fn serializes_camel_case_fields() {
        let server = get_test_server(1);

        let response = server.get("/transactions").await;

        let body = response.json::<serde_json::Value>();
        assert_eq!(body[0]["dateOfSale"], "2022-03-10T12:00:00Z");
        assert_eq!(body[0]["sold"], false);
    }

    #[tokio::test]
    async fn invalid_month_is_a_server_error() {
        let server = get_test_server(1);

        let response = server
            .get("/transactions")
            .add_query_param("month", "march")
            .await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn no_matches_is_an_empty_array() {
        let server = get_test_server(3);

        let response = server
            .get("/transactions")
            .add_query_param("search", "nothing matches this")
            .await;

        response.assert_status_ok();
        assert_eq!(response.text(), "[]");
    }
}
