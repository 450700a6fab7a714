//! Combines the statistics, bar chart and pie chart into one response.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{Query, State},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{Error, db::lock_connection, transaction::TransactionFilter};

use super::{
    ReportQuery, ReportState,
    bar_chart::{PriceRangeCount, get_bar_chart},
    pie_chart::{CategoryCount, get_pie_chart},
    statistics::{Statistics, get_statistics},
};

/// All three reports for the same filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedReport {
    /// The sale statistics.
    pub statistics: Statistics,
    /// The price histogram.
    pub bar_chart: Vec<PriceRangeCount>,
    /// The category breakdown.
    pub pie_chart: Vec<CategoryCount>,
}

/// Get the statistics, bar chart and pie chart for the month in the query.
///
/// If any of the reports fail, the whole request fails.
pub async fn get_combined_endpoint(
    State(state): State<ReportState>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<CombinedReport>, Error> {
    let filter = state.filter(&query)?;

    get_combined_report(state.db_connection, filter)
        .await
        .inspect_err(|error| tracing::error!("could not get combined report: {error}"))
        .map(Json)
}

/// Run the three reports for `filter` as parallel blocking tasks.
///
/// Returns the first error from any of the reports.
pub async fn get_combined_report(
    db_connection: Arc<Mutex<Connection>>,
    filter: TransactionFilter,
) -> Result<CombinedReport, Error> {
    let filter = Arc::new(filter);

    let (statistics, bar_chart, pie_chart) = tokio::try_join!(
        spawn_report(db_connection.clone(), filter.clone(), get_statistics),
        spawn_report(db_connection.clone(), filter.clone(), get_bar_chart),
        spawn_report(db_connection, filter, get_pie_chart),
    )?;

    Ok(CombinedReport {
        statistics,
        bar_chart,
        pie_chart,
    })
}

async fn spawn_report<T>(
    db_connection: Arc<Mutex<Connection>>,
    filter: Arc<TransactionFilter>,
    report: fn(&TransactionFilter, &Connection) -> Result<T, Error>,
) -> Result<T, Error>
where
    T: Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let connection = lock_connection(&db_connection)?;
        report(&filter, &connection)
    })
    .await
    .map_err(|error| {
        tracing::error!("report task failed: {error}");
        Error::TaskFailed(error.to_string())
    })?
}

#[cfg(test)]
mod tests {
    use axum::{Router, http::StatusCode, routing::get};
    use axum_test::TestServer;
    use time::Month;

    use crate::{
        Error,
        report::{
            PRICE_RANGES, ReportState,
            test_utils::{get_report_state, scenario_transactions},
        },
        transaction::{MonthRange, TransactionFilter},
    };

    use super::{CombinedReport, get_combined_endpoint, get_combined_report};

    fn get_test_server(state: ReportState) -> TestServer {
        let app = Router::new()
            .route("/combined", get(get_combined_endpoint))
            .with_state(state);

        TestServer::new(app)
    }

    #[tokio::test]
    async fn combines_all_three_reports() {
        let state = get_report_state(&scenario_transactions());
        let filter =
            TransactionFilter::for_month(MonthRange::new(Month::March, 2022, "Etc/UTC").unwrap());

        let got = get_combined_report(state.db_connection, filter)
            .await
            .unwrap();

        assert_eq!(got.statistics.total_sale_amount, 200.0);
        assert_eq!(got.bar_chart.len(), PRICE_RANGES.len());
        assert_eq!(got.pie_chart.len(), 2);
    }

    #[tokio::test]
    async fn fails_when_a_report_fails() {
        let state = get_report_state(&[]);
        state
            .db_connection
            .lock()
            .unwrap()
            .execute("DROP TABLE \"transaction\"", ())
            .unwrap();

        let result = get_combined_report(state.db_connection, TransactionFilter::default()).await;

        assert!(matches!(result, Err(Error::SqlError(_))), "got {result:?}");
    }

    #[tokio::test]
    async fn fails_when_lock_is_poisoned() {
        let state = get_report_state(&[]);
        let db_connection = state.db_connection.clone();
        let _ = std::thread::spawn(move || {
            let _guard = db_connection.lock().unwrap();
            panic!("poison the lock");
        })
        .join();

        let result = get_combined_report(state.db_connection, TransactionFilter::default()).await;

        assert_eq!(result, Err(Error::DatabaseLockError));
    }

    #[tokio::test]
    async fn endpoint_uses_keys_for_dashboard() {
        let server = get_test_server(get_report_state(&scenario_transactions()));

        let response = server
            .get("/combined")
            .add_query_param("month", "April")
            .add_query_param("year", 2022)
            .add_query_param("search", "ignored")
            .add_query_param("page", 3)
            .await;

        response.assert_status_ok();
        let body = response.json::<serde_json::Value>();
        assert_eq!(body["statistics"]["totalSaleAmount"], 999.0);
        assert_eq!(body["statistics"]["totalSoldItems"], 1);
        assert_eq!(body["barChart"][9]["range"], "901-Infinity");
        assert_eq!(body["barChart"][9]["count"], 1);
        assert_eq!(body["pieChart"][0]["_id"], "A");
    }

    #[tokio::test]
    async fn endpoint_returns_500_without_partial_results() {
        let state = get_report_state(&[]);
        state
            .db_connection
            .lock()
            .unwrap()
            .execute("DROP TABLE \"transaction\"", ())
            .unwrap();
        let server = get_test_server(state);

        let response = server.get("/combined").await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        assert!(serde_json::from_str::<CombinedReport>(&response.text()).is_err());
    }
}
