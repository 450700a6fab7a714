//! Counts of transactions in fixed price ranges.

use axum::{
    Json,
    extract::{Query, State},
};
use rusqlite::{Connection, types::Value};
use serde::{Deserialize, Serialize};

use crate::{Error, db::lock_connection, transaction::TransactionFilter};

use super::{ReportQuery, ReportState, statistics::count_where};

/// A price range in the histogram.
///
/// Ranges are labelled with whole numbers as `min-max`, e.g. "101-200". The
/// first range includes both ends. Every other range starts just above the
/// previous range's `max`, so fractional prices such as 100.5 are counted in
/// the following range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceRange {
    /// The smallest whole price in the range.
    pub min: u32,
    /// The largest price in the range, or `None` if the range has no upper bound.
    pub max: Option<u32>,
}

impl PriceRange {
    /// The label for the range, e.g. "101-200", or "901-Infinity" for the last range.
    pub fn label(&self) -> String {
        match self.max {
            Some(max) => format!("{}-{max}", self.min),
            None => format!("{}-Infinity", self.min),
        }
    }
}

/// The fixed price ranges of the histogram, in ascending order.
pub const PRICE_RANGES: [PriceRange; 10] = [
    PriceRange { min: 0, max: Some(100) },
    PriceRange { min: 101, max: Some(200) },
    PriceRange { min: 201, max: Some(300) },
    PriceRange { min: 301, max: Some(400) },
    PriceRange { min: 401, max: Some(500) },
    PriceRange { min: 501, max: Some(600) },
    PriceRange { min: 601, max: Some(700) },
    PriceRange { min: 701, max: Some(800) },
    PriceRange { min: 801, max: Some(900) },
    PriceRange { min: 901, max: None },
];

/// The number of transactions in one price range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRangeCount {
    /// The label of the price range, e.g. "101-200".
    pub range: String,
    /// The number of matching transactions priced within the range.
    pub count: u64,
}

/// Get the price histogram for the month in the query.
pub async fn get_bar_chart_endpoint(
    State(state): State<ReportState>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<Vec<PriceRangeCount>>, Error> {
    let filter = state.filter(&query)?;
    let connection = lock_connection(&state.db_connection)?;

    get_bar_chart(&filter, &connection)
        .inspect_err(|error| tracing::error!("could not get bar chart data: {error}"))
        .map(Json)
}

/// Count the transactions matching `filter` in each of [PRICE_RANGES].
///
/// Every range is included in the result, even if its count is zero. Each
/// count is a separate query.
///
/// # Errors
/// Returns [Error::SqlError] if any of the queries fail.
pub fn get_bar_chart(
    filter: &TransactionFilter,
    connection: &Connection,
) -> Result<Vec<PriceRangeCount>, Error> {
    let clause = filter.to_where_clause();
    let mut lower_bound: Option<u32> = None;

    PRICE_RANGES
        .iter()
        .map(|range| -> Result<PriceRangeCount, Error> {
            let range_clause = match lower_bound {
                None => clause.with("price >= ?", [Value::Integer(range.min.into())]),
                Some(previous_max) => {
                    clause.with("price > ?", [Value::Integer(previous_max.into())])
                }
            };
            let range_clause = match range.max {
                Some(max) => range_clause.with("price <= ?", [Value::Integer(max.into())]),
                None => range_clause,
            };
            lower_bound = range.max;

            Ok(PriceRangeCount {
                range: range.label(),
                count: count_where(&range_clause, connection)?,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use time::{Month, macros::datetime};

    use crate::{
        report::test_utils::{get_report_state, scenario_transactions},
        transaction::{MonthRange, TransactionFilter, test_utils::sample_transaction},
    };

    use super::{PRICE_RANGES, PriceRange, get_bar_chart};

    #[test]
    fn labels_match_ranges() {
        let labels: Vec<String> = PRICE_RANGES.iter().map(PriceRange::label).collect();

        assert_eq!(
            labels,
            vec![
                "0-100",
                "101-200",
                "201-300",
                "301-400",
                "401-500",
                "501-600",
                "601-700",
                "701-800",
                "801-900",
                "901-Infinity",
            ]
        );
    }

    #[test]
    fn scenario_bar_chart_for_march() {
        let state = get_report_state(&scenario_transactions());
        let conn = state.db_connection.lock().unwrap();
        let filter =
            TransactionFilter::for_month(MonthRange::new(Month::March, 2022, "Etc/UTC").unwrap());

        let got = get_bar_chart(&filter, &conn).unwrap();

        assert_eq!(got.len(), 10);
        assert_eq!(got[0].range, "0-100");
        assert_eq!(got[0].count, 1);
        assert_eq!(got[1].range, "101-200");
        assert_eq!(got[1].count, 1);
        assert!(got[2..].iter().all(|entry| entry.count == 0), "got {got:?}");
    }

    #[test]
    fn boundaries_land_in_one_range() {
        let date = datetime!(2022-03-15 8:00 UTC);
        let prices = [0.0, 100.0, 100.5, 101.0, 200.0, 900.0, 900.01, 901.0, 5000.0];
        let transactions: Vec<_> = prices
            .iter()
            .enumerate()
            .map(|(i, &price)| sample_transaction(i as i64, price, date))
            .collect();
        let state = get_report_state(&transactions);
        let conn = state.db_connection.lock().unwrap();

        let got = get_bar_chart(&TransactionFilter::default(), &conn).unwrap();

        let counts: Vec<u64> = got.iter().map(|entry| entry.count).collect();
        assert_eq!(counts, vec![2, 3, 0, 0, 0, 0, 0, 0, 1, 3]);
    }

    #[test]
    fn counts_sum_to_matching_transactions() {
        let date = datetime!(2022-06-15 8:00 UTC);
        let transactions: Vec<_> = (0..40)
            .map(|i| sample_transaction(i, i as f64 * 37.25, date))
            .collect();
        let state = get_report_state(&transactions);
        let conn = state.db_connection.lock().unwrap();

        let got = get_bar_chart(&TransactionFilter::default(), &conn).unwrap();

        assert_eq!(got.iter().map(|entry| entry.count).sum::<u64>(), 40);
    }

    #[test]
    fn empty_store_has_every_range_with_zero() {
        let state = get_report_state(&[]);
        let conn = state.db_connection.lock().unwrap();

        let got = get_bar_chart(&TransactionFilter::default(), &conn).unwrap();

        assert_eq!(got.len(), PRICE_RANGES.len());
        assert!(got.iter().all(|entry| entry.count == 0));
    }
}
