//! Report module
//!
//! Provides the aggregate queries behind the dashboard: sale statistics, a
//! price-range histogram, a category breakdown, and an endpoint that combines
//! all three.

mod bar_chart;
mod combined;
mod pie_chart;
mod statistics;

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;
use serde::Deserialize;

use crate::{AppState, Error, transaction::TransactionFilter};

pub use bar_chart::{PRICE_RANGES, PriceRange, PriceRangeCount, get_bar_chart, get_bar_chart_endpoint};
pub use combined::{CombinedReport, get_combined_endpoint, get_combined_report};
pub use pie_chart::{CategoryCount, get_pie_chart, get_pie_chart_endpoint};
pub use statistics::{Statistics, get_statistics, get_statistics_endpoint};

/// The query parameters shared by the report endpoints.
///
/// Any other parameters, e.g. `search` or `page`, are accepted and ignored.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ReportQuery {
    /// The English name of the month to report on, e.g. "March".
    pub month: Option<String>,
    /// The year `month` falls in. Defaults to the current year.
    pub year: Option<String>,
}

/// The state needed for the report endpoints.
#[derive(Debug, Clone)]
pub struct ReportState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for ReportState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

impl ReportState {
    /// Build the transaction filter for a report request.
    fn filter(&self, query: &ReportQuery) -> Result<TransactionFilter, Error> {
        TransactionFilter::from_params(
            None,
            query.month.as_deref(),
            query.year.as_deref(),
            &self.local_timezone,
        )
    }
}
