//! A small reporting service for a dataset of product sale transactions.
//!
//! The service seeds its SQLite database from a remote JSON dataset and serves
//! a JSON API with paged search, monthly sale statistics, a price-range
//! histogram, and a category breakdown for a dashboard UI.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::response::{IntoResponse, Response};
use axum_server::Handle;
use tokio::signal;

mod app_state;
mod database_id;
mod db;
mod endpoints;
mod internal_server_error;
mod logging;
mod not_found;
mod pagination;
mod report;
mod routing;
mod seed;
mod timezone;
mod transaction;

pub use app_state::AppState;
pub use db::initialize as initialize_db;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use pagination::{Page, PaginationConfig};
pub use report::{
    CategoryCount, CombinedReport, PRICE_RANGES, PriceRange, PriceRangeCount, Statistics,
    get_bar_chart, get_combined_report, get_pie_chart, get_statistics,
};
pub use routing::build_router;
pub use seed::{
    DEFAULT_SEED_URL, SeedConfig, fetch_seed_transactions, parse_seed_transactions,
    replace_all_transactions,
};
pub use timezone::get_local_offset;
pub use transaction::{
    MonthRange, Transaction, TransactionFilter, count_transactions, parse_month,
    search_transactions,
};

use crate::internal_server_error::InternalServerError;

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A month query parameter did not name a calendar month.
    ///
    /// Month names are matched case-sensitively against the English names,
    /// e.g. "March".
    #[error("\"{0}\" is not a valid month name")]
    InvalidMonth(String),

    /// A year query parameter was not an integer.
    #[error("\"{0}\" is not a valid year")]
    InvalidYear(String),

    /// The month and year could not be turned into a valid date range, e.g.
    /// the year is outside the supported range.
    #[error("could not create a date range for {month} {year}")]
    InvalidDateRange {
        /// The month name from the request.
        month: String,
        /// The year the month was resolved against.
        year: i32,
    },

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// The seed dataset could not be downloaded.
    ///
    /// Covers connection failures, timeouts and non-success HTTP statuses.
    #[error("could not fetch the seed dataset: {0}")]
    SeedFetchError(String),

    /// The seed dataset was downloaded but is not a valid list of transactions.
    #[error("could not parse the seed dataset: {0}")]
    InvalidSeedData(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// A background task for a database query panicked or was cancelled.
    #[error("a database task failed to complete: {0}")]
    TaskFailed(String),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        tracing::error!("an unhandled SQL error occurred: {}", value);
        Error::SqlError(value)
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        tracing::error!("An error occurred while handling a request: {}", self);

        match self {
            Error::InvalidMonth(month) => InternalServerError {
                description: &format!(
                    "\"{month}\" is not a valid month. Use the full English name, e.g. \"March\"."
                ),
            }
            .into_response(),
            Error::InvalidYear(year) => InternalServerError {
                description: &format!("\"{year}\" is not a valid year."),
            }
            .into_response(),
            Error::InvalidDateRange { month, year } => InternalServerError {
                description: &format!("Could not create a date range for {month} {year}."),
            }
            .into_response(),
            Error::InvalidTimezoneError(timezone) => InternalServerError {
                description: &format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            }
            .into_response(),
            Error::SeedFetchError(_) | Error::InvalidSeedData(_) => InternalServerError {
                description: "Error initializing database",
            }
            .into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            _ => InternalServerError::default().into_response(),
        }
    }
}
