//! Seeds the database with the product transaction dataset.
//!
//! The dataset is downloaded and parsed in full before the database is
//! touched, and the old records are replaced inside one SQLite transaction.
//! A failed download leaves the existing records as they were, and readers
//! never see a partially seeded table.

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    db::lock_connection,
    internal_server_error::InternalServerError,
    transaction::{Transaction, delete_all_transactions, insert_transaction},
};

/// The public dataset of product transactions.
pub const DEFAULT_SEED_URL: &str = "https://s3.amazonaws.com/roxiler.com/product_transaction.json";

/// Where and how to download the seed dataset from.
#[derive(Debug, Clone)]
pub struct SeedConfig {
    /// The URL of a JSON array of transactions.
    pub url: String,
    /// The maximum time to wait for the download to complete.
    pub timeout: Duration,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_SEED_URL.to_owned(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// The state needed for seeding the database.
#[derive(Debug, Clone)]
pub struct SeedState {
    /// The database connection to write transactions to.
    pub db_connection: Arc<Mutex<Connection>>,
    /// Where to download the dataset from.
    pub seed_config: SeedConfig,
    /// The client used for the download.
    pub http_client: reqwest::Client,
}

impl FromRef<AppState> for SeedState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            seed_config: state.seed_config.clone(),
            http_client: state.http_client.clone(),
        }
    }
}

/// Replace all transactions with the dataset at the configured seed URL.
pub async fn get_initialize_endpoint(State(state): State<SeedState>) -> Response {
    match seed_database(&state).await {
        Ok(count) => {
            tracing::info!("Seeded database with {count} transactions");
            (StatusCode::OK, "Database initialized with seed data").into_response()
        }
        // Store errors also render as the initialize message.
        Err(error @ (Error::SqlError(_) | Error::DatabaseLockError)) => {
            tracing::error!("Error initializing database: {error}");
            InternalServerError {
                description: "Error initializing database",
            }
            .into_response()
        }
        Err(error) => error.into_response(),
    }
}

async fn seed_database(state: &SeedState) -> Result<usize, Error> {
    let transactions = fetch_seed_transactions(&state.http_client, &state.seed_config.url).await?;

    let connection = lock_connection(&state.db_connection)?;
    replace_all_transactions(&transactions, &connection)
}

/// Download and parse the seed dataset at `url`.
///
/// # Errors
/// Returns:
/// - [Error::SeedFetchError] if the request fails or the response status is not a success,
/// - or [Error::InvalidSeedData] if the body is not a JSON array of transactions.
pub async fn fetch_seed_transactions(
    client: &reqwest::Client,
    url: &str,
) -> Result<Vec<Transaction>, Error> {
    tracing::debug!("Fetching seed dataset from {url}");

    let body = client
        .get(url)
        .send()
        .await
        .and_then(|response| response.error_for_status())
        .map_err(|error| Error::SeedFetchError(error.to_string()))?
        .bytes()
        .await
        .map_err(|error| Error::SeedFetchError(error.to_string()))?;

    parse_seed_transactions(&body)
}

/// Parse a JSON array of transactions.
///
/// # Errors
/// Returns [Error::InvalidSeedData] if `json` is not an array of valid
/// transactions, e.g. a `dateOfSale` is not an RFC 3339 timestamp.
pub fn parse_seed_transactions(json: &[u8]) -> Result<Vec<Transaction>, Error> {
    serde_json::from_slice(json).map_err(|error| Error::InvalidSeedData(error.to_string()))
}

/// Replace every transaction in the database with `transactions`.
///
/// The delete and inserts are committed together, so on error the previous
/// transactions are kept.
///
/// Returns the number of inserted transactions.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn replace_all_transactions(
    transactions: &[Transaction],
    connection: &Connection,
) -> Result<usize, Error> {
    let sql_transaction = connection.unchecked_transaction()?;

    let deleted = delete_all_transactions(&sql_transaction)?;
    for transaction in transactions {
        insert_transaction(transaction, &sql_transaction)?;
    }

    sql_transaction.commit()?;
    tracing::debug!(
        "Replaced {deleted} transactions with {} transactions",
        transactions.len()
    );

    Ok(transactions.len())
}


#[cfg(test)]
mod replace_tests {
    use time::macros::datetime;

    use crate::transaction::{
        count_transactions, insert_transaction,
        test_utils::{get_test_connection, sample_transaction},
    };

    use super::replace_all_transactions;

    #[test]
    fn replaces_existing_transactions() {
        let conn = get_test_connection();
        let date = datetime!(2022-03-01 0:00 UTC);
        for i in 1..=5 {
            insert_transaction(&sample_transaction(i, 1.0, date), &conn).unwrap();
        }

        let inserted = replace_all_transactions(
            &[sample_transaction(10, 2.0, date), sample_transaction(11, 3.0, date)],
            &conn,
        )
        .unwrap();

        assert_eq!(inserted, 2);
        assert_eq!(count_transactions(&conn).unwrap(), 2);
    }

    #[test]
    fn empty_dataset_empties_the_store() {
        let conn = get_test_connection();
        insert_transaction(
            &sample_transaction(1, 1.0, datetime!(2022-03-01 0:00 UTC)),
            &conn,
        )
        .unwrap();

        let inserted = replace_all_transactions(&[], &conn).unwrap();

        assert_eq!(inserted, 0);
        assert_eq!(count_transactions(&conn).unwrap(), 0);
    }

    #[test]
    fn failed_insert_keeps_previous_transactions() {
        let conn = get_test_connection();
        let date = datetime!(2022-03-01 0:00 UTC);
        insert_transaction(&sample_transaction(1, 1.0, date), &conn).unwrap();
        conn.execute_batch(
            "CREATE TRIGGER reject_big_ids BEFORE INSERT ON \"transaction\"
             WHEN NEW.id > 100
             BEGIN SELECT RAISE(ABORT, 'id too big'); END;",
        )
        .unwrap();

        let result = replace_all_transactions(
            &[sample_transaction(2, 1.0, date), sample_transaction(200, 1.0, date)],
            &conn,
        );

        assert!(result.is_err());
        assert_eq!(count_transactions(&conn).unwrap(), 1);
    }
}
