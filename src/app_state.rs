//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::{
    Error, db::initialize, pagination::PaginationConfig, seed::SeedConfig,
    timezone::get_local_offset,
};

/// The state of the REST server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    ///
    /// Month filters start and end at midnight in this timezone.
    pub local_timezone: String,

    /// The config that controls how to page search results.
    pub pagination_config: PaginationConfig,

    /// Where and how to download the seed dataset from.
    pub seed_config: SeedConfig,

    /// The client used to download the seed dataset.
    pub http_client: reqwest::Client,

    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for the domain models.
    /// `local_timezone` should be a valid, canonical timezone name, e.g. "Pacific/Auckland".
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized, the timezone is
    /// not valid, or the HTTP client cannot be created.
    pub fn new(
        db_connection: Connection,
        local_timezone: &str,
        pagination_config: PaginationConfig,
        seed_config: SeedConfig,
    ) -> Result<Self, Error> {
        initialize(&db_connection)?;

        if get_local_offset(local_timezone).is_none() {
            return Err(Error::InvalidTimezoneError(local_timezone.to_owned()));
        }

        let http_client = reqwest::Client::builder()
            .timeout(seed_config.timeout)
            .build()
            .map_err(|error| Error::SeedFetchError(format!("could not build HTTP client: {error}")))?;

        Ok(Self {
            local_timezone: local_timezone.to_owned(),
            pagination_config,
            seed_config,
            http_client,
            db_connection: Arc::new(Mutex::new(db_connection)),
        })
    }
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use crate::{Error, PaginationConfig, SeedConfig};

    use super::AppState;

    #[test]
    fn new_rejects_unknown_timezone() {
        let conn = Connection::open_in_memory().unwrap();

        let result = AppState::new(
            conn,
            "Atlantis/Capital",
            PaginationConfig::default(),
            SeedConfig::default(),
        );

        assert!(matches!(result, Err(Error::InvalidTimezoneError(tz)) if tz == "Atlantis/Capital"));
    }

    #[test]
    fn new_creates_tables() {
        let conn = Connection::open_in_memory().unwrap();

        let state = AppState::new(
            conn,
            "Etc/UTC",
            PaginationConfig::default(),
            SeedConfig::default(),
        )
        .expect("Could not create app state");

        let connection = state.db_connection.lock().unwrap();
        assert_eq!(crate::count_transactions(&connection), Ok(0));
    }
}
