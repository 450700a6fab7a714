//! Defines the core data model and database queries for transactions.

use rusqlite::{Connection, Row, types::Type};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Error, database_id::TransactionId};

// ============================================================================
// MODELS
// ============================================================================

/// A product sale record, i.e. a listing that either sold or did not.
///
/// This is also the shape of a record in the seed dataset, so it
/// deserializes from the same JSON it serializes to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// The identifier from the seed dataset. Not guaranteed to be unique.
    pub id: TransactionId,
    /// The product title.
    pub title: String,
    /// The listed price of the product.
    ///
    /// Expected to be non-negative, but this is not validated.
    pub price: f64,
    /// A longer text description of the product.
    pub description: String,
    /// The category label, e.g. "electronics".
    pub category: String,
    /// A URL to an image of the product.
    pub image: String,
    /// Whether the product sold.
    pub sold: bool,
    /// When the sale was listed, if the dataset recorded it.
    ///
    /// Stored with millisecond precision and always read back in UTC.
    /// Transactions without a date never match a month filter.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub date_of_sale: Option<OffsetDateTime>,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// The columns of a transaction in the order expected by [map_transaction_row].
pub(crate) const TRANSACTION_COLUMNS: &str =
    "id, title, price, description, category, image, sold, date_of_sale";

/// Insert a transaction into the database.
///
/// Transactions are kept in insertion order, which is the order that search
/// results are returned in.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn insert_transaction(transaction: &Transaction, connection: &Connection) -> Result<(), Error> {
    connection
        .prepare_cached(
            "INSERT INTO \"transaction\" \
            (id, title, price, description, category, image, sold, date_of_sale) \
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )?
        .execute((
            transaction.id,
            &transaction.title,
            transaction.price,
            &transaction.description,
            &transaction.category,
            &transaction.image,
            transaction.sold,
            transaction.date_of_sale.map(to_unix_millis),
        ))?;

    Ok(())
}

/// Delete every transaction in the database.
///
/// Returns the number of deleted transactions.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn delete_all_transactions(connection: &Connection) -> Result<usize, Error> {
    connection
        .execute("DELETE FROM \"transaction\"", ())
        .map_err(|error| error.into())
}

/// Get the total number of transactions in the database.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn count_transactions(connection: &Connection) -> Result<u64, Error> {
    connection
        .query_row("SELECT COUNT(row_id) FROM \"transaction\";", [], |row| {
            get_count(row, 0)
        })
        .map_err(|error| error.into())
}

/// Read a `COUNT(...)` column, which SQLite returns as a signed integer.
pub(crate) fn get_count(row: &Row, index: usize) -> Result<u64, rusqlite::Error> {
    let count: i64 = row.get(index)?;

    u64::try_from(count).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(index, Type::Integer, Box::new(error))
    })
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    // `row_id` only records insertion order, the dataset's own `id` may repeat.
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
            row_id INTEGER PRIMARY KEY AUTOINCREMENT,
            id INTEGER NOT NULL,
            title TEXT NOT NULL,
            price REAL NOT NULL,
            description TEXT NOT NULL,
            category TEXT NOT NULL,
            image TEXT NOT NULL,
            sold INTEGER NOT NULL,
            date_of_sale INTEGER
        );

        CREATE INDEX IF NOT EXISTS idx_transaction_date_of_sale
            ON \"transaction\"(date_of_sale);",
    )?;

    Ok(())
}

/// Map a database row selected with [TRANSACTION_COLUMNS] to a Transaction.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id = row.get(0)?;
    let title = row.get(1)?;
    let price = row.get(2)?;
    let description = row.get(3)?;
    let category = row.get(4)?;
    let image = row.get(5)?;
    let sold = row.get(6)?;
    let date_of_sale = row
        .get::<_, Option<i64>>(7)?
        .map(from_unix_millis)
        .transpose()
        .map_err(|error| {
            rusqlite::Error::FromSqlConversionFailure(7, Type::Integer, Box::new(error))
        })?;

    Ok(Transaction {
        id,
        title,
        price,
        description,
        category,
        image,
        sold,
        date_of_sale,
    })
}

/// Convert a timestamp to the number of milliseconds since the Unix epoch.
pub(crate) fn to_unix_millis(date_time: OffsetDateTime) -> i64 {
    (date_time.unix_timestamp_nanos() / 1_000_000) as i64
}

fn from_unix_millis(millis: i64) -> Result<OffsetDateTime, time::error::ComponentRange> {
    OffsetDateTime::from_unix_timestamp_nanos(millis as i128 * 1_000_000)
}

// ============================================================================
// TESTS
// ============================================================================
