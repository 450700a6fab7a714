use rusqlite::Connection;
use time::OffsetDateTime;

use crate::{db::initialize, transaction::Transaction};

pub(crate) fn sample_transaction(id: i64, price: f64, date_of_sale: OffsetDateTime) -> Transaction {
    Transaction {
        id,
        title: format!("Product #{id}"),
        price,
        description: format!("Description of product #{id}"),
        category: "electronics".to_owned(),
        image: format!("https://example.com/images/{id}.jpg"),
        sold: false,
        date_of_sale: Some(date_of_sale),
    }
}

/// An in-memory database with the tables for the app created.
pub(crate) fn get_test_connection() -> Connection {
    let conn = Connection::open_in_memory().expect("Could not open in-memory SQLite database");
    initialize(&conn).expect("Could not initialize database");
    conn
}
