//! Database ID type definition.

/// The identifier a transaction was given by the seed dataset.
///
/// This is not a primary key and is not guaranteed to be unique.
pub type TransactionId = i64;
