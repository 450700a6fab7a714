//! Builds SQL filters over transactions from search and month query parameters.

use rusqlite::types::Value;
use time::{Date, Month, OffsetDateTime};

use crate::{
    Error,
    timezone::{local_midnight, local_today},
    transaction::core::to_unix_millis,
};

/// The half-open range `[start, end)` covering one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthRange {
    /// Local midnight on the first day of the month.
    pub start: OffsetDateTime,
    /// Local midnight on the first day of the following month.
    pub end: OffsetDateTime,
}

impl MonthRange {
    /// Create the range for `month` of `year`, with the month boundaries at
    /// midnight in `local_timezone`.
    ///
    /// # Errors
    /// Returns:
    /// - [Error::InvalidDateRange] if the month cannot be represented in `year`,
    /// - or [Error::InvalidTimezoneError] if `local_timezone` is not a canonical timezone name.
    pub fn new(month: Month, year: i32, local_timezone: &str) -> Result<Self, Error> {
        let invalid_range = || Error::InvalidDateRange {
            month: month.to_string(),
            year,
        };

        let start_date = Date::from_calendar_date(year, month, 1).map_err(|_| invalid_range())?;
        let next_year = if month == Month::December {
            year + 1
        } else {
            year
        };
        let end_date =
            Date::from_calendar_date(next_year, month.next(), 1).map_err(|_| invalid_range())?;

        let to_local = |date| {
            local_midnight(date, local_timezone)
                .ok_or_else(|| Error::InvalidTimezoneError(local_timezone.to_owned()))
        };

        Ok(Self {
            start: to_local(start_date)?,
            end: to_local(end_date)?,
        })
    }
}

/// Parse an English month name, e.g. "March".
///
/// Matching is case-sensitive, so "march" is rejected.
///
/// # Errors
/// Returns [Error::InvalidMonth] if `name` is not the full name of a month.
pub fn parse_month(name: &str) -> Result<Month, Error> {
    name.parse::<Month>()
        .map_err(|_| Error::InvalidMonth(name.to_owned()))
}

/// A filter over transactions.
///
/// The default filter matches every transaction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionFilter {
    /// Match transactions whose title or description contain this text, or
    /// whose price is equal to it as a number.
    pub search: Option<String>,
    /// Match transactions sold within this month.
    pub month_range: Option<MonthRange>,
}

impl TransactionFilter {
    /// Create a filter from raw query parameters.
    ///
    /// Empty strings are treated the same as missing parameters. `year` is
    /// only used when `month` is given and defaults to the current year in
    /// `local_timezone`.
    ///
    /// # Errors
    /// Returns:
    /// - [Error::InvalidMonth] if `month` is not an English month name,
    /// - [Error::InvalidYear] if `year` is not an integer,
    /// - or [Error::InvalidTimezoneError] if `local_timezone` is not a canonical timezone name.
    pub fn from_params(
        search: Option<&str>,
        month: Option<&str>,
        year: Option<&str>,
        local_timezone: &str,
    ) -> Result<Self, Error> {
        let search = non_empty(search).map(str::to_owned);

        let month_range = match non_empty(month) {
            Some(month_name) => {
                let month = parse_month(month_name)?;
                let year = match non_empty(year) {
                    Some(year) => year
                        .trim()
                        .parse::<i32>()
                        .map_err(|_| Error::InvalidYear(year.to_owned()))?,
                    None => local_today(local_timezone)
                        .ok_or_else(|| Error::InvalidTimezoneError(local_timezone.to_owned()))?
                        .year(),
                };

                Some(MonthRange::new(month, year, local_timezone)?)
            }
            None => None,
        };

        Ok(Self {
            search,
            month_range,
        })
    }

    /// Create a filter that only matches transactions in `month_range`.
    pub fn for_month(month_range: MonthRange) -> Self {
        Self {
            search: None,
            month_range: Some(month_range),
        }
    }

    /// Build the SQL conditions for this filter.
    pub(crate) fn to_where_clause(&self) -> WhereClause {
        let mut clause = WhereClause::default();

        // Both sides are folded by SQLite so the term and columns fold the same way.
        if let Some(search) = &self.search {
            match parse_price(search) {
                Some(price) => clause.and(
                    "(instr(lower(title), lower(?)) > 0 \
                    OR instr(lower(description), lower(?)) > 0 OR price = ?)",
                    [
                        Value::Text(search.clone()),
                        Value::Text(search.clone()),
                        Value::Real(price),
                    ],
                ),
                None => clause.and(
                    "(instr(lower(title), lower(?)) > 0 \
                    OR instr(lower(description), lower(?)) > 0)",
                    [Value::Text(search.clone()), Value::Text(search.clone())],
                ),
            }
        }

        if let Some(range) = &self.month_range {
            clause.and(
                "date_of_sale >= ? AND date_of_sale < ?",
                [
                    Value::Integer(to_unix_millis(range.start)),
                    Value::Integer(to_unix_millis(range.end)),
                ],
            );
        }

        clause
    }
}

fn non_empty(param: Option<&str>) -> Option<&str> {
    param.filter(|value| !value.trim().is_empty())
}

/// Only an exact, finite number is compared against the price column.
fn parse_price(search: &str) -> Option<f64> {
    search
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|price| price.is_finite())
}

/// SQL conditions joined with `AND` and their positional parameters.
#[derive(Debug, Default, Clone, PartialEq)]
pub(crate) struct WhereClause {
    conditions: Vec<String>,
    params: Vec<Value>,
}

impl WhereClause {
    /// Add a condition using `?` placeholders, with `params` in placeholder order.
    pub(crate) fn and(&mut self, condition: &str, params: impl IntoIterator<Item = Value>) {
        self.conditions.push(condition.to_owned());
        self.params.extend(params);
    }

    /// Return a copy of this clause with another condition added.
    pub(crate) fn with(
        &self,
        condition: &str,
        params: impl IntoIterator<Item = Value>,
    ) -> WhereClause {
        let mut clause = self.clone();
        clause.and(condition, params);
        clause
    }

    /// The SQL text, either empty or starting with " WHERE ".
    pub(crate) fn sql(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.conditions.join(" AND "))
        }
    }

    pub(crate) fn params(&self) -> &[Value] {
        &self.params
    }
}

#[cfg(test)]
mod month_range_tests {
    use time::{Month, macros::datetime};

    use crate::Error;

    use super::{MonthRange, parse_month};

    #[test]
    fn parses_full_month_names() {
        assert_eq!(parse_month("March"), Ok(Month::March));
        assert_eq!(parse_month("December"), Ok(Month::December));
    }

    #[test]
    fn rejects_lowercase_and_abbreviated_names() {
        assert_eq!(
            parse_month("march"),
            Err(Error::InvalidMonth("march".to_owned()))
        );
        assert_eq!(parse_month("Mar"), Err(Error::InvalidMonth("Mar".to_owned())));
    }

    #[test]
    fn range_covers_one_month_in_utc() {
        let range = MonthRange::new(Month::March, 2022, "Etc/UTC").unwrap();

        assert_eq!(range.start, datetime!(2022-03-01 0:00 UTC));
        assert_eq!(range.end, datetime!(2022-04-01 0:00 UTC));
    }

    #[test]
    fn december_rolls_into_next_year() {
        let range = MonthRange::new(Month::December, 2021, "Etc/UTC").unwrap();

        assert_eq!(range.start, datetime!(2021-12-01 0:00 UTC));
        assert_eq!(range.end, datetime!(2022-01-01 0:00 UTC));
    }

    #[test]
    fn range_starts_at_local_midnight() {
        let range = MonthRange::new(Month::March, 2022, "Asia/Kolkata").unwrap();

        assert_eq!(range.start, datetime!(2022-02-28 18:30 UTC));
        assert_eq!(range.end, datetime!(2022-03-31 18:30 UTC));
    }

    #[test]
    fn invalid_timezone_is_an_error() {
        let result = MonthRange::new(Month::March, 2022, "Not/A_Zone");

        assert_eq!(
            result,
            Err(Error::InvalidTimezoneError("Not/A_Zone".to_owned()))
        );
    }
}
