//! This modules defines the common functionality for paging data.

/// The config for pagination
#[derive(Debug, Clone)]
pub struct PaginationConfig {
    /// The page number to default to when not specified in a request.
    pub default_page: u64,
    /// The number of records per page when not specified in a request.
    pub default_page_size: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page: 1,
            default_page_size: 10,
        }
    }
}

impl PaginationConfig {
    /// Resolve the raw `page` and `per_page` query parameters.
    ///
    /// Values that are missing, not a whole number, or zero fall back to the
    /// defaults in this config.
    pub fn resolve(&self, page: Option<&str>, per_page: Option<&str>) -> Page {
        Page {
            number: parse_positive(page).unwrap_or(self.default_page.max(1)),
            size: parse_positive(per_page).unwrap_or(self.default_page_size.max(1)),
        }
    }
}

fn parse_positive(value: Option<&str>) -> Option<u64> {
    value
        .and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|&value| value > 0)
}

/// A 1-indexed page of records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// The page number, starting from 1.
    pub number: u64,
    /// The maximum number of records on the page.
    pub size: u64,
}

impl Page {
    /// The number of records before this page.
    pub fn offset(&self) -> i64 {
        let offset = self.number.saturating_sub(1).saturating_mul(self.size);
        i64::try_from(offset).unwrap_or(i64::MAX)
    }

    /// The maximum number of records on this page, as an SQL `LIMIT`.
    pub fn limit(&self) -> i64 {
        i64::try_from(self.size).unwrap_or(i64::MAX)
    }
}
