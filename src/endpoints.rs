//! The API endpoint URIs.

/// The route that reseeds the database from the remote dataset.
pub const INITIALIZE: &str = "/initialize";
/// The route for paged transaction search.
pub const TRANSACTIONS: &str = "/transactions";
/// The route for the monthly sale statistics.
pub const STATISTICS: &str = "/statistics";
/// The route for the monthly price histogram.
pub const BAR_CHART: &str = "/barchart";
/// The route for the monthly category breakdown.
pub const PIE_CHART: &str = "/piechart";
/// The route for the statistics, bar chart and pie chart in one response.
pub const COMBINED: &str = "/combined";
