//! Field extraction from rendered portal HTML.

pub mod detail;
pub mod dom;
pub mod search;

pub use detail::extract_notice;
pub use search::parse_search_results;
