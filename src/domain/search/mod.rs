//! Search domain - Query parsing and URL parameters

mod params;
mod parser;

pub use params::SearchParams;
pub use parser::{
    normalize_round, parse_search_query, SearchTarget, DEFAULT_POSITION, DEFAULT_ROUND,
};
