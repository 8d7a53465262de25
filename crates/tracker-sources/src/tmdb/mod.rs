pub mod api;
pub mod client;

pub use client::TmdbClient;

pub const PROVIDER_NAME: &str = "tmdb";
/// Shortest accepted search query.
pub const MIN_QUERY_LEN: usize = 2;
/// Cast members kept per title.
pub const CAST_LIMIT: usize = 5;
