//! Family Office News Tracker
//!
//! Fetches Google News search results for a list of tracked family offices,
//! keeps every article once (keyed by link) in SQLite, and serves the last
//! sixty days of coverage as an HTML table with a CSV download.

pub mod config;
pub mod cutoff;
pub mod db;
pub mod export;
pub mod fetcher;
pub mod provider;
pub mod routes;
pub mod timestamp;
