pub mod blend;
pub mod cache_savings;
pub mod client;
pub mod config;
pub mod cost;
pub mod features;
pub mod formatter;
pub mod models;
pub mod panel;
pub mod rollup;
pub mod series;
pub mod table;
