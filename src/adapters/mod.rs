//! Adapters layer: concrete implementations of ports.
//!
//! - `http`: reqwest client for the remote prediction service
//! - `sanitize`: patient-value filtering for logs

pub mod http;
pub mod sanitize;

pub use http::HttpPredictionClient;
