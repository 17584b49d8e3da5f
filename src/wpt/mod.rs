//! Client for the page-speed testing service (WebPageTest).
//!
//! Covers the three calls the relay makes: scheduling a test, checking
//! its status and fetching the full JSON result.

mod client;
mod models;
mod report;

pub use client::*;
pub use models::*;
pub use report::*;

use std::time::Duration;
use thiserror::Error;

/// Testing service error types.
///
/// The relay treats every variant the same way (the step is abandoned);
/// the distinction only shows up in logs.
#[derive(Error, Debug)]
pub enum WptError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("network error: {0}")]
    Network(String),
    #[error("unexpected HTTP status {0}")]
    HttpStatus(u16),
    #[error("service status {code}: {text}")]
    ServiceStatus { code: i64, text: String },
    #[error("invalid response body: {0}")]
    Decode(String),
}
