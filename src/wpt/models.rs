//! Response bodies returned by the testing service.

use serde::{Deserialize, Deserializer};
use std::collections::HashMap;

/// Body of `runtest.php?f=json`.
#[derive(Debug, Clone, Deserialize)]
pub struct RunTestResponse {
    #[serde(rename = "statusCode")]
    pub status_code: i64,
    #[serde(rename = "statusText", default)]
    pub status_text: Option<String>,
    #[serde(default)]
    pub data: Option<RunTestData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RunTestData {
    #[serde(rename = "testId")]
    pub test_id: String,
}

/// Body of `testStatus.php?f=json`.
///
/// `statusCode` is 200 once the test has completed; 1xx codes mean it is
/// queued or running and 4xx codes mean it failed or is unknown.
#[derive(Debug, Clone, Deserialize)]
pub struct TestStatus {
    #[serde(rename = "statusCode")]
    pub status_code: i64,
    #[serde(rename = "statusText", default)]
    pub status_text: Option<String>,
}

impl TestStatus {
    pub fn is_complete(&self) -> bool {
        self.status_code == 200
    }
}

/// Body of `jsonResult.php`.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonResult {
    pub data: TestResult,
}

/// A finished test: its runs and the link to the hosted summary.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TestResult {
    #[serde(deserialize_with = "deserialize_runs")]
    pub runs: Vec<Run>,
    #[serde(default)]
    pub summary: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Run {
    /// Missing when the run itself failed.
    #[serde(rename = "firstView", default)]
    pub first_view: Option<FirstView>,
}

/// Measurements of a first (cold cache) page view.
///
/// The service reports `null` for metrics it could not capture, so every
/// field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FirstView {
    #[serde(rename = "URL", default)]
    pub url: Option<String>,
    /// Milliseconds until the page was fully loaded.
    #[serde(rename = "fullyLoaded", default)]
    pub fully_loaded: Option<f64>,
    #[serde(rename = "requestsFull", default)]
    pub requests_full: Option<f64>,
    /// Bytes downloaded.
    #[serde(rename = "bytesIn", default)]
    pub bytes_in: Option<f64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RunsRepr {
    List(Vec<Run>),
    Keyed(HashMap<String, Run>),
}

/// Runs come back either as an array or as an object keyed by run number.
fn deserialize_runs<'de, D>(deserializer: D) -> Result<Vec<Run>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match RunsRepr::deserialize(deserializer)? {
        RunsRepr::List(runs) => runs,
        RunsRepr::Keyed(map) => {
            let mut keyed: Vec<(String, Run)> = map.into_iter().collect();
            keyed.sort_by(|(a, _), (b, _)| match (a.parse::<u64>(), b.parse::<u64>()) {
                (Ok(a), Ok(b)) => a.cmp(&b),
                _ => a.cmp(b),
            });
            keyed.into_iter().map(|(_, run)| run).collect()
        }
    })
}
