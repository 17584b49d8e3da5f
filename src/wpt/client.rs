//! HTTP client for the testing service.

use std::time::Duration;

use serde::de::DeserializeOwned;

use super::{JsonResult, RunTestResponse, TestResult, TestStatus, WptError};

/// Client bound to one testing service instance.
#[derive(Debug, Clone)]
pub struct WptClient {
    base_url: String,
    timeout: Duration,
    http: reqwest::Client,
}

impl WptClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, WptError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WptError::Network(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            http,
        })
    }

    /// Ask the service to schedule a test of `url` and return its identifier.
    pub async fn run_test(&self, url: &str, runs: &str, api_key: &str) -> Result<String, WptError> {
        let body: RunTestResponse = self
            .get_json(
                "runtest.php",
                &[("url", url), ("runs", runs), ("f", "json"), ("k", api_key)],
            )
            .await?;

        if body.status_code != 200 {
            return Err(WptError::ServiceStatus {
                code: body.status_code,
                text: body.status_text.unwrap_or_default(),
            });
        }

        match body.data {
            Some(data) if !data.test_id.is_empty() => Ok(data.test_id),
            _ => Err(WptError::Decode("missing data.testId".to_string())),
        }
    }

    /// Current status of a scheduled test.
    pub async fn test_status(&self, test_id: &str) -> Result<TestStatus, WptError> {
        self.get_json("testStatus.php", &[("f", "json"), ("test", test_id)])
            .await
    }

    /// Full result of a completed test.
    pub async fn json_result(&self, test_id: &str) -> Result<TestResult, WptError> {
        let body: JsonResult = self.get_json("jsonResult.php", &[("test", test_id)]).await?;
        Ok(body.data)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> Result<T, WptError> {
        let url = format!("{}/{}", self.base_url, endpoint);

        let response = self
            .http
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    WptError::Timeout(self.timeout)
                } else {
                    WptError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(WptError::HttpStatus(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| WptError::Network(e.to_string()))?;

        serde_json::from_slice(&body).map_err(|e| WptError::Decode(e.to_string()))
    }
}
