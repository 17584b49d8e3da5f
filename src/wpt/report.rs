//! Plain-text report posted to the chat channel.

use super::TestResult;

const FENCE: &str = "```";

/// Format a finished test as a preformatted chat block.
///
/// Each run contributes its URL, the action that triggered the test, load
/// time in seconds, request count and kilobytes downloaded. Values are
/// divided by 1000 without rounding. Runs that failed (no first view) are
/// left out.
pub fn format_report(result: &TestResult, action: &str) -> String {
    let mut text = String::from(FENCE);

    for (i, run) in result.runs.iter().enumerate() {
        let Some(view) = &run.first_view else {
            tracing::debug!("Skipping run {} without first view", i + 1);
            continue;
        };

        text.push_str(&format!("URL: {}\n", view.url.as_deref().unwrap_or_default()));
        text.push_str(&format!("Action: {}\n", action));
        text.push_str(&format!("Time: {} Seconds\n", metric(view.fully_loaded, 1000.0)));
        text.push_str(&format!("Requests: {}\n", metric(view.requests_full, 1.0)));
        text.push_str(&format!("Bytes In: {} KB\n", metric(view.bytes_in, 1000.0)));
    }

    text.push_str(&format!("View Full Summary: {}{}", result.summary, FENCE));
    text
}

/// A scaled metric, blank when the service did not report it.
fn metric(value: Option<f64>, divisor: f64) -> String {
    value.map(|v| (v / divisor).to_string()).unwrap_or_default()
}
