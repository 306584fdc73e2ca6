//! Client metrics.
//!
//! # Metrics
//! - `fuel_requests_total` (counter): completed requests by method, outcome
//! - `fuel_request_duration_seconds` (histogram): submission to completion
//! - `fuel_redirects_total` (counter): redirect hops followed, by status
//!
//! Recorded through the `metrics` facade; nothing is exported unless the
//! embedding application installs a recorder.

use std::time::Duration;

pub fn record_request(method: &'static str, outcome: &'static str, elapsed: Duration) {
    ::metrics::counter!("fuel_requests_total", "method" => method, "outcome" => outcome)
        .increment(1);
    ::metrics::histogram!("fuel_request_duration_seconds", "method" => method)
        .record(elapsed.as_secs_f64());
}

pub fn record_redirect(status: u16) {
    ::metrics::counter!("fuel_redirects_total", "status" => status.to_string()).increment(1);
}
