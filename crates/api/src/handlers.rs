use axum::{extract::State, Json};
use dotgate_infrastructure::MetricsSnapshot;
use serde::Serialize;
use tracing::debug;

use crate::state::AppState;

#[derive(Serialize)]
pub struct StatsResponse {
    pub host: String,
    pub upstream: String,
    pub requests_total: u64,
    pub exchanges_succeeded: u64,
    pub exchanges_failed: u64,
    pub avg_exchange_time_ms: f64,
}

pub async fn health_check() -> &'static str {
    "OK"
}

pub async fn get_stats(State(state): State<AppState>) -> Json<StatsResponse> {
    debug!("Fetching relay statistics");
    let snapshot = state.metrics.snapshot();

    Json(StatsResponse {
        host: state.host.clone(),
        upstream: state.upstream.clone(),
        requests_total: snapshot.requests,
        exchanges_succeeded: snapshot.succeeded,
        exchanges_failed: snapshot.failed,
        avg_exchange_time_ms: snapshot.avg_duration_ms,
    })
}

/// Prometheus text exposition, format version 0.0.4.
pub async fn get_metrics(State(state): State<AppState>) -> String {
    render_prometheus(&state.metrics.snapshot(), &state.host)
}

fn render_prometheus(snapshot: &MetricsSnapshot, host: &str) -> String {
    let mut out = String::with_capacity(1024);

    out.push_str("# HELP dotgate_requests_total Number of queries received.\n");
    out.push_str("# TYPE dotgate_requests_total counter\n");
    out.push_str(&format!(
        "dotgate_requests_total{{host=\"{host}\"}} {}\n",
        snapshot.requests
    ));

    out.push_str("# HELP dotgate_exchanges_total Completed exchanges by outcome.\n");
    out.push_str("# TYPE dotgate_exchanges_total counter\n");
    out.push_str(&format!(
        "dotgate_exchanges_total{{host=\"{host}\",outcome=\"success\"}} {}\n",
        snapshot.succeeded
    ));
    out.push_str(&format!(
        "dotgate_exchanges_total{{host=\"{host}\",outcome=\"failure\"}} {}\n",
        snapshot.failed
    ));

    out.push_str(
        "# HELP dotgate_exchange_duration_seconds Time spent processing one exchange.\n",
    );
    out.push_str("# TYPE dotgate_exchange_duration_seconds histogram\n");
    for (bound, count) in &snapshot.duration_buckets {
        out.push_str(&format!(
            "dotgate_exchange_duration_seconds_bucket{{host=\"{host}\",le=\"{bound}\"}} {count}\n"
        ));
    }
    out.push_str(&format!(
        "dotgate_exchange_duration_seconds_bucket{{host=\"{host}\",le=\"+Inf\"}} {}\n",
        snapshot.duration_count
    ));
    out.push_str(&format!(
        "dotgate_exchange_duration_seconds_sum{{host=\"{host}\"}} {}\n",
        snapshot.duration_sum_seconds
    ));
    out.push_str(&format!(
        "dotgate_exchange_duration_seconds_count{{host=\"{host}\"}} {}\n",
        snapshot.duration_count
    ));

    out
}
