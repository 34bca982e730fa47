use dotgate_infrastructure::RelayMetrics;

#[derive(Clone)]
pub struct AppState {
    pub metrics: RelayMetrics,

    /// Host identity attached to every exported metric.
    pub host: String,

    /// The resolver this process forwards to, for the stats view.
    pub upstream: String,
}

impl AppState {
    pub fn new(metrics: RelayMetrics, upstream: String) -> Self {
        let host = hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .unwrap_or_else(|| "unknown".to_string());

        Self {
            metrics,
            host,
            upstream,
        }
    }
}
