use prometheus::{
    CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};

/// Metrics collection for the gateway
pub struct Metrics {
    pub proxy_requests_total: CounterVec,
    pub proxy_rejections_total: CounterVec,
    pub upstream_requests_total: CounterVec,
    pub upstream_request_duration_seconds: HistogramVec,
    pub upstream_errors_total: CounterVec,
    registry: Registry,
}

impl Metrics {
    /// Create a new Metrics instance with all metrics registered
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let proxy_requests_total = CounterVec::new(
            Opts::new("proxy_requests_total", "Total number of proxied requests"),
            &["route", "status"],
        )?;
        registry.register(Box::new(proxy_requests_total.clone()))?;

        let proxy_rejections_total = CounterVec::new(
            Opts::new(
                "proxy_rejections_total",
                "Requests rejected before reaching the upstream",
            ),
            &["reason"],
        )?;
        registry.register(Box::new(proxy_rejections_total.clone()))?;

        let upstream_requests_total = CounterVec::new(
            Opts::new(
                "upstream_requests_total",
                "Total number of upstream requests",
            ),
            &["status"],
        )?;
        registry.register(Box::new(upstream_requests_total.clone()))?;

        let upstream_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "upstream_request_duration_seconds",
                "Upstream request duration in seconds",
            )
            .buckets(vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
            ]),
            &["route"],
        )?;
        registry.register(Box::new(upstream_request_duration_seconds.clone()))?;

        let upstream_errors_total = CounterVec::new(
            Opts::new("upstream_errors_total", "Total number of upstream errors"),
            &["error_type"],
        )?;
        registry.register(Box::new(upstream_errors_total.clone()))?;

        Ok(Metrics {
            proxy_requests_total,
            proxy_rejections_total,
            upstream_requests_total,
            upstream_request_duration_seconds,
            upstream_errors_total,
            registry,
        })
    }

    /// Gather all metrics and encode them in Prometheus format
    pub fn gather(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).to_string())
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new().expect("Failed to create metrics")
    }
}
