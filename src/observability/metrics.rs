use prometheus::{
    Encoder, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub dispatch_attempts_total: IntCounterVec,
    pub dispatch_queue_depth: IntGauge,
    pub dispatch_latency_seconds: HistogramVec,
    pub job_transitions_total: IntCounterVec,
    pub payments_settled_total: IntCounter,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let dispatch_attempts_total = IntCounterVec::new(
            Opts::new(
                "dispatch_attempts_total",
                "Dispatch engine attempts by outcome",
            ),
            &["outcome"],
        )
        .expect("valid dispatch_attempts_total metric");

        let dispatch_queue_depth = IntGauge::new(
            "dispatch_queue_depth",
            "Jobs currently waiting in the dispatch queue",
        )
        .expect("valid dispatch_queue_depth metric");

        let dispatch_latency_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "dispatch_latency_seconds",
                "Latency of dispatch processing in seconds",
            ),
            &["outcome"],
        )
        .expect("valid dispatch_latency_seconds metric");

        let job_transitions_total = IntCounterVec::new(
            Opts::new(
                "job_transitions_total",
                "Committed job transitions by target status",
            ),
            &["status"],
        )
        .expect("valid job_transitions_total metric");

        let payments_settled_total = IntCounter::new(
            "payments_settled_total",
            "Payment records created on job completion",
        )
        .expect("valid payments_settled_total metric");

        registry
            .register(Box::new(dispatch_attempts_total.clone()))
            .expect("register dispatch_attempts_total");
        registry
            .register(Box::new(dispatch_queue_depth.clone()))
            .expect("register dispatch_queue_depth");
        registry
            .register(Box::new(dispatch_latency_seconds.clone()))
            .expect("register dispatch_latency_seconds");
        registry
            .register(Box::new(job_transitions_total.clone()))
            .expect("register job_transitions_total");
        registry
            .register(Box::new(payments_settled_total.clone()))
            .expect("register payments_settled_total");

        Self {
            registry,
            dispatch_attempts_total,
            dispatch_queue_depth,
            dispatch_latency_seconds,
            job_transitions_total,
            payments_settled_total,
        }
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}
