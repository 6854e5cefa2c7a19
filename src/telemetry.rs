use opentelemetry::{
    global,
    metrics::{Counter, Histogram, MeterProvider},
    KeyValue,
};
use opentelemetry_sdk::metrics::SdkMeterProvider;
use prometheus::Registry;
use std::collections::HashSet;

pub struct Metrics {
    request_counter: Counter<u64>,
    prediction_duration: Histogram<u64>,
    prediction_failures: Counter<u64>,
    // Dropping the last provider handle shuts its reader down.
    _provider: SdkMeterProvider,
    pub registry: Registry,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();
        let exporter = opentelemetry_prometheus::exporter()
            .with_registry(registry.clone())
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build prometheus exporter: {}", e))?;

        let provider = SdkMeterProvider::builder().with_reader(exporter).build();

        let meter = provider.meter("agro_ml");
        global::set_meter_provider(provider.clone());

        let request_counter = meter
            .u64_counter("requests_total")
            .with_description("Total number of prediction requests")
            .build();

        // Script start-up dominates, so buckets run from tens of ms to the timeout.
        let boundaries = generate_boundaries(&[50, 250, 1000, 5000, 30000], &[50, 250, 1000, 5000]);

        let prediction_duration = meter
            .u64_histogram("prediction_duration_ms")
            .with_boundaries(boundaries)
            .with_description("Duration of predictor calls in milliseconds")
            .build();

        let prediction_failures = meter
            .u64_counter("prediction_failures_total")
            .with_description("Total number of failed predictor calls")
            .build();

        Ok(Metrics {
            request_counter,
            prediction_duration,
            prediction_failures,
            _provider: provider,
            registry,
        })
    }

    pub fn record_request(&self, route: &str) {
        let attributes = vec![KeyValue::new("route", route.to_string())];
        self.request_counter.add(1, &attributes);
    }

    pub fn record_prediction_duration(&self, duration_ms: u64, route: &str) {
        let attributes = vec![KeyValue::new("route", route.to_string())];
        self.prediction_duration.record(duration_ms, &attributes);
    }

    pub fn record_prediction_failure(&self, route: &str, kind: &'static str) {
        let attributes = vec![
            KeyValue::new("route", route.to_string()),
            KeyValue::new("kind", kind),
        ];
        self.prediction_failures.add(1, &attributes);
    }
}

/// Bucket edges for consecutive segments `edges[i]..=edges[i + 1]`, each walked
/// with `steps[i]`.
fn generate_boundaries(edges: &[i32], steps: &[usize]) -> Vec<f64> {
    let mut seen = HashSet::new();
    edges
        .windows(2)
        .zip(steps)
        .flat_map(|(segment, &step)| (segment[0]..=segment[1]).step_by(step))
        .filter(|&x| seen.insert(x))
        .map(|x| x as f64)
        .collect()
}
