use prometheus::{
    register_histogram_with_registry, register_int_counter_vec_with_registry, register_int_counter_with_registry,
    Histogram, IntCounter, IntCounterVec, Registry, TextEncoder,
};
use tokio::time::Instant;

use crate::errors::OperatorError;

#[derive(Clone)]
pub struct Metrics {
    pub reconcile: ReconcileMetrics,
    pub registry: Registry,
}

impl Default for Metrics {
    fn default() -> Self {
        let registry = Registry::new_custom(Some("ingresscapacitycontroller".to_string()), None)
            .expect("static registry prefix is valid");
        let reconcile = ReconcileMetrics::new(&registry);
        Self { registry, reconcile }
    }
}

impl Metrics {
    /// Render the registry in the Prometheus text exposition format.
    pub fn gather(&self) -> String {
        let families = self.registry.gather();
        TextEncoder::new().encode_to_string(&families).unwrap_or_default()
    }
}

/// A reconcile pass here spans the whole cluster (every zone plus the
/// default controller), not a single custom resource, so these counters
/// aren't labelled per-object the way a one-CR-per-reconcile controller's
/// metrics would be.
#[derive(Clone)]
pub struct ReconcileMetrics {
    pub runs: IntCounter,
    pub failures: IntCounterVec,
    pub duration: Histogram,
}

impl ReconcileMetrics {
    fn new(registry: &Registry) -> Self {
        Self {
            runs: register_int_counter_with_registry!("reconciliations_total", "number of reconcile passes run", registry)
                .unwrap(),
            failures: register_int_counter_vec_with_registry!(
                "reconciliation_errors_total",
                "reconciliation errors by kind",
                &["error"],
                registry
            )
            .unwrap(),
            duration: register_histogram_with_registry!(
                "reconcile_duration_seconds",
                "time spent in a single reconcile pass",
                vec![0.01, 0.1, 0.25, 0.5, 1., 5., 15., 60.],
                registry
            )
            .unwrap(),
        }
    }

    pub fn set_failure(&self, e: &OperatorError) {
        self.failures.with_label_values(&[e.metric_label()]).inc();
    }

    pub fn count_and_measure(&self) -> ReconcileMeasurer {
        self.runs.inc();
        ReconcileMeasurer {
            start: Instant::now(),
            metric: self.duration.clone(),
        }
    }
}

/// Measures the duration of a reconcile pass via `Drop`.
pub struct ReconcileMeasurer {
    start: Instant,
    metric: Histogram,
}

impl Drop for ReconcileMeasurer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_millis() as f64 / 1000.0;
        self.metric.observe(duration);
    }
}
