use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

// ============================================================================
// Metrics Module - Prometheus metrics for order operations
// ============================================================================
//
// Recorded by the order service, scraped through GET /metrics.
//
// ============================================================================

pub struct Metrics {
    registry: Registry,

    pub order_operations: IntCounterVec,
    pub order_operation_duration: HistogramVec,
    pub items_written: IntCounter,
    pub rollbacks: IntCounterVec,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let order_operations = IntCounterVec::new(
            Opts::new("order_operations_total", "Order operations by outcome"),
            &["operation", "outcome"],
        )?;
        registry.register(Box::new(order_operations.clone()))?;

        let order_operation_duration = HistogramVec::new(
            HistogramOpts::new(
                "order_operation_duration_seconds",
                "Order operation latency including store round trips",
            )
            .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
            &["operation"],
        )?;
        registry.register(Box::new(order_operation_duration.clone()))?;

        let items_written = IntCounter::new(
            "order_items_written_total",
            "Item rows committed by order creation",
        )?;
        registry.register(Box::new(items_written.clone()))?;

        let rollbacks = IntCounterVec::new(
            Opts::new("order_rollbacks_total", "Transactions rolled back"),
            &["operation"],
        )?;
        registry.register(Box::new(rollbacks.clone()))?;

        Ok(Self {
            registry,
            order_operations,
            order_operation_duration,
            items_written,
            rollbacks,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Record the outcome (an error kind, or "ok") and latency of one operation.
    pub fn record_operation(&self, operation: &str, outcome: &str, duration_secs: f64) {
        self.order_operations
            .with_label_values(&[operation, outcome])
            .inc();
        self.order_operation_duration
            .with_label_values(&[operation])
            .observe(duration_secs);
    }

    pub fn record_items_written(&self, count: usize) {
        self.items_written.inc_by(count as u64);
    }

    pub fn record_rollback(&self, operation: &str) {
        self.rollbacks.with_label_values(&[operation]).inc();
    }

    /// Render the registry in the Prometheus text exposition format.
    pub fn encode(&self) -> anyhow::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new().unwrap();
        metrics.record_operation("create", "ok", 0.01);
        assert!(!metrics.registry().gather().is_empty());
    }

    #[test]
    fn test_record_operation() {
        let metrics = Metrics::new().unwrap();
        metrics.record_operation("get", "ok", 0.002);
        metrics.record_operation("get", "not_found", 0.001);
        metrics.record_operation("get", "ok", 0.003);

        let gathered = metrics.registry().gather();
        let ops = gathered
            .iter()
            .find(|m| m.name() == "order_operations_total")
            .unwrap();
        assert_eq!(ops.metric.len(), 2);
    }

    #[test]
    fn test_items_and_rollbacks() {
        let metrics = Metrics::new().unwrap();
        metrics.record_items_written(3);
        metrics.record_rollback("create");

        assert_eq!(metrics.items_written.get(), 3);
        assert_eq!(metrics.rollbacks.with_label_values(&["create"]).get(), 1);
    }

    #[test]
    fn test_encode_text_format() {
        let metrics = Metrics::new().unwrap();
        metrics.record_items_written(2);

        let text = metrics.encode().unwrap();
        assert!(text.contains("order_items_written_total 2"));
    }
}
