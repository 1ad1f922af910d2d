mod handlers;

use prometheus::{IntCounterVec, Opts, Registry};

use crate::domain::errors::ErrorKind;

pub use handlers::{health_handler, metrics_handler};

// ============================================================================
// Metrics Module - Prometheus counters for domain outcomes
// ============================================================================
//
// - Guest directory operations (create/update/delete/...)
// - Access registry operations (register/check/me/...)
// - Bulk import rows
//
// Outcome label is `ok` or the lower-case failure kind. Scraped via /metrics.
// ============================================================================

pub const OUTCOME_OK: &str = "ok";

pub struct Metrics {
    registry: Registry,

    pub guest_operations: IntCounterVec,
    pub credential_operations: IntCounterVec,
    pub import_rows: IntCounterVec,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let guest_operations = IntCounterVec::new(
            Opts::new("guest_operations_total", "Guest directory operations by outcome"),
            &["operation", "outcome"],
        )?;
        registry.register(Box::new(guest_operations.clone()))?;

        let credential_operations = IntCounterVec::new(
            Opts::new("credential_operations_total", "Access registry operations by outcome"),
            &["operation", "outcome"],
        )?;
        registry.register(Box::new(credential_operations.clone()))?;

        let import_rows = IntCounterVec::new(
            Opts::new("import_rows_total", "Bulk import rows by outcome"),
            &["outcome"],
        )?;
        registry.register(Box::new(import_rows.clone()))?;

        Ok(Self {
            registry,
            guest_operations,
            credential_operations,
            import_rows,
        })
    }

    /// Get the Prometheus registry for exposing metrics via HTTP
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_guest_operation(&self, operation: &str, failure: Option<ErrorKind>) {
        self.guest_operations
            .with_label_values(&[operation, outcome(failure)])
            .inc();
    }

    pub fn record_credential_operation(&self, operation: &str, failure: Option<ErrorKind>) {
        self.credential_operations
            .with_label_values(&[operation, outcome(failure)])
            .inc();
    }

    pub fn record_import_row(&self, failure: Option<ErrorKind>) {
        self.import_rows.with_label_values(&[outcome(failure)]).inc();
    }
}

fn outcome(failure: Option<ErrorKind>) -> &'static str {
    failure.map(|kind| kind.as_str()).unwrap_or(OUTCOME_OK)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter_value(metrics: &Metrics, name: &str, labels: &[(&str, &str)]) -> Option<f64> {
        metrics
            .registry()
            .gather()
            .iter()
            .find(|family| family.name() == name)?
            .metric
            .iter()
            .find(|m| {
                labels
                    .iter()
                    .all(|(k, v)| m.label.iter().any(|l| l.name() == *k && l.value() == *v))
            })
            .and_then(|m| m.counter.value)
    }

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new().unwrap();
        metrics.record_guest_operation("create", None);
        metrics.record_credential_operation("register", None);
        metrics.record_import_row(None);
        assert_eq!(metrics.registry().gather().len(), 3);
    }

    #[test]
    fn test_outcome_labels() {
        let metrics = Metrics::new().unwrap();
        metrics.record_guest_operation("create", None);
        metrics.record_guest_operation("create", Some(ErrorKind::Conflict));
        metrics.record_guest_operation("create", Some(ErrorKind::Conflict));

        assert_eq!(
            counter_value(&metrics, "guest_operations_total", &[("operation", "create"), ("outcome", "ok")]),
            Some(1.0)
        );
        assert_eq!(
            counter_value(&metrics, "guest_operations_total", &[("outcome", "conflict")]),
            Some(2.0)
        );
    }

    #[test]
    fn test_import_rows() {
        let metrics = Metrics::new().unwrap();
        metrics.record_import_row(None);
        metrics.record_import_row(Some(ErrorKind::Validation));

        assert_eq!(
            counter_value(&metrics, "import_rows_total", &[("outcome", "validation")]),
            Some(1.0)
        );
    }
}
