use std::collections::HashMap;

use prometheus::{
    histogram_opts, labels, opts, register_histogram_vec_with_registry,
    register_int_counter_vec_with_registry, Encoder, HistogramVec, IntCounterVec, Registry,
};

const NAMESPACE: &str = "teleport";

/// Macro to prefix a string with the namespace.
macro_rules! namespaced {
    ($name:expr) => {
        format!("{}_{}", NAMESPACE, $name)
    };
}

/// Metrics shared by every teleport agent
#[derive(Debug, Clone)]
pub struct CoreMetrics {
    /// Metrics registry for adding new metrics and gathering reports
    registry: Registry,
    const_labels: HashMap<String, String>,
    agent_name: String,

    span_durations: HistogramVec,
    relay_tasks: IntCounterVec,
    attestation_polls: IntCounterVec,
}

impl CoreMetrics {
    /// Track metrics for a particular agent name.
    pub fn new(for_agent: &str, registry: Registry) -> prometheus::Result<Self> {
        let const_labels: HashMap<String, String> = labels! {
            namespaced!("baselib_version") => env!("CARGO_PKG_VERSION").into(),
            "agent".into() => for_agent.into(),
        };
        let const_labels_ref = const_labels
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect::<HashMap<_, _>>();

        let span_durations = register_histogram_vec_with_registry!(
            histogram_opts!(
                namespaced!("span_duration_seconds"),
                "Duration from tracing span creation to span destruction",
                vec![0.005, 0.05, 0.5, 2.0, 10.0, 60.0, 300.0],
                const_labels.clone()
            ),
            &["span_name", "span_target"],
            registry
        )?;

        let relay_tasks = register_int_counter_vec_with_registry!(
            opts!(
                namespaced!("relay_tasks_total"),
                "Relay tasks that reached a terminal state",
                const_labels_ref
            ),
            &["outcome"],
            registry
        )?;

        let attestation_polls = register_int_counter_vec_with_registry!(
            opts!(
                namespaced!("attestation_polls_total"),
                "Polls of the oracle signature source",
                const_labels_ref
            ),
            &["result"],
            registry
        )?;

        Ok(Self {
            registry,
            const_labels,
            agent_name: for_agent.into(),
            span_durations,
            relay_tasks,
            attestation_polls,
        })
    }

    /// Create and register a new int counter vec on this registry, sharing
    /// the const labels.
    pub fn new_int_counter(
        &self,
        metric_name: &str,
        help: &str,
        labels: &[&str],
    ) -> prometheus::Result<IntCounterVec> {
        let const_labels_ref = self
            .const_labels
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect::<HashMap<_, _>>();
        register_int_counter_vec_with_registry!(
            opts!(namespaced!(metric_name), help, const_labels_ref),
            labels,
            self.registry
        )
    }

    /// Histogram of span lifetimes.
    ///
    /// Labels:
    /// - `span_name`: name of the span. e.g. the function name.
    /// - `span_target`: module path of the span.
    pub fn span_duration_seconds(&self) -> HistogramVec {
        self.span_durations.clone()
    }

    /// Relay tasks that finished.
    ///
    /// Labels:
    /// - `outcome`: `executed`, `failed` or `timeout`.
    pub fn relay_tasks(&self) -> IntCounterVec {
        self.relay_tasks.clone()
    }

    /// Oracle signature polls.
    ///
    /// Labels:
    /// - `result`: `ok` or `error`.
    pub fn attestation_polls(&self) -> IntCounterVec {
        self.attestation_polls.clone()
    }

    /// Gather available metrics into an encoded (plaintext, OpenMetrics format)
    /// report.
    pub fn gather(&self) -> prometheus::Result<Vec<u8>> {
        let collected_metrics = self.registry.gather();
        let mut out_buf = Vec::with_capacity(1024 * 64);
        let encoder = prometheus::TextEncoder::new();
        encoder.encode(&collected_metrics, &mut out_buf)?;
        Ok(out_buf)
    }

    /// Get the name of this agent, e.g. "keeper"
    pub fn agent_name(&self) -> &str {
        &self.agent_name
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn report_contains_namespaced_counters() {
        let metrics = CoreMetrics::new("keeper", Registry::new()).unwrap();
        metrics.relay_tasks().with_label_values(&["executed"]).inc();
        let flushes = metrics
            .new_int_counter("flushes_total", "Flushes", &["pair"])
            .unwrap();
        flushes.with_label_values(&["OPT-MAIN-A>ETH-MAIN-A"]).inc();

        let report = String::from_utf8(metrics.gather().unwrap()).unwrap();
        assert!(report.contains("teleport_relay_tasks_total"));
        assert!(report.contains("teleport_flushes_total"));
        assert!(report.contains(r#"agent="keeper""#));
        assert_eq!(metrics.agent_name(), "keeper");
    }
}
