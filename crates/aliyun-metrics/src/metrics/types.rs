use std::sync::Arc;

use aliyun_common::error::{ExporterError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
    Counter,
    Gauge,
    Histogram,
}

impl MetricType {
    pub fn as_prometheus_type(&self) -> &'static str {
        match self {
            Self::Counter => "counter",
            Self::Gauge => "gauge",
            Self::Histogram => "histogram",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricDescriptor {
    pub name: String,
    pub help: String,
    pub metric_type: MetricType,
    pub variable_labels: Vec<String>,
}

impl MetricDescriptor {
    pub fn gauge(name: impl Into<String>, help: impl Into<String>, variable_labels: &[&str]) -> Self {
        Self {
            name: name.into(),
            help: help.into(),
            metric_type: MetricType::Gauge,
            variable_labels: variable_labels.iter().map(|label| (*label).to_string()).collect(),
        }
    }

    pub fn arity(&self) -> usize {
        self.variable_labels.len()
    }
}

#[derive(Debug, Clone)]
pub enum MetricValue {
    Counter(f64),
    Gauge(f64),
    Histogram {
        buckets: Vec<(f64, u64)>,
        count: u64,
        sum: f64,
    },
}

#[derive(Debug, Clone)]
pub struct MetricSample {
    pub labels: Vec<(String, String)>,
    pub value: MetricValue,
}

#[derive(Debug, Clone)]
pub struct CollectedMetric {
    pub descriptor: MetricDescriptor,
    pub samples: Vec<MetricSample>,
}

/// One gauge value produced on demand by a [`Collector`](super::Collector).
///
/// Label values are positional and always match the descriptor's label
/// schema in length; construction fails otherwise.
#[derive(Debug, Clone)]
pub struct ConstSample {
    descriptor: Arc<MetricDescriptor>,
    label_values: Vec<String>,
    value: f64,
}

impl ConstSample {
    pub fn new(
        descriptor: &Arc<MetricDescriptor>,
        label_values: Vec<String>,
        value: f64,
    ) -> Result<Self> {
        if label_values.len() != descriptor.arity() {
            return Err(ExporterError::LabelArity {
                metric: descriptor.name.clone(),
                expected: descriptor.arity(),
                actual: label_values.len(),
            });
        }

        Ok(Self {
            descriptor: Arc::clone(descriptor),
            label_values,
            value,
        })
    }

    pub fn descriptor(&self) -> &MetricDescriptor {
        &self.descriptor
    }

    pub fn label_values(&self) -> &[String] {
        &self.label_values
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn label(&self, name: &str) -> Option<&str> {
        self.descriptor
            .variable_labels
            .iter()
            .position(|label| label == name)
            .and_then(|index| self.label_values.get(index))
            .map(String::as_str)
    }

    pub(crate) fn into_metric_sample(self) -> MetricSample {
        let labels = self
            .descriptor
            .variable_labels
            .iter()
            .cloned()
            .zip(self.label_values)
            .collect();

        MetricSample {
            labels,
            value: match self.descriptor.metric_type {
                MetricType::Counter => MetricValue::Counter(self.value),
                _ => MetricValue::Gauge(self.value),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn const_sample_rejects_short_label_tuple() {
        let descriptor = Arc::new(MetricDescriptor::gauge(
            "aliyun_eip_net_rx_rate",
            "Inbound bandwidth",
            &["user_id", "instance_id", "ip"],
        ));

        let err = ConstSample::new(&descriptor, vec!["u".into(), "eip-1".into()], 1.0).unwrap_err();
        assert!(matches!(
            err,
            ExporterError::LabelArity {
                expected: 3,
                actual: 2,
                ..
            }
        ));
    }

    #[test]
    fn const_sample_resolves_labels_by_name() {
        let descriptor = Arc::new(MetricDescriptor::gauge(
            "aliyun_eip_net_rx_rate",
            "Inbound bandwidth",
            &["user_id", "instance_id", "ip"],
        ));

        let sample = ConstSample::new(
            &descriptor,
            vec!["u".into(), "eip-1".into(), String::new()],
            2.5,
        )
        .unwrap();

        assert_eq!(sample.label("instance_id"), Some("eip-1"));
        assert_eq!(sample.label("ip"), Some(""));
        assert_eq!(sample.label("port"), None);
    }
}
