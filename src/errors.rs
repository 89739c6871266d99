use thiserror::Error;

/// Errors surfaced by the pure, Kubernetes-unaware modules: the capacity
/// model and the ingress controller builder.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValueError {
    #[error("per-replica ingress throughput budget is negative: max_ingress_throughput ({max_ingress_throughput}) is smaller than the reserved replication and burst headroom ({reserved})")]
    ConfigurationUnsatisfiable {
        max_ingress_throughput: i64,
        reserved: i64,
    },

    #[error("Kafka {0} is missing a required quota on its external listener")]
    MissingQuota(String),

    #[error("invalid value: {0}")]
    Invalid(String),
}

/// Errors surfaced by the reconciler and router deployment patcher, which do
/// talk to the Kubernetes API.
#[derive(Error, Debug)]
pub enum OperatorError {
    #[error("KubeErr: {0}")]
    KubeErr(#[from] kube::Error),

    #[error("SerializationError: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("ValueError: {0}")]
    ValueError(#[from] ValueError),

    #[error("router deployment {0} has {1} containers, expected exactly 1")]
    UnexpectedContainerCount(String, usize),

    #[error("informer caches not yet ready, skipping reconcile")]
    NotReady,
}

pub type Result<T, E = OperatorError> = std::result::Result<T, E>;

impl OperatorError {
    /// A low-cardinality label suitable for a Prometheus metric.
    pub fn metric_label(&self) -> &'static str {
        match self {
            OperatorError::KubeErr(_) => "kube_error",
            OperatorError::SerializationError(_) => "serialization_error",
            OperatorError::ValueError(_) => "value_error",
            OperatorError::UnexpectedContainerCount(..) => "unexpected_container_count",
            OperatorError::NotReady => "not_ready",
        }
    }
}
