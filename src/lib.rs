/// Externally-owned CRD and core Kubernetes type definitions this crate reads and writes
pub mod apis;
/// Desired-state construction for IngressController and router Deployment objects
pub mod builder;
/// Pure replica-count and connection-demand formulas
pub mod capacity;
/// Environment-bound process configuration
pub mod config;
pub mod errors;
/// List/watch caches over the Kubernetes objects this controller depends on
pub mod informers;
/// Prometheus metrics
pub mod metrics;
/// The serialized reconcile pass
pub mod reconciler;
/// Derives the set of routes a Kafka's brokers need fronted
pub mod route_projection;
/// Debounced patcher for router Deployment resources
pub mod router_patcher;
/// Periodic reconcile trigger
pub mod scheduler;
/// Log and trace integrations
pub mod telemetry;

#[cfg(test)]
pub mod fixtures;

pub use config::Config;
pub use errors::{OperatorError, Result, ValueError};
pub use metrics::Metrics;
pub use reconciler::{run, Context, Diagnostics, State};
