use std::env;

use crate::errors::ValueError;

/// Process configuration for the ingress capacity controller, bound once per
/// reconcile from environment variables (mirroring the dotted
/// `ingresscontroller.*` keys in SPEC_FULL.md §6, upper-cased and
/// underscore-joined).
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Quantity string, e.g. "500m". Any of the four resource knobs being
    /// present activates the router deployment patcher.
    pub limit_cpu: Option<String>,
    pub limit_memory: Option<String>,
    pub request_cpu: Option<String>,
    pub request_memory: Option<String>,

    pub default_replica_count: Option<i32>,
    pub az_replica_count: Option<i32>,

    pub max_ingress_throughput_bytes: i64,
    pub max_ingress_connections: i64,
    pub peak_throughput_percentage: i64,

    /// Blank disables the `hard-stop-after` annotation.
    pub hard_stop_after: String,
    pub ingress_container_command: Vec<String>,
    /// `<= 0` disables the `reloadInterval` unsupported override.
    pub reload_interval_seconds: i64,

    pub ingress_operator_namespace: String,
    pub ingress_router_namespace: String,
    pub reconcile_interval_seconds: u64,
    pub debounce_millis: u64,
    /// Fallback cluster domain used only when the default `kas`
    /// IngressController has no domain yet (see DESIGN.md Open Questions).
    pub default_ingress_domain: String,
    pub metrics_port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            limit_cpu: from_env_opt("INGRESSCONTROLLER_LIMIT_CPU"),
            limit_memory: from_env_opt("INGRESSCONTROLLER_LIMIT_MEMORY"),
            request_cpu: from_env_opt("INGRESSCONTROLLER_REQUEST_CPU"),
            request_memory: from_env_opt("INGRESSCONTROLLER_REQUEST_MEMORY"),

            default_replica_count: from_env_opt("INGRESSCONTROLLER_DEFAULT_REPLICA_COUNT")
                .map(|v| v.parse().expect("INGRESSCONTROLLER_DEFAULT_REPLICA_COUNT must be an integer")),
            az_replica_count: from_env_opt("INGRESSCONTROLLER_AZ_REPLICA_COUNT")
                .map(|v| v.parse().expect("INGRESSCONTROLLER_AZ_REPLICA_COUNT must be an integer")),

            max_ingress_throughput_bytes: parse_quantity_bytes(&from_env_default(
                "INGRESSCONTROLLER_MAX_INGRESS_THROUGHPUT",
                "300Mi",
            ))
            .expect("INGRESSCONTROLLER_MAX_INGRESS_THROUGHPUT must be a valid Kubernetes quantity"),
            max_ingress_connections: from_env_default("INGRESSCONTROLLER_MAX_INGRESS_CONNECTIONS", "10000")
                .parse()
                .expect("INGRESSCONTROLLER_MAX_INGRESS_CONNECTIONS must be an integer"),
            peak_throughput_percentage: from_env_default("INGRESSCONTROLLER_PEAK_THROUGHPUT_PERCENTAGE", "100")
                .parse()
                .expect("INGRESSCONTROLLER_PEAK_THROUGHPUT_PERCENTAGE must be an integer"),

            hard_stop_after: from_env_default("INGRESSCONTROLLER_HARD_STOP_AFTER", ""),
            ingress_container_command: from_env_opt("INGRESSCONTROLLER_INGRESS_CONTAINER_COMMAND")
                .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or_default(),
            reload_interval_seconds: from_env_default("INGRESSCONTROLLER_RELOAD_INTERVAL_SECONDS", "0")
                .parse()
                .expect("INGRESSCONTROLLER_RELOAD_INTERVAL_SECONDS must be an integer"),

            ingress_operator_namespace: from_env_default(
                "INGRESS_OPERATOR_NAMESPACE",
                "openshift-ingress-operator",
            ),
            ingress_router_namespace: from_env_default("INGRESS_ROUTER_NAMESPACE", "openshift-ingress"),
            reconcile_interval_seconds: from_env_default("RECONCILE_INTERVAL_SECONDS", "180")
                .parse()
                .expect("RECONCILE_INTERVAL_SECONDS must be an integer"),
            debounce_millis: from_env_default("DEBOUNCE_MILLIS", "2000")
                .parse()
                .expect("DEBOUNCE_MILLIS must be an integer"),
            default_ingress_domain: from_env_default("CLUSTER_DOMAIN", "apps.testing.domain.tld"),
            metrics_port: from_env_default("PORT", "8080")
                .parse()
                .expect("PORT must be an integer"),
        }
    }
}

impl Config {
    /// The router deployment patcher is only active when at least one of the
    /// four resource knobs is configured (SPEC_FULL.md §4.6).
    pub fn router_patcher_active(&self) -> bool {
        self.limit_cpu.is_some()
            || self.limit_memory.is_some()
            || self.request_cpu.is_some()
            || self.request_memory.is_some()
    }
}

fn from_env_default(var: &str, default: &str) -> String {
    env::var(var).unwrap_or_else(|_| default.to_owned())
}

fn from_env_opt(var: &str) -> Option<String> {
    env::var(var).ok().filter(|v| !v.is_empty())
}

/// Parses a Kubernetes quantity string (e.g. "300Mi", "512Ki", "2G") into a
/// byte count. Supports the binary (`Ki/Mi/Gi/Ti`) and decimal (`k/M/G/T`)
/// suffix families; a bare integer is interpreted as bytes.
pub fn parse_quantity_bytes(q: &str) -> std::result::Result<i64, ValueError> {
    let q = q.trim();
    const BINARY: [(&str, i64); 4] = [
        ("Ki", 1024),
        ("Mi", 1024 * 1024),
        ("Gi", 1024 * 1024 * 1024),
        ("Ti", 1024 * 1024 * 1024 * 1024),
    ];
    const DECIMAL: [(&str, i64); 4] = [
        ("k", 1_000),
        ("M", 1_000_000),
        ("G", 1_000_000_000),
        ("T", 1_000_000_000_000),
    ];
    for (suffix, multiplier) in BINARY.iter() {
        if let Some(num) = q.strip_suffix(suffix) {
            let value: f64 = num
                .parse()
                .map_err(|_| ValueError::Invalid(format!("invalid quantity: {q}")))?;
            return Ok((value * *multiplier as f64) as i64);
        }
    }
    for (suffix, multiplier) in DECIMAL.iter() {
        if let Some(num) = q.strip_suffix(suffix) {
            let value: f64 = num
                .parse()
                .map_err(|_| ValueError::Invalid(format!("invalid quantity: {q}")))?;
            return Ok((value * *multiplier as f64) as i64);
        }
    }
    q.parse()
        .map_err(|_| ValueError::Invalid(format!("invalid quantity: {q}")))
}
