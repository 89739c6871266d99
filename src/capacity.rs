//! Pure, side-effect-free replica-count and connection-demand formulas. No
//! Kubernetes I/O happens here; every function is deterministic given its
//! inputs, which makes this the easiest module in the crate to test.

use kube::Resource;

use crate::apis::Kafka;
use crate::errors::ValueError;

const ONE_MIB: f64 = 1024.0 * 1024.0;

/// A byte-valued summary over a set of per-broker-replica quota samples.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ByteSummary {
    pub sum: i64,
    pub max: i64,
}

/// Builds a [`ByteSummary`] from a list of Kafkas, where each Kafka
/// contributes `replicas` copies of whatever `extract` returns for it. A
/// Kafka for which `extract` returns `None` falls back to `default`; if
/// neither is available the Kafka is reported as missing a required quota.
pub fn build_summary<'a>(
    kafkas: impl IntoIterator<Item = &'a Kafka>,
    mut extract: impl FnMut(&Kafka) -> Option<i64>,
    default: Option<i64>,
) -> Result<ByteSummary, ValueError> {
    let mut sum: i64 = 0;
    let mut max: i64 = 0;
    for kafka in kafkas {
        let value = extract(kafka).or(default).ok_or_else(|| {
            ValueError::MissingQuota(kafka.meta().name.clone().unwrap_or_default())
        })?;
        let replicas = i64::from(kafka.replicas().max(0));
        sum += value * replicas;
        max = max.max(value);
    }
    Ok(ByteSummary { sum, max })
}

/// Configuration consumed by [`replicas_for_zone`].
#[derive(Clone, Copy, Debug)]
pub struct ZoneCapacityConfig {
    pub max_ingress_throughput_bytes: i64,
    pub max_ingress_connections: i64,
    pub peak_percentage: i64,
    pub az_replica_override: Option<i32>,
}

/// Turns ingress/egress throughput summaries, connection demand, and a
/// zone's fractional share of the fleet into the replica count that zone's
/// ingress controller needs, per §4.2 of the capacity model.
pub fn replicas_for_zone(
    ingress: &ByteSummary,
    egress: &ByteSummary,
    connection_demand: i64,
    zone_fraction: f64,
    config: &ZoneCapacityConfig,
) -> Result<i32, ValueError> {
    if let Some(override_value) = config.az_replica_override {
        return Ok(override_value);
    }

    let throughput = (egress.max + ingress.max) as f64 / 2.0;
    let replication_throughput = ingress.max as f64 * 2.0;
    let reserved = replication_throughput + throughput / 2.0 + ONE_MIB;
    let per_replica_bytes = config.max_ingress_throughput_bytes as f64 - reserved;
    if per_replica_bytes < 0.0 {
        return Err(ValueError::ConfigurationUnsatisfiable {
            max_ingress_throughput: config.max_ingress_throughput_bytes,
            reserved: reserved as i64,
        });
    }

    let demand = (egress.sum + ingress.sum) as f64 * zone_fraction / 2.0 * (config.peak_percentage as f64 / 100.0);
    let throughput_replicas = (demand / per_replica_bytes).ceil() as i32;
    let conn_replicas =
        ((connection_demand as f64 * zone_fraction) / config.max_ingress_connections as f64).ceil() as i32;

    Ok(1.max(throughput_replicas).max(conn_replicas))
}

/// Configuration consumed by [`replicas_for_default`].
#[derive(Clone, Copy, Debug)]
pub struct DefaultCapacityConfig {
    pub max_ingress_connections: i64,
    pub default_replica_override: Option<i32>,
}

pub fn replicas_for_default(connection_demand: i64, config: &DefaultCapacityConfig) -> i32 {
    if let Some(override_value) = config.default_replica_override {
        return override_value;
    }
    (connection_demand as f64 / config.max_ingress_connections as f64).ceil() as i32
}

/// Sums `maxConnections * replicas` across every Kafka that declares an
/// external listener with a connection limit; Kafkas without one contribute 0.
pub fn connection_demand(kafkas: &[Kafka]) -> i64 {
    kafkas
        .iter()
        .map(|k| k.max_connections().map(|max_conn| max_conn * i64::from(k.replicas())).unwrap_or(0))
        .sum()
}
