use std::collections::BTreeMap;

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Strimzi's static quota plugin config keys, read out of `spec.kafka.config`.
pub const PRODUCE_QUOTA_CONFIG_KEY: &str = "client.quota.callback.static.produce";
pub const FETCH_QUOTA_CONFIG_KEY: &str = "client.quota.callback.static.fetch";

/// A `kafka.strimzi.io/v1beta2` `Kafka`. This crate only reads it, so the
/// spec is kept to the fields the capacity model and route projection
/// actually consult.
#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, JsonSchema)]
#[cfg_attr(test, derive(Default))]
#[kube(group = "kafka.strimzi.io", version = "v1beta2", kind = "Kafka", namespaced)]
#[kube(status = "KafkaStatus")]
#[allow(non_snake_case)]
pub struct KafkaSpec {
    pub kafka: KafkaClusterSpec,
}

#[derive(Deserialize, Serialize, Clone, Debug, JsonSchema, Default)]
pub struct KafkaClusterSpec {
    pub replicas: i32,
    #[serde(default)]
    pub listeners: Vec<KafkaListener>,
    #[serde(default)]
    pub config: BTreeMap<String, Value>,
}

#[derive(Deserialize, Serialize, Clone, Debug, JsonSchema, Default)]
pub struct KafkaListener {
    pub name: String,
    #[serde(rename = "type")]
    pub listener_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration: Option<KafkaListenerConfiguration>,
}

#[derive(Deserialize, Serialize, Clone, Debug, JsonSchema, Default)]
pub struct KafkaListenerConfiguration {
    #[serde(
        rename = "maxConnections",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub max_connections: Option<i64>,
}

#[derive(Deserialize, Serialize, Clone, Debug, JsonSchema, Default)]
pub struct KafkaStatus {
    #[serde(default)]
    pub conditions: Vec<Value>,
}

/// A listener is "external" for this subsystem's purposes if it's reachable
/// through the ingress layer rather than only in-cluster.
fn is_external(listener_type: &str) -> bool {
    matches!(listener_type, "route" | "loadbalancer" | "ingress")
}

impl Kafka {
    pub fn external_listener(&self) -> Option<&KafkaListener> {
        self.spec.kafka.listeners.iter().find(|l| is_external(&l.listener_type))
    }

    pub fn max_connections(&self) -> Option<i64> {
        self.external_listener()?.configuration.as_ref()?.max_connections
    }

    pub fn produce_quota_bytes(&self) -> Option<i64> {
        quota_from_config(&self.spec.kafka.config, PRODUCE_QUOTA_CONFIG_KEY)
    }

    pub fn fetch_quota_bytes(&self) -> Option<i64> {
        quota_from_config(&self.spec.kafka.config, FETCH_QUOTA_CONFIG_KEY)
    }

    pub fn replicas(&self) -> i32 {
        self.spec.kafka.replicas
    }
}

fn quota_from_config(config: &BTreeMap<String, Value>, key: &str) -> Option<i64> {
    match config.get(key)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}
