use std::collections::BTreeMap;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const TOPOLOGY_ZONE_LABEL: &str = "topology.kubernetes.io/zone";
pub const WORKER_NODE_LABEL: &str = "node-role.kubernetes.io/worker";
pub const INFRA_NODE_LABEL: &str = "node-role.kubernetes.io/infra";
pub const HARD_STOP_AFTER_ANNOTATION: &str = "ingress.operator.openshift.io/hard-stop-after";
pub const OWNING_INGRESSCONTROLLER_LABEL: &str =
    "ingresscontroller.operator.openshift.io/owning-ingresscontroller";
pub const RELOAD_INTERVAL_OVERRIDE_KEY: &str = "reloadInterval";

/// An `operator.openshift.io/v1` `IngressController`. This crate both reads
/// and writes these, so the spec carries the fields the builder manages plus
/// an escape hatch for everything else (`unsupported_config_overrides`).
#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, JsonSchema)]
#[cfg_attr(test, derive(Default))]
#[kube(
    group = "operator.openshift.io",
    version = "v1",
    kind = "IngressController",
    namespaced
)]
#[kube(status = "IngressControllerStatus")]
pub struct IngressControllerSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replicas: Option<i32>,
    #[serde(default, rename = "routeSelector", skip_serializing_if = "Option::is_none")]
    pub route_selector: Option<LabelSelector>,
    #[serde(default, rename = "nodePlacement", skip_serializing_if = "Option::is_none")]
    pub node_placement: Option<NodePlacement>,
    #[serde(
        default,
        rename = "endpointPublishingStrategy",
        skip_serializing_if = "Option::is_none"
    )]
    pub endpoint_publishing_strategy: Option<EndpointPublishingStrategy>,
    #[serde(
        default,
        rename = "unsupportedConfigOverrides",
        skip_serializing_if = "Option::is_none"
    )]
    pub unsupported_config_overrides: Option<BTreeMap<String, Value>>,
}

#[derive(Deserialize, Serialize, Clone, Debug, JsonSchema, Default, PartialEq)]
pub struct NodePlacement {
    #[serde(default, rename = "nodeSelector", skip_serializing_if = "Option::is_none")]
    pub node_selector: Option<LabelSelector>,
}

#[derive(Deserialize, Serialize, Clone, Debug, JsonSchema, PartialEq)]
pub struct EndpointPublishingStrategy {
    #[serde(rename = "type")]
    pub strategy_type: EndpointPublishingStrategyType,
}

/// Mirrors the literal set of publishing strategies this subsystem is
/// allowed to pick between; the nested AWS NLB provider detail some
/// OpenShift clusters need is deliberately out of scope here.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, JsonSchema, PartialEq, Eq)]
pub enum EndpointPublishingStrategyType {
    LoadBalancerService,
    External,
    Aws,
    Nlb,
}

#[derive(Deserialize, Serialize, Clone, Debug, JsonSchema, Default)]
pub struct IngressControllerStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

impl IngressController {
    /// The domain this controller has actually been assigned by the
    /// ingress operator, falling back to the spec's requested domain.
    pub fn observed_domain(&self) -> Option<&str> {
        self.status
            .as_ref()
            .and_then(|s| s.domain.as_deref())
            .or(self.spec.domain.as_deref())
    }
}
