//! Constructs the desired `IngressController` object for a zone or for the
//! default multi-zone controller, and decides whether an observed object
//! actually needs a write.

use std::collections::BTreeMap;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use kube::{Resource, ResourceExt};

use crate::apis::ingresscontroller::{
    HARD_STOP_AFTER_ANNOTATION, RELOAD_INTERVAL_OVERRIDE_KEY, TOPOLOGY_ZONE_LABEL, WORKER_NODE_LABEL,
};
use crate::apis::{EndpointPublishingStrategy, EndpointPublishingStrategyType, IngressController, IngressControllerSpec, NodePlacement};

pub const MANAGED_BY_LABEL: &str = "app.kubernetes.io/managed-by";
pub const MANAGED_BY_VALUE: &str = "ingress-capacity-controller";

/// Minimum drop in replicas hysteresis allows through in a single reconcile.
pub const MIN_REPLICA_REDUCTION: i32 = 1;

#[derive(Clone, Debug)]
pub struct DesiredIngressController {
    pub name: String,
    pub namespace: String,
    pub domain: String,
    pub computed_replicas: i32,
    pub route_selector: BTreeMap<String, String>,
    pub zone: Option<String>,
    pub worker_node_count: usize,
    pub strategy: EndpointPublishingStrategyType,
    pub hard_stop_after: String,
    pub reload_interval_seconds: i64,
}

/// Builds the candidate object, applying hysteresis and the HA floor, and
/// preserving any fields on `existing` this crate doesn't manage.
pub fn build(desired: &DesiredIngressController, existing: Option<&IngressController>) -> IngressController {
    let mut controller = existing.cloned().unwrap_or_else(|| {
        IngressController::new(&desired.name, IngressControllerSpec {
            domain: None,
            replicas: None,
            route_selector: None,
            node_placement: None,
            endpoint_publishing_strategy: None,
            unsupported_config_overrides: None,
        })
    });

    let mut replicas = desired.computed_replicas;
    if let Some(existing_replicas) = existing.and_then(|e| e.spec.replicas) {
        if existing_replicas - replicas <= MIN_REPLICA_REDUCTION {
            replicas = existing_replicas;
        }
    }
    if replicas == 1 && desired.worker_node_count > 3 {
        replicas = 2;
    }

    controller.meta_mut().name = Some(desired.name.clone());
    controller.meta_mut().namespace = Some(desired.namespace.clone());
    let mut labels = controller.labels().clone();
    labels.insert(MANAGED_BY_LABEL.to_string(), MANAGED_BY_VALUE.to_string());
    controller.meta_mut().labels = Some(labels);

    controller.spec.domain = Some(desired.domain.clone());
    controller.spec.replicas = Some(replicas);
    controller.spec.route_selector = Some(LabelSelector {
        match_labels: Some(desired.route_selector.clone()),
        match_expressions: None,
    });
    controller.spec.endpoint_publishing_strategy = Some(EndpointPublishingStrategy {
        strategy_type: desired.strategy,
    });

    match desired.zone.as_deref() {
        Some(zone) if !zone.is_empty() => {
            let mut match_labels = BTreeMap::new();
            match_labels.insert(TOPOLOGY_ZONE_LABEL.to_string(), zone.to_string());
            match_labels.insert(WORKER_NODE_LABEL.to_string(), String::new());
            controller.spec.node_placement = Some(NodePlacement {
                node_selector: Some(LabelSelector {
                    match_labels: Some(match_labels),
                    match_expressions: None,
                }),
            });
        }
        _ => {}
    }

    let mut annotations = controller.annotations().clone();
    if !desired.hard_stop_after.trim().is_empty() {
        annotations.insert(HARD_STOP_AFTER_ANNOTATION.to_string(), desired.hard_stop_after.clone());
    } else {
        annotations.remove(HARD_STOP_AFTER_ANNOTATION);
    }
    controller.meta_mut().annotations = if annotations.is_empty() { None } else { Some(annotations) };

    let mut overrides = controller.spec.unsupported_config_overrides.clone().unwrap_or_default();
    if desired.reload_interval_seconds > 0 {
        overrides.insert(
            RELOAD_INTERVAL_OVERRIDE_KEY.to_string(),
            serde_json::json!(desired.reload_interval_seconds),
        );
    } else {
        overrides.remove(RELOAD_INTERVAL_OVERRIDE_KEY);
    }
    controller.spec.unsupported_config_overrides = if overrides.is_empty() { None } else { Some(overrides) };

    controller
}

/// Only write if the diff between what's observed and what's desired
/// contains something other than an `add` — i.e. a field we own actually
/// changed, or a foreign field we dropped by round-tripping through our
/// (intentionally partial) struct. Pure additions mean our struct simply
/// doesn't model a field the apiserver already has; leave it alone.
pub fn needs_write(existing: Option<&IngressController>, desired: &IngressController) -> bool {
    let Some(existing) = existing else {
        return true;
    };
    let existing_json = serde_json::to_value(existing).unwrap_or_default();
    let desired_json = serde_json::to_value(desired).unwrap_or_default();
    let patch = json_patch::diff(&existing_json, &desired_json);
    patch.0.iter().any(|op| !matches!(op, json_patch::PatchOperation::Add(_)))
}
