//! Derives the externally resolvable route endpoints for a managed Kafka:
//! the fixed bootstrap/admin-server entries plus one entry per broker route,
//! each carrying the router domain of whichever zone (or the default
//! multi-zone controller) actually fronts it.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{Node, Pod, Service};
use kube::{Resource, ResourceExt};

use crate::apis::ingresscontroller::TOPOLOGY_ZONE_LABEL;
use crate::apis::{IngressController, Kafka, Route};

pub const BOOTSTRAP_ROUTE_NAME: &str = "bootstrap";
pub const ADMIN_SERVER_ROUTE_NAME: &str = "admin-server";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ManagedKafkaRoute {
    pub name: String,
    pub prefix: String,
    pub router_domain: String,
}

/// Projects the route set for `kafka`. `kas_controller` is the default
/// multi-zone controller; `zone_controllers` is keyed by zone name.
pub fn project_routes(
    kafka: &Kafka,
    kas_controller: Option<&IngressController>,
    zone_controllers: &BTreeMap<String, IngressController>,
    routes: &[Route],
    services: &[Service],
    pods: &[Pod],
    nodes: &[Node],
) -> Vec<ManagedKafkaRoute> {
    let kas_domain = kas_controller.and_then(IngressController::observed_domain).unwrap_or("");
    let multi_zone_domain = router_domain_for(kas_domain);

    let mut out = vec![
        ManagedKafkaRoute {
            name: BOOTSTRAP_ROUTE_NAME.to_string(),
            prefix: String::new(),
            router_domain: multi_zone_domain.clone(),
        },
        ManagedKafkaRoute {
            name: ADMIN_SERVER_ROUTE_NAME.to_string(),
            prefix: ADMIN_SERVER_ROUTE_NAME.to_string(),
            router_domain: multi_zone_domain,
        },
    ];

    let kafka_name = kafka.name_any();
    for route in routes {
        if route.namespace() != kafka.namespace() {
            continue;
        }
        if !route.is_broker_route() || !owned_by_kafka(route, &kafka_name) {
            continue;
        }

        let domain = resolve_zone(route, services, pods, nodes)
            .and_then(|zone| zone_controllers.get(&zone))
            .and_then(IngressController::observed_domain)
            .map(router_domain_for)
            .unwrap_or_default();

        let host = &route.spec.host;
        let prefix = strip_bootstrap_suffix(host, kas_domain).unwrap_or_else(|| host.clone());

        out.push(ManagedKafkaRoute {
            name: prefix.clone(),
            prefix,
            router_domain: domain,
        });
    }

    out.sort_by(|a, b| a.name.cmp(&b.name));
    out
}

fn router_domain_for(domain: &str) -> String {
    if domain.is_empty() {
        String::new()
    } else {
        format!("ingresscontroller.{domain}")
    }
}

/// Broker route hosts are `<prefix>-<bootstrapDomain>`; `bootstrapDomain` is
/// the same domain the `kas` controller contributes to the bootstrap/
/// admin-server entries, so stripping it recovers the broker's prefix.
fn strip_bootstrap_suffix(host: &str, kas_domain: &str) -> Option<String> {
    if kas_domain.is_empty() {
        return None;
    }
    host.strip_suffix(&format!("-{kas_domain}")).map(str::to_string)
}

fn owned_by_kafka(route: &Route, kafka_name: &str) -> bool {
    route
        .meta()
        .owner_references
        .as_ref()
        .is_some_and(|refs| refs.iter().any(|r| r.kind == "Kafka" && r.name == kafka_name))
}

fn resolve_zone(route: &Route, services: &[Service], pods: &[Pod], nodes: &[Node]) -> Option<String> {
    let service = services
        .iter()
        .find(|s| s.name_any() == route.spec.to.name && s.namespace() == route.namespace())?;
    let selector = service.spec.as_ref()?.selector.as_ref()?;
    let pod = pods
        .iter()
        .find(|p| p.namespace() == route.namespace() && selector.iter().all(|(k, v)| p.labels().get(k) == Some(v)))?;
    let node_name = pod.spec.as_ref()?.node_name.as_ref()?;
    let node = nodes.iter().find(|n| n.name_any() == *node_name)?;
    node.labels().get(TOPOLOGY_ZONE_LABEL).cloned()
}
