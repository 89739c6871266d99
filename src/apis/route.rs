use kube::{CustomResource, Resource};
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

lazy_static::lazy_static! {
    /// Broker routes are named `<prefix>-kafka-<n>`; this is how the route
    /// projection tells them apart from the bootstrap/admin-server routes.
    pub static ref BROKER_ROUTE_NAME: Regex = Regex::new(r".+-kafka-\d+$").unwrap();
}

/// A `route.openshift.io/v1` `Route`.
#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, JsonSchema)]
#[cfg_attr(test, derive(Default))]
#[kube(group = "route.openshift.io", version = "v1", kind = "Route", namespaced)]
#[kube(status = "RouteStatus")]
pub struct RouteSpec {
    pub host: String,
    pub to: RouteTargetReference,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<RouteTls>,
}

#[derive(Deserialize, Serialize, Clone, Debug, JsonSchema, Default)]
pub struct RouteTargetReference {
    pub kind: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<i32>,
}

#[derive(Deserialize, Serialize, Clone, Debug, JsonSchema, Default)]
pub struct RouteTls {
    pub termination: String,
}

#[derive(Deserialize, Serialize, Clone, Debug, JsonSchema, Default)]
pub struct RouteStatus {
    #[serde(default)]
    pub ingress: Vec<serde_json::Value>,
}

impl Route {
    /// A broker route is one whose object name ends in `-kafka-<n>`; the
    /// bootstrap and admin-server routes never match this.
    pub fn is_broker_route(&self) -> bool {
        let name = self.meta().name.as_deref().unwrap_or("");
        BROKER_ROUTE_NAME.is_match(name)
    }
}
