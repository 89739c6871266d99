/// Externally-owned CRD: `kafka.strimzi.io/v1beta2 Kafka`.
pub mod kafka;
/// Core-owned CRD: `operator.openshift.io/v1 IngressController`.
pub mod ingresscontroller;
/// Externally-owned CRD: `route.openshift.io/v1 Route`.
pub mod route;

pub use ingresscontroller::{
    EndpointPublishingStrategy, EndpointPublishingStrategyType, IngressController, IngressControllerSpec,
    IngressControllerStatus, NodePlacement,
};
pub use kafka::{Kafka, KafkaClusterSpec, KafkaListener, KafkaListenerConfiguration, KafkaSpec, KafkaStatus};
pub use route::{Route, RouteSpec, RouteStatus, RouteTargetReference, RouteTls};
