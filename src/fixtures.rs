//! Helper methods and a mocked-apiserver harness, available for tests only.

use std::collections::BTreeMap;

use http::{Request, Response};
use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{
    Container, Node, NodeSpec, Pod, PodSpec, PodTemplateSpec, ResourceRequirements, Service, ServiceSpec,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use kube::client::Body;
use kube::{Client, Resource};

use crate::apis::ingresscontroller::{TOPOLOGY_ZONE_LABEL, WORKER_NODE_LABEL};
use crate::apis::{
    IngressController, IngressControllerSpec, IngressControllerStatus, Kafka, KafkaClusterSpec, KafkaListener,
    KafkaListenerConfiguration, KafkaSpec,
};

impl Kafka {
    /// A Kafka with one external `route` listener carrying a connection
    /// limit, and no static quota config (callers add quotas with
    /// [`Kafka::with_quotas`] as needed).
    pub fn test(name: &str, namespace: &str, replicas: i32, max_connections: i64) -> Self {
        let mut k = Kafka::new(
            name,
            KafkaSpec {
                kafka: KafkaClusterSpec {
                    replicas,
                    listeners: vec![KafkaListener {
                        name: "external".to_string(),
                        listener_type: "route".to_string(),
                        configuration: Some(KafkaListenerConfiguration {
                            max_connections: Some(max_connections),
                        }),
                    }],
                    config: BTreeMap::new(),
                },
            },
        );
        k.meta_mut().namespace = Some(namespace.to_string());
        k
    }

    pub fn with_quotas(mut self, produce_bytes: i64, fetch_bytes: i64) -> Self {
        self.spec.kafka.config.insert(
            crate::apis::kafka::PRODUCE_QUOTA_CONFIG_KEY.to_string(),
            serde_json::json!(produce_bytes),
        );
        self.spec.kafka.config.insert(
            crate::apis::kafka::FETCH_QUOTA_CONFIG_KEY.to_string(),
            serde_json::json!(fetch_bytes),
        );
        self
    }
}

impl IngressController {
    /// A default/zone `IngressController` as the ingress operator would
    /// report it back, with `status.domain` already assigned.
    pub fn test(name: &str, namespace: &str, domain: &str, replicas: i32) -> Self {
        let mut c = IngressController::new(
            name,
            IngressControllerSpec {
                domain: Some(domain.to_string()),
                replicas: Some(replicas),
                ..Default::default()
            },
        );
        c.meta_mut().namespace = Some(namespace.to_string());
        c.status = Some(IngressControllerStatus {
            domain: Some(domain.to_string()),
        });
        c
    }
}

/// A worker node in `zone`, eligible for ingress controller placement.
pub fn worker_node(name: &str, zone: &str) -> Node {
    let mut labels = BTreeMap::new();
    labels.insert(WORKER_NODE_LABEL.to_string(), String::new());
    labels.insert(TOPOLOGY_ZONE_LABEL.to_string(), zone.to_string());
    Node {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            labels: Some(labels),
            ..Default::default()
        },
        spec: Some(NodeSpec::default()),
        ..Default::default()
    }
}

/// A broker pod scheduled onto `node_name`, labelled the way a Strimzi
/// StatefulSet-managed Kafka broker pod is.
pub fn broker_pod(name: &str, namespace: &str, node_name: &str) -> Pod {
    let mut labels = BTreeMap::new();
    labels.insert("statefulset.kubernetes.io/pod-name".to_string(), name.to_string());
    Pod {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            labels: Some(labels),
            ..Default::default()
        },
        spec: Some(PodSpec {
            node_name: Some(node_name.to_string()),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// The headless per-broker service a broker route targets.
pub fn broker_service(name: &str, namespace: &str) -> Service {
    let mut selector = BTreeMap::new();
    selector.insert("statefulset.kubernetes.io/pod-name".to_string(), name.to_string());
    Service {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        },
        spec: Some(ServiceSpec {
            selector: Some(selector),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// A router `Deployment` owned by the named ingress controller, with a
/// sole container running `command`.
pub fn router_deployment(namespace: &str, owning_controller: &str, command: Vec<&str>) -> Deployment {
    let mut labels = BTreeMap::new();
    labels.insert(
        crate::apis::ingresscontroller::OWNING_INGRESSCONTROLLER_LABEL.to_string(),
        owning_controller.to_string(),
    );
    Deployment {
        metadata: ObjectMeta {
            name: Some(format!("router-{owning_controller}")),
            namespace: Some(namespace.to_string()),
            labels: Some(labels),
            ..Default::default()
        },
        spec: Some(DeploymentSpec {
            selector: LabelSelector::default(),
            template: PodTemplateSpec {
                spec: Some(PodSpec {
                    containers: vec![Container {
                        name: "router".to_string(),
                        command: Some(command.into_iter().map(str::to_string).collect()),
                        resources: Some(ResourceRequirements::default()),
                        ..Default::default()
                    }],
                    ..Default::default()
                }),
                ..Default::default()
            },
            ..Default::default()
        }),
        status: None,
    }
}

type ApiServerHandle = tower_test::mock::Handle<Request<Body>, Response<Body>>;

/// A mocked apiserver: construct with [`ApiServerVerifier::new`], hand the
/// returned `Client` to the code under test, and drive expectations with
/// `expect_patch` from a spawned task.
pub struct ApiServerVerifier(ApiServerHandle);

impl ApiServerVerifier {
    pub fn new() -> (Client, Self) {
        let (mock_service, handle) = tower_test::mock::pair();
        let client = Client::new(mock_service, "default");
        (client, Self(handle))
    }

    /// Waits for the next PATCH whose URI contains `uri_fragment`, asserts
    /// it, and responds with `response_body` serialized as JSON.
    pub async fn expect_patch(self, uri_fragment: &str, response_body: &impl serde::Serialize) -> Self {
        self.expect_patch_checking(uri_fragment, |_body| {}, response_body).await
    }

    /// Like [`Self::expect_patch`], but also decodes the request body as
    /// JSON and hands it to `check` before responding — for asserting on
    /// the actual patched fields (e.g. the hysteresis-adjusted replica
    /// count), not just the URI.
    pub async fn expect_patch_checking(
        mut self,
        uri_fragment: &str,
        check: impl FnOnce(&serde_json::Value),
        response_body: &impl serde::Serialize,
    ) -> Self {
        let (request, send) = self.0.next_request().await.expect("service not called");
        assert_eq!(request.method(), http::Method::PATCH);
        assert!(
            request.uri().to_string().contains(uri_fragment),
            "unexpected PATCH uri: {}",
            request.uri()
        );
        let body_bytes = hyper::body::to_bytes(request.into_body())
            .await
            .expect("read PATCH request body");
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).expect("PATCH body is valid JSON");
        check(&body);
        let response = serde_json::to_vec(response_body).unwrap();
        send.send_response(Response::builder().body(Body::from(response)).unwrap());
        self
    }
}

pub async fn timeout_after_1s(handle: tokio::task::JoinHandle<()>) {
    tokio::time::timeout(std::time::Duration::from_secs(1), handle)
        .await
        .expect("timeout on mock apiserver")
        .expect("scenario succeeded")
}
