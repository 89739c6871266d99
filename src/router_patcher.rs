//! Debounced patcher for router `Deployment` resources: enforces the
//! resource requirements and container command configured for the ingress
//! router, working around fields the ingress operator itself doesn't expose
//! a knob for.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Container, ResourceRequirements};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use kube::api::{Patch, PatchParams};
use kube::{Api, Client, ResourceExt};
use tokio::sync::Mutex as AsyncMutex;
use tracing::error;

use crate::apis::ingresscontroller::OWNING_INGRESSCONTROLLER_LABEL;
use crate::config::Config;
use crate::errors::{OperatorError, Result};
use crate::informers::Cache;

pub const FIELD_MANAGER: &str = "ingress-capacity-controller";

pub type DeploymentKey = (String, String);

#[derive(Clone, Debug, PartialEq)]
pub struct DesiredContainerState {
    pub resources: ResourceRequirements,
    pub command: Vec<String>,
}

pub fn desired_container_state(config: &Config) -> DesiredContainerState {
    let mut limits = BTreeMap::new();
    if let Some(cpu) = &config.limit_cpu {
        limits.insert("cpu".to_string(), Quantity(cpu.clone()));
    }
    if let Some(memory) = &config.limit_memory {
        limits.insert("memory".to_string(), Quantity(memory.clone()));
    }
    let mut requests = BTreeMap::new();
    if let Some(cpu) = &config.request_cpu {
        requests.insert("cpu".to_string(), Quantity(cpu.clone()));
    }
    if let Some(memory) = &config.request_memory {
        requests.insert("memory".to_string(), Quantity(memory.clone()));
    }
    DesiredContainerState {
        resources: ResourceRequirements {
            limits: if limits.is_empty() { None } else { Some(limits) },
            requests: if requests.is_empty() { None } else { Some(requests) },
            ..Default::default()
        },
        command: config.ingress_container_command.clone(),
    }
}

fn sole_container(d: &Deployment) -> Result<&Container> {
    let containers = d
        .spec
        .as_ref()
        .and_then(|s| s.template.spec.as_ref())
        .map(|s| &s.containers)
        .ok_or_else(|| OperatorError::UnexpectedContainerCount(d.name_any(), 0))?;
    if containers.len() != 1 {
        return Err(OperatorError::UnexpectedContainerCount(d.name_any(), containers.len()));
    }
    Ok(&containers[0])
}

/// `shouldPatch(d)` from the design: owned by a `kas*` ingress controller,
/// exactly one container, and that container's resources or command differ
/// from what's desired.
pub fn should_patch(d: &Deployment, desired: &DesiredContainerState) -> bool {
    match d.labels().get(OWNING_INGRESSCONTROLLER_LABEL) {
        Some(owner) if owner.starts_with("kas") => {}
        _ => return false,
    }
    let container = match sole_container(d) {
        Ok(c) => c,
        Err(e) => {
            error!(deployment = %d.name_any(), error = %e, "skipping router deployment patch");
            return false;
        }
    };
    let resources_match = container.resources.as_ref() == Some(&desired.resources);
    let command_matches = container.command.as_deref() == Some(desired.command.as_slice());
    !(resources_match && command_matches)
}

/// Builds the strategic-merge-patch body that overwrites the sole
/// container's resources and command in place. A JSON merge patch would
/// replace the whole `containers` array atomically and drop every other
/// field of the container (image, ports, env, probes, ...); strategic merge
/// patch merges `PodSpec.containers` by its `name` patch-merge key instead,
/// so only `resources`/`command` actually change.
fn patch_body(container_name: &str, desired: &DesiredContainerState) -> serde_json::Value {
    serde_json::json!({
        "spec": {
            "template": {
                "spec": {
                    "containers": [{
                        "name": container_name,
                        "resources": desired.resources,
                        "command": desired.command,
                    }]
                }
            }
        }
    })
}

/// A deduplicating debounce queue: N events for the same key arriving
/// within the debounce window collapse into a single drain-and-patch pass.
pub struct RouterPatcher {
    pending: Arc<AsyncMutex<HashSet<DeploymentKey>>>,
    scheduled: Arc<AtomicBool>,
    debounce: Duration,
}

impl RouterPatcher {
    pub fn new(debounce_millis: u64) -> Self {
        Self {
            pending: Arc::new(AsyncMutex::new(HashSet::new())),
            scheduled: Arc::new(AtomicBool::new(false)),
            debounce: Duration::from_millis(debounce_millis),
        }
    }

    /// Enqueues `key` for patching. If no debounce callback is currently
    /// scheduled, spawns one; otherwise this just joins the pending batch.
    pub fn enqueue(&self, key: DeploymentKey, client: Client, cache: Cache<Deployment>, config: Arc<Config>) {
        if self.scheduled.swap(true, Ordering::SeqCst) {
            // A callback is already counting down; just make sure our key is queued.
            let pending = self.pending.clone();
            tokio::spawn(async move {
                pending.lock().await.insert(key);
            });
            return;
        }

        let pending = self.pending.clone();
        let scheduled = self.scheduled.clone();
        let debounce = self.debounce;
        tokio::spawn(async move {
            pending.lock().await.insert(key);
            tokio::time::sleep(debounce).await;
            scheduled.store(false, Ordering::SeqCst);
            let keys: Vec<_> = pending.lock().await.drain().collect();
            for key in keys {
                if let Err(e) = patch_one(&client, &cache, &config, &key).await {
                    error!(namespace = %key.0, name = %key.1, error = %e, "failed to patch router deployment");
                }
            }
        });
    }
}

async fn patch_one(client: &Client, cache: &Cache<Deployment>, config: &Config, key: &DeploymentKey) -> Result<()> {
    let Some(deployment) = cache.get_by_key(Some(&key.0), &key.1) else {
        return Ok(());
    };
    let desired = desired_container_state(config);
    if !should_patch(&deployment, &desired) {
        return Ok(());
    }
    let container = sole_container(&deployment)?;
    let api: Api<Deployment> = Api::namespaced(client.clone(), &key.0);
    let params = PatchParams {
        field_manager: Some(FIELD_MANAGER.to_string()),
        ..PatchParams::default()
    };
    api.patch(&key.1, &params, &Patch::Strategic(patch_body(&container.name, &desired)))
        .await?;
    Ok(())
}
