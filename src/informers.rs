//! A uniform list/watch cache over a single resource type, with readiness
//! gating and add/update/delete dispatch. Built on `kube::runtime::{watcher,
//! reflector}`, the idiomatic list/watch primitive in this ecosystem; the
//! facade layers its own seen-keys bookkeeping on top because the reflector
//! store alone can't tell "first time seen" from "seen again".

use std::collections::HashSet;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use futures::StreamExt;
use kube::runtime::reflector::{ObjectRef, Store};
use kube::runtime::{reflector, watcher, WatchStreamExt};
use kube::{Api, Resource, ResourceExt};
use tracing::{debug, warn};

type Handler<K> = Arc<dyn Fn(Arc<K>) + Send + Sync>;

/// A live cache for one Kubernetes resource type.
pub struct Cache<K>
where
    K: Resource + Clone + 'static,
    K::DynamicType: Eq + Hash + Clone,
{
    store: Store<K>,
    ready: Arc<AtomicBool>,
    seen: Arc<Mutex<HashSet<ObjectRef<K>>>>,
    on_add: Arc<Mutex<Vec<Handler<K>>>>,
    on_update: Arc<Mutex<Vec<Handler<K>>>>,
    on_delete: Arc<Mutex<Vec<Handler<K>>>>,
}

impl<K> Clone for Cache<K>
where
    K: Resource + Clone + 'static,
    K::DynamicType: Eq + Hash + Clone,
{
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            ready: self.ready.clone(),
            seen: self.seen.clone(),
            on_add: self.on_add.clone(),
            on_update: self.on_update.clone(),
            on_delete: self.on_delete.clone(),
        }
    }
}

impl<K> Cache<K>
where
    K: Resource + Clone + Debug + Send + Sync + 'static,
    K::DynamicType: Eq + Hash + Clone + Default + Send + Sync,
{
    /// Spawns the watcher/reflector task and returns a handle to the cache.
    /// The returned cache becomes `ready()` once the first `Restarted` batch
    /// (the initial list) has been applied.
    pub fn spawn(api: Api<K>, config: watcher::Config) -> Self {
        let (store, writer) = reflector::store();
        let ready = Arc::new(AtomicBool::new(false));
        let seen = Arc::new(Mutex::new(HashSet::new()));
        let on_add: Arc<Mutex<Vec<Handler<K>>>> = Arc::new(Mutex::new(Vec::new()));
        let on_update: Arc<Mutex<Vec<Handler<K>>>> = Arc::new(Mutex::new(Vec::new()));
        let on_delete: Arc<Mutex<Vec<Handler<K>>>> = Arc::new(Mutex::new(Vec::new()));

        let cache = Self {
            store,
            ready: ready.clone(),
            seen: seen.clone(),
            on_add: on_add.clone(),
            on_update: on_update.clone(),
            on_delete: on_delete.clone(),
        };

        let watch = watcher(api, config)
            .default_backoff()
            .reflect(writer)
            .for_each(move |event| {
                let ready = ready.clone();
                let seen = seen.clone();
                let on_add = on_add.clone();
                let on_update = on_update.clone();
                let on_delete = on_delete.clone();
                async move {
                    match event {
                        Ok(watcher::Event::Applied(obj)) => {
                            let key = ObjectRef::from_obj(&obj);
                            let first_time = seen.lock().unwrap().insert(key);
                            let handlers = if first_time { &on_add } else { &on_update };
                            for handler in handlers.lock().unwrap().iter() {
                                handler(Arc::new(obj.clone()));
                            }
                        }
                        Ok(watcher::Event::Deleted(obj)) => {
                            let key = ObjectRef::from_obj(&obj);
                            seen.lock().unwrap().remove(&key);
                            for handler in on_delete.lock().unwrap().iter() {
                                handler(Arc::new(obj.clone()));
                            }
                        }
                        Ok(watcher::Event::Restarted(objs)) => {
                            let mut seen_guard = seen.lock().unwrap();
                            for obj in objs {
                                let key = ObjectRef::from_obj(&obj);
                                let first_time = seen_guard.insert(key);
                                let handlers = if first_time { &on_add } else { &on_update };
                                for handler in handlers.lock().unwrap().iter() {
                                    handler(Arc::new(obj.clone()));
                                }
                            }
                            drop(seen_guard);
                            ready.store(true, Ordering::SeqCst);
                            debug!(kind = std::any::type_name::<K>(), "informer cache is ready");
                        }
                        Err(e) => {
                            warn!(error = %e, kind = std::any::type_name::<K>(), "watch error, retrying");
                        }
                    }
                }
            });
        tokio::spawn(watch);

        cache
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    pub fn list(&self) -> Vec<Arc<K>> {
        self.store.state()
    }

    pub fn get_by_key(&self, namespace: Option<&str>, name: &str) -> Option<Arc<K>> {
        self.list()
            .into_iter()
            .find(|o| o.name_any() == name && o.namespace().as_deref() == namespace)
    }

    pub fn on_add(&self, handler: impl Fn(Arc<K>) + Send + Sync + 'static) {
        self.on_add.lock().unwrap().push(Arc::new(handler));
    }

    pub fn on_update(&self, handler: impl Fn(Arc<K>) + Send + Sync + 'static) {
        self.on_update.lock().unwrap().push(Arc::new(handler));
    }

    pub fn on_delete(&self, handler: impl Fn(Arc<K>) + Send + Sync + 'static) {
        self.on_delete.lock().unwrap().push(Arc::new(handler));
    }
}

#[cfg(test)]
impl<K> Cache<K>
where
    K: Resource + Clone + Debug + Send + Sync + 'static,
    K::DynamicType: Eq + Hash + Clone + Default + Send + Sync,
{
    /// Builds an already-ready cache pre-loaded with `items`, without
    /// spawning a watcher. For reconcile tests that need populated caches
    /// but no live apiserver to watch.
    pub fn test_store(items: Vec<K>) -> Self {
        let (store, mut writer) = reflector::store();
        writer.apply_watcher_event(&watcher::Event::Restarted(items));
        Self {
            store,
            ready: Arc::new(AtomicBool::new(true)),
            seen: Arc::new(Mutex::new(HashSet::new())),
            on_add: Arc::new(Mutex::new(Vec::new())),
            on_update: Arc::new(Mutex::new(Vec::new())),
            on_delete: Arc::new(Mutex::new(Vec::new())),
        }
    }
}
