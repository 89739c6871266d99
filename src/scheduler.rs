//! A single cached scheduler drives the periodic reconcile cadence. Unlike
//! the debounce timer in [`crate::router_patcher`], this one ticks forever
//! at a fixed interval; skip-if-running semantics live with the caller's
//! reconcile guard, not here, since both the periodic path and informer
//! event callbacks need to share the same "at most one in flight" guard.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

/// Spawns a task that invokes `tick` once per `interval`, forever.
pub fn spawn_periodic<F, Fut>(interval: Duration, mut tick: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            debug!("periodic reconcile trigger fired");
            tick().await;
        }
    });
}
