//! Worker loop for the recommendation controller
//!
//! Event sources push namespaced keys into a bounded queue. The manager runs
//! distinct keys concurrently up to a configured limit and never runs two
//! passes for the same key at once: a key that arrives while its pass is in
//! flight is marked dirty and dispatched again when that pass finishes.

use crate::config::ReconcilerConfig;
use crate::controller::RecommendationController;
use crane_types::ObjectKey;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex, Notify, RwLock, Semaphore};

#[derive(Default)]
struct KeyState {
    in_flight: HashSet<ObjectKey>,
    dirty: HashSet<ObjectKey>,
}

/// Drives [`RecommendationController`] from a queue of keys
pub struct ControllerManager {
    controller: Arc<RecommendationController>,
    config: ReconcilerConfig,
    queue_tx: mpsc::Sender<ObjectKey>,
    keys: Mutex<KeyState>,
    permits: Arc<Semaphore>,
    running: RwLock<bool>,
    shutdown: Notify,
}

impl ControllerManager {
    /// Create a new manager and the receiving end of its key queue
    pub fn new(
        controller: Arc<RecommendationController>,
        config: ReconcilerConfig,
    ) -> (Arc<Self>, mpsc::Receiver<ObjectKey>) {
        let (queue_tx, queue_rx) = mpsc::channel(config.queue_capacity.max(1));
        let permits = Arc::new(Semaphore::new(config.max_concurrent_reconciles.max(1)));

        let manager = Arc::new(Self {
            controller,
            config,
            queue_tx,
            keys: Mutex::new(KeyState::default()),
            permits,
            running: RwLock::new(false),
            shutdown: Notify::new(),
        });

        (manager, queue_rx)
    }

    /// Queue a key for reconciliation
    pub async fn enqueue(&self, key: ObjectKey) {
        if let Err(e) = self.queue_tx.send(key).await {
            tracing::warn!(recommendation = %e.0, "Key queue closed, dropping key");
        }
    }

    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }

    /// Process keys until [`ControllerManager::stop`] is called.
    ///
    /// Passes already in flight when the loop ends run to completion.
    pub async fn start(self: Arc<Self>, mut queue_rx: mpsc::Receiver<ObjectKey>) {
        {
            let mut running = self.running.write().await;
            *running = true;
        }

        tracing::info!(
            workers = self.config.max_concurrent_reconciles,
            "Recommendation controller started"
        );

        loop {
            tokio::select! {
                _ = self.shutdown.notified() => break,
                key = queue_rx.recv() => match key {
                    Some(key) => self.clone().dispatch(key).await,
                    None => break,
                },
            }
        }

        {
            let mut running = self.running.write().await;
            *running = false;
        }

        tracing::info!("Recommendation controller stopped");
    }

    /// Stop the worker loop
    pub async fn stop(&self) {
        let mut running = self.running.write().await;
        *running = false;
        self.shutdown.notify_one();
    }

    async fn dispatch(self: Arc<Self>, key: ObjectKey) {
        {
            let mut keys = self.keys.lock().await;
            if keys.in_flight.contains(&key) {
                keys.dirty.insert(key);
                return;
            }
            keys.in_flight.insert(key.clone());
        }

        tokio::spawn(self.run_key(key));
    }

    // Runs passes for one key until no newer event arrived during the last one.
    async fn run_key(self: Arc<Self>, key: ObjectKey) {
        loop {
            self.run_pass(&key).await;

            let mut keys = self.keys.lock().await;
            if !keys.dirty.remove(&key) {
                keys.in_flight.remove(&key);
                break;
            }
        }
    }

    async fn run_pass(&self, key: &ObjectKey) {
        let _permit = match self.permits.acquire().await {
            Ok(permit) => permit,
            Err(_) => return,
        };

        match self.controller.reconcile(key).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                tracing::debug!(recommendation = %key, "Recommendation no longer exists");
            }
            Err(e) => {
                tracing::error!(
                    recommendation = %key,
                    error = %e,
                    "Reconciliation failed"
                );
                self.requeue(key.clone(), self.config.requeue_after());
            }
        }
    }

    fn requeue(&self, key: ObjectKey, delay: Duration) {
        let queue_tx = self.queue_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = queue_tx.send(key).await;
        });
    }
}
