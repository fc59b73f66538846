//! HTTP exposer: binds a listener and serves registered collectables.

use std::net::SocketAddr;
use std::sync::{Arc, Weak};

use tokio::net::TcpListener;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

use promkit_core::error::{MetricsError, Result};
use promkit_core::Collectable;

use crate::app_state::ExposerState;
use crate::config::ExposerSection;
use crate::router;

/// A running metrics server.
///
/// Collectables are registered by weak reference per path. Dropping the
/// exposer stops the server; in-flight scrapes are allowed to finish.
pub struct Exposer {
    state: ExposerState,
    local_addr: SocketAddr,
    shutdown: watch::Sender<bool>,
    server: Mutex<Option<JoinHandle<std::io::Result<()>>>>,
}

impl Exposer {
    /// Bind `cfg.listen` and start serving `cfg.path` in the background.
    pub async fn bind(cfg: &ExposerSection) -> Result<Self> {
        let state = ExposerState::new(&cfg.path)?;
        let listener = TcpListener::bind(cfg.listen.as_str())
            .await
            .map_err(|e| MetricsError::Network(format!("bind {} failed: {e}", cfg.listen)))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| MetricsError::Network(format!("local_addr failed: {e}")))?;

        let (shutdown, mut stop_rx) = watch::channel(false);
        let app = router::build_router(state.clone());
        let server = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = stop_rx.wait_for(|stop| *stop).await;
                })
                .await
        });

        tracing::info!(%local_addr, path = %cfg.path, "exposer listening");
        Ok(Self {
            state,
            local_addr,
            shutdown,
            server: Mutex::new(Some(server)),
        })
    }

    /// Address actually bound (useful with port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Paths currently served, sorted.
    pub fn listening_paths(&self) -> Vec<String> {
        self.state.paths()
    }

    /// Serve `collectable` on the default path.
    pub fn register_collectable<C: Collectable + 'static>(&self, collectable: &Arc<C>) {
        let weak: Weak<dyn Collectable> = Arc::<C>::downgrade(collectable);
        if let Some(endpoint) = self.state.endpoint(self.state.default_path()) {
            endpoint.register(weak);
        }
    }

    /// Serve `collectable` on `path`, mounting the path if needed.
    pub fn register_collectable_at<C: Collectable + 'static>(
        &self,
        collectable: &Arc<C>,
        path: &str,
    ) -> Result<()> {
        let weak: Weak<dyn Collectable> = Arc::<C>::downgrade(collectable);
        let endpoint = self.state.endpoint_or_create(path)?;
        if endpoint.register(weak) {
            tracing::debug!(path, "collectable registered");
        }
        Ok(())
    }

    /// Stop serving `collectable` on the default path.
    pub fn remove_collectable<C: Collectable + 'static>(&self, collectable: &Arc<C>) -> bool {
        self.remove_collectable_at(collectable, self.state.default_path())
    }

    /// Stop serving `collectable` on `path`. Returns whether it was registered there.
    pub fn remove_collectable_at<C: Collectable + 'static>(
        &self,
        collectable: &Arc<C>,
        path: &str,
    ) -> bool {
        self.state
            .endpoint(path)
            .map(|e| e.remove(Arc::as_ptr(collectable)))
            .unwrap_or(false)
    }

    pub fn is_stopped(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Ask the server to stop accepting connections. Idempotent.
    pub fn stop(&self) {
        if !self.shutdown.send_replace(true) {
            tracing::info!(local_addr = %self.local_addr, "exposer stopping");
        }
    }

    /// Wait until the server task has exited. Call after [`Exposer::stop`].
    pub async fn stopped(&self) -> Result<()> {
        let handle = self.server.lock().await.take();
        let Some(handle) = handle else {
            return Ok(());
        };
        handle
            .await
            .map_err(|e| MetricsError::Internal(format!("server task failed: {e}")))?
            .map_err(|e| MetricsError::Network(format!("server error: {e}")))
    }
}

impl Drop for Exposer {
    fn drop(&mut self) {
        self.stop();
    }
}
