//! promkit exposer demo.
//!
//! Loads `promkit.yaml` (or the path given as the first argument), registers
//! the declared families plus a set of sample metrics, and serves them until
//! Ctrl-C or SIGTERM.

mod demo;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{fmt, EnvFilter};

use promkit_core::error::Result;
use promkit_core::Registry;
use promkit_exposer::{config, Exposer};

#[tokio::main]
async fn main() {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run().await {
        tracing::error!(class = e.class().as_str(), error = %e, "promkit-exposer failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let path = std::env::args().nth(1).unwrap_or_else(|| "promkit.yaml".into());
    let cfg = if Path::new(&path).exists() {
        config::load_from_file(&path)?
    } else {
        tracing::info!(%path, "config not found, using defaults");
        config::PromkitConfig::default()
    };

    let registry = Arc::new(Registry::new());
    for decl in &cfg.families {
        decl.register(&registry)?;
    }
    let sample = demo::SampleMetrics::register(&registry)?;

    let exposer = Exposer::bind(&cfg.exposer).await?;
    exposer.register_collectable(&registry);
    tracing::info!(addr = %exposer.local_addr(), path = %cfg.exposer.path, "promkit-exposer serving");

    let mut rng = demo::XorShift::seeded();
    let mut tick = tokio::time::interval(Duration::from_secs(1));
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = tick.tick() => {
                if let Err(e) = sample.step(rng.next_u64()) {
                    tracing::warn!(class = e.class().as_str(), error = %e, "sample update failed");
                }
            }
            _ = &mut shutdown => break,
        }
    }

    exposer.stop();
    exposer.stopped().await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("signal received, starting graceful shutdown");
}
