//! Name server daemon entry point: loads configuration, wires C1-C8
//! against an in-process coordination backend, and blocks until
//! SIGINT/SIGTERM.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use tracing::info;

use tabletctl_config::NameServerConfig;
use tabletctl_coord::memory::MemoryBackend;
use tabletctl_server::NameServer;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let config = NameServerConfig::load()?;
    let holder_id = format!("ns-{}", std::process::id());
    info!(%holder_id, "starting name server");

    // The production ensemble driver (ZooKeeper, etcd, ...) is out of
    // scope for this repository (see tabletctl-coord); this binary runs
    // against the in-process backend, which makes it a single-process
    // demonstration of C1-C8 rather than a deployable cluster member.
    let backend = Arc::new(MemoryBackend::new());
    let server = NameServer::new(backend, holder_id, &config);
    server.start();

    wait_for_shutdown_signal()?;

    info!("shutdown signal received");
    server.shutdown();
    Ok(())
}

#[cfg(unix)]
fn wait_for_shutdown_signal() -> Result<()> {
    use std::sync::atomic::{AtomicBool, Ordering};
    use signal_hook::consts::{SIGINT, SIGTERM};

    let shutdown = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(SIGINT, Arc::clone(&shutdown))?;
    signal_hook::flag::register(SIGTERM, Arc::clone(&shutdown))?;

    while !shutdown.load(Ordering::Relaxed) {
        thread::sleep(Duration::from_millis(200));
    }
    Ok(())
}

#[cfg(not(unix))]
fn wait_for_shutdown_signal() -> Result<()> {
    loop {
        thread::sleep(Duration::from_secs(3600));
    }
}
