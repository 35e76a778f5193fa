//! Brings up a [`NameServer`] for the lifetime of one CLI invocation.
//!
//! A real operator tool would dial a long-running daemon over the wire
//! transport named out of scope in `spec.md` §1; absent that transport,
//! this CLI starts its own in-process name server against the same
//! in-memory coordination backend `tabletctl-server`'s binary uses, so
//! every subcommand below is still a pure client of [`NameServerApi`].

use std::sync::Arc;

use anyhow::Result;

use tabletctl_config::NameServerConfig;
use tabletctl_coord::memory::MemoryBackend;
use tabletctl_server::NameServer;

pub fn bring_up(config_dir: Option<&str>) -> Result<Arc<NameServer<MemoryBackend>>> {
    let config = match config_dir {
        Some(dir) => NameServerConfig::load_from_dir(dir)?,
        None => NameServerConfig::load()?,
    };

    let backend = Arc::new(MemoryBackend::new());
    let holder_id = format!("tabletctl-{}", std::process::id());
    let server = NameServer::new(backend, holder_id, &config);
    server.start();
    Ok(server)
}
