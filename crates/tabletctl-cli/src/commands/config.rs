//! Runtime configuration subcommands.
//!
//! `tabletctl-server` does not support live config mutation or
//! introspection over the admin surface (config is loaded once at
//! startup); both calls below simply surface that rejection.

use std::sync::Arc;

use anyhow::Result;

use tabletctl_coord::memory::MemoryBackend;
use tabletctl_rpc::*;
use tabletctl_server::NameServer;

use super::table::report;

type Server = Arc<NameServer<MemoryBackend>>;

pub fn set(server: &Server, key: String, value: String) -> Result<()> {
    let response = server.conf_set(ConfSetRequest { key, value });
    report(&response.status)
}

pub fn get(server: &Server, key: String) -> Result<()> {
    let response = server.conf_get(ConfGetRequest { key });
    if !response.status.is_ok() {
        return report(&response.status);
    }
    match response.value {
        Some(value) => println!("{value}"),
        None => println!("(unset)"),
    }
    Ok(())
}
