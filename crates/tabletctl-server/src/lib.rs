//! Name server daemon: wires the coordination client (C1), catalog
//! (C3), cluster registry (C4), OP scheduler (C6), and reconciler (C7)
//! into one process, and implements the admin RPC surface (C8) against
//! them.

pub mod api_impl;
pub mod server;

pub use server::NameServer;
