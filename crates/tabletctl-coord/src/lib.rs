//! Coordination-service client (component C1): sessions, the fencing
//! distributed lock, watches, and node-path layout for the name server's
//! persisted state.
//!
//! The production ensemble driver (ZooKeeper, etcd, ...) is out of
//! scope for this repository; everything here is expressed against the
//! [`CoordBackend`] trait, with [`MemoryBackend`] as the in-process test
//! double used throughout this workspace's test suites.

pub mod backend;
pub mod client;
pub mod error;
pub mod memory;
pub mod paths;

pub use backend::{CoordBackend, NodeKind, VersionedValue, WatchEvent};
pub use client::{CoordClient, OnLocked, OnLostLock};
pub use error::{CoordError, Result};
pub use memory::MemoryBackend;
