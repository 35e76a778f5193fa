//! Membership Watcher (C2) and Reconciler (C7): turns coordination-
//! service membership changes into scheduler OPs and runs the periodic
//! jobs that only the active name server performs (spec.md §4.2, §4.7).

pub mod error;
pub mod jobs;
pub mod membership;
pub mod reconciler;

pub use error::{ReconcilerError, Result};
pub use jobs::PeriodicJob;
pub use membership::{MembershipEvent, MembershipWatcher};
pub use reconciler::{Reconciler, ReconcilerIntervals};
