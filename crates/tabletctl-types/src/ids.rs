//! Small `Copy` identifier newtypes used throughout the control plane.
//!
//! These follow the same shape as the teacher's entity IDs: cheap 8-byte
//! values with `Display`, `From<u64>`/`Into<u64>`, and a full ordering so
//! they can be used as map keys and sorted for deterministic output.

use std::fmt::{self, Display};

/// Globally monotonic identifier for an [`crate::op::OpInfo`].
///
/// OP ids are assigned from the coordination service's `op_index_node`
/// counter (spec I3: strictly increasing, globally unique per name-server
/// epoch).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct OpId(u64);

impl OpId {
    pub const INVALID: OpId = OpId(u64::MAX);

    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }

    pub fn next(self) -> Self {
        OpId(self.0 + 1)
    }
}

impl Display for OpId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "op#{}", self.0)
    }
}

impl From<u64> for OpId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<OpId> for u64 {
    fn from(id: OpId) -> Self {
        id.0
    }
}

/// Identifier for a [`crate::op::Task`], unique within its owning OP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct TaskId(u32);

impl TaskId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task#{}", self.0)
    }
}

/// Partition identifier: `0 <= pid < P` for a table with `P` partitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct Pid(u32);

impl Pid {
    pub const INVALID: Pid = Pid(u32::MAX);

    pub fn new(pid: u32) -> Self {
        Self(pid)
    }

    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for Pid {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

/// Monotonic per-partition epoch, bumped on every leader change (spec
/// GLOSSARY: "Term"). Used for fencing during replica recovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, serde::Serialize, serde::Deserialize)]
pub struct Term(u64);

impl Term {
    pub const ZERO: Term = Term(0);

    pub fn new(term: u64) -> Self {
        Self(term)
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }

    /// Returns the next term, strictly greater than this one.
    pub fn next(self) -> Self {
        Term(self.0 + 1)
    }
}

impl Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "term:{}", self.0)
    }
}

/// A tablet or blob-server network endpoint, e.g. `"10.0.0.4:9527"`.
///
/// Cheap to clone; compared and hashed by value. Used as the key into
/// the tablet/blob-server registries and as the replica identity in
/// partition replica lists.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct Endpoint(String);

impl Endpoint {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self(endpoint.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for Endpoint {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Endpoint {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<Endpoint> for String {
    fn from(value: Endpoint) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn op_id_ordering_is_strictly_increasing() {
        let a = OpId::new(1);
        let b = a.next();
        assert!(b > a);
        assert_eq!(b.as_u64(), 2);
    }

    #[test]
    fn term_next_is_strictly_greater() {
        let t = Term::new(5);
        assert!(t.next() > t);
    }

    #[test]
    fn endpoint_roundtrips_through_string() {
        let e = Endpoint::new("10.0.0.1:9527");
        let s: String = e.clone().into();
        assert_eq!(Endpoint::from(s), e);
    }
}
