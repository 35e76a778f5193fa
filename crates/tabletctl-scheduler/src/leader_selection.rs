//! Pure decision functions used when building `ChangeLeaderOP` and
//! replica-recovery OPs. Kept free of any catalog/tablet I/O so they can
//! be exercised directly in unit tests.

use tabletctl_types::{Endpoint, OpType};

/// A candidate replica's reported position, as returned by
/// `GetTableStatus`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub endpoint: Endpoint,
    pub term: u64,
    pub offset: u64,
}

/// `SelectLeader`: picks the alive replica with the greatest
/// `(term, offset)` pair, breaking ties on lowest endpoint in
/// lexicographic order.
pub fn select_leader(candidates: &[Candidate]) -> Option<Endpoint> {
    candidates
        .iter()
        .max_by(|a, b| {
            (a.term, a.offset, std::cmp::Reverse(&a.endpoint))
                .cmp(&(b.term, b.offset, std::cmp::Reverse(&b.endpoint)))
        })
        .map(|winner| winner.endpoint.clone())
}

/// Recovery strategy chosen for a replica coming back online, based on
/// how far it has drifted from the current leader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryStrategy {
    /// Reuse existing tablet-local data; offset is within tolerance and
    /// term matches.
    Simplify,
    /// Full re-sync from the leader; offset has drifted too far but the
    /// term still matches.
    FullResync,
    /// Drop tablet-local data and reload; term itself has diverged.
    DropAndReload,
}

impl RecoveryStrategy {
    pub fn op_type(self) -> OpType {
        match self {
            RecoveryStrategy::Simplify => OpType::ReAddReplicaSimplify,
            RecoveryStrategy::FullResync => OpType::ReAddReplicaNoSend,
            RecoveryStrategy::DropAndReload => OpType::ReAddReplicaWithDrop,
        }
    }
}

/// `RecoverEndpointInternal`'s per-partition decision: compares the
/// returning replica's (term, offset) against the current leader's.
pub fn choose_recovery_strategy(
    leader_term: u64,
    leader_offset: u64,
    replica_term: u64,
    replica_offset: u64,
    offset_delta_tolerance: u64,
) -> RecoveryStrategy {
    if replica_term != leader_term {
        return RecoveryStrategy::DropAndReload;
    }
    if leader_offset.saturating_sub(replica_offset) <= offset_delta_tolerance {
        RecoveryStrategy::Simplify
    } else {
        RecoveryStrategy::FullResync
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(endpoint: &str, term: u64, offset: u64) -> Candidate {
        Candidate {
            endpoint: Endpoint::new(endpoint),
            term,
            offset,
        }
    }

    #[test]
    fn select_leader_prefers_highest_term_then_offset() {
        let winner = select_leader(&[
            candidate("a:9527", 1, 100),
            candidate("b:9527", 2, 10),
            candidate("c:9527", 2, 50),
        ]);
        assert_eq!(winner, Some(Endpoint::new("c:9527")));
    }

    #[test]
    fn select_leader_breaks_ties_on_lowest_endpoint() {
        let winner = select_leader(&[
            candidate("b:9527", 1, 100),
            candidate("a:9527", 1, 100),
        ]);
        assert_eq!(winner, Some(Endpoint::new("a:9527")));
    }

    #[test]
    fn recovery_strategy_picks_simplify_within_tolerance() {
        let strategy = choose_recovery_strategy(5, 100, 5, 95, 10);
        assert_eq!(strategy, RecoveryStrategy::Simplify);
    }

    #[test]
    fn recovery_strategy_picks_full_resync_beyond_tolerance() {
        let strategy = choose_recovery_strategy(5, 1000, 5, 100, 10);
        assert_eq!(strategy, RecoveryStrategy::FullResync);
    }

    #[test]
    fn recovery_strategy_picks_drop_and_reload_on_term_mismatch() {
        let strategy = choose_recovery_strategy(6, 1000, 5, 999, 10);
        assert_eq!(strategy, RecoveryStrategy::DropAndReload);
    }
}
