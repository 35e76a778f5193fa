//! `SetPartitionInfo`: round-robin replica placement across the live
//! tablet set, with a shuffled starting offset so leaders for different
//! tables don't all land on the first tablet in sorted order.

use rand::seq::SliceRandom;
use rand::RngCore;

use tabletctl_types::{Endpoint, Partition, Pid, Replica};

/// Assigns `replica_factor` replicas to each of `partition_count`
/// partitions, round-robin over `live_tablets`. The first replica
/// assigned to a partition becomes its initial leader.
///
/// `live_tablets` is shuffled once (seeded by `rng`) before assignment so
/// repeated calls against the same tablet set don't always start leaders
/// on the same endpoint.
pub fn assign_partitions(
    live_tablets: &[Endpoint],
    partition_count: u32,
    replica_factor: u32,
    rng: &mut impl RngCore,
) -> Vec<Partition> {
    let mut ring = live_tablets.to_vec();
    ring.shuffle(rng);

    let ring_len = ring.len();
    let mut partitions = Vec::with_capacity(partition_count as usize);
    let mut cursor = 0usize;

    for pid in 0..partition_count {
        let mut replicas = Vec::with_capacity(replica_factor as usize);
        for slot in 0..replica_factor {
            let endpoint = ring[cursor % ring_len].clone();
            cursor += 1;
            replicas.push(if slot == 0 {
                Replica::new_leader(endpoint)
            } else {
                Replica::new_follower(endpoint)
            });
        }
        partitions.push(Partition::new(Pid::new(pid), replicas));
    }

    partitions
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn tablets(n: usize) -> Vec<Endpoint> {
        (0..n).map(|i| Endpoint::new(format!("t{i}:9527"))).collect()
    }

    #[test]
    fn each_partition_gets_replica_factor_replicas_with_one_leader() {
        let mut rng = SmallRng::seed_from_u64(7);
        let partitions = assign_partitions(&tablets(3), 2, 2, &mut rng);

        assert_eq!(partitions.len(), 2);
        for partition in &partitions {
            assert_eq!(partition.replicas.len(), 2);
            assert_eq!(partition.replicas.iter().filter(|r| r.is_leader).count(), 1);
        }
    }

    #[test]
    fn placement_is_deterministic_for_a_fixed_seed() {
        let mut rng_a = SmallRng::seed_from_u64(42);
        let mut rng_b = SmallRng::seed_from_u64(42);
        let tablets = tablets(5);

        let a = assign_partitions(&tablets, 4, 3, &mut rng_a);
        let b = assign_partitions(&tablets, 4, 3, &mut rng_b);
        assert_eq!(a, b);
    }

    #[test]
    fn replica_factor_can_exceed_ring_by_wrapping() {
        let mut rng = SmallRng::seed_from_u64(1);
        let partitions = assign_partitions(&tablets(2), 1, 2, &mut rng);
        assert_eq!(partitions[0].replicas.len(), 2);
    }
}
