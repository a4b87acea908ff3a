//! Authoritative source selection
//!
//! Any replica that has the file and is no longer accused by anyone can
//! be a source. As a tie-breaker, the replica that seems furthest ahead
//! wins: its score rewards both the accusations it has leveled at peers
//! and any self-admitted guilt those peers carry.

use tracing::debug;

use crate::matrix::AccusationMatrix;
use crate::replica::{ReplicaId, ReplicaSet};
use crate::verdict::ConflictKind;

/// Pick the authoritative source, or the conflict that prevents one.
///
/// A strictly positive score is required: a pristine candidate with no
/// positive evidence of being ahead is reported as cancelled-out
/// accusations rather than healed.
pub fn select(
    matrix: &AccusationMatrix,
    replicas: &ReplicaSet,
) -> std::result::Result<ReplicaId, ConflictKind> {
    match best_candidate(matrix, replicas) {
        None => Err(ConflictKind::NoPristineSource),
        Some((_, 0)) => Err(ConflictKind::AccusationsCancel),
        Some((source, score)) => {
            debug!(source = %source, score, "Selected heal source");
            Ok(source)
        }
    }
}

/// The eligible candidate with the greatest score, if any.
///
/// Candidates are considered in replica order and only replaced on a
/// strictly greater score, so equal-score ties always resolve to the
/// earlier replica.
fn best_candidate(matrix: &AccusationMatrix, replicas: &ReplicaSet) -> Option<(ReplicaId, u64)> {
    let mut best: Option<(ReplicaId, u64)> = None;

    for (candidate, replica) in replicas.iter() {
        if !replica.present {
            continue;
        }
        // If anyone accuses, the candidate is rejected.
        let accused = replicas
            .iter()
            .any(|(viewer, _)| matrix.data(viewer, candidate) != 0);
        if accused {
            continue;
        }
        let mut score = 0u64;
        for (target, _) in replicas.iter() {
            if target != candidate {
                score += u64::from(matrix.data(candidate, target));
                score += u64::from(matrix.data(target, target));
            }
        }
        match best {
            Some((_, high)) if score <= high => {}
            _ => best = Some((candidate, score)),
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replica::Replica;

    const A: ReplicaId = ReplicaId(0);
    const B: ReplicaId = ReplicaId(1);

    fn replicas(present: [bool; 2]) -> ReplicaSet {
        let mut set = ReplicaSet::new(vec![
            Replica::new("client-0", "server-0:/export", "/b0"),
            Replica::new("client-1", "server-1:/export", "/b1"),
        ])
        .unwrap();
        for (i, p) in present.iter().enumerate() {
            if *p {
                set.mark_present(ReplicaId(i));
            }
        }
        set
    }

    fn matrix(cells: [u32; 4]) -> AccusationMatrix {
        let mut m = AccusationMatrix::zeroed(2);
        m.set_data(A, A, cells[0]);
        m.set_data(A, B, cells[1]);
        m.set_data(B, A, cells[2]);
        m.set_data(B, B, cells[3]);
        m
    }

    #[test]
    fn test_accuser_wins_with_peer_self_count() {
        // A accuses B, and B admits guilt: both counts feed A's score.
        let m = matrix([0, 1, 0, 1]);
        assert_eq!(select(&m, &replicas([true, true])), Ok(A));
    }

    #[test]
    fn test_accused_replica_is_ineligible() {
        let m = matrix([0, 0, 1, 0]);
        assert_eq!(select(&m, &replicas([true, true])), Ok(B));
    }

    #[test]
    fn test_absent_replica_is_never_a_source() {
        // B would win on score, but it does not have the file.
        let m = matrix([1, 0, 0, 0]);
        assert_eq!(
            select(&m, &replicas([true, false])),
            Err(ConflictKind::NoPristineSource)
        );
    }

    #[test]
    fn test_all_accused_means_no_pristine_source() {
        let m = matrix([1, 0, 0, 1]);
        assert_eq!(
            select(&m, &replicas([true, true])),
            Err(ConflictKind::NoPristineSource)
        );
    }

    #[test]
    fn test_zero_score_reports_cancelled_accusations() {
        let m = matrix([0, 0, 0, 0]);
        assert_eq!(
            select(&m, &replicas([true, true])),
            Err(ConflictKind::AccusationsCancel)
        );
    }

    #[test]
    fn test_equal_score_tie_breaks_to_earlier_replica() {
        // Both candidates eligible with the same score: the candidate
        // earlier in the replica ordering must win, deterministically.
        let m = matrix([0, 0, 0, 0]);
        let set = replicas([true, true]);
        for _ in 0..16 {
            assert_eq!(best_candidate(&m, &set), Some((A, 0)));
        }
    }
}
