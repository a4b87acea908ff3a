//! Aggressive accusation withdrawal and reversal
//!
//! A self-accusing replica's accusations of others are suspect. Whether
//! each one stands depends on how the two counts compare:
//!
//!   - count for the other replica is greater: the accusation stands
//!   - the two counts are equal: the accusation is withdrawn
//!   - count for self is greater: the accusation is reversed
//!
//! Accusation loops must be broken here, before the split-brain check
//! runs, so this pass is kept separate from detection.

use tracing::debug;

use crate::matrix::AccusationMatrix;
use crate::replica::ReplicaId;

/// Rewrite `matrix` so that well-founded cross-accusations override
/// self-accusations.
///
/// Viewers are processed sequentially in `order`, against the matrix
/// state current at that point: a later viewer sees the reversals already
/// applied on behalf of earlier viewers. The input matrix is left
/// untouched.
pub fn resolve(matrix: &AccusationMatrix, order: &[ReplicaId]) -> AccusationMatrix {
    let mut out = matrix.clone();

    for &viewer in order {
        let own = out.data(viewer, viewer);
        if own == 0 {
            continue;
        }
        let mut withdrawn = 0usize;
        for &target in order {
            if viewer == target {
                continue;
            }
            let other = out.data(viewer, target);
            if other <= own {
                debug!(viewer = %viewer, target = %target, "Withdrawing accusation");
                out.set_data(viewer, target, 0);
                if other < own {
                    debug!(viewer = %viewer, target = %target, "Reversing it as well");
                    let reversed = out.data(target, viewer).saturating_add(1);
                    out.set_data(target, viewer, reversed);
                }
                withdrawn += 1;
            }
        }
        // If all of this viewer's accusations of others stand, extend full
        // trust and remove the self-accusation.
        if withdrawn == 0 && out.data(viewer, viewer) != 0 {
            debug!(viewer = %viewer, "Clearing self-accusation");
            out.set_data(viewer, viewer, 0);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: ReplicaId = ReplicaId(0);
    const B: ReplicaId = ReplicaId(1);

    fn matrix(cells: [u32; 4]) -> AccusationMatrix {
        let mut m = AccusationMatrix::zeroed(2);
        m.set_data(A, A, cells[0]);
        m.set_data(A, B, cells[1]);
        m.set_data(B, A, cells[2]);
        m.set_data(B, B, cells[3]);
        m
    }

    fn cells(m: &AccusationMatrix) -> [u32; 4] {
        [m.data(A, A), m.data(A, B), m.data(B, A), m.data(B, B)]
    }

    #[test]
    fn test_stronger_cross_accusation_stands() {
        let before = matrix([1, 2, 0, 0]);
        let after = resolve(&before, &[A, B]);
        // The accusation stood, so the self-accusation is cleared.
        assert_eq!(cells(&after), [0, 2, 0, 0]);
    }

    #[test]
    fn test_equal_counts_withdraw_without_reversal() {
        let before = matrix([1, 1, 0, 0]);
        let after = resolve(&before, &[A, B]);
        assert_eq!(cells(&after), [1, 0, 0, 0]);
    }

    #[test]
    fn test_weaker_cross_accusation_is_reversed() {
        let before = matrix([2, 1, 0, 0]);
        let after = resolve(&before, &[A, B]);
        assert_eq!(cells(&after), [2, 0, 1, 0]);
    }

    #[test]
    fn test_later_viewer_sees_earlier_reversal() {
        // Both replicas accuse only themselves. A's pass reverses its
        // zero accusation of B; B's pass then withdraws that fresh
        // reverse accusation against A.
        let before = matrix([1, 0, 0, 1]);
        let after = resolve(&before, &[A, B]);
        assert_eq!(cells(&after), [1, 0, 0, 1]);
    }

    #[test]
    fn test_input_matrix_is_untouched() {
        let before = matrix([2, 1, 0, 0]);
        let snapshot = before.clone();
        let _ = resolve(&before, &[A, B]);
        assert_eq!(before, snapshot);
    }

    #[test]
    fn test_no_self_accusation_is_a_noop() {
        let before = matrix([0, 3, 2, 0]);
        let after = resolve(&before, &[A, B]);
        assert_eq!(cells(&after), cells(&before));
    }
}
