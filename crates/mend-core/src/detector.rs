//! Split-brain detection over a resolved matrix

use crate::matrix::AccusationMatrix;
use crate::replica::ReplicaId;
use crate::verdict::ConflictKind;

/// Scan for accusation patterns that make healing unsafe.
///
/// Mutual accusation is always fatal. Accusation of self plus others is
/// fatal only outside aggressive mode; in aggressive mode the resolver
/// has already adjudicated that combination. The first violation found
/// wins.
pub fn detect(
    matrix: &AccusationMatrix,
    order: &[ReplicaId],
    aggressive: bool,
) -> Option<ConflictKind> {
    for &viewer in order {
        for &target in order {
            if viewer == target {
                continue;
            }
            if matrix.data(viewer, target) == 0 {
                continue;
            }
            if matrix.data(target, viewer) != 0 {
                return Some(ConflictKind::MutualAccusation {
                    a: viewer,
                    b: target,
                });
            }
            if !aggressive && matrix.data(viewer, viewer) != 0 {
                return Some(ConflictKind::SelfPlusOtherAccusation { viewer, target });
            }
        }
    }
    None
}
