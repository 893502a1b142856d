//! Clause storage.
//!
//! The original engine this is grounded on packs clauses into a single growable byte buffer and
//! addresses them with offsets into that buffer (an arena of variable-length records, akin to
//! `varisat`'s `ClauseAlloc`/`ClauseRef`). That design is built around clauses that never change
//! length after creation. Here clauses shrink in place (BLE/QRATU remove literals, invariant 3
//! keeps re-deriving watcher positions), which is awkward to do safely inside a packed arena, so
//! clauses are instead stored as an ordinary `Vec<Clause>`, each owning its own `Vec<Lit>`. A
//! clause's position in that `Vec` never changes, so a `ClauseIx` is a stable handle for the
//! lifetime of the formula, the same role `ClauseRef` plays in the packed design.

use qbf_formula::Lit;

/// A stable handle to a clause, valid for the lifetime of the owning formula.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct ClauseIx(u32);

impl ClauseIx {
    pub(crate) fn from_index(index: usize) -> ClauseIx {
        ClauseIx(index as u32)
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Sentinel for an unset watcher index (invariant 4's "invalid index").
pub const INVALID_WATCH: usize = usize::max_value();

/// A single clause: its literals, watcher positions and status bits.
///
/// Literals are kept sorted ascending by `(qblock.nesting, variable.id)` (invariant 1); this is
/// the formula store's responsibility to maintain, not this type's.
#[derive(Clone, Debug)]
pub struct Clause {
    /// Assigned in ingest order; stable even as clauses are removed or shrunk.
    pub id: u32,
    pub lits: Vec<Lit>,

    /// Right watcher: for clauses of length >= 2, always on an unassigned existential literal
    /// under the current abstraction (invariant 4), or `INVALID_WATCH` if unwatched (length <
    /// 2, or mid-update).
    pub rw_index: usize,
    /// Left watcher: `lw_index < rw_index`, any quantifier type.
    pub lw_index: usize,

    /// Set once this clause has been found redundant by any clause-level check.
    pub redundant: bool,
    /// Set while this clause is in the `rescheduled` queue, to avoid double-scheduling.
    pub rescheduled: bool,
    /// Set for the duration of an asymmetric-tautology style check on this very clause, so QBCP
    /// does not use it to derive a (trivial) conflict against itself.
    pub ignore_in_qbcp: bool,
    /// Set when this clause has witnessed another clause's non-redundancy, so it is tracked in
    /// `witness_clauses` for rescheduling if it later becomes redundant itself.
    pub witness: bool,
    /// Set when this clause is already recorded in `lw_update_clauses` for the current QBCP
    /// call, so it isn't pushed twice.
    pub lw_update_collected: bool,
}

impl Clause {
    pub fn new(id: u32, lits: Vec<Lit>) -> Clause {
        let len = lits.len();
        let (lw_index, rw_index) = if len >= 2 {
            (len - 2, len - 1)
        } else {
            (INVALID_WATCH, INVALID_WATCH)
        };
        Clause {
            id,
            lits,
            rw_index,
            lw_index,
            redundant: false,
            rescheduled: false,
            ignore_in_qbcp: false,
            witness: false,
            lw_update_collected: false,
        }
    }

    pub fn len(&self) -> usize {
        self.lits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lits.is_empty()
    }

    pub fn is_watched(&self) -> bool {
        self.rw_index != INVALID_WATCH
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qbf_formula::Lit;

    #[test]
    fn short_clauses_start_unwatched() {
        let unit = Clause::new(0, vec![Lit::from_dimacs(1)]);
        assert!(!unit.is_watched());
        assert_eq!(unit.rw_index, INVALID_WATCH);
        assert_eq!(unit.lw_index, INVALID_WATCH);
    }

    #[test]
    fn clauses_of_length_two_or_more_start_watched_on_the_last_two_literals() {
        let clause = Clause::new(0, vec![Lit::from_dimacs(1), Lit::from_dimacs(2), Lit::from_dimacs(3)]);
        assert!(clause.is_watched());
        assert_eq!(clause.rw_index, 2);
        assert_eq!(clause.lw_index, 1);
        assert!(clause.lw_index < clause.rw_index);
    }
}
