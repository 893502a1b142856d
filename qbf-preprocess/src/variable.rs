//! Per-variable state: quantifier membership, assignment and occurrence lists.

use qbf_formula::{Lit, Nesting, QType};

use crate::clause::ClauseIx;

/// The three-valued assignment a variable can carry during a single QBCP call.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Assignment {
    True,
    False,
    Undef,
}

impl Assignment {
    /// Whether a literal of the given polarity is satisfied under this assignment.
    pub fn satisfies(self, polarity_is_positive: bool) -> bool {
        match self {
            Assignment::True => polarity_is_positive,
            Assignment::False => !polarity_is_positive,
            Assignment::Undef => false,
        }
    }

    /// Whether a literal of the given polarity is falsified under this assignment.
    pub fn falsifies(self, polarity_is_positive: bool) -> bool {
        match self {
            Assignment::True => !polarity_is_positive,
            Assignment::False => polarity_is_positive,
            Assignment::Undef => false,
        }
    }

    /// The assignment that satisfies `lit`.
    pub fn satisfying(lit: Lit) -> Assignment {
        if lit.is_positive() {
            Assignment::True
        } else {
            Assignment::False
        }
    }

    /// The assignment that falsifies `lit`.
    pub fn falsifying(lit: Lit) -> Assignment {
        Assignment::satisfying(!lit)
    }
}

impl Default for Assignment {
    fn default() -> Assignment {
        Assignment::Undef
    }
}

/// Per-variable state.
///
/// Indexed by `Var::index()` in a dense table owned by the formula store (invariant 8: the
/// occurrence lists here are exactly what indexes the formula from the variable's side).
#[derive(Clone, Debug, Default)]
pub struct VarInfo {
    /// Quantifier type of the block this variable belongs to. `None` until ingest places it in a
    /// block.
    pub qtype: Option<QType>,
    /// Nesting level of the owning block (renumbered once the prefix is finalized).
    pub nesting: Nesting,

    pub assignment: Assignment,
    /// Set once QBCP has consumed this variable's assignment to propagate its implications.
    pub propagated: bool,

    /// Transient scan marks, repurposed by whichever pass is currently running (e.g. "already
    /// visited while scanning an occurrence list", "already seeded this QBCP call"). Callers are
    /// responsible for clearing the mark they use before relying on it.
    pub mark_a: bool,
    pub mark_b: bool,

    pub pos_occ: Vec<ClauseIx>,
    pub neg_occ: Vec<ClauseIx>,
    pub watched_pos_occ: Vec<ClauseIx>,
    pub watched_neg_occ: Vec<ClauseIx>,
}

impl VarInfo {
    pub fn is_quantified(&self) -> bool {
        self.qtype.is_some()
    }

    /// Whether this variable is existential given an existential-abstraction level: its own
    /// block is existential, or (when abstraction is enabled) its nesting is within the
    /// abstracted range. `None` means abstraction is disabled: only its declared type counts.
    pub fn is_existential_under(&self, eabs_nesting: Option<Nesting>) -> bool {
        match self.qtype {
            Some(QType::Exists) => true,
            Some(QType::Forall) => eabs_nesting.map_or(false, |n| self.nesting <= n),
            None => false,
        }
    }

    pub fn occ(&self, positive: bool) -> &[ClauseIx] {
        if positive {
            &self.pos_occ
        } else {
            &self.neg_occ
        }
    }

    pub fn occ_mut(&mut self, positive: bool) -> &mut Vec<ClauseIx> {
        if positive {
            &mut self.pos_occ
        } else {
            &mut self.neg_occ
        }
    }

    pub fn watched_occ(&self, positive: bool) -> &[ClauseIx] {
        if positive {
            &self.watched_pos_occ
        } else {
            &self.watched_neg_occ
        }
    }

    pub fn watched_occ_mut(&mut self, positive: bool) -> &mut Vec<ClauseIx> {
        if positive {
            &mut self.watched_pos_occ
        } else {
            &mut self.watched_neg_occ
        }
    }
}
