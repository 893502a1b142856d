//! Universal literal removal (§4.6), shared by BLE and QRATU.
//!
//! The source this is grounded on walks a clause's literal array with a raw pointer and
//! decrements it in place while removing entries (flagged in its own comments as fragile). Here
//! the clause's literal vector is edited by index and watcher bookkeeping is re-derived instead
//! of patched in place, which sidesteps that fragility without changing the observable result.

use qbf_formula::Lit;

use crate::clause::{ClauseIx, INVALID_WATCH};
use crate::formula::Formula;

/// Remove `lit` (a universal literal of `clause_ix`) from the clause, fixing up occurrence and
/// watcher bookkeeping. Returns the clause's new length.
pub(crate) fn remove_universal_literal(formula: &mut Formula, clause_ix: ClauseIx, lit: Lit) -> usize {
    formula
        .var_mut(lit.var())
        .occ_mut(lit.is_positive())
        .retain(|&ix| ix != clause_ix);

    let pos = formula
        .clause(clause_ix)
        .lits
        .iter()
        .position(|&l| l == lit)
        .expect("lit must be present in its own clause");

    let (old_rw, old_lw) = {
        let c = formula.clause(clause_ix);
        (c.rw_index, c.lw_index)
    };

    let mut needs_reinit = false;
    if old_rw == pos || old_lw == pos {
        let rw_lit = formula.clause(clause_ix).lits[old_rw];
        let lw_lit = formula.clause(clause_ix).lits[old_lw];
        unwatch_for_removal(formula, clause_ix, rw_lit);
        unwatch_for_removal(formula, clause_ix, lw_lit);
        needs_reinit = true;
    }

    {
        let clause = formula.clause_mut(clause_ix);
        clause.lits.remove(pos);
        if !needs_reinit && clause.is_watched() {
            if clause.rw_index > pos {
                clause.rw_index -= 1;
            }
            if clause.lw_index > pos {
                clause.lw_index -= 1;
            }
        }
    }

    let len = formula.clause(clause_ix).len();

    if len < 2 {
        let clause = formula.clause_mut(clause_ix);
        clause.rw_index = INVALID_WATCH;
        clause.lw_index = INVALID_WATCH;
        if len == 1 {
            formula.unit_clauses.push(clause_ix);
        }
    } else if needs_reinit {
        let (rw_lit, lw_lit) = {
            let clause = formula.clause_mut(clause_ix);
            clause.rw_index = len - 1;
            clause.lw_index = len - 2;
            (clause.lits[len - 1], clause.lits[len - 2])
        };
        formula
            .var_mut(rw_lit.var())
            .watched_occ_mut(rw_lit.is_positive())
            .push(clause_ix);
        formula
            .var_mut(lw_lit.var())
            .watched_occ_mut(lw_lit.is_positive())
            .push(clause_ix);
    }

    len
}

fn unwatch_for_removal(formula: &mut Formula, clause_ix: ClauseIx, lit: Lit) {
    formula
        .var_mut(lit.var())
        .watched_occ_mut(lit.is_positive())
        .retain(|&ix| ix != clause_ix);
}
