//! Q-unit-propagation (QBCP) with watched literals under an existential abstraction (EABS).
//!
//! A single [`QbcpRun`] is created per asymmetric-tautology / QRAT check: it accumulates an
//! assignment trail, propagates it to a fixed point (or a conflict, or its propagation budget),
//! and is always retracted by the caller before the check returns a result, restoring every
//! invariant this module relies on between checks.

use qbf_formula::{Lit, QType, Var};

use crate::clause::ClauseIx;
use crate::formula::Formula;
use crate::variable::Assignment;

/// Outcome of a completed (or budget-exhausted) `QbcpRun::run`.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum QbcpResult {
    /// Propagation reached a fixed point without a conflict.
    Unknown,
    /// Some clause became falsified under the current assignment.
    Unsat,
    /// `limit_qbcp_cur_props` was exceeded; the check that drove this run should be treated as
    /// inconclusive (the candidate stays non-redundant), not as an error.
    BudgetExceeded,
}

/// Internal signal that a clause was falsified; never escapes this module.
struct Conflict;

enum ScanOutcome {
    Satisfied(usize),
    Unassigned(usize),
    None,
}

fn scan_watcher(
    formula: &Formula,
    lits: &[Lit],
    from_inclusive: usize,
    eabs_nesting: Option<u32>,
    existential_only: bool,
) -> ScanOutcome {
    let mut j = from_inclusive + 1;
    while j > 0 {
        j -= 1;
        let lit = lits[j];
        let info = formula.var(lit.var());
        if info.assignment.satisfies(lit.is_positive()) {
            return ScanOutcome::Satisfied(j);
        }
        if info.assignment == Assignment::Undef
            && (!existential_only || info.is_existential_under(eabs_nesting))
        {
            return ScanOutcome::Unassigned(j);
        }
    }
    ScanOutcome::None
}

fn unwatch(formula: &mut Formula, clause_ix: ClauseIx, lit: Lit) {
    formula
        .var_mut(lit.var())
        .watched_occ_mut(lit.is_positive())
        .retain(|&ix| ix != clause_ix);
}

fn watch(formula: &mut Formula, clause_ix: ClauseIx, lit: Lit) {
    formula
        .var_mut(lit.var())
        .watched_occ_mut(lit.is_positive())
        .push(clause_ix);
}

/// A single, self-contained propagation call.
pub struct QbcpRun {
    trail: Vec<Var>,
    prop_head: usize,
    lw_update_clauses: Vec<ClauseIx>,
    eabs_nesting: Option<u32>,
    eabs_nesting_aux: u32,
    props_this_call: u64,
}

impl QbcpRun {
    pub fn new(eabs_nesting: Option<u32>) -> QbcpRun {
        QbcpRun {
            trail: Vec::new(),
            prop_head: 0,
            lw_update_clauses: Vec::new(),
            eabs_nesting,
            eabs_nesting_aux: 0,
            props_this_call: 0,
        }
    }

    /// Maximum block nesting touched by `seed` calls so far, used to pick the next abstraction
    /// level (see `qat`/`qrat`).
    pub fn eabs_nesting_aux(&self) -> u32 {
        self.eabs_nesting_aux
    }

    pub fn set_eabs_nesting(&mut self, eabs_nesting: Option<u32>) {
        self.eabs_nesting = eabs_nesting;
    }

    /// Seed an assignment before propagation begins. A repeat of an already-held consistent
    /// assignment is a no-op; a seed that contradicts one already held is a conflict.
    pub fn seed(&mut self, formula: &mut Formula, var: Var, value: Assignment) -> Result<(), ()> {
        match formula.var(var).assignment {
            Assignment::Undef => {
                self.assign_and_enqueue(formula, var, value);
                let nesting = formula.var(var).nesting;
                if nesting > self.eabs_nesting_aux {
                    self.eabs_nesting_aux = nesting;
                }
                Ok(())
            }
            current if current == value => Ok(()),
            _ => Err(()),
        }
    }

    fn assign_and_enqueue(&mut self, formula: &mut Formula, var: Var, value: Assignment) {
        debug_assert_eq!(formula.var(var).assignment, Assignment::Undef);
        formula.var_mut(var).assignment = value;
        self.trail.push(var);
        formula.stats.total_assignments += 1;
        self.props_this_call += 1;
    }

    /// Run propagation to a fixed point, a conflict, or the exhaustion of
    /// `options.limit_qbcp_cur_props`. The caller must call [`QbcpRun::retract`] afterwards
    /// regardless of the outcome.
    pub fn run(&mut self, formula: &mut Formula) -> QbcpResult {
        while self.prop_head < self.trail.len() {
            if formula.options.limit_qbcp_cur_props > 0
                && self.props_this_call >= formula.options.limit_qbcp_cur_props
            {
                return QbcpResult::BudgetExceeded;
            }

            let var = self.trail[self.prop_head];
            self.prop_head += 1;

            if self.propagate_assigned_var(formula, var).is_err() {
                return QbcpResult::Unsat;
            }
        }
        formula.stats.qbcp_total_props += self.props_this_call;
        QbcpResult::Unknown
    }

    fn propagate_assigned_var(&mut self, formula: &mut Formula, var: Var) -> Result<(), Conflict> {
        let falsified_is_positive = formula.var(var).assignment == Assignment::False;

        let mut i = 0;
        loop {
            let len_before = formula.var(var).watched_occ(falsified_is_positive).len();
            if i >= len_before {
                break;
            }
            let clause_ix = formula.var(var).watched_occ(falsified_is_positive)[i];

            self.propagate_clause(formula, clause_ix)?;

            let len_after = formula.var(var).watched_occ(falsified_is_positive).len();
            if len_after >= len_before {
                i += 1;
            }
            // else: the clause relocated its watcher away from this list; re-examine index i.
        }

        formula.var_mut(var).propagated = true;
        Ok(())
    }

    fn propagate_clause(&mut self, formula: &mut Formula, clause_ix: ClauseIx) -> Result<(), Conflict> {
        if formula.clause(clause_ix).ignore_in_qbcp {
            return Ok(());
        }

        let (old_rw, old_lw) = {
            let c = formula.clause(clause_ix);
            (c.rw_index, c.lw_index)
        };
        let rw_lit = formula.clause(clause_ix).lits[old_rw];
        let lw_lit = formula.clause(clause_ix).lits[old_lw];

        if formula.var(rw_lit.var()).assignment.satisfies(rw_lit.is_positive())
            || formula.var(lw_lit.var()).assignment.satisfies(lw_lit.is_positive())
        {
            return Ok(());
        }

        let lits = formula.clause(clause_ix).lits.clone();
        let len = lits.len();

        let new_rw = match scan_watcher(formula, &lits, len - 1, self.eabs_nesting, true) {
            ScanOutcome::None => return Err(Conflict),
            // A satisfied literal anywhere in the scan means the clause is already satisfied;
            // leave the watchers exactly where they are rather than relocating onto it.
            ScanOutcome::Satisfied(_) => return Ok(()),
            ScanOutcome::Unassigned(0) => {
                self.assign_and_enqueue(formula, lits[0].var(), Assignment::satisfying(lits[0]));
                return Ok(());
            }
            ScanOutcome::Unassigned(j) => j,
        };

        let new_lw = match scan_watcher(formula, &lits, new_rw - 1, self.eabs_nesting, false) {
            ScanOutcome::None => {
                self.assign_and_enqueue(
                    formula,
                    lits[new_rw].var(),
                    Assignment::satisfying(lits[new_rw]),
                );
                return Ok(());
            }
            ScanOutcome::Satisfied(_) => return Ok(()),
            ScanOutcome::Unassigned(j) => j,
        };

        unwatch(formula, clause_ix, rw_lit);
        unwatch(formula, clause_ix, lw_lit);

        {
            let clause = formula.clause_mut(clause_ix);
            clause.rw_index = new_rw;
            clause.lw_index = new_lw;
        }
        watch(formula, clause_ix, lits[new_rw]);
        watch(formula, clause_ix, lits[new_lw]);

        if formula.var(lits[new_rw].var()).qtype == Some(QType::Forall) {
            let clause = formula.clause_mut(clause_ix);
            if !clause.lw_update_collected {
                clause.lw_update_collected = true;
                self.lw_update_clauses.push(clause_ix);
            }
        }

        Ok(())
    }

    /// Undo every assignment made by this run and restore the watcher invariant: outside of a
    /// live QBCP call every right watcher is syntactically existential (the abstraction may have
    /// let it rest on a universal literal while variables were assigned).
    pub fn retract(mut self, formula: &mut Formula) {
        for &var in &self.trail {
            let info = formula.var_mut(var);
            info.assignment = Assignment::Undef;
            info.propagated = false;
        }

        for clause_ix in self.lw_update_clauses.drain(..) {
            let (rw_lit, len) = {
                let c = formula.clause(clause_ix);
                (c.lits[c.rw_index], c.len())
            };
            if formula.var(rw_lit.var()).qtype == Some(QType::Forall) {
                let new_rw_lit = formula.clause(clause_ix).lits[len - 1];
                unwatch(formula, clause_ix, rw_lit);
                watch(formula, clause_ix, new_rw_lit);
                formula.clause_mut(clause_ix).rw_index = len - 1;
            }
            formula.clause_mut(clause_ix).lw_update_collected = false;
        }
    }
}

/// Seed assignments for every unit input clause, as a fixed prelude run before any check's own
/// assumptions. Returns `Err` if two unit clauses conflict (immediate `Unsat`).
pub(crate) fn seed_unit_clauses(formula: &mut Formula, run: &mut QbcpRun) -> Result<(), ()> {
    let unit_clauses = formula.unit_clauses.clone();
    for ix in unit_clauses {
        if formula.clause(ix).redundant || formula.clause(ix).ignore_in_qbcp {
            continue;
        }
        let lit = formula.clause(ix).lits[0];
        run.seed(formula, lit.var(), Assignment::satisfying(lit))?;
    }
    Ok(())
}
