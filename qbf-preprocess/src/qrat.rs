//! QAT/QRAT checkers (§4.4): asymmetric tautology and its resolution-aware strengthening,
//! built on top of a single [`QbcpRun`] per check.

use qbf_formula::{Lit, QType};

use crate::clause::ClauseIx;
use crate::formula::Formula;
use crate::outer_tautology::record_witness;
use crate::qbcp::{seed_unit_clauses, QbcpResult, QbcpRun};
use crate::variable::Assignment;

fn eabs_nesting_for(formula: &Formula, run: &QbcpRun) -> Option<u32> {
    if formula.options.no_eabs {
        return None;
    }
    let aux = run.eabs_nesting_aux();
    if formula.options.no_eabs_improved_nesting || aux == 0 {
        Some(aux)
    } else {
        Some(aux - 1)
    }
}

/// Whether `clause_ix` is an asymmetric tautology: negating it and propagating derives `Unsat`.
pub(crate) fn qat_check(formula: &mut Formula, clause_ix: ClauseIx) -> bool {
    formula.clause_mut(clause_ix).ignore_in_qbcp = true;

    let mut run = QbcpRun::new(None);
    let result = (|| -> Result<QbcpResult, ()> {
        seed_unit_clauses(formula, &mut run)?;
        for &lit in &formula.clause(clause_ix).lits.clone() {
            run.seed(formula, lit.var(), Assignment::falsifying(lit))?;
        }
        run.set_eabs_nesting(eabs_nesting_for(formula, &run));
        Ok(run.run(formula))
    })();

    let is_tautology = matches!(result, Ok(QbcpResult::Unsat) | Err(()));
    run.retract(formula);
    formula.clause_mut(clause_ix).ignore_in_qbcp = false;
    is_tautology
}

/// The QRAT resolution check: as [`qat_check`] but seeds from three waves — unit clauses, the
/// tested clause's literals (except `lit`), and the resolution partner's literals (except
/// `-lit`, bounded by `nesting(lit)`).
fn qrat_check(formula: &mut Formula, clause_ix: ClauseIx, lit: Lit, occ_ix: ClauseIx) -> bool {
    formula.clause_mut(clause_ix).ignore_in_qbcp = true;
    formula.clause_mut(occ_ix).ignore_in_qbcp = true;

    let pivot_nesting = formula.var(lit.var()).nesting;
    let ignore_inner_lits = formula.options.ignore_inner_lits;

    let mut run = QbcpRun::new(None);
    let result = (|| -> Result<QbcpResult, ()> {
        seed_unit_clauses(formula, &mut run)?;

        for &cl in &formula.clause(clause_ix).lits.clone() {
            if cl == lit {
                continue;
            }
            if ignore_inner_lits && formula.var(cl.var()).nesting > pivot_nesting {
                continue;
            }
            run.seed(formula, cl.var(), Assignment::falsifying(cl))?;
        }

        let not_lit = !lit;
        for &ol in &formula.clause(occ_ix).lits.clone() {
            if ol == not_lit {
                continue;
            }
            // Literals are sorted ascending by nesting (invariant 1); once the bound is
            // exceeded every later literal's is too.
            if formula.var(ol.var()).nesting > pivot_nesting {
                break;
            }
            run.seed(formula, ol.var(), Assignment::falsifying(ol))?;
        }

        run.set_eabs_nesting(eabs_nesting_for(formula, &run));
        Ok(run.run(formula))
    })();

    let has_qrat = matches!(result, Ok(QbcpResult::Unsat) | Err(()));
    run.retract(formula);
    formula.clause_mut(clause_ix).ignore_in_qbcp = false;
    formula.clause_mut(occ_ix).ignore_in_qbcp = false;

    has_qrat
}

/// Whether `lit` (a literal of `clause_ix`) has QRAT: every non-redundant opposite-phase
/// occurrence resolves to a propositional tautology under the seeded assignment. Records the
/// first occurrence that fails as a witness.
pub(crate) fn has_qrat_on_literal(formula: &mut Formula, clause_ix: ClauseIx, lit: Lit) -> bool {
    let candidates: Vec<ClauseIx> = formula
        .var(lit.var())
        .occ(!lit.is_positive())
        .iter()
        .copied()
        .filter(|&ix| ix != clause_ix && !formula.clause(ix).redundant)
        .collect();

    for occ_ix in candidates {
        if !qrat_check(formula, clause_ix, lit, occ_ix) {
            record_witness(formula, occ_ix);
            return false;
        }
    }
    true
}

/// Whether `clause_ix` has QRAT on some existential literal (QRATE); the first literal that
/// qualifies is returned so callers can reuse it as the removal pivot in literal modes.
pub(crate) fn clause_has_qrat(formula: &mut Formula, clause_ix: ClauseIx) -> bool {
    let ignore_outermost = formula.options.ignore_outermost_vars;
    let existential_lits: Vec<Lit> = formula
        .clause(clause_ix)
        .lits
        .iter()
        .copied()
        .filter(|l| {
            let info = formula.var(l.var());
            info.qtype == Some(QType::Exists) && !(ignore_outermost && info.nesting == 0)
        })
        .collect();

    for lit in existential_lits {
        if has_qrat_on_literal(formula, clause_ix, lit) {
            return true;
        }
    }
    false
}

/// QRATU: whether universal `lit` (in `clause_ix`) itself has QRAT, making it removable.
pub(crate) fn literal_has_qrat(formula: &mut Formula, clause_ix: ClauseIx, lit: Lit) -> bool {
    has_qrat_on_literal(formula, clause_ix, lit)
}
