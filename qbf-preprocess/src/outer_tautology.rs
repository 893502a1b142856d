//! Outer-resolvent / outer-tautology checks (syntactic, nesting-bounded).
//!
//! Used directly by QBCE/BLE (a clause or universal literal is blocked iff every resolvent with
//! an opposite-phase partner is an outer tautology) and indirectly wherever `witness_clauses`
//! tracking is needed for non-confluent rescheduling.

use qbf_formula::Lit;

use crate::clause::ClauseIx;
use crate::formula::Formula;

/// Whether the resolvent of `c_lits` and `occ_lits` on `pivot` is tautologous on a variable at
/// nesting `<= nesting(pivot)`.
///
/// Both clauses are sorted ascending by `(nesting, var id)` (invariant 1), so once a literal's
/// nesting exceeds the pivot's, every later literal's nesting does too. With
/// `prune_by_nesting` this sortedness is exploited to stop scanning early; without it, every
/// literal is still visited (and counted), matching the source's unoptimized code path used to
/// compare against the pruned one.
fn is_outer_tautology(
    formula: &mut Formula,
    c_lits: &[Lit],
    occ_lits: &[Lit],
    pivot: Lit,
    prune_by_nesting: bool,
) -> bool {
    let pivot_nesting = formula.var(pivot.var()).nesting;

    for &cl in c_lits {
        if cl == pivot {
            continue;
        }

        let cl_nesting = formula.var(cl.var()).nesting;
        formula.stats.clause_redundancy_or_checks_lits_seen += 1;
        if cl_nesting > pivot_nesting {
            if prune_by_nesting {
                break;
            } else {
                continue;
            }
        }

        for &ol in occ_lits {
            let ol_nesting = formula.var(ol.var()).nesting;
            formula.stats.clause_redundancy_or_checks_lits_seen += 1;
            if ol_nesting > pivot_nesting {
                if prune_by_nesting {
                    break;
                } else {
                    continue;
                }
            }

            if ol == !cl {
                return true;
            }
        }
    }

    false
}

/// Record that `occ_ix` witnessed some clause's/literal's non-redundancy, so it is revisited if
/// `occ_ix` itself later becomes redundant (see [`crate::redundancy`]).
pub(crate) fn record_witness(formula: &mut Formula, occ_ix: ClauseIx) {
    if !formula.clause(occ_ix).witness {
        formula.clause_mut(occ_ix).witness = true;
        formula.witness_clauses.push(occ_ix);
    }
}

/// QBCE/BLE blocking test: `pivot` (a literal of `clause_ix`, either quantifier type) blocks the
/// clause/is itself blocked iff every non-redundant opposite-phase occurrence resolves to an
/// outer tautology on `pivot`. The first partner that does not is recorded as a witness.
pub(crate) fn is_blocking(formula: &mut Formula, clause_ix: ClauseIx, pivot: Lit) -> bool {
    let prune = formula.options.qbce_check_taut_by_nesting;
    let c_lits = formula.clause(clause_ix).lits.clone();

    let candidates: Vec<ClauseIx> = formula
        .var(pivot.var())
        .occ(!pivot.is_positive())
        .iter()
        .copied()
        .filter(|&ix| ix != clause_ix && !formula.clause(ix).redundant)
        .collect();

    let mut witness = None;
    for occ_ix in candidates {
        formula.stats.clause_redundancy_or_checks += 1;
        let occ_lits = formula.clause(occ_ix).lits.clone();
        if !is_outer_tautology(formula, &c_lits, &occ_lits, pivot, prune) {
            witness = Some(occ_ix);
            break;
        }
    }

    match witness {
        Some(occ_ix) => {
            record_witness(formula, occ_ix);
            false
        }
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qbf_qdimacs::QdimacsParser;

    fn parse(input: &[u8]) -> Formula {
        QdimacsParser::parse(input, Formula::new()).expect("parsing failed")
    }

    #[test]
    fn blocking_clause_has_tautologous_resolvent_on_every_partner() {
        // Clause 1 is `1 2`, clause 2 is `-1 -2`; resolving on pivot `1` leaves `2` and `-2`, a
        // tautology, so `1` blocks clause 1 against its only opposite-phase partner.
        let mut formula = parse(b"p cnf 2 2\ne 1 2 0\n1 2 0\n-1 -2 0\n");
        let clause_ix = formula.clause_indices().next().unwrap();
        let pivot = formula.clause(clause_ix).lits[0];
        assert!(is_blocking(&mut formula, clause_ix, pivot));
    }

    #[test]
    fn non_blocking_clause_records_the_failing_partner_as_a_witness() {
        // Clause 1 is `1 2`, clause 2 is `-1 3`; resolving on pivot `1` leaves `2` and `3`, not
        // a tautology, so clause 2 witnesses that `1` does not block clause 1.
        let mut formula = parse(b"p cnf 3 2\ne 1 2 3 0\n1 2 0\n-1 3 0\n");
        let clause_ix = formula.clause_indices().next().unwrap();
        let pivot = formula.clause(clause_ix).lits[0];
        assert!(!is_blocking(&mut formula, clause_ix, pivot));
        assert_eq!(formula.witness_clauses.len(), 1);
    }
}
