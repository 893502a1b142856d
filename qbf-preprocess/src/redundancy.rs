//! The redundancy loop (§4.5): per-clause and per-literal redundancy detection with witness
//! tracking and rescheduling, shared by all five modes (QBCE, QAT, QRATE, BLE, QRATU).

use rand::seq::SliceRandom;

use qbf_formula::QType;

use crate::clause::ClauseIx;
use crate::driver::TimeBudget;
use crate::formula::Formula;
use crate::literal_removal;
use crate::outer_tautology;
use crate::qrat;

/// Soft-limit polling interval, in clause tests (source uses `2^10`).
const TIME_CHECK_INTERVAL: u64 = 1 << 10;
/// Progress-logging interval, in clause tests (source uses `2^15`).
const PROGRESS_LOG_INTERVAL: u64 = 1 << 15;

fn log_progress(formula: &Formula, mode_name: &str, checks_done: u64, remaining: usize) {
    if formula.options.verbosity >= 1 && checks_done % PROGRESS_LOG_INTERVAL == 0 {
        log::info!("{}: {} checks done, {} clauses left in queue", mode_name, checks_done, remaining);
    }
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum ClauseMode {
    Qbce,
    Qat,
    Qrate,
}

impl ClauseMode {
    fn name(self) -> &'static str {
        match self {
            ClauseMode::Qbce => "QBCE",
            ClauseMode::Qat => "QAT",
            ClauseMode::Qrate => "QRATE",
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum LiteralMode {
    Ble,
    Qratu,
}

impl LiteralMode {
    fn name(self) -> &'static str {
        match self {
            LiteralMode::Ble => "BLE",
            LiteralMode::Qratu => "QRATU",
        }
    }
}

fn within_limits(formula: &Formula, clause_ix: ClauseIx) -> bool {
    let opts = &formula.options;
    let clause = formula.clause(clause_ix);
    let len = clause.len() as u32;

    if opts.limit_min_clause_len > 0 && len < opts.limit_min_clause_len {
        return false;
    }
    if opts.limit_max_clause_len > 0 && len > opts.limit_max_clause_len {
        return false;
    }
    if opts.limit_max_occ_cnt > 0 {
        for &lit in &clause.lits {
            let occ_len = formula.var(lit.var()).occ(!lit.is_positive()).len() as u32;
            if occ_len > opts.limit_max_occ_cnt {
                return false;
            }
        }
    }
    true
}

/// QBCE and BLE are always scheduled in clause-id order; only QAT/QRATE/QRATU consult
/// `options.permute` (used to probe QRAT's non-confluence, see `config.rs`'s doc comment on
/// `permute`).
fn order_queue(formula: &mut Formula, queue: &mut [ClauseIx], permutable: bool) {
    if permutable && formula.options.permute {
        queue.shuffle(formula.rng_mut());
    } else {
        queue.sort_by_key(|&ix| formula.clause(ix).id);
    }
}

fn clear_witnesses(formula: &mut Formula) {
    for ix in std::mem::take(&mut formula.witness_clauses) {
        formula.clause_mut(ix).witness = false;
    }
}

/// Reschedule non-redundant resolution partners of witnesses that have themselves become
/// redundant; witnesses that are still non-redundant are left in place (they might still be
/// needed as a witness for something else, or become redundant later and get handled then).
fn reschedule_witness_partners(formula: &mut Formula, rescheduled: &mut Vec<ClauseIx>) {
    let witnesses = std::mem::take(&mut formula.witness_clauses);
    let mut still_witnesses = Vec::with_capacity(witnesses.len());

    for witness_ix in witnesses {
        if !formula.clause(witness_ix).redundant {
            still_witnesses.push(witness_ix);
            continue;
        }

        let lits = formula.clause(witness_ix).lits.clone();
        for lit in lits {
            let partners: Vec<ClauseIx> = formula
                .var(lit.var())
                .occ(!lit.is_positive())
                .iter()
                .copied()
                .collect();
            for partner_ix in partners {
                if !formula.clause(partner_ix).redundant
                    && !formula.clause(partner_ix).rescheduled
                    && within_limits(formula, partner_ix)
                {
                    formula.clause_mut(partner_ix).rescheduled = true;
                    rescheduled.push(partner_ix);
                }
            }
        }
    }

    formula.witness_clauses = still_witnesses;
}

fn clause_is_redundant(formula: &mut Formula, mode: ClauseMode, clause_ix: ClauseIx) -> bool {
    match mode {
        ClauseMode::Qbce => {
            let ignore_outermost = formula.options.ignore_outermost_vars;
            let pivots: Vec<_> = formula
                .clause(clause_ix)
                .lits
                .iter()
                .copied()
                .filter(|l| {
                    let info = formula.var(l.var());
                    info.qtype == Some(QType::Exists) && !(ignore_outermost && info.nesting == 0)
                })
                .collect();
            for lit in pivots {
                formula.stats.cnt_qbce_checks += 1;
                if outer_tautology::is_blocking(formula, clause_ix, lit) {
                    return true;
                }
            }
            false
        }
        ClauseMode::Qat => qrat::qat_check(formula, clause_ix),
        ClauseMode::Qrate => qrat::clause_has_qrat(formula, clause_ix),
    }
}

fn saturate_clause_mode(formula: &mut Formula, mode: ClauseMode, budget: &TimeBudget) -> bool {
    let uses_witnesses = mode != ClauseMode::Qat;
    let permutable = mode != ClauseMode::Qbce;
    if uses_witnesses {
        clear_witnesses(formula);
    }

    let mut to_be_checked: Vec<ClauseIx> = formula
        .clause_indices()
        .filter(|&ix| within_limits(formula, ix))
        .collect();
    let mut rescheduled: Vec<ClauseIx> = Vec::new();
    let mut any_change = false;
    let mut checks_done: u64 = 0;

    loop {
        if to_be_checked.is_empty() {
            break;
        }

        order_queue(formula, &mut to_be_checked, permutable);
        let total = to_be_checked.len();

        for (processed, ix) in to_be_checked.drain(..).enumerate() {
            formula.clause_mut(ix).rescheduled = false;
            if formula.clause(ix).redundant {
                continue;
            }

            checks_done += 1;
            log_progress(formula, mode.name(), checks_done, total - processed - 1);
            if checks_done % TIME_CHECK_INTERVAL == 0 && budget.expired() {
                return any_change;
            }

            if clause_is_redundant(formula, mode, ix) {
                formula.clause_mut(ix).redundant = true;
                formula.stats.cnt_redundant_clauses += 1;
                any_change = true;
            }
        }

        if mode == ClauseMode::Qbce {
            formula.stats.cnt_qbce_iterations += 1;
        }

        if uses_witnesses {
            reschedule_witness_partners(formula, &mut rescheduled);
        }
        if rescheduled.is_empty() {
            break;
        }
        std::mem::swap(&mut to_be_checked, &mut rescheduled);
        rescheduled.clear();
    }

    any_change
}

pub(crate) fn run_qbce(formula: &mut Formula, budget: &TimeBudget) -> bool {
    saturate_clause_mode(formula, ClauseMode::Qbce, budget)
}

pub(crate) fn run_qat(formula: &mut Formula, budget: &TimeBudget) -> bool {
    saturate_clause_mode(formula, ClauseMode::Qat, budget)
}

pub(crate) fn run_qrate(formula: &mut Formula, budget: &TimeBudget) -> bool {
    saturate_clause_mode(formula, ClauseMode::Qrate, budget)
}

/// Try every universal literal currently in `clause_ix`, removing each that is blocked/has QRAT.
/// Re-scans the clause's (possibly shrinking) literal list by index rather than by iterator, to
/// avoid mutating a list while holding a live position into it.
fn remove_redundant_literals(formula: &mut Formula, mode: LiteralMode, clause_ix: ClauseIx) -> bool {
    let mut removed_any = false;
    let mut i = 0;
    loop {
        if formula.clause(clause_ix).redundant {
            break;
        }
        let lits = formula.clause(clause_ix).lits.clone();
        if i >= lits.len() {
            break;
        }
        let lit = lits[i];
        let info = formula.var(lit.var());
        if info.qtype != Some(QType::Forall) || (formula.options.ignore_outermost_vars && info.nesting == 0) {
            i += 1;
            continue;
        }

        let blocked = match mode {
            LiteralMode::Ble => outer_tautology::is_blocking(formula, clause_ix, lit),
            LiteralMode::Qratu => {
                formula.stats.cnt_qratu_checks += 1;
                qrat::literal_has_qrat(formula, clause_ix, lit)
            }
        };

        if blocked {
            literal_removal::remove_universal_literal(formula, clause_ix, lit);
            formula.stats.cnt_redundant_literals += 1;
            removed_any = true;
            // the literal previously at i+1 has shifted into i; re-examine it
        } else {
            i += 1;
        }
    }
    removed_any
}

fn saturate_literal_mode(formula: &mut Formula, mode: LiteralMode, budget: &TimeBudget) -> bool {
    let permutable = mode != LiteralMode::Ble;
    let mut to_be_checked: Vec<ClauseIx> = formula
        .clause_indices()
        .filter(|&ix| within_limits(formula, ix))
        .collect();
    let mut any_change = false;
    let mut checks_done: u64 = 0;

    loop {
        if to_be_checked.is_empty() {
            break;
        }
        order_queue(formula, &mut to_be_checked, permutable);
        let total = to_be_checked.len();

        let mut pass_changed = false;
        for (processed, ix) in to_be_checked.drain(..).enumerate() {
            formula.clause_mut(ix).rescheduled = false;
            if formula.clause(ix).redundant {
                continue;
            }

            checks_done += 1;
            log_progress(formula, mode.name(), checks_done, total - processed - 1);
            if checks_done % TIME_CHECK_INTERVAL == 0 && budget.expired() {
                return any_change;
            }

            if remove_redundant_literals(formula, mode, ix) {
                pass_changed = true;
                any_change = true;
            }
        }

        if mode == LiteralMode::Qratu {
            formula.stats.cnt_qratu_iterations += 1;
        }

        if !pass_changed {
            break;
        }
        to_be_checked = formula
            .clause_indices()
            .filter(|&ix| within_limits(formula, ix))
            .collect();
    }

    any_change
}

pub(crate) fn run_ble(formula: &mut Formula, budget: &TimeBudget) -> bool {
    saturate_literal_mode(formula, LiteralMode::Ble, budget)
}

pub(crate) fn run_qratu(formula: &mut Formula, budget: &TimeBudget) -> bool {
    saturate_literal_mode(formula, LiteralMode::Qratu, budget)
}
