//! Top-level driver loop (§4.7): alternates clause-mode and literal-mode saturation until
//! neither finds anything, the iteration cap is hit, or the soft time limit expires.

use std::time::{Duration, Instant};

use crate::formula::Formula;
use crate::redundancy;

/// Soft wall-clock budget for a whole `preprocess()` call. `None` means unlimited.
pub(crate) struct TimeBudget {
    deadline: Option<Instant>,
}

impl TimeBudget {
    fn new(soft_time_limit_secs: u64) -> TimeBudget {
        TimeBudget {
            deadline: if soft_time_limit_secs == 0 {
                None
            } else {
                Some(Instant::now() + Duration::from_secs(soft_time_limit_secs))
            },
        }
    }

    pub(crate) fn expired(&self) -> bool {
        matches!(self.deadline, Some(deadline) if Instant::now() >= deadline)
    }
}

/// Run the redundancy engine to a fixed point (or until the soft time limit or
/// `limit_global_iterations` cuts it short). Returns the number of driver iterations performed.
pub fn preprocess(formula: &mut Formula) -> u32 {
    let budget = TimeBudget::new(formula.options.soft_time_limit);

    let mut iter = 0;
    let mut changed = true;
    while changed && !budget.expired() && iter < formula.options.limit_global_iterations {
        iter += 1;
        changed = false;
        log::debug!("driver: starting iteration {}", iter);

        if !formula.options.no_qbce {
            changed |= redundancy::run_qbce(formula, &budget);
            formula.unlink_redundant_clauses();
        }
        if !formula.options.no_qat && !budget.expired() {
            changed |= redundancy::run_qat(formula, &budget);
            formula.unlink_redundant_clauses();
        }
        if !formula.options.no_qrate && !budget.expired() {
            changed |= redundancy::run_qrate(formula, &budget);
            formula.unlink_redundant_clauses();
        }

        if !budget.expired() {
            let mut literal_changed = false;
            if !formula.options.no_ble {
                literal_changed |= redundancy::run_ble(formula, &budget);
            }
            if !formula.options.no_qratu && !budget.expired() {
                literal_changed |= redundancy::run_qratu(formula, &budget);
            }
            changed |= literal_changed;
        }

        if formula.options.verbosity >= 1 {
            log::info!(
                "driver: iteration {} done, changed={}, redundant clauses so far={}",
                iter, changed, formula.stats.cnt_redundant_clauses
            );
        }
    }

    if budget.expired() {
        log::warn!("driver: soft time limit exceeded after {} iterations", iter);
    }

    iter
}
