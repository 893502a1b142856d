//! Counters collected during ingest and preprocessing, for `print_stats`.

use std::fmt;

/// Running counters, updated in place by the formula store and the redundancy engine.
///
/// These are plain counters rather than a proper metrics abstraction: the source this is
/// grounded on prints a fixed table at the end of a run, and that's all `print_stats` needs to
/// reproduce.
#[derive(Clone, Debug, Default)]
pub struct Stats {
    /// Outer-resolvent checks performed (one per candidate partner clause).
    pub clause_redundancy_or_checks: u64,
    /// Literals visited while performing outer-resolvent checks.
    pub clause_redundancy_or_checks_lits_seen: u64,

    /// Number of QBCE checks attempted (one per existential literal of a candidate clause).
    pub cnt_qbce_checks: u64,
    /// Number of QBCE saturation iterations run.
    pub cnt_qbce_iterations: u64,

    /// Number of QRATU checks attempted.
    pub cnt_qratu_checks: u64,
    /// Number of QRATU saturation iterations run.
    pub cnt_qratu_iterations: u64,

    /// Total clauses found redundant (any clause mode).
    pub cnt_redundant_clauses: u64,
    /// Total universal literals removed (any literal mode).
    pub cnt_redundant_literals: u64,

    /// Total QBCP assignments performed, across all checks.
    pub qbcp_total_props: u64,
    /// Assignments performed in the current QBCP call; reset at the start of each call and
    /// compared against `limit_qbcp_cur_props`.
    pub qbcp_cur_props: u64,
    /// Total assignments, including those immediately retracted.
    pub total_assignments: u64,

    /// Longest clause seen so far.
    pub max_clause_length: u32,
    /// Sum of all (non-redundant) clause lengths, for computing an average.
    pub total_clause_lengths: u64,
    /// Largest occurrence-list length seen for any variable.
    pub max_occ_cnt: u32,
    /// Sum of all occurrence-list lengths.
    pub total_occ_cnts: u64,

    /// Approximate bytes allocated for clause and occurrence-list storage, used to enforce an
    /// optional memory cap. Approximate because it is updated at clause/vector granularity
    /// rather than tracking every reallocation precisely.
    pub current_allocated: u64,
}

impl Stats {
    pub fn print(&self, target: &mut impl fmt::Write) -> fmt::Result {
        writeln!(target, "c redundant clauses:           {}", self.cnt_redundant_clauses)?;
        writeln!(target, "c redundant literals:          {}", self.cnt_redundant_literals)?;
        writeln!(target, "c QBCE checks / iterations:    {} / {}", self.cnt_qbce_checks, self.cnt_qbce_iterations)?;
        writeln!(target, "c QRATU checks / iterations:   {} / {}", self.cnt_qratu_checks, self.cnt_qratu_iterations)?;
        writeln!(target, "c outer-resolvent checks:      {}", self.clause_redundancy_or_checks)?;
        writeln!(target, "c outer-resolvent lits seen:   {}", self.clause_redundancy_or_checks_lits_seen)?;
        writeln!(target, "c QBCP total propagations:     {}", self.qbcp_total_props)?;
        writeln!(target, "c total assignments:           {}", self.total_assignments)?;
        writeln!(target, "c max clause length:           {}", self.max_clause_length)?;
        writeln!(target, "c max occurrence count:        {}", self.max_occ_cnt)?;
        writeln!(target, "c approx. allocated bytes:     {}", self.current_allocated)?;
        Ok(())
    }

    pub(crate) fn note_clause_length(&mut self, len: usize) {
        self.max_clause_length = self.max_clause_length.max(len as u32);
        self.total_clause_lengths += len as u64;
    }

    pub(crate) fn note_occ_len(&mut self, len: usize) {
        self.max_occ_cnt = self.max_occ_cnt.max(len as u32);
        self.total_occ_cnts += len as u64;
    }
}
