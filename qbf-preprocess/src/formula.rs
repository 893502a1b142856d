//! The prefix/formula store: quantifier blocks, the dense variable table and the clause arena.
//!
//! This owns ingest (driven through [`QdimacsSink`]), the printed output format, and the
//! maintenance operations the redundancy engine needs (unlinking redundant clauses, removing a
//! redundant universal literal). The actual redundancy checks live in sibling modules that take
//! `&mut Formula`.

use qbf_formula::{Lit, Nesting, QBlock, QType, Var};
use qbf_qdimacs::QdimacsSink;
use rand::SeedableRng;
use rand_pcg::Pcg64;

use crate::clause::{Clause, ClauseIx, INVALID_WATCH};
use crate::config::Options;
use crate::error::IngestError;
use crate::stats::Stats;
use crate::variable::VarInfo;

/// 1-based index into the dense variable table (index 0 is unused, per invariant).
fn table_index(var: Var) -> usize {
    var.index() + 1
}

/// The quantifier prefix, the variable table and all clauses.
pub struct Formula {
    pub(crate) qblocks: Vec<QBlock>,
    pub(crate) vars: Vec<VarInfo>,
    pub(crate) clauses: Vec<Clause>,
    pub(crate) unit_clauses: Vec<ClauseIx>,
    pub(crate) witness_clauses: Vec<ClauseIx>,
    pub(crate) parsed_empty_clause: bool,
    pub(crate) max_var_declared: Option<u32>,
    rng: Option<Pcg64>,

    open_qblock: bool,
    prefix_finalized: bool,
    current_clause_lits: Vec<Lit>,
    next_clause_id: u32,

    pub options: Options,
    pub stats: Stats,
}

impl Default for Formula {
    fn default() -> Formula {
        Formula {
            qblocks: Vec::new(),
            vars: Vec::new(),
            clauses: Vec::new(),
            unit_clauses: Vec::new(),
            witness_clauses: Vec::new(),
            parsed_empty_clause: false,
            max_var_declared: None,
            rng: None,

            open_qblock: false,
            prefix_finalized: false,
            current_clause_lits: Vec::new(),
            next_clause_id: 0,

            options: Options::default(),
            stats: Stats::default(),
        }
    }
}

impl Formula {
    pub fn new() -> Formula {
        Formula::default()
    }

    pub fn max_var_id(&self) -> Option<u32> {
        self.max_var_declared
    }

    pub fn clause(&self, ix: ClauseIx) -> &Clause {
        &self.clauses[ix.index()]
    }

    pub fn clause_mut(&mut self, ix: ClauseIx) -> &mut Clause {
        &mut self.clauses[ix.index()]
    }

    pub fn var(&self, var: Var) -> &VarInfo {
        &self.vars[table_index(var)]
    }

    pub fn var_mut(&mut self, var: Var) -> &mut VarInfo {
        &mut self.vars[table_index(var)]
    }

    pub fn qblocks(&self) -> impl Iterator<Item = &QBlock> {
        self.qblocks.iter().filter(|b| !b.is_empty())
    }

    /// Non-redundant clauses, in ingest order. Valid any time; reflects the current state of the
    /// `redundant` flag without requiring `unlink_redundant_clauses` to have run first.
    pub fn clauses(&self) -> impl Iterator<Item = &Clause> {
        self.clauses.iter().filter(|c| !c.redundant)
    }

    pub fn clause_indices(&self) -> impl Iterator<Item = ClauseIx> + '_ {
        (0..self.clauses.len())
            .map(ClauseIx::from_index)
            .filter(move |&ix| !self.clause(ix).redundant)
    }

    /// The permutation RNG used to shuffle check order when `options.permute` is set, seeded
    /// from `options.seed` on first use and reused for the remainder of the preprocess call.
    pub(crate) fn rng_mut(&mut self) -> &mut Pcg64 {
        let seed = self.options.seed;
        self.rng.get_or_insert_with(|| Pcg64::seed_from_u64(seed))
    }

    // -- ingest -----------------------------------------------------------------------------

    fn validate_var_id(&self, var_id: u32) -> Result<(), IngestError> {
        let max = self
            .max_var_declared
            .ok_or(IngestError::NoMaxVarDeclared(var_id))?;
        if var_id == 0 || var_id > max {
            return Err(IngestError::VarOutOfRange {
                var: var_id,
                max_var: max,
            });
        }
        Ok(())
    }

    /// Merge adjacent same-type quantifier blocks and renumber nesting 0..k-1. Called once, just
    /// before the first clause is ingested.
    fn finalize_prefix(&mut self) {
        let mut merged: Vec<QBlock> = Vec::with_capacity(self.qblocks.len());
        for block in self.qblocks.drain(..) {
            if block.is_empty() {
                continue;
            }
            if let Some(last) = merged.last_mut() {
                if last.qtype == block.qtype {
                    last.vars.extend(block.vars);
                    continue;
                }
            }
            merged.push(block);
        }
        for (nesting, block) in merged.iter_mut().enumerate() {
            block.nesting = nesting as Nesting;
            for &var in &block.vars {
                self.vars[table_index(var)].nesting = nesting as Nesting;
            }
        }
        self.qblocks = merged;
    }

    fn finish_clause(&mut self) -> Result<(), IngestError> {
        if !self.prefix_finalized {
            self.finalize_prefix();
            self.prefix_finalized = true;
        }

        let mut lits = std::mem::take(&mut self.current_clause_lits);
        lits.sort_by_key(|l| (self.vars[table_index(l.var())].nesting, l.var().index()));

        let mut deduped: Vec<Lit> = Vec::with_capacity(lits.len());
        let mut tautology = false;
        for lit in lits {
            match deduped.last() {
                Some(&last) if last.var() == lit.var() => {
                    if last != lit {
                        tautology = true;
                        break;
                    }
                }
                _ => deduped.push(lit),
            }
        }

        if tautology {
            return Ok(());
        }

        while let Some(&last) = deduped.last() {
            if self.vars[table_index(last.var())].qtype == Some(QType::Forall) {
                deduped.pop();
            } else {
                break;
            }
        }

        self.store_clause(deduped);
        Ok(())
    }

    fn store_clause(&mut self, lits: Vec<Lit>) {
        let id = self.next_clause_id;
        self.next_clause_id += 1;

        if lits.is_empty() {
            self.parsed_empty_clause = true;
            return;
        }

        self.stats.note_clause_length(lits.len());
        let clause = Clause::new(id, lits);
        let ix = ClauseIx::from_index(self.clauses.len());

        for &lit in &clause.lits {
            let vidx = table_index(lit.var());
            self.vars[vidx].occ_mut(lit.is_positive()).push(ix);
            let occ_len = self.vars[vidx].occ(lit.is_positive()).len();
            self.stats.note_occ_len(occ_len);
        }

        if clause.len() == 1 {
            self.unit_clauses.push(ix);
        } else {
            let rw = clause.lits[clause.rw_index];
            let lw = clause.lits[clause.lw_index];
            self.vars[table_index(rw.var())]
                .watched_occ_mut(rw.is_positive())
                .push(ix);
            self.vars[table_index(lw.var())]
                .watched_occ_mut(lw.is_positive())
                .push(ix);
        }

        self.clauses.push(clause);
    }

    /// Free the literal storage of clauses already flagged redundant and drop them from every
    /// occurrence/watched-occurrence list that still mentions them. `ClauseIx` stays a stable
    /// handle (the `Vec<Clause>` slot is kept, just emptied), so this only needs to run once per
    /// newly-redundant batch; an empty `lits` marks a clause as already unlinked.
    pub(crate) fn unlink_redundant_clauses(&mut self) {
        let to_unlink: Vec<ClauseIx> = (0..self.clauses.len())
            .map(ClauseIx::from_index)
            .filter(|&ix| self.clauses[ix.index()].redundant && !self.clauses[ix.index()].lits.is_empty())
            .collect();

        for ix in to_unlink {
            let (lits, rw_index, lw_index) = {
                let c = &self.clauses[ix.index()];
                (c.lits.clone(), c.rw_index, c.lw_index)
            };

            if rw_index != INVALID_WATCH {
                let rw_lit = lits[rw_index];
                let lw_lit = lits[lw_index];
                self.vars[table_index(rw_lit.var())]
                    .watched_occ_mut(rw_lit.is_positive())
                    .retain(|&c| c != ix);
                self.vars[table_index(lw_lit.var())]
                    .watched_occ_mut(lw_lit.is_positive())
                    .retain(|&c| c != ix);
            }

            for lit in lits {
                self.vars[table_index(lit.var())]
                    .occ_mut(lit.is_positive())
                    .retain(|&c| c != ix);
            }

            let clause = &mut self.clauses[ix.index()];
            clause.lits = Vec::new();
            clause.rw_index = INVALID_WATCH;
            clause.lw_index = INVALID_WATCH;
        }
    }

    // -- output -------------------------------------------------------------------------------

    /// Write the formula in QDIMACS form. Assumes [`crate::redundancy::unlink_redundant_clauses`]
    /// has been run (or nothing has been removed yet): "active" variables are those with a
    /// non-empty occurrence list, matching the invariant that occurrence lists index exactly the
    /// surviving clauses.
    pub fn print_formula(&self, target: &mut impl std::io::Write) -> std::io::Result<()> {
        if self.parsed_empty_clause {
            return target.write_all(b"p cnf 0 1\n0\n");
        }

        let clause_count = self.clauses().count();
        if clause_count == 0 {
            return target.write_all(b"p cnf 0 0\n");
        }

        let max_var = self
            .vars
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(_, v)| !v.pos_occ.is_empty() || !v.neg_occ.is_empty())
            .map(|(i, _)| i as u32)
            .max()
            .unwrap_or(0);

        qbf_qdimacs::write_qdimacs_header(
            target,
            qbf_qdimacs::QdimacsHeader {
                var_count: max_var as usize,
                clause_count,
            },
        )?;

        for block in self.qblocks() {
            let vars = block.vars.iter().filter_map(|&v| {
                let info = &self.vars[table_index(v)];
                if !info.pos_occ.is_empty() || !info.neg_occ.is_empty() {
                    Some(v.to_dimacs() as u32)
                } else {
                    None
                }
            });
            qbf_qdimacs::write_qdimacs_prefix_line(target, block.qtype, vars)?;
        }

        for clause in self.clauses() {
            qbf_qdimacs::write_qdimacs_clause(target, clause.lits.iter().map(|l| l.to_dimacs()))?;
        }

        Ok(())
    }
}

impl QdimacsSink for Formula {
    type Error = IngestError;

    fn declare_max_var_id(&mut self, max_var: u32) -> Result<(), IngestError> {
        if self.max_var_declared.is_some() {
            return Err(IngestError::MaxVarAlreadyDeclared);
        }
        self.max_var_declared = Some(max_var);
        self.vars = vec![VarInfo::default(); max_var as usize + 1];
        Ok(())
    }

    fn new_qblock(&mut self, qtype: QType) -> Result<(), IngestError> {
        let nesting = self.qblocks.len() as Nesting;
        self.qblocks.push(QBlock::new(qtype, nesting));
        self.open_qblock = true;
        Ok(())
    }

    fn add_var_to_qblock(&mut self, var: u32) -> Result<(), IngestError> {
        if !self.open_qblock {
            return Err(IngestError::NoOpenQBlock);
        }
        self.validate_var_id(var)?;
        let idx = var as usize;
        if self.vars[idx].is_quantified() {
            return Err(IngestError::VariableAlreadyQuantified(var));
        }

        let block = self.qblocks.last_mut().expect("open_qblock implies a block exists");
        self.vars[idx].qtype = Some(block.qtype);
        self.vars[idx].nesting = block.nesting;
        block.vars.push(Var::from_dimacs(var as isize));
        Ok(())
    }

    fn add_literal(&mut self, lit: i64) -> Result<(), IngestError> {
        if self.open_qblock {
            return if lit == 0 {
                self.open_qblock = false;
                Ok(())
            } else {
                Err(IngestError::QBlockStillOpen)
            };
        }

        if lit == 0 {
            return self.finish_clause();
        }

        let var_id = lit.abs() as u32;
        self.validate_var_id(var_id)?;
        if !self.vars[var_id as usize].is_quantified() {
            return Err(IngestError::UndeclaredVariable(var_id));
        }

        self.current_clause_lits
            .push(Lit::from_dimacs(lit as isize));
        Ok(())
    }
}
