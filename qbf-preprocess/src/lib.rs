//! A preprocessor for Quantified Boolean Formulas (QBF) in prenex CNF.
//!
//! Given a quantifier prefix and a set of clauses, [`Preprocessor::preprocess`] removes clauses
//! and universal literals that are redundant with respect to satisfiability, using Quantified
//! Blocked Clause Elimination (QBCE), Quantified (Resolution) Asymmetric Tautology (QAT/QRATE)
//! and their literal-level analogues (BLE/QRATU). See [`qrat`] and [`redundancy`] for the engine
//! itself; this module is the public surface mirroring the original `qratpreplus.h` API.

mod clause;
mod config;
mod driver;
mod error;
mod formula;
mod literal_removal;
mod outer_tautology;
mod qbcp;
mod qrat;
mod redundancy;
mod stats;
mod variable;

use std::fs::File;
use std::io;
use std::path::Path;

use qbf_qdimacs::{QdimacsParser, QdimacsSink};

pub use crate::clause::{Clause, ClauseIx};
pub use crate::config::Options;
pub use crate::error::{ConfigError, IngestError, PreprocessError};
pub use crate::stats::Stats;
pub use qbf_formula::{Lit, QBlock, QType, Var};

use crate::formula::Formula;

/// The public entry point: owns a [`Formula`] and drives ingest, configuration and
/// preprocessing. A thin wrapper so ingest stays expressible through [`qbf_qdimacs::QdimacsSink`]
/// (letting `Formula` itself be passed straight to a parser) while still giving callers who
/// build formulas by hand a single object to hold onto.
pub struct Preprocessor {
    formula: Formula,
}

impl Default for Preprocessor {
    fn default() -> Preprocessor {
        Preprocessor {
            formula: Formula::new(),
        }
    }
}

impl Preprocessor {
    pub fn new() -> Preprocessor {
        Preprocessor::default()
    }

    pub fn declare_max_var_id(&mut self, max_var: u32) -> Result<(), IngestError> {
        self.formula.declare_max_var_id(max_var)
    }

    pub fn max_var_id(&self) -> Option<u32> {
        self.formula.max_var_id()
    }

    pub fn new_qblock(&mut self, qtype: QType) -> Result<(), IngestError> {
        self.formula.new_qblock(qtype)
    }

    pub fn add_var_to_qblock(&mut self, var: u32) -> Result<(), IngestError> {
        self.formula.add_var_to_qblock(var)
    }

    pub fn add_literal(&mut self, lit: i64) -> Result<(), IngestError> {
        self.formula.add_literal(lit)
    }

    /// Parse a QDIMACS-formatted byte stream, driving ingest directly into this preprocessor's
    /// formula.
    pub fn add_qdimacs(&mut self, input: impl io::Read) -> anyhow::Result<()> {
        let formula = std::mem::take(&mut self.formula);
        self.formula = QdimacsParser::parse(input, formula)?;
        Ok(())
    }

    /// Convenience wrapper around [`Preprocessor::add_qdimacs`] reading from a file path.
    pub fn add_formula(&mut self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let file = File::open(path)?;
        self.add_qdimacs(file)
    }

    pub fn configure(&mut self, key: &str, value: Option<&str>) -> Result<(), ConfigError> {
        self.formula.options.configure(key, value)
    }

    pub fn options(&self) -> &Options {
        &self.formula.options
    }

    pub fn options_mut(&mut self) -> &mut Options {
        &mut self.formula.options
    }

    /// Run the redundancy engine to a fixed point (or until the soft time limit or
    /// `limit_global_iterations` cuts it short). Returns the number of driver iterations run.
    pub fn preprocess(&mut self) -> u32 {
        driver::preprocess(&mut self.formula)
    }

    pub fn print_formula(&self, target: &mut impl io::Write) -> io::Result<()> {
        self.formula.print_formula(target)
    }

    pub fn print_stats(&self, target: &mut impl std::fmt::Write) -> std::fmt::Result {
        self.formula.stats.print(target)
    }

    pub fn stats(&self) -> &Stats {
        &self.formula.stats
    }

    pub fn clauses(&self) -> impl Iterator<Item = &Clause> {
        self.formula.clauses()
    }

    pub fn qblocks(&self) -> impl Iterator<Item = &QBlock> {
        self.formula.qblocks()
    }
}
