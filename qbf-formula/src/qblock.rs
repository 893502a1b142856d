//! Quantifier blocks and prefix nesting.
use std::fmt;

use crate::lit::Var;

/// Depth of a quantifier block in the prefix. 0 is outermost.
pub type Nesting = u32;

/// The quantifier a block is associated with.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum QType {
    Exists,
    Forall,
}

impl QType {
    /// Letter used in QDIMACS prefix lines (`a`/`e`) and in printed output.
    pub fn letter(self) -> char {
        match self {
            QType::Exists => 'e',
            QType::Forall => 'a',
        }
    }

    pub fn opposite(self) -> QType {
        match self {
            QType::Exists => QType::Forall,
            QType::Forall => QType::Exists,
        }
    }
}

impl fmt::Display for QType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// A block of variables sharing a quantifier type and nesting level.
///
/// Blocks form an ordered sequence; adjacent blocks must have opposite types (this is enforced by
/// merging adjacent same-type blocks once the prefix is finalized, see
/// `qbf_preprocess::formula::Formula::finalize_prefix`).
#[derive(Clone, Debug)]
pub struct QBlock {
    pub qtype: QType,
    pub nesting: Nesting,
    pub vars: Vec<Var>,
}

impl QBlock {
    pub fn new(qtype: QType, nesting: Nesting) -> QBlock {
        QBlock {
            qtype,
            nesting,
            vars: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}
