//! Preprocessor configuration.

use crate::error::ConfigError;

/// Configurable parameters controlling which redundancy notions run and how aggressively.
///
/// Unlike the solver configuration this preprocessor is descended from, these fields are not
/// tuned for performance-critical search heuristics; most gate a whole redundancy notion on or
/// off, or cap the work a single check may do. Hand-written `Default` instead of a derive, since
/// several defaults are "off" (`false`) which a derive would get right, but `soft_time_limit` and
/// the `limit_*` fields need explicit non-zero defaults that a blanket `#[derive(Default)]` would
/// not produce.
#[derive(Clone, Debug)]
pub struct Options {
    /// Disable Quantified Blocked Clause Elimination. (Default: false)
    pub no_qbce: bool,
    /// Disable the Quantified Asymmetric Tautology clause check. (Default: false)
    pub no_qat: bool,
    /// Disable the QRAT clause check (QRATE). (Default: false)
    pub no_qrate: bool,
    /// Disable Blocked Literal Elimination (universal literals). (Default: false)
    pub no_ble: bool,
    /// Disable the QRAT literal check (QRATU). (Default: false)
    pub no_qratu: bool,

    /// Disable existential abstraction during QBCP; blocks keep their declared type.
    /// (Default: false)
    pub no_eabs: bool,
    /// Disable decrementing the abstraction nesting level by one when it is chosen from the
    /// seeded variables. (Default: false)
    pub no_eabs_improved_nesting: bool,

    /// When seeding assignments from the tested clause in a QRAT check, skip literals whose
    /// nesting exceeds the pivot's. (Default: false)
    pub ignore_inner_lits: bool,
    /// Skip redundancy tests involving variables of the outermost block. (Default: false)
    pub ignore_outermost_vars: bool,
    /// Use the nesting-pruned outer-tautology scan instead of the full scan. (Default: false)
    pub qbce_check_taut_by_nesting: bool,

    /// Shuffle check order with a seeded Fisher-Yates permutation instead of sorting by clause
    /// id; only affects QAT/QRAT(U) modes. (Default: false)
    pub permute: bool,
    /// Seed for the permutation PRNG. (Default: 0)
    pub seed: u64,

    /// Soft wall-clock budget for the whole driver loop, in seconds. 0 means unlimited.
    /// (Default: 0)
    pub soft_time_limit: u64,
    /// Maximum number of clause-elimination/literal-elimination driver iterations. (Default:
    /// 1000)
    pub limit_global_iterations: u32,
    /// Maximum number of assignments a single QBCP call may perform before giving up on the
    /// check (treated as inconclusive, not an error). (Default: 1,000,000)
    pub limit_qbcp_cur_props: u64,
    /// Skip scheduling a clause for a redundancy check if any of its literals has more than this
    /// many complementary occurrences. 0 means unlimited. (Default: 0)
    pub limit_max_occ_cnt: u32,
    /// Skip scheduling a clause longer than this. 0 means unlimited. (Default: 0)
    pub limit_max_clause_len: u32,
    /// Skip scheduling a clause shorter than this. (Default: 0)
    pub limit_min_clause_len: u32,

    /// Trace verbosity: 0 none, 1 progress, 2 per-check detail. (Default: 0)
    pub verbosity: u8,
}

impl Default for Options {
    fn default() -> Options {
        Options {
            no_qbce: false,
            no_qat: false,
            no_qrate: false,
            no_ble: false,
            no_qratu: false,

            no_eabs: false,
            no_eabs_improved_nesting: false,

            ignore_inner_lits: false,
            ignore_outermost_vars: false,
            qbce_check_taut_by_nesting: false,

            permute: false,
            seed: 0,

            soft_time_limit: 0,
            limit_global_iterations: 1000,
            limit_qbcp_cur_props: 1_000_000,
            limit_max_occ_cnt: 0,
            limit_max_clause_len: 0,
            limit_min_clause_len: 0,

            verbosity: 0,
        }
    }
}

impl Options {
    /// Apply a single `key=value` (or bare `key` for a flag) configuration override, as used by
    /// the CLI's `-C` flag.
    pub fn configure(&mut self, key: &str, value: Option<&str>) -> Result<(), ConfigError> {
        fn flag(value: Option<&str>, option: &str) -> Result<bool, ConfigError> {
            match value {
                None => Ok(true),
                Some(v) => Err(ConfigError::UnexpectedValue(format!("{} ({})", option, v))),
            }
        }

        fn number<T: std::str::FromStr>(value: Option<&str>, option: &str) -> Result<T, ConfigError> {
            let value = value.ok_or_else(|| ConfigError::MissingValue(option.to_owned()))?;
            value.parse().map_err(|_| ConfigError::NotANumber {
                option: option.to_owned(),
                value: value.to_owned(),
            })
        }

        match key {
            "no_qbce" => self.no_qbce = flag(value, key)?,
            "no_qat" => self.no_qat = flag(value, key)?,
            "no_qrate" => self.no_qrate = flag(value, key)?,
            "no_ble" => self.no_ble = flag(value, key)?,
            "no_qratu" => self.no_qratu = flag(value, key)?,
            "no_eabs" => self.no_eabs = flag(value, key)?,
            "no_eabs_improved_nesting" => self.no_eabs_improved_nesting = flag(value, key)?,
            "ignore_inner_lits" => self.ignore_inner_lits = flag(value, key)?,
            "ignore_outermost_vars" => self.ignore_outermost_vars = flag(value, key)?,
            "qbce_check_taut_by_nesting" => self.qbce_check_taut_by_nesting = flag(value, key)?,
            "permute" => self.permute = flag(value, key)?,
            "seed" => self.seed = number(value, key)?,
            "soft_time_limit" => self.soft_time_limit = number(value, key)?,
            "limit_global_iterations" => self.limit_global_iterations = number(value, key)?,
            "limit_qbcp_cur_props" => self.limit_qbcp_cur_props = number(value, key)?,
            "limit_max_occ_cnt" => self.limit_max_occ_cnt = number(value, key)?,
            "limit_max_clause_len" => self.limit_max_clause_len = number(value, key)?,
            "limit_min_clause_len" => self.limit_min_clause_len = number(value, key)?,
            "verbosity" => self.verbosity = number(value, key)?,
            _ => return Err(ConfigError::UnknownOption(key.to_owned())),
        }
        Ok(())
    }
}
