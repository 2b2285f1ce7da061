use std::fmt;

use z3_sys::{Z3_L_FALSE, Z3_L_TRUE, Z3_lbool};

use crate::model::Model;

/// Outcome of a satisfiability check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SatResult {
    /// The assertions have a model.
    Sat,
    /// The assertions are contradictory.
    Unsat,
    /// The solver gave up (timeout, interrupt, incompleteness).
    Unknown,
}

impl SatResult {
    /// Returns `true` if the result is `Sat`.
    ///
    /// This is the two-valued view: `Unsat` and `Unknown` both read as "not
    /// satisfiable".
    pub fn is_sat(&self) -> bool {
        matches!(self, SatResult::Sat)
    }

    /// Returns `true` if the result is `Unsat`.
    pub fn is_unsat(&self) -> bool {
        matches!(self, SatResult::Unsat)
    }

    /// Returns `true` if the result is `Unknown`.
    pub fn is_unknown(&self) -> bool {
        matches!(self, SatResult::Unknown)
    }

    pub(crate) fn from_lbool(value: Z3_lbool) -> Self {
        if value == Z3_L_TRUE {
            SatResult::Sat
        } else if value == Z3_L_FALSE {
            SatResult::Unsat
        } else {
            SatResult::Unknown
        }
    }
}

impl fmt::Display for SatResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SatResult::Sat => write!(f, "sat"),
            SatResult::Unsat => write!(f, "unsat"),
            SatResult::Unknown => write!(f, "unknown"),
        }
    }
}

/// A check result bundled with what the solver can say about it.
#[derive(Debug, Clone)]
pub enum SolverResult {
    /// Satisfiable, with the model Z3 produced.
    Sat(Model),
    /// Unsatisfiable.
    Unsat,
    /// Undetermined, with Z3's reason (e.g. `"timeout"`, `"canceled"`).
    Unknown(String),
}

impl SolverResult {
    /// Returns `true` if the result is `Sat`.
    pub fn is_sat(&self) -> bool {
        matches!(self, SolverResult::Sat(_))
    }

    /// Returns `true` if the result is `Unsat`.
    pub fn is_unsat(&self) -> bool {
        matches!(self, SolverResult::Unsat)
    }

    /// Returns `true` if the result is `Unknown`.
    pub fn is_unknown(&self) -> bool {
        matches!(self, SolverResult::Unknown(_))
    }

    /// Returns the model if the result is `Sat`.
    pub fn model(&self) -> Option<&Model> {
        match self {
            SolverResult::Sat(model) => Some(model),
            _ => None,
        }
    }

    /// The three-valued outcome without its payload.
    pub fn status(&self) -> SatResult {
        match self {
            SolverResult::Sat(_) => SatResult::Sat,
            SolverResult::Unsat => SatResult::Unsat,
            SolverResult::Unknown(_) => SatResult::Unknown,
        }
    }
}
