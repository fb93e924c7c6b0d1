//! Error types and status codes for the bundle optimizer.
//!
//! Status codes are plain enums rather than `Result` errors: a direction
//! computation that hits its iteration limit or CPU budget has still produced
//! usable state (counters, a direction, a trial iterate), and the outer loop
//! decides what to do with each outcome.

use thiserror::Error;

/// Outcome of one direction computation.
///
/// There is no "unset" variant: internal phases communicate through early
/// returns, so a caller can only ever observe one of these five values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectionStatus {
    /// A direction was produced meeting the acceptance test or the
    /// radii-update escape condition.
    Success = 0,
    /// The oracle refused to evaluate f or its gradient at the current
    /// iterate.
    EvaluationFailure = 1,
    /// The QP solver failed and `fail_on_qp_failure` is set.
    QpFailure = 2,
    /// The inner iteration cap was exceeded and `fail_on_iteration_limit`
    /// is set.
    IterationLimit = 3,
    /// The wall-clock budget was exhausted. The outer loop should re-signal
    /// this as the solver-wide CPU limit condition.
    CpuTimeLimit = 4,
}

impl DirectionStatus {
    /// Returns true if the computation produced an accepted direction.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Integer code for fixed-width column output.
    pub fn code(&self) -> i32 {
        *self as i32
    }
}

/// Outcome of one QP subproblem solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QpStatus {
    /// Converged to the requested dual stationarity tolerance.
    Success = 0,
    /// Iteration limit reached before convergence.
    IterationLimit = 1,
    /// The solve broke down (non-finite data or degenerate state).
    Failure = 2,
}

impl QpStatus {
    /// Returns true if the solve converged.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Integer code for fixed-width column output.
    pub fn code(&self) -> i32 {
        *self as i32
    }
}

/// Errors raised while assembling solver state, before any iteration runs.
#[derive(Error, Debug)]
pub enum SolverError {
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Result type alias for solver construction.
pub type Result<T> = std::result::Result<T, SolverError>;
