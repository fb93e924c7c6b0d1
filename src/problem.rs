//! Subgradient oracle contract.

use std::cell::Cell;

/// User-supplied objective for nonsmooth minimization.
///
/// Implementors evaluate f(x) and one element of the subdifferential at x.
/// Either evaluation may refuse (return `None`/`false`), which the solver
/// reports as an evaluation failure rather than a panic. Callers treat a
/// non-finite objective value the same as a refusal.
///
/// `evaluate_objective_and_gradient` exists for oracles that compute both in
/// one pass; the default implementation just chains the separate calls.
pub trait Problem {
    /// Number of input variables.
    fn number_of_variables(&self) -> usize;

    /// Evaluate f(x). `None` means the oracle declined to evaluate.
    fn evaluate_objective(&self, x: &[f64]) -> Option<f64>;

    /// Evaluate one subgradient of f at x into `gradient`. Returns success.
    fn evaluate_gradient(&self, x: &[f64], gradient: &mut [f64]) -> bool;

    /// Evaluate f(x) and a subgradient together. `None` means failure; on
    /// failure the contents of `gradient` are unspecified.
    fn evaluate_objective_and_gradient(&self, x: &[f64], gradient: &mut [f64]) -> Option<f64> {
        let value = self.evaluate_objective(x)?;
        if self.evaluate_gradient(x, gradient) {
            Some(value)
        } else {
            None
        }
    }
}

/// Tallies of actual oracle invocations.
///
/// An [`Iterate`](crate::iterate::Iterate) bumps these only when it really
/// calls into the oracle; cached re-evaluations do not count. The cells use
/// interior mutability so the tallies stay reachable while the point set is
/// borrowed for expansion.
#[derive(Debug, Default)]
pub struct EvaluationCounters {
    objective_evaluations: Cell<usize>,
    gradient_evaluations: Cell<usize>,
}

impl EvaluationCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of objective evaluations performed so far.
    pub fn objective_evaluations(&self) -> usize {
        self.objective_evaluations.get()
    }

    /// Number of gradient evaluations performed so far.
    pub fn gradient_evaluations(&self) -> usize {
        self.gradient_evaluations.get()
    }

    /// Record one objective evaluation.
    pub fn count_objective_evaluation(&self) {
        self.objective_evaluations
            .set(self.objective_evaluations.get() + 1);
    }

    /// Record one gradient evaluation.
    pub fn count_gradient_evaluation(&self) {
        self.gradient_evaluations
            .set(self.gradient_evaluations.get() + 1);
    }
}
