//! A point with lazily cached objective and subgradient evaluations.

use std::rc::Rc;

use crate::problem::{EvaluationCounters, Problem};
use crate::vector::Vector;

/// A visited point together with its cached oracle data.
///
/// The objective value and subgradient are computed at most once; a failed
/// evaluation is also cached, so the oracle is never retried at the same
/// point. The gradient is held behind `Rc` because bundle lists share it
/// with the owning point set without copying. Actual oracle invocations are
/// tallied into the supplied [`EvaluationCounters`]; cache hits are not.
#[derive(Debug, Clone)]
pub struct Iterate {
    position: Vector,
    objective: Option<f64>,
    objective_attempted: bool,
    gradient: Option<Rc<Vector>>,
    gradient_attempted: bool,
}

impl Iterate {
    /// Create an iterate at `position` with empty caches.
    pub fn new(position: Vector) -> Self {
        Self {
            position,
            objective: None,
            objective_attempted: false,
            gradient: None,
            gradient_attempted: false,
        }
    }

    /// The point's coordinates.
    pub fn vector(&self) -> &Vector {
        &self.position
    }

    /// Evaluate and cache f at this point. Returns success.
    ///
    /// Non-finite oracle values count as failure.
    pub fn evaluate_objective(
        &mut self,
        problem: &dyn Problem,
        counters: &EvaluationCounters,
    ) -> bool {
        if self.objective_attempted {
            return self.objective.is_some();
        }
        self.objective_attempted = true;
        counters.count_objective_evaluation();
        match problem.evaluate_objective(self.position.values()) {
            Some(value) if value.is_finite() => {
                self.objective = Some(value);
                true
            }
            _ => false,
        }
    }

    /// Evaluate and cache one subgradient at this point. Returns success.
    pub fn evaluate_gradient(
        &mut self,
        problem: &dyn Problem,
        counters: &EvaluationCounters,
    ) -> bool {
        if self.gradient_attempted {
            return self.gradient.is_some();
        }
        self.gradient_attempted = true;
        counters.count_gradient_evaluation();
        let mut gradient = Vector::new(self.position.length());
        if problem.evaluate_gradient(self.position.values(), gradient.values_mut()) {
            self.gradient = Some(Rc::new(gradient));
            true
        } else {
            false
        }
    }

    /// Evaluate and cache f and a subgradient together. Returns success only
    /// if both are available afterwards.
    pub fn evaluate_objective_and_gradient(
        &mut self,
        problem: &dyn Problem,
        counters: &EvaluationCounters,
    ) -> bool {
        if self.objective_attempted && self.gradient_attempted {
            return self.objective.is_some() && self.gradient.is_some();
        }
        if self.objective_attempted || self.gradient_attempted {
            // One half is already cached; fill in the other.
            return self.evaluate_objective(problem, counters)
                && self.evaluate_gradient(problem, counters);
        }
        self.objective_attempted = true;
        self.gradient_attempted = true;
        counters.count_objective_evaluation();
        counters.count_gradient_evaluation();
        let mut gradient = Vector::new(self.position.length());
        match problem.evaluate_objective_and_gradient(self.position.values(), gradient.values_mut())
        {
            Some(value) if value.is_finite() => {
                self.objective = Some(value);
                self.gradient = Some(Rc::new(gradient));
                true
            }
            _ => false,
        }
    }

    /// Cached objective value, if a successful evaluation happened.
    pub fn try_objective(&self) -> Option<f64> {
        self.objective
    }

    /// Cached objective value.
    ///
    /// Panics if no successful evaluation happened; callers check the flag
    /// returned by the evaluate methods first.
    pub fn objective(&self) -> f64 {
        self.objective.unwrap()
    }

    /// Cached subgradient, if a successful evaluation happened.
    pub fn try_gradient(&self) -> Option<Rc<Vector>> {
        self.gradient.clone()
    }

    /// Cached subgradient as a shared handle.
    ///
    /// Panics if no successful evaluation happened.
    pub fn gradient(&self) -> Rc<Vector> {
        self.gradient.clone().unwrap()
    }

    /// New iterate at a * self + b * v, with empty caches.
    pub fn make_new_linear_combination(&self, a: f64, b: f64, v: &Vector) -> Iterate {
        Iterate::new(self.position.linear_combination(a, b, v))
    }
}
