//! Reference QP solver for the cutting-plane subproblem.
//!
//! Solves, with the identity metric,
//!
//! ```text
//! min_d  (1/2) d'd + max_i (b_i + <g_i, d> - f(x_k))    s.t. |d|_inf <= delta
//! ```
//!
//! through its dual: maximize over simplex weights omega
//!
//! ```text
//! q(omega) = sum_j phi((G omega)_j) + b' omega,
//! phi(t)   = -t^2/2            if |t| <= delta,
//!            delta^2/2 - delta|t|  otherwise,
//! ```
//!
//! by projected-gradient ascent. The inner minimizer recovers the primal as
//! `d_j = -clip((G omega)_j, +-delta)`; the clipped value `G omega + gamma`
//! is the translated gradient combination (`gamma` collects the trust-region
//! multipliers). Constant shifts of `b` move `q` by a constant and change
//! neither the maximizer nor the KKT error, so the linear terms are used
//! as-is.
//!
//! With the identity metric the translated combination equals the negated
//! primal step, so `combination_translated_norm2_squared` and
//! `primal_solution_norm2_squared` coincide here; the queries stay separate
//! because the contract separates them.
//!
//! Cold solves start from omega = e_0 and hot solves warm-start from the
//! previous weights padded with zeros, so identical inputs produce
//! bit-identical solutions.

use std::rc::Rc;

use crate::error::QpStatus;
use crate::reporter::Reporter;
use crate::strategies::{QpSolver, Strategy};
use crate::types::QpOptions;
use crate::vector::Vector;

/// Projection of `v` onto the unit simplex.
///
/// Sort-based algorithm; O(m log m), deterministic.
fn project_onto_simplex(v: &mut [f64]) {
    let m = v.len();
    if m == 0 {
        return;
    }
    let mut sorted: Vec<f64> = v.to_vec();
    sorted.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
    let mut cumulative = 0.0;
    let mut theta = 0.0;
    for (k, &u) in sorted.iter().enumerate() {
        cumulative += u;
        let candidate = (cumulative - 1.0) / (k as f64 + 1.0);
        if u - candidate > 0.0 {
            theta = candidate;
        }
    }
    for value in v.iter_mut() {
        *value = (*value - theta).max(0.0);
    }
}

/// Projected-gradient dual-ascent solver for the bundle subproblem.
pub struct DualAscentQp {
    options: QpOptions,
    scalar: f64,
    inexact_tolerance: f64,
    gradients: Vec<Rc<Vector>>,
    linear_terms: Vec<f64>,
    omega: Vec<f64>,
    primal: Vec<f64>,
    translated: Vec<f64>,
    status: QpStatus,
    iterations: usize,
    kkt_error: f64,
}

impl DualAscentQp {
    pub fn new(options: QpOptions) -> Self {
        Self {
            options,
            scalar: 1.0,
            inexact_tolerance: 1.0,
            gradients: Vec::new(),
            linear_terms: Vec::new(),
            omega: Vec::new(),
            primal: Vec::new(),
            translated: Vec::new(),
            status: QpStatus::Success,
            iterations: 0,
            kkt_error: 0.0,
        }
    }

    /// Effective dual stationarity target: the configured tolerance relaxed
    /// by the inexactness handed down from the direction core.
    fn kkt_target(&self) -> f64 {
        self.options.kkt_tolerance.max(1e-8 * self.inexact_tolerance)
    }

    fn data_is_finite(&self) -> bool {
        self.linear_terms.iter().all(|b| b.is_finite())
            && self
                .gradients
                .iter()
                .all(|g| g.values().iter().all(|v| v.is_finite()))
    }

    /// Shared solve body; `warm` keeps the current omega as the starting
    /// point (padded to the row count), otherwise omega restarts at e_0.
    fn run(&mut self, warm: bool) {
        let m = self.gradients.len();
        self.iterations = 0;
        if m == 0 || !self.data_is_finite() {
            self.set_primal_solution_to_zero();
            self.status = QpStatus::Failure;
            return;
        }
        let n = self.gradients[0].length();
        if self.gradients.iter().any(|g| g.length() != n) {
            self.primal = vec![0.0; n];
            self.translated = vec![0.0; n];
            self.kkt_error = 0.0;
            self.status = QpStatus::Failure;
            return;
        }

        if warm && !self.omega.is_empty() {
            self.omega.resize(m, 0.0);
        } else {
            self.omega = vec![0.0; m];
            self.omega[0] = 1.0;
        }

        // Trace of the Gram matrix bounds its largest eigenvalue; 1/L is a
        // safe ascent stepsize.
        let trace: f64 = self.gradients.iter().map(|g| {
            let norm = g.norm2();
            norm * norm
        }).sum();
        let stepsize = 1.0 / trace.max(1e-12);

        let mut combination = vec![0.0; n];
        let mut dual_gradient = vec![0.0; m];
        let target = self.kkt_target();

        loop {
            self.iterations += 1;

            // combination = G omega
            for value in combination.iter_mut() {
                *value = 0.0;
            }
            for (weight, gradient) in self.omega.iter().zip(self.gradients.iter()) {
                if *weight != 0.0 {
                    for (c, g) in combination.iter_mut().zip(gradient.values()) {
                        *c += weight * g;
                    }
                }
            }

            // primal recovery and trust-region translation
            self.translated = combination
                .iter()
                .map(|&c| c.clamp(-self.scalar, self.scalar))
                .collect();
            self.primal = self.translated.iter().map(|&t| -t).collect();

            // dual gradient: <g_i, d> + b_i
            for ((dg, gradient), b) in dual_gradient
                .iter_mut()
                .zip(self.gradients.iter())
                .zip(self.linear_terms.iter())
            {
                let mut inner = 0.0;
                for (g, d) in gradient.values().iter().zip(self.primal.iter()) {
                    inner += g * d;
                }
                *dg = inner + b;
            }

            let best = dual_gradient.iter().fold(f64::NEG_INFINITY, |a, &v| a.max(v));
            let current: f64 = dual_gradient
                .iter()
                .zip(self.omega.iter())
                .map(|(dg, w)| dg * w)
                .sum();
            self.kkt_error = (best - current).max(0.0);

            if !self.kkt_error.is_finite() {
                self.set_primal_solution_to_zero();
                self.status = QpStatus::Failure;
                return;
            }
            if self.kkt_error <= target {
                self.status = QpStatus::Success;
                return;
            }
            if self.iterations >= self.options.iteration_limit {
                self.status = QpStatus::IterationLimit;
                return;
            }

            for (w, dg) in self.omega.iter_mut().zip(dual_gradient.iter()) {
                *w += stepsize * dg;
            }
            project_onto_simplex(&mut self.omega);
        }
    }
}

impl Strategy for DualAscentQp {
    fn name(&self) -> &str {
        "DualAscentQp"
    }
}

impl QpSolver for DualAscentQp {
    fn set_scalar(&mut self, scalar: f64) {
        self.scalar = scalar;
    }

    fn set_inexact_solution_tolerance(&mut self, tolerance: f64) {
        self.inexact_tolerance = tolerance;
    }

    fn set_gradient_list(&mut self, gradients: Vec<Rc<Vector>>) {
        self.gradients = gradients;
    }

    fn set_linear_terms(&mut self, terms: Vec<f64>) {
        self.linear_terms = terms;
    }

    fn add_data(&mut self, gradients: Vec<Rc<Vector>>, terms: Vec<f64>) {
        self.gradients.extend(gradients);
        self.linear_terms.extend(terms);
    }

    fn solve_qp(&mut self, _reporter: &Reporter) {
        self.run(false);
    }

    fn solve_qp_hot(&mut self, _reporter: &Reporter) {
        self.run(true);
    }

    fn set_primal_solution_to_zero(&mut self) {
        for value in self.primal.iter_mut() {
            *value = 0.0;
        }
        for value in self.translated.iter_mut() {
            *value = 0.0;
        }
        self.kkt_error = 0.0;
    }

    fn status(&self) -> QpStatus {
        self.status
    }

    fn primal_solution(&self, out: &mut [f64]) {
        // A failed first solve leaves no primal; readers get zeros.
        let k = out.len().min(self.primal.len());
        out[..k].copy_from_slice(&self.primal[..k]);
        for value in out[k..].iter_mut() {
            *value = 0.0;
        }
    }

    fn primal_solution_norm2_squared(&self) -> f64 {
        self.primal.iter().map(|d| d * d).sum()
    }

    fn primal_solution_norm_inf(&self) -> f64 {
        self.primal.iter().fold(0.0, |m, d| m.max(d.abs()))
    }

    fn dual_objective_quadratic_value(&self) -> f64 {
        0.5 * self.combination_translated_norm2_squared()
    }

    fn combination_translated_norm2_squared(&self) -> f64 {
        self.translated.iter().map(|t| t * t).sum()
    }

    fn dual_solution_length(&self) -> usize {
        self.omega.len()
    }

    fn dual_solution(&self, out: &mut [f64]) {
        debug_assert_eq!(out.len(), self.omega.len());
        out.copy_from_slice(&self.omega);
    }

    fn number_of_iterations(&self) -> usize {
        self.iterations
    }

    fn gradient_list_length(&self) -> usize {
        self.gradients.len()
    }

    fn kkt_error_dual(&self) -> f64 {
        self.kkt_error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn solver_with(gradients: Vec<Vec<f64>>, terms: Vec<f64>, scalar: f64) -> DualAscentQp {
        let mut qp = DualAscentQp::new(QpOptions::default());
        qp.set_scalar(scalar);
        qp.set_inexact_solution_tolerance(1.0);
        qp.set_gradient_list(
            gradients
                .into_iter()
                .map(|g| Rc::new(Vector::from_values(g)))
                .collect(),
        );
        qp.set_linear_terms(terms);
        qp
    }

    #[test]
    fn test_simplex_projection_basics() {
        let mut v = vec![0.5, 0.5];
        project_onto_simplex(&mut v);
        assert_relative_eq!(v[0], 0.5);
        assert_relative_eq!(v[1], 0.5);

        let mut v = vec![2.0, 0.0];
        project_onto_simplex(&mut v);
        assert_relative_eq!(v[0], 1.0);
        assert_relative_eq!(v[1], 0.0);

        let mut v = vec![1.0, 1.0];
        project_onto_simplex(&mut v);
        assert_relative_eq!(v[0] + v[1], 1.0);
        assert_relative_eq!(v[0], v[1]);
    }

    #[test]
    fn test_single_cut_negated_gradient() {
        let reporter = Reporter::default();
        let mut qp = solver_with(vec![vec![1.0]], vec![1.0], 1.0);
        qp.solve_qp(&reporter);
        assert_eq!(qp.status(), QpStatus::Success);
        let mut d = [0.0];
        qp.primal_solution(&mut d);
        assert_relative_eq!(d[0], -1.0);
        assert_relative_eq!(qp.primal_solution_norm_inf(), 1.0);
        assert_relative_eq!(qp.primal_solution_norm2_squared(), 1.0);
        assert_relative_eq!(qp.combination_translated_norm2_squared(), 1.0);
        assert_relative_eq!(qp.dual_objective_quadratic_value(), 0.5);
        assert_eq!(qp.dual_solution_length(), 1);
    }

    #[test]
    fn test_trust_region_clips_step() {
        let reporter = Reporter::default();
        let mut qp = solver_with(vec![vec![10.0, 0.5]], vec![3.0], 1.0);
        qp.solve_qp(&reporter);
        let mut d = [0.0, 0.0];
        qp.primal_solution(&mut d);
        assert_relative_eq!(d[0], -1.0);
        assert_relative_eq!(d[1], -0.5);
    }

    #[test]
    fn test_opposing_cuts_balance() {
        // g and -g with equal linear terms: the optimal combination vanishes.
        let reporter = Reporter::default();
        let mut qp = solver_with(vec![vec![2.0], vec![-2.0]], vec![0.0, 0.0], 5.0);
        qp.solve_qp(&reporter);
        assert_eq!(qp.status(), QpStatus::Success);
        assert!(qp.primal_solution_norm_inf() < 1e-4);
        let mut omega = [0.0, 0.0];
        qp.dual_solution(&mut omega);
        assert_relative_eq!(omega[0] + omega[1], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_hot_solve_after_add_data() {
        let reporter = Reporter::default();
        let mut qp = solver_with(vec![vec![1.0, 0.0]], vec![1.0], 1.0);
        qp.solve_qp(&reporter);
        qp.add_data(vec![Rc::new(Vector::from_values(vec![0.0, 1.0]))], vec![1.0]);
        qp.solve_qp_hot(&reporter);
        assert_eq!(qp.status(), QpStatus::Success);
        assert_eq!(qp.gradient_list_length(), 2);
        assert_eq!(qp.dual_solution_length(), 2);
        let mut d = [0.0, 0.0];
        qp.primal_solution(&mut d);
        // both cuts active: the step moves against both gradients
        assert!(d[0] < 0.0 && d[1] < 0.0);
    }

    #[test]
    fn test_empty_bundle_fails() {
        let reporter = Reporter::default();
        let mut qp = DualAscentQp::new(QpOptions::default());
        qp.solve_qp(&reporter);
        assert_eq!(qp.status(), QpStatus::Failure);
    }

    #[test]
    fn test_non_finite_data_fails() {
        let reporter = Reporter::default();
        let mut qp = solver_with(vec![vec![f64::NAN]], vec![1.0], 1.0);
        qp.solve_qp(&reporter);
        assert_eq!(qp.status(), QpStatus::Failure);
        assert_eq!(qp.primal_solution_norm_inf(), 0.0);
    }

    #[test]
    fn test_cold_solve_is_deterministic() {
        let reporter = Reporter::default();
        let mut first = solver_with(
            vec![vec![1.0, 0.3], vec![-0.2, 0.9]],
            vec![1.0, 0.8],
            0.7,
        );
        first.solve_qp(&reporter);
        let mut second = solver_with(
            vec![vec![1.0, 0.3], vec![-0.2, 0.9]],
            vec![1.0, 0.8],
            0.7,
        );
        second.solve_qp(&reporter);
        let (mut a, mut b) = ([0.0, 0.0], [0.0, 0.0]);
        first.primal_solution(&mut a);
        second.primal_solution(&mut b);
        assert_eq!(a[0].to_bits(), b[0].to_bits());
        assert_eq!(a[1].to_bits(), b[1].to_bits());
        assert_eq!(first.number_of_iterations(), second.number_of_iterations());
    }

    #[test]
    fn test_set_primal_solution_to_zero() {
        let reporter = Reporter::default();
        let mut qp = solver_with(vec![vec![1.0]], vec![1.0], 1.0);
        qp.solve_qp(&reporter);
        assert!(qp.primal_solution_norm_inf() > 0.0);
        qp.set_primal_solution_to_zero();
        assert_eq!(qp.primal_solution_norm_inf(), 0.0);
        assert_eq!(qp.combination_translated_norm2_squared(), 0.0);
        assert_eq!(qp.kkt_error_dual(), 0.0);
    }
}
