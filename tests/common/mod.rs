//! Shared objectives and strategy stubs for the integration tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use bundle_opt::{
    DirectionOptions, DualAscentQp, Problem, QpOptions, QpSolver, QpStatus, Quantities, Reporter,
    Strategy, Termination, Vector,
};

// ─────────────────────────────────────────────────────────────────────────────
// Objectives
// ─────────────────────────────────────────────────────────────────────────────

/// f(x) = |x| on R.
pub struct AbsValue;

impl Problem for AbsValue {
    fn number_of_variables(&self) -> usize {
        1
    }

    fn evaluate_objective(&self, x: &[f64]) -> Option<f64> {
        Some(x[0].abs())
    }

    fn evaluate_gradient(&self, x: &[f64], gradient: &mut [f64]) -> bool {
        gradient[0] = if x[0] >= 0.0 { 1.0 } else { -1.0 };
        true
    }
}

/// Rosen's max function f(x) = max(x_1, x_2, -x_1 - x_2) on R^2.
///
/// Piecewise linear with minimum 0 at the origin; the subgradient picks the
/// first attaining piece, so evaluations are deterministic on ties.
pub struct RosenMax;

impl Problem for RosenMax {
    fn number_of_variables(&self) -> usize {
        2
    }

    fn evaluate_objective(&self, x: &[f64]) -> Option<f64> {
        Some(x[0].max(x[1]).max(-x[0] - x[1]))
    }

    fn evaluate_gradient(&self, x: &[f64], gradient: &mut [f64]) -> bool {
        let third = -x[0] - x[1];
        if x[0] >= x[1] && x[0] >= third {
            gradient.copy_from_slice(&[1.0, 0.0]);
        } else if x[1] >= third {
            gradient.copy_from_slice(&[0.0, 1.0]);
        } else {
            gradient.copy_from_slice(&[-1.0, -1.0]);
        }
        true
    }
}

/// f identically zero; every point is stationary.
pub struct FlatZero {
    pub n: usize,
}

impl Problem for FlatZero {
    fn number_of_variables(&self) -> usize {
        self.n
    }

    fn evaluate_objective(&self, _x: &[f64]) -> Option<f64> {
        Some(0.0)
    }

    fn evaluate_gradient(&self, _x: &[f64], gradient: &mut [f64]) -> bool {
        for g in gradient.iter_mut() {
            *g = 0.0;
        }
        true
    }
}

/// Oracle that refuses every evaluation.
pub struct Refusing {
    pub n: usize,
}

impl Problem for Refusing {
    fn number_of_variables(&self) -> usize {
        self.n
    }

    fn evaluate_objective(&self, _x: &[f64]) -> Option<f64> {
        None
    }

    fn evaluate_gradient(&self, _x: &[f64], _gradient: &mut [f64]) -> bool {
        false
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Setup helper
// ─────────────────────────────────────────────────────────────────────────────

/// Quantities at `x0` with both radii set to `radius`.
pub fn quantities_at(problem: Rc<dyn Problem>, x0: Vec<f64>, radius: f64) -> Quantities {
    let mut quantities = Quantities::new(problem, Vector::from_values(x0)).unwrap();
    quantities.set_trust_region_radius(radius);
    quantities.set_stationarity_radius(radius);
    quantities
}

// ─────────────────────────────────────────────────────────────────────────────
// QP solver stubs
// ─────────────────────────────────────────────────────────────────────────────

/// QP solver that reports failure on every solve.
pub struct AlwaysFailQp {
    rows: usize,
}

impl AlwaysFailQp {
    pub fn new() -> Self {
        Self { rows: 0 }
    }
}

impl Strategy for AlwaysFailQp {
    fn name(&self) -> &str {
        "AlwaysFailQp"
    }
}

impl QpSolver for AlwaysFailQp {
    fn set_scalar(&mut self, _scalar: f64) {}
    fn set_inexact_solution_tolerance(&mut self, _tolerance: f64) {}
    fn set_gradient_list(&mut self, gradients: Vec<Rc<Vector>>) {
        self.rows = gradients.len();
    }
    fn set_linear_terms(&mut self, _terms: Vec<f64>) {}
    fn add_data(&mut self, gradients: Vec<Rc<Vector>>, _terms: Vec<f64>) {
        self.rows += gradients.len();
    }
    fn solve_qp(&mut self, _reporter: &Reporter) {}
    fn solve_qp_hot(&mut self, _reporter: &Reporter) {}
    fn set_primal_solution_to_zero(&mut self) {}
    fn status(&self) -> QpStatus {
        QpStatus::Failure
    }
    fn primal_solution(&self, out: &mut [f64]) {
        for value in out.iter_mut() {
            *value = 0.0;
        }
    }
    fn primal_solution_norm2_squared(&self) -> f64 {
        0.0
    }
    fn primal_solution_norm_inf(&self) -> f64 {
        0.0
    }
    fn dual_objective_quadratic_value(&self) -> f64 {
        0.0
    }
    fn combination_translated_norm2_squared(&self) -> f64 {
        0.0
    }
    fn dual_solution_length(&self) -> usize {
        0
    }
    fn dual_solution(&self, _out: &mut [f64]) {}
    fn number_of_iterations(&self) -> usize {
        0
    }
    fn gradient_list_length(&self) -> usize {
        self.rows
    }
    fn kkt_error_dual(&self) -> f64 {
        f64::INFINITY
    }
}

/// QP solver whose first solve fails, delegating to a real solver afterwards.
pub struct FailOnceQp {
    inner: DualAscentQp,
    solves: usize,
    forced_failure: bool,
}

impl FailOnceQp {
    pub fn new() -> Self {
        Self {
            inner: DualAscentQp::new(QpOptions::default()),
            solves: 0,
            forced_failure: false,
        }
    }
}

impl Strategy for FailOnceQp {
    fn name(&self) -> &str {
        "FailOnceQp"
    }
}

impl QpSolver for FailOnceQp {
    fn set_scalar(&mut self, scalar: f64) {
        self.inner.set_scalar(scalar);
    }
    fn set_inexact_solution_tolerance(&mut self, tolerance: f64) {
        self.inner.set_inexact_solution_tolerance(tolerance);
    }
    fn set_gradient_list(&mut self, gradients: Vec<Rc<Vector>>) {
        self.inner.set_gradient_list(gradients);
    }
    fn set_linear_terms(&mut self, terms: Vec<f64>) {
        self.inner.set_linear_terms(terms);
    }
    fn add_data(&mut self, gradients: Vec<Rc<Vector>>, terms: Vec<f64>) {
        self.inner.add_data(gradients, terms);
    }
    fn solve_qp(&mut self, reporter: &Reporter) {
        self.solves += 1;
        if self.solves == 1 {
            self.forced_failure = true;
        } else {
            self.forced_failure = false;
            self.inner.solve_qp(reporter);
        }
    }
    fn solve_qp_hot(&mut self, reporter: &Reporter) {
        self.solves += 1;
        self.forced_failure = false;
        self.inner.solve_qp_hot(reporter);
    }
    fn set_primal_solution_to_zero(&mut self) {
        self.inner.set_primal_solution_to_zero();
    }
    fn status(&self) -> QpStatus {
        if self.forced_failure {
            QpStatus::Failure
        } else {
            self.inner.status()
        }
    }
    fn primal_solution(&self, out: &mut [f64]) {
        if self.forced_failure {
            for value in out.iter_mut() {
                *value = 0.0;
            }
        } else {
            self.inner.primal_solution(out);
        }
    }
    fn primal_solution_norm2_squared(&self) -> f64 {
        if self.forced_failure {
            0.0
        } else {
            self.inner.primal_solution_norm2_squared()
        }
    }
    fn primal_solution_norm_inf(&self) -> f64 {
        if self.forced_failure {
            0.0
        } else {
            self.inner.primal_solution_norm_inf()
        }
    }
    fn dual_objective_quadratic_value(&self) -> f64 {
        if self.forced_failure {
            0.0
        } else {
            self.inner.dual_objective_quadratic_value()
        }
    }
    fn combination_translated_norm2_squared(&self) -> f64 {
        if self.forced_failure {
            0.0
        } else {
            self.inner.combination_translated_norm2_squared()
        }
    }
    fn dual_solution_length(&self) -> usize {
        self.inner.dual_solution_length()
    }
    fn dual_solution(&self, out: &mut [f64]) {
        self.inner.dual_solution(out);
    }
    fn number_of_iterations(&self) -> usize {
        if self.forced_failure {
            0
        } else {
            self.inner.number_of_iterations()
        }
    }
    fn gradient_list_length(&self) -> usize {
        self.inner.gradient_list_length()
    }
    fn kkt_error_dual(&self) -> f64 {
        if self.forced_failure {
            f64::INFINITY
        } else {
            self.inner.kkt_error_dual()
        }
    }
}

/// Snapshot of the QP data at one solve.
#[derive(Debug, Clone)]
pub struct QpDataSnapshot {
    pub gradients: Vec<Vec<f64>>,
    pub linear_terms: Vec<f64>,
    pub hot: bool,
}

/// QP solver that snapshots its data at every solve, delegating the actual
/// work to `DualAscentQp`.
pub struct RecordingQp {
    inner: DualAscentQp,
    gradients: Vec<Rc<Vector>>,
    linear_terms: Vec<f64>,
    pub snapshots: Rc<RefCell<Vec<QpDataSnapshot>>>,
}

impl RecordingQp {
    pub fn new(snapshots: Rc<RefCell<Vec<QpDataSnapshot>>>) -> Self {
        Self {
            inner: DualAscentQp::new(QpOptions::default()),
            gradients: Vec::new(),
            linear_terms: Vec::new(),
            snapshots,
        }
    }

    fn snapshot(&self, hot: bool) {
        self.snapshots.borrow_mut().push(QpDataSnapshot {
            gradients: self
                .gradients
                .iter()
                .map(|g| g.values().to_vec())
                .collect(),
            linear_terms: self.linear_terms.clone(),
            hot,
        });
    }
}

impl Strategy for RecordingQp {
    fn name(&self) -> &str {
        "RecordingQp"
    }
}

impl QpSolver for RecordingQp {
    fn set_scalar(&mut self, scalar: f64) {
        self.inner.set_scalar(scalar);
    }
    fn set_inexact_solution_tolerance(&mut self, tolerance: f64) {
        self.inner.set_inexact_solution_tolerance(tolerance);
    }
    fn set_gradient_list(&mut self, gradients: Vec<Rc<Vector>>) {
        self.gradients = gradients.clone();
        self.inner.set_gradient_list(gradients);
    }
    fn set_linear_terms(&mut self, terms: Vec<f64>) {
        self.linear_terms = terms.clone();
        self.inner.set_linear_terms(terms);
    }
    fn add_data(&mut self, gradients: Vec<Rc<Vector>>, terms: Vec<f64>) {
        self.gradients.extend(gradients.iter().cloned());
        self.linear_terms.extend(terms.iter().cloned());
        self.inner.add_data(gradients, terms);
    }
    fn solve_qp(&mut self, reporter: &Reporter) {
        self.snapshot(false);
        self.inner.solve_qp(reporter);
    }
    fn solve_qp_hot(&mut self, reporter: &Reporter) {
        self.snapshot(true);
        self.inner.solve_qp_hot(reporter);
    }
    fn set_primal_solution_to_zero(&mut self) {
        self.inner.set_primal_solution_to_zero();
    }
    fn status(&self) -> QpStatus {
        self.inner.status()
    }
    fn primal_solution(&self, out: &mut [f64]) {
        self.inner.primal_solution(out);
    }
    fn primal_solution_norm2_squared(&self) -> f64 {
        self.inner.primal_solution_norm2_squared()
    }
    fn primal_solution_norm_inf(&self) -> f64 {
        self.inner.primal_solution_norm_inf()
    }
    fn dual_objective_quadratic_value(&self) -> f64 {
        self.inner.dual_objective_quadratic_value()
    }
    fn combination_translated_norm2_squared(&self) -> f64 {
        self.inner.combination_translated_norm2_squared()
    }
    fn dual_solution_length(&self) -> usize {
        self.inner.dual_solution_length()
    }
    fn dual_solution(&self, out: &mut [f64]) {
        self.inner.dual_solution(out);
    }
    fn number_of_iterations(&self) -> usize {
        self.inner.number_of_iterations()
    }
    fn gradient_list_length(&self) -> usize {
        self.inner.gradient_list_length()
    }
    fn kkt_error_dual(&self) -> f64 {
        self.inner.kkt_error_dual()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Termination stub
// ─────────────────────────────────────────────────────────────────────────────

/// Termination that never requests a radii update.
pub struct NeverTermination;

impl Strategy for NeverTermination {
    fn name(&self) -> &str {
        "NeverTermination"
    }
}

impl Termination for NeverTermination {
    fn check_conditions_direction_computation(
        &mut self,
        _options: &DirectionOptions,
        _quantities: &Quantities,
        _reporter: &Reporter,
        _qp_solver: &dyn QpSolver,
    ) {
    }

    fn update_radii_direction_computation(&self) -> bool {
        false
    }
}
