//! Shared solver state threaded through every strategy.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::error::{Result, SolverError};
use crate::iterate::Iterate;
use crate::problem::{EvaluationCounters, Problem};
use crate::vector::Vector;

/// Shared mutable state for one solve.
///
/// Owned by the outer loop and lent to one strategy at a time; nothing here
/// is touched concurrently. The point set owns every visited iterate; the
/// current and trial handles may alias entries of it (and, right after
/// `set_trial_iterate_to_current_iterate`, each other).
pub struct Quantities {
    problem: Rc<dyn Problem>,
    current_iterate: Rc<RefCell<Iterate>>,
    trial_iterate: Rc<RefCell<Iterate>>,
    direction: Vector,
    point_set: Vec<Rc<RefCell<Iterate>>>,
    number_of_variables: usize,
    trust_region_radius: f64,
    stationarity_radius: f64,
    inner_iteration_counter: usize,
    qp_iteration_counter: usize,
    total_inner_iterations: usize,
    total_qp_iterations: usize,
    direction_computation_time: Duration,
    start_time: Instant,
    cpu_time_limit: f64,
    evaluate_function_with_gradient: bool,
    evaluation_counters: EvaluationCounters,
}

impl Quantities {
    /// Create solver state starting from `initial_point`.
    ///
    /// The trial iterate starts as an alias of the current iterate; radii
    /// default to 1.0 and the CPU budget to unlimited.
    pub fn new(problem: Rc<dyn Problem>, initial_point: Vector) -> Result<Self> {
        let n = problem.number_of_variables();
        if n == 0 {
            return Err(SolverError::InvalidArgs(
                "number of variables must be >= 1".into(),
            ));
        }
        if initial_point.length() != n {
            return Err(SolverError::DimensionMismatch {
                expected: n,
                actual: initial_point.length(),
            });
        }
        let current = Rc::new(RefCell::new(Iterate::new(initial_point)));
        Ok(Self {
            problem,
            trial_iterate: Rc::clone(&current),
            current_iterate: current,
            direction: Vector::new(n),
            point_set: Vec::new(),
            number_of_variables: n,
            trust_region_radius: 1.0,
            stationarity_radius: 1.0,
            inner_iteration_counter: 0,
            qp_iteration_counter: 0,
            total_inner_iterations: 0,
            total_qp_iterations: 0,
            direction_computation_time: Duration::ZERO,
            start_time: Instant::now(),
            cpu_time_limit: f64::INFINITY,
            evaluate_function_with_gradient: false,
            evaluation_counters: EvaluationCounters::new(),
        })
    }

    /// The oracle.
    pub fn problem(&self) -> Rc<dyn Problem> {
        Rc::clone(&self.problem)
    }

    /// Handle to the current iterate.
    pub fn current_iterate(&self) -> Rc<RefCell<Iterate>> {
        Rc::clone(&self.current_iterate)
    }

    /// Handle to the trial iterate.
    pub fn trial_iterate(&self) -> Rc<RefCell<Iterate>> {
        Rc::clone(&self.trial_iterate)
    }

    /// Replace the trial iterate with a fresh probe point.
    pub fn set_trial_iterate(&mut self, iterate: Iterate) {
        self.trial_iterate = Rc::new(RefCell::new(iterate));
    }

    /// Alias the trial iterate to the current iterate.
    pub fn set_trial_iterate_to_current_iterate(&mut self) {
        self.trial_iterate = Rc::clone(&self.current_iterate);
    }

    /// Accept the trial iterate as the new current iterate (outer-loop
    /// hand-off after line search).
    pub fn set_current_iterate_to_trial_iterate(&mut self) {
        self.current_iterate = Rc::clone(&self.trial_iterate);
    }

    /// The search direction.
    pub fn direction(&self) -> &Vector {
        &self.direction
    }

    /// Mutable access to the search direction.
    pub fn direction_mut(&mut self) -> &mut Vector {
        &mut self.direction
    }

    /// The bundle candidates visited so far.
    pub fn point_set(&self) -> &[Rc<RefCell<Iterate>>] {
        &self.point_set
    }

    /// Append a point to the point set (append-only within an outer
    /// iteration).
    pub fn push_to_point_set(&mut self, iterate: Rc<RefCell<Iterate>>) {
        self.point_set.push(iterate);
    }

    /// Drop every stored bundle candidate (point-set update hand-off).
    pub fn clear_point_set(&mut self) {
        self.point_set.clear();
    }

    pub fn number_of_variables(&self) -> usize {
        self.number_of_variables
    }

    pub fn trust_region_radius(&self) -> f64 {
        self.trust_region_radius
    }

    pub fn set_trust_region_radius(&mut self, radius: f64) {
        self.trust_region_radius = radius;
    }

    pub fn stationarity_radius(&self) -> f64 {
        self.stationarity_radius
    }

    pub fn set_stationarity_radius(&mut self, radius: f64) {
        self.stationarity_radius = radius;
    }

    /// Whether the oracle computes f and the subgradient in one pass.
    pub fn evaluate_function_with_gradient(&self) -> bool {
        self.evaluate_function_with_gradient
    }

    pub fn set_evaluate_function_with_gradient(&mut self, joint: bool) {
        self.evaluate_function_with_gradient = joint;
    }

    /// Oracle-call tallies, handed to every `Iterate` evaluation.
    pub fn evaluation_counters(&self) -> &EvaluationCounters {
        &self.evaluation_counters
    }

    /// Objective evaluations performed during this solve.
    pub fn objective_evaluations(&self) -> usize {
        self.evaluation_counters.objective_evaluations()
    }

    /// Gradient evaluations performed during this solve.
    pub fn gradient_evaluations(&self) -> usize {
        self.evaluation_counters.gradient_evaluations()
    }

    // ──────────────────────────────────────────────────────────────────────
    // Counters and timers
    // ──────────────────────────────────────────────────────────────────────

    pub fn inner_iteration_counter(&self) -> usize {
        self.inner_iteration_counter
    }

    pub fn reset_inner_iteration_counter(&mut self) {
        self.inner_iteration_counter = 0;
    }

    pub fn increment_inner_iteration_counter(&mut self, amount: usize) {
        self.inner_iteration_counter += amount;
    }

    pub fn qp_iteration_counter(&self) -> usize {
        self.qp_iteration_counter
    }

    pub fn reset_qp_iteration_counter(&mut self) {
        self.qp_iteration_counter = 0;
    }

    pub fn increment_qp_iteration_counter(&mut self, amount: usize) {
        self.qp_iteration_counter += amount;
    }

    pub fn total_inner_iterations(&self) -> usize {
        self.total_inner_iterations
    }

    /// Fold the per-call inner counter into the running total.
    pub fn increment_total_inner_iteration_counter(&mut self) {
        self.total_inner_iterations += self.inner_iteration_counter;
    }

    pub fn total_qp_iterations(&self) -> usize {
        self.total_qp_iterations
    }

    /// Fold the per-call QP counter into the running total.
    pub fn increment_total_qp_iteration_counter(&mut self) {
        self.total_qp_iterations += self.qp_iteration_counter;
    }

    pub fn direction_computation_time(&self) -> Duration {
        self.direction_computation_time
    }

    pub fn increment_direction_computation_time(&mut self, elapsed: Duration) {
        self.direction_computation_time += elapsed;
    }

    /// Instant the solve started; the CPU budget is measured from here.
    pub fn start_time(&self) -> Instant {
        self.start_time
    }

    pub fn reset_start_time(&mut self) {
        self.start_time = Instant::now();
    }

    /// Wall-clock budget in seconds.
    pub fn cpu_time_limit(&self) -> f64 {
        self.cpu_time_limit
    }

    pub fn set_cpu_time_limit(&mut self, seconds: f64) {
        self.cpu_time_limit = seconds;
    }

    /// True once the wall-clock budget is spent.
    pub fn cpu_time_limit_reached(&self) -> bool {
        self.start_time.elapsed().as_secs_f64() >= self.cpu_time_limit
    }

    // ──────────────────────────────────────────────────────────────────────
    // Outer-iteration print layout
    // ──────────────────────────────────────────────────────────────────────

    pub fn iteration_header(&self) -> &str {
        "  Iter.     Objective    Stat. Rad.  Trust Rad."
    }

    pub fn iteration_null_values(&self) -> &str {
        "-------- ------------- ----------- -----------"
    }
}
