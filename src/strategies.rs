//! Capability contracts consumed by the direction computation, and the
//! façade that owns one implementation of each.
//!
//! Every seam is a narrow trait object: any implementation satisfying the
//! contract may be substituted (the scenario tests swap in stub QP solvers
//! this way). The façade adds split-borrow helpers so the termination test
//! can inspect the QP solver while both live in the same container.

use std::rc::Rc;

use crate::error::QpStatus;
use crate::qp::DualAscentQp;
use crate::quantities::Quantities;
use crate::reporter::Reporter;
use crate::termination::StationarityTermination;
use crate::types::{DirectionOptions, QpOptions};
use crate::vector::Vector;

/// Common surface of every pluggable strategy: a name and the fixed-width
/// column strings it contributes to iteration output.
pub trait Strategy {
    /// Short strategy name for diagnostics.
    fn name(&self) -> &str;

    /// Column headers this strategy contributes, or "" for none.
    fn iteration_header(&self) -> &str {
        ""
    }

    /// Dashes matching `iteration_header` for skipped iterations, or "".
    fn iteration_null_values(&self) -> &str {
        ""
    }
}

/// Solver for the structured convex QP over a bundle of cuts.
///
/// The subproblem minimizes a regularized piecewise-linear model, roughly
/// `min_d (1/2) d'Hd + max_i (b_i + <g_i, d> - f(x_k))` subject to a trust
/// region `|d| <= scalar`; the dual weights live on the simplex over bundle
/// rows. Data is staged with the setters, then solved cold (`solve_qp`) or
/// warm-started on incrementally added rows (`solve_qp_hot`).
pub trait QpSolver: Strategy {
    /// Set the trust-region scalar.
    fn set_scalar(&mut self, scalar: f64);

    /// Set the inexactness tolerance (the caller passes its stationarity
    /// radius).
    fn set_inexact_solution_tolerance(&mut self, tolerance: f64);

    /// Replace the gradient list.
    fn set_gradient_list(&mut self, gradients: Vec<Rc<Vector>>);

    /// Replace the linear terms.
    fn set_linear_terms(&mut self, terms: Vec<f64>);

    /// Append rows for a subsequent hot solve.
    fn add_data(&mut self, gradients: Vec<Rc<Vector>>, terms: Vec<f64>);

    /// Solve from a cold start.
    fn solve_qp(&mut self, reporter: &Reporter);

    /// Re-solve reusing the previous solution state.
    fn solve_qp_hot(&mut self, reporter: &Reporter);

    /// Zero the primal solution and its derived statistics.
    fn set_primal_solution_to_zero(&mut self);

    fn status(&self) -> QpStatus;

    /// Copy the primal step into `out` (length n).
    fn primal_solution(&self, out: &mut [f64]);

    fn primal_solution_norm2_squared(&self) -> f64;

    fn primal_solution_norm_inf(&self) -> f64;

    /// Quadratic term of the dual objective at the last solution.
    fn dual_objective_quadratic_value(&self) -> f64;

    /// Squared 2-norm of the translated gradient combination.
    fn combination_translated_norm2_squared(&self) -> f64;

    /// Length of the dual weight vector at the last solve.
    fn dual_solution_length(&self) -> usize;

    /// Copy the dual weights into `out` (length `dual_solution_length`).
    fn dual_solution(&self, out: &mut [f64]);

    /// Iterations spent in the last solve.
    fn number_of_iterations(&self) -> usize;

    /// Current number of bundle rows.
    fn gradient_list_length(&self) -> usize;

    /// Dual KKT error at the last solution.
    fn kkt_error_dual(&self) -> f64;
}

/// Decides on radius updates and completion.
pub trait Termination: Strategy {
    /// Inspect iterate/radius/QP state after a probe; may raise the
    /// radii-update flag.
    fn check_conditions_direction_computation(
        &mut self,
        options: &DirectionOptions,
        quantities: &Quantities,
        reporter: &Reporter,
        qp_solver: &dyn QpSolver,
    );

    /// Whether the outer loop should adjust the radii. Inside the direction
    /// computation this flag doubles as an escape-success condition.
    fn update_radii_direction_computation(&self) -> bool;
}

/// Picks a stepsize along the computed direction.
pub trait LineSearch: Strategy {
    /// Run the search; on success the trial iterate holds the accepted
    /// point.
    fn run_line_search(&mut self, quantities: &mut Quantities, reporter: &Reporter) -> bool;
}

/// Maintains the approximate Hessian between outer iterations.
pub trait HessianUpdate: Strategy {
    fn update_hessian(&mut self, quantities: &Quantities, reporter: &Reporter);
}

/// Prunes or reorganizes the point set between outer iterations.
pub trait PointSetUpdate: Strategy {
    fn update_point_set(&mut self, quantities: &mut Quantities, reporter: &Reporter);
}

// ──────────────────────────────────────────────────────────────────────────────
// Façade
// ──────────────────────────────────────────────────────────────────────────────

/// Container holding one implementation of each strategy contract.
pub struct Strategies {
    qp_solver: Box<dyn QpSolver>,
    termination: Box<dyn Termination>,
    line_search: Box<dyn LineSearch>,
    approximate_hessian_update: Box<dyn HessianUpdate>,
    point_set_update: Box<dyn PointSetUpdate>,
}

impl Strategies {
    pub fn new(
        qp_solver: Box<dyn QpSolver>,
        termination: Box<dyn Termination>,
        line_search: Box<dyn LineSearch>,
        approximate_hessian_update: Box<dyn HessianUpdate>,
        point_set_update: Box<dyn PointSetUpdate>,
    ) -> Self {
        Self {
            qp_solver,
            termination,
            line_search,
            approximate_hessian_update,
            point_set_update,
        }
    }

    /// Reference implementations wired together.
    pub fn default_set() -> Self {
        Self::new(
            Box::new(DualAscentQp::new(QpOptions::default())),
            Box::new(StationarityTermination::default()),
            Box::new(FullStepSearch),
            Box::new(IdentityHessianUpdate),
            Box::new(KeepAllPointSetUpdate),
        )
    }

    pub fn qp_solver(&self) -> &dyn QpSolver {
        self.qp_solver.as_ref()
    }

    pub fn qp_solver_mut(&mut self) -> &mut dyn QpSolver {
        self.qp_solver.as_mut()
    }

    pub fn termination(&self) -> &dyn Termination {
        self.termination.as_ref()
    }

    pub fn line_search(&self) -> &dyn LineSearch {
        self.line_search.as_ref()
    }

    pub fn line_search_mut(&mut self) -> &mut dyn LineSearch {
        self.line_search.as_mut()
    }

    pub fn approximate_hessian_update(&self) -> &dyn HessianUpdate {
        self.approximate_hessian_update.as_ref()
    }

    pub fn point_set_update(&self) -> &dyn PointSetUpdate {
        self.point_set_update.as_ref()
    }

    /// Run the termination check against the owned QP solver.
    ///
    /// Split-borrow helper: termination gets read access to the QP solver
    /// while both are owned by this container.
    pub fn check_termination_direction_computation(
        &mut self,
        options: &DirectionOptions,
        quantities: &Quantities,
        reporter: &Reporter,
    ) {
        let Self {
            qp_solver,
            termination,
            ..
        } = self;
        termination.check_conditions_direction_computation(
            options,
            quantities,
            reporter,
            qp_solver.as_ref(),
        );
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// Minimal default strategies
// ──────────────────────────────────────────────────────────────────────────────

/// Line search that keeps the unit step produced by the direction
/// computation.
pub struct FullStepSearch;

impl Strategy for FullStepSearch {
    fn name(&self) -> &str {
        "FullStepSearch"
    }

    fn iteration_header(&self) -> &str {
        " Stepsize"
    }

    fn iteration_null_values(&self) -> &str {
        "---------"
    }
}

impl LineSearch for FullStepSearch {
    fn run_line_search(&mut self, quantities: &mut Quantities, _reporter: &Reporter) -> bool {
        let trial = {
            let current = quantities.current_iterate();
            let current = current.borrow();
            current.make_new_linear_combination(1.0, 1.0, quantities.direction())
        };
        quantities.set_trial_iterate(trial);
        true
    }
}

/// No-op Hessian maintenance (identity metric throughout).
///
/// Contributes no iteration columns.
pub struct IdentityHessianUpdate;

impl Strategy for IdentityHessianUpdate {
    fn name(&self) -> &str {
        "IdentityHessianUpdate"
    }
}

impl HessianUpdate for IdentityHessianUpdate {
    fn update_hessian(&mut self, _quantities: &Quantities, _reporter: &Reporter) {}
}

/// Point-set maintenance that never prunes.
pub struct KeepAllPointSetUpdate;

impl Strategy for KeepAllPointSetUpdate {
    fn name(&self) -> &str {
        "KeepAllPointSetUpdate"
    }

    fn iteration_header(&self) -> &str {
        " PS Pts."
    }

    fn iteration_null_values(&self) -> &str {
        "--------"
    }
}

impl PointSetUpdate for KeepAllPointSetUpdate {
    fn update_point_set(&mut self, _quantities: &mut Quantities, _reporter: &Reporter) {}
}
