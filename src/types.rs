//! Configuration for the direction computation and the reference QP solver.
//!
//! Plain structs with documented defaults; no registry or parsing layer.

/// Configuration for the cutting-plane direction computation.
#[derive(Debug, Clone)]
pub struct DirectionOptions {
    /// Accept trial iterates into the point set even when the step's
    /// infinity norm exceeds the stationarity radius.
    /// Default: false.
    pub add_far_points: bool,

    /// Treat exceeding the inner-iteration limit as a failure instead of
    /// returning the best step found so far.
    /// Default: false.
    pub fail_on_iteration_limit: bool,

    /// Treat any QP non-success as a failure instead of taking the recovery
    /// path (re-seeding the bundle from the current iterate alone).
    /// Default: false.
    pub fail_on_qp_failure: bool,

    /// Operate on an aggregated two-cut bundle until the point set reaches
    /// `aggregation_size_threshold * n` entries.
    /// Default: false.
    pub try_aggregation: bool,

    /// Probe a pure gradient step before building the full cutting-plane
    /// subproblem. Stepsize set by `gradient_stepsize`.
    /// Default: true.
    pub try_gradient_step: bool,

    /// Probe a shortened version of the current QP step each inner
    /// iteration. Stepsize fraction set by `shortened_stepsize`.
    /// Default: true.
    pub try_shortened_step: bool,

    /// Switch from the aggregated to the full bundle once the point set
    /// holds at least this multiple of n points.
    /// Default: 10.0.
    pub aggregation_size_threshold: f64,

    /// Downshifting constant. The linear term of an added cut is the
    /// minimum of its linearization value and the current objective minus
    /// this constant times the squared distance to the bundle point.
    /// Default: 1e-2.
    pub downshift_constant: f64,

    /// Stepsize for the gradient fast-path probe.
    /// Default: 1e-4.
    pub gradient_stepsize: f64,

    /// Shortened-step fraction. The probe stepsize is
    /// `shortened_stepsize * min(stationarity radius, |d|_inf) / |d|_inf`.
    /// Default: 1e-2.
    pub shortened_stepsize: f64,

    /// Sufficient-decrease coefficient for step acceptance.
    /// Default: 1e-8.
    pub step_acceptance_tolerance: f64,

    /// Cap on inner iterations within one direction computation.
    /// Default: 20.
    pub inner_iteration_limit: usize,
}

impl Default for DirectionOptions {
    fn default() -> Self {
        Self {
            add_far_points: false,
            fail_on_iteration_limit: false,
            fail_on_qp_failure: false,
            try_aggregation: false,
            try_gradient_step: true,
            try_shortened_step: true,
            aggregation_size_threshold: 10.0,
            downshift_constant: 1e-2,
            gradient_stepsize: 1e-4,
            shortened_stepsize: 1e-2,
            step_acceptance_tolerance: 1e-8,
            inner_iteration_limit: 20,
        }
    }
}

/// Configuration for the reference dual-ascent QP solver.
#[derive(Debug, Clone)]
pub struct QpOptions {
    /// Cap on projected-gradient iterations per solve.
    /// Default: 500.
    pub iteration_limit: usize,

    /// Dual stationarity target. The effective target is relaxed by the
    /// inexact-solution tolerance handed down from the direction core.
    /// Default: 1e-10.
    pub kkt_tolerance: f64,
}

impl Default for QpOptions {
    fn default() -> Self {
        Self {
            iteration_limit: 500,
            kkt_tolerance: 1e-10,
        }
    }
}
