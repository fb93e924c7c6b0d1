//! # bundle-opt-rs: Cutting-Plane Direction Computation for Nonsmooth Optimization
//!
//! A Rust-native implementation of the bundle (cutting-plane) direction
//! computation at the heart of proximal-bundle solvers for nonsmooth,
//! nonconvex unconstrained minimization. Given a subgradient oracle for
//! f: R^n -> R, each call assembles a piecewise-linear model from downshifted
//! subgradient cuts, solves trust-region QP subproblems over that bundle, and
//! returns a descent step together with a status code the outer loop acts on.
//!
//! ## Overview
//!
//! The moving parts, bottom up:
//!
//! - [`Vector`], [`Iterate`]: dense vectors and visited points with cached
//!   oracle evaluations.
//! - [`Problem`]: the user's subgradient oracle.
//! - [`Quantities`]: shared solver state (iterates, direction, point set,
//!   radii, counters, wall-clock budget).
//! - [`Strategies`]: a façade over the pluggable capabilities (QP solver,
//!   termination, line search, Hessian update, point-set update), each a
//!   narrow trait.
//! - [`CuttingPlaneDirection`]: the direction computation itself, with a
//!   gradient-step fast path, shortened-step probes, bundle aggregation, and
//!   QP failure recovery.
//! - [`DualAscentQp`], [`StationarityTermination`]: reference
//!   implementations of the two contracts the core leans on hardest.
//!
//! Cuts are *downshifted*: each linear term is capped at
//! `f(x_k) - kappa * |x_k - p|^2`, which keeps the model below the current
//! objective value even when f is nonconvex.
//!
//! ## References
//!
//! - Kiwiel, K.C. "Methods of Descent for Nondifferentiable Optimization."
//!   Lecture Notes in Mathematics 1133, Springer (1985).
//! - Burke, J.V., Lewis, A.S. & Overton, M.L. "A Robust Gradient Sampling
//!   Algorithm for Nonsmooth, Nonconvex Optimization." SIAM J. Optim. 15,
//!   751-779 (2005).
//! - Curtis, F.E. & Que, X. "An adaptive gradient sampling algorithm for
//!   non-smooth optimization." Optim. Methods Softw. 28, 1302-1324 (2013).

pub mod direction;
pub mod error;
pub mod iterate;
pub mod problem;
pub mod qp;
pub mod quantities;
pub mod reporter;
pub mod strategies;
pub mod termination;
pub mod types;
pub mod vector;

// Re-export main types
pub use direction::CuttingPlaneDirection;
pub use error::{DirectionStatus, QpStatus, Result, SolverError};
pub use iterate::Iterate;
pub use problem::{EvaluationCounters, Problem};
pub use qp::DualAscentQp;
pub use quantities::Quantities;
pub use reporter::{ReportLevel, Reporter};
pub use strategies::{
    FullStepSearch, HessianUpdate, IdentityHessianUpdate, KeepAllPointSetUpdate, LineSearch,
    PointSetUpdate, QpSolver, Strategies, Strategy, Termination,
};
pub use termination::StationarityTermination;
pub use types::{DirectionOptions, QpOptions};
pub use vector::Vector;
