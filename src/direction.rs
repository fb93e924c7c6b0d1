//! Cutting-plane direction computation for nonsmooth objectives.
//!
//! One invocation builds a bundle of downshifted subgradient cuts around the
//! current iterate, then alternates QP solves with cheap probe steps until a
//! trial point achieves sufficient decrease (or the termination strategy
//! decides the radii are resolved). The phases, in order:
//!
//! 1. Evaluate f and a subgradient at the current iterate; seed the bundle
//!    with that single linearization.
//! 2. Optionally probe a pure gradient step before paying for the full
//!    subproblem.
//! 3. Expand the bundle with every point-set entry inside the stationarity
//!    radius, downshifting each cut so it stays below f(x_k) even when f is
//!    nonconvex.
//! 4. Inner loop: test the current trial for acceptance, enforce iteration
//!    and wall-clock limits, optionally collapse the bundle into an
//!    aggregated two-cut surrogate, append cuts at the trial (and at a
//!    shortened probe), and re-solve (cold over the aggregated or full
//!    bundle, or hot over the incrementally added rows).
//!
//! A QP breakdown re-seeds the bundle from the current iterate alone and
//! re-solves, so a well-defined (if conservative) direction survives solver
//! stalls unless `fail_on_qp_failure` is set.
//!
//! The sufficient-decrease threshold multiplies the QP's predicted reduction
//! `min(Q_dual, max(N_comb, N_prim))` by the acceptance tolerance and the
//! active stepsize, an Armijo-type test consistent with bundle-method
//! convergence theory. Note the asymmetry: the gradient fast path scales by
//! `gradient_stepsize` and the shortened probe by its computed stepsize,
//! while the full-step test in the inner loop uses prefactor 1 because the
//! step already carries its magnitude.
//!
//! References: Kiwiel, "Methods of Descent for Nondifferentiable
//! Optimization", Springer (1985); Burke, Lewis & Overton, "A robust
//! gradient sampling algorithm for nonsmooth, nonconvex optimization",
//! SIAM J. Optim. 15 (2005); Curtis & Que, "An adaptive gradient sampling
//! algorithm for non-smooth optimization", Optim. Methods Softw. 28 (2013).

use std::rc::Rc;
use std::time::Instant;

use crate::error::DirectionStatus;
use crate::iterate::Iterate;
use crate::problem::Problem;
use crate::quantities::Quantities;
use crate::reporter::{ReportLevel, Reporter};
use crate::strategies::{QpSolver, Strategies, Strategy};
use crate::types::DirectionOptions;
use crate::vector::Vector;

/// Bundle-method direction computation.
///
/// Stateless between calls apart from the last returned status; all working
/// storage (the cut lists, their aggregated twins, and the per-iteration new
/// rows) lives on the stack of one `compute_direction` call.
pub struct CuttingPlaneDirection {
    status: Option<DirectionStatus>,
}

impl CuttingPlaneDirection {
    pub fn new() -> Self {
        Self { status: None }
    }

    /// Status of the last computation, if any ran.
    pub fn status(&self) -> Option<DirectionStatus> {
        self.status
    }

    /// Compute a search direction into `quantities.direction` and leave an
    /// accepted candidate in `quantities.trialIterate`.
    ///
    /// Counters, the elapsed-time total, and one summary line are emitted on
    /// every exit path, so telemetry survives failures.
    pub fn compute_direction(
        &mut self,
        options: &DirectionOptions,
        quantities: &mut Quantities,
        reporter: &Reporter,
        strategies: &mut Strategies,
    ) -> DirectionStatus {
        let start = Instant::now();

        strategies.qp_solver_mut().set_primal_solution_to_zero();
        quantities.direction_mut().set_to_zero();
        quantities.reset_inner_iteration_counter();
        quantities.reset_qp_iteration_counter();
        quantities.set_trial_iterate_to_current_iterate();

        // One header line per solve, above the inner-iteration lines; the
        // strategies that do not run here contribute their own columns, same
        // composition as the per-inner-iteration null values.
        let mut header = String::from(self.iteration_header());
        for strategy_header in [
            strategies.termination().iteration_header(),
            strategies.line_search().iteration_header(),
            strategies.approximate_hessian_update().iteration_header(),
            strategies.point_set_update().iteration_header(),
        ] {
            if !strategy_header.is_empty() {
                header.push(' ');
                header.push_str(strategy_header);
            }
        }
        reporter.printf(ReportLevel::PerInnerIteration, format_args!("{}\n", header));

        let status = run_phases(options, quantities, reporter, strategies);

        // Epilogue on every path.
        print_solve_columns(
            reporter,
            ReportLevel::PerIteration,
            quantities,
            strategies.qp_solver(),
        );
        reporter.printf(ReportLevel::PerIteration, format_args!("\n"));
        quantities.increment_total_inner_iteration_counter();
        quantities.increment_total_qp_iteration_counter();
        quantities.increment_direction_computation_time(start.elapsed());
        self.status = Some(status);
        status
    }
}

impl Default for CuttingPlaneDirection {
    fn default() -> Self {
        Self::new()
    }
}

impl Strategy for CuttingPlaneDirection {
    fn name(&self) -> &str {
        "CuttingPlaneDirection"
    }

    fn iteration_header(&self) -> &str {
        "In. Its.  QP Pts.  QP Its. QP   QP KKT    |Step|   |Step|_H"
    }

    fn iteration_null_values(&self) -> &str {
        "-------- -------- -------- -- --------- --------- ---------"
    }
}

/// All phases of one direction computation; early returns carry the status
/// and the caller runs the epilogue.
fn run_phases(
    options: &DirectionOptions,
    quantities: &mut Quantities,
    reporter: &Reporter,
    strategies: &mut Strategies,
) -> DirectionStatus {
    let problem = quantities.problem();

    // Evaluate the current iterate, jointly if the oracle supports it.
    let evaluation_success = {
        let current = quantities.current_iterate();
        let mut current = current.borrow_mut();
        if quantities.evaluate_function_with_gradient() {
            current
                .evaluate_objective_and_gradient(problem.as_ref(), quantities.evaluation_counters())
        } else {
            current.evaluate_objective(problem.as_ref(), quantities.evaluation_counters())
                && current.evaluate_gradient(problem.as_ref(), quantities.evaluation_counters())
        }
    };
    if !evaluation_success {
        return DirectionStatus::EvaluationFailure;
    }

    strategies
        .qp_solver_mut()
        .set_scalar(quantities.trust_region_radius());
    strategies
        .qp_solver_mut()
        .set_inexact_solution_tolerance(quantities.stationarity_radius());

    // Current-iterate data reused throughout; copied out so later borrows of
    // point-set entries (which may alias the current iterate) stay clean.
    let (current_objective, current_gradient, current_position) = {
        let current = quantities.current_iterate();
        let current = current.borrow();
        (
            current.objective(),
            current.gradient(),
            current.vector().clone(),
        )
    };

    // Seed bundle: the current iterate's linearization.
    let mut gradient_list: Vec<Rc<Vector>> = vec![Rc::clone(&current_gradient)];
    let mut linear_terms: Vec<f64> = vec![current_objective];

    strategies
        .qp_solver_mut()
        .set_gradient_list(gradient_list.clone());
    strategies
        .qp_solver_mut()
        .set_linear_terms(linear_terms.clone());

    // ──────────────────────────────────────────────────────────────────────
    // Gradient-step fast path
    // ──────────────────────────────────────────────────────────────────────
    if options.try_gradient_step {
        strategies.qp_solver_mut().solve_qp(reporter);
        convert_qp_solution_to_step(quantities, strategies);

        let probe = {
            let current = quantities.current_iterate();
            let current = current.borrow();
            current.make_new_linear_combination(
                1.0,
                options.gradient_stepsize,
                quantities.direction(),
            )
        };
        quantities.set_trial_iterate(probe);

        let evaluation_success = evaluate_trial_objective(quantities, &problem);
        strategies.check_termination_direction_computation(options, quantities, reporter);

        if evaluation_success
            && (sufficient_decrease(
                options,
                quantities,
                strategies.qp_solver(),
                options.gradient_stepsize,
            ) || strategies
                .termination()
                .update_radii_direction_computation())
        {
            return DirectionStatus::Success;
        }
    }

    // ──────────────────────────────────────────────────────────────────────
    // Bundle expansion over the point set
    // ──────────────────────────────────────────────────────────────────────
    for point in quantities.point_set() {
        let difference = {
            let p = point.borrow();
            current_position.linear_combination(1.0, -1.0, p.vector())
        };
        if difference.norm_inf() > quantities.stationarity_radius() {
            continue;
        }

        let evaluation_success = {
            let mut p = point.borrow_mut();
            if quantities.evaluate_function_with_gradient() {
                p.evaluate_objective_and_gradient(problem.as_ref(), quantities.evaluation_counters())
            } else {
                p.evaluate_objective(problem.as_ref(), quantities.evaluation_counters())
                    && p.evaluate_gradient(problem.as_ref(), quantities.evaluation_counters())
            }
        };
        if evaluation_success {
            let p = point.borrow();
            gradient_list.push(p.gradient());
            linear_terms.push(downshifted_cut(
                current_objective,
                &current_position,
                &p,
                options.downshift_constant,
            ));
        }
    }

    strategies
        .qp_solver_mut()
        .set_gradient_list(gradient_list.clone());
    strategies
        .qp_solver_mut()
        .set_linear_terms(linear_terms.clone());

    // Initial full solve.
    strategies.qp_solver_mut().solve_qp(reporter);
    convert_qp_solution_to_step(quantities, strategies);

    if !strategies.qp_solver().status().is_success() {
        if options.fail_on_qp_failure {
            return DirectionStatus::QpFailure;
        }
        reseed_and_resolve(
            &mut gradient_list,
            &mut linear_terms,
            &current_gradient,
            current_objective,
            quantities,
            reporter,
            strategies,
        );
    }

    // Aggregated twins of the cut lists; `switched_to_full` latches once
    // aggregation is abandoned for this computation.
    let mut switched_to_full = false;
    let mut gradient_list_aggregated = gradient_list.clone();
    let mut linear_terms_aggregated = linear_terms.clone();

    // ──────────────────────────────────────────────────────────────────────
    // Inner loop
    // ──────────────────────────────────────────────────────────────────────
    loop {
        reporter.flush_buffer();

        let mut evaluation_success = evaluate_trial_objective(quantities, &problem);
        strategies.check_termination_direction_computation(options, quantities, reporter);

        // Full-step acceptance: prefactor 1, the step carries its magnitude.
        if evaluation_success
            && (sufficient_decrease(options, quantities, strategies.qp_solver(), 1.0)
                || strategies
                    .termination()
                    .update_radii_direction_computation())
        {
            return DirectionStatus::Success;
        }

        if quantities.inner_iteration_counter() > options.inner_iteration_limit {
            return if options.fail_on_iteration_limit {
                DirectionStatus::IterationLimit
            } else {
                DirectionStatus::Success
            };
        }

        if quantities.cpu_time_limit_reached() {
            return DirectionStatus::CpuTimeLimit;
        }

        // Collapse the aggregated bundle into the current iterate's cut plus
        // the dual-weighted surrogate cut.
        if options.try_aggregation && !switched_to_full {
            let length = strategies.qp_solver().dual_solution_length();
            let mut omega = vec![0.0; length];
            strategies.qp_solver().dual_solution(&mut omega);

            let mut aggregation_vector = Vector::new(quantities.number_of_variables());
            let mut aggregation_scalar = 0.0;
            for (weight, (gradient, term)) in omega.iter().zip(
                gradient_list_aggregated
                    .iter()
                    .zip(linear_terms_aggregated.iter()),
            ) {
                aggregation_vector.add_scaled_vector(*weight, gradient);
                aggregation_scalar += weight * term;
            }

            gradient_list_aggregated = vec![
                Rc::clone(&current_gradient),
                Rc::new(aggregation_vector),
            ];
            linear_terms_aggregated = vec![current_objective, aggregation_scalar];
        }

        // Rows appended this iteration, handed to the hot solve.
        let mut gradient_list_new: Vec<Rc<Vector>> = Vec::new();
        let mut linear_terms_new: Vec<f64> = Vec::new();

        // Far-point addition: always under the option, otherwise only when
        // the step stayed within the stationarity radius.
        if options.add_far_points
            || strategies.qp_solver().primal_solution_norm_inf()
                <= quantities.stationarity_radius()
        {
            if evaluation_success {
                if !quantities.evaluate_function_with_gradient() {
                    let trial = quantities.trial_iterate();
                    let success = trial
                        .borrow_mut()
                        .evaluate_gradient(problem.as_ref(), quantities.evaluation_counters());
                    evaluation_success = success;
                }
                if evaluation_success {
                    append_trial_cut(
                        options,
                        quantities,
                        current_objective,
                        &current_position,
                        switched_to_full,
                        &mut gradient_list,
                        &mut linear_terms,
                        &mut gradient_list_aggregated,
                        &mut linear_terms_aggregated,
                        &mut gradient_list_new,
                        &mut linear_terms_new,
                    );
                }
            }
        }

        // Shortened-step probe.
        if options.try_shortened_step {
            let step_norm_inf = strategies.qp_solver().primal_solution_norm_inf();
            // A zero step has nothing to shorten; skip rather than divide.
            if step_norm_inf > 0.0 {
                let shortened_stepsize = options.shortened_stepsize
                    * quantities.stationarity_radius().min(step_norm_inf)
                    / step_norm_inf;

                let probe = {
                    let current = quantities.current_iterate();
                    let current = current.borrow();
                    current.make_new_linear_combination(
                        1.0,
                        shortened_stepsize,
                        quantities.direction(),
                    )
                };
                quantities.set_trial_iterate(probe);

                evaluation_success = evaluate_trial_objective(quantities, &problem);
                strategies.check_termination_direction_computation(options, quantities, reporter);

                if evaluation_success
                    && (sufficient_decrease(
                        options,
                        quantities,
                        strategies.qp_solver(),
                        shortened_stepsize,
                    ) || strategies
                        .termination()
                        .update_radii_direction_computation())
                {
                    return DirectionStatus::Success;
                }

                if evaluation_success {
                    if !quantities.evaluate_function_with_gradient() {
                        let trial = quantities.trial_iterate();
                        let success = trial
                            .borrow_mut()
                            .evaluate_gradient(problem.as_ref(), quantities.evaluation_counters());
                        evaluation_success = success;
                    }
                    if evaluation_success {
                        append_trial_cut(
                            options,
                            quantities,
                            current_objective,
                            &current_position,
                            switched_to_full,
                            &mut gradient_list,
                            &mut linear_terms,
                            &mut gradient_list_aggregated,
                            &mut linear_terms_aggregated,
                            &mut gradient_list_new,
                            &mut linear_terms_new,
                        );
                    }
                }
            }
        }

        // One line per inner iteration: this strategy's columns, dashes for
        // the strategies that do not run here, then the outer-layout dashes.
        print_solve_columns(
            reporter,
            ReportLevel::PerInnerIteration,
            quantities,
            strategies.qp_solver(),
        );
        let mut blank_solve = String::new();
        for null_values in [
            strategies.termination().iteration_null_values(),
            strategies.line_search().iteration_null_values(),
            strategies.approximate_hessian_update().iteration_null_values(),
            strategies.point_set_update().iteration_null_values(),
        ] {
            if !null_values.is_empty() {
                blank_solve.push(' ');
                blank_solve.push_str(null_values);
            }
        }
        reporter.printf(
            ReportLevel::PerInnerIteration,
            format_args!("{}\n{}\n", blank_solve, quantities.iteration_null_values()),
        );

        // Re-solve: aggregated cold, full cold with switch, or hot over the
        // new rows.
        let aggregating = options.try_aggregation && !switched_to_full;
        let threshold =
            options.aggregation_size_threshold * quantities.number_of_variables() as f64;
        if aggregating && (quantities.point_set().len() as f64) < threshold {
            strategies
                .qp_solver_mut()
                .set_gradient_list(gradient_list_aggregated.clone());
            strategies
                .qp_solver_mut()
                .set_linear_terms(linear_terms_aggregated.clone());
            strategies.qp_solver_mut().solve_qp(reporter);
        } else if aggregating {
            strategies
                .qp_solver_mut()
                .set_gradient_list(gradient_list.clone());
            strategies
                .qp_solver_mut()
                .set_linear_terms(linear_terms.clone());
            strategies.qp_solver_mut().solve_qp(reporter);
            switched_to_full = true;
        } else {
            strategies
                .qp_solver_mut()
                .add_data(gradient_list_new, linear_terms_new);
            strategies.qp_solver_mut().solve_qp_hot(reporter);
        }
        convert_qp_solution_to_step(quantities, strategies);

        if !strategies.qp_solver().status().is_success() {
            if options.fail_on_qp_failure {
                return DirectionStatus::QpFailure;
            }
            reseed_and_resolve(
                &mut gradient_list,
                &mut linear_terms,
                &current_gradient,
                current_objective,
                quantities,
                reporter,
                strategies,
            );
            gradient_list_aggregated = gradient_list.clone();
            linear_terms_aggregated = linear_terms.clone();
        }
    }
}

/// Write the QP primal into the direction, set trial <- current + direction,
/// and account for the solve.
fn convert_qp_solution_to_step(quantities: &mut Quantities, strategies: &mut Strategies) {
    let iterations = strategies.qp_solver().number_of_iterations();
    quantities.increment_qp_iteration_counter(iterations);
    quantities.increment_inner_iteration_counter(1);

    strategies
        .qp_solver()
        .primal_solution(quantities.direction_mut().values_mut());

    let trial = {
        let current = quantities.current_iterate();
        let current = current.borrow();
        current.make_new_linear_combination(1.0, 1.0, quantities.direction())
    };
    quantities.set_trial_iterate(trial);
}

/// Evaluate f at the trial iterate (jointly with the gradient when the
/// oracle computes both).
fn evaluate_trial_objective(quantities: &Quantities, problem: &Rc<dyn Problem>) -> bool {
    let trial = quantities.trial_iterate();
    let mut trial = trial.borrow_mut();
    if quantities.evaluate_function_with_gradient() {
        trial.evaluate_objective_and_gradient(problem.as_ref(), quantities.evaluation_counters())
    } else {
        trial.evaluate_objective(problem.as_ref(), quantities.evaluation_counters())
    }
}

/// Armijo-type sufficient decrease against the QP's predicted reduction.
fn sufficient_decrease(
    options: &DirectionOptions,
    quantities: &Quantities,
    qp_solver: &dyn QpSolver,
    prefactor: f64,
) -> bool {
    let trial = quantities.trial_iterate();
    let trial_objective = match trial.borrow().try_objective() {
        Some(value) => value,
        None => return false,
    };
    let current = quantities.current_iterate();
    let current_objective = current.borrow().objective();

    let predicted_reduction = qp_solver.dual_objective_quadratic_value().min(
        qp_solver
            .combination_translated_norm2_squared()
            .max(qp_solver.primal_solution_norm2_squared()),
    );

    trial_objective - current_objective
        < -options.step_acceptance_tolerance * prefactor * predicted_reduction
}

/// Linear term of the cut at `point`: the linearization value capped by the
/// downshifted bound, so the plane never overestimates f at the current
/// iterate.
fn downshifted_cut(
    current_objective: f64,
    current_position: &Vector,
    point: &Iterate,
    downshift_constant: f64,
) -> f64 {
    let gradient = point.gradient();
    let linearization_value = point.objective()
        + gradient.inner_product(current_position)
        - gradient.inner_product(point.vector());
    let difference = current_position.linear_combination(1.0, -1.0, point.vector());
    let downshifting_value =
        current_objective - downshift_constant * difference.norm2().powi(2);
    linearization_value.min(downshifting_value)
}

/// Push the trial iterate into the point set and its cut into the new-row
/// lists, mirrored into the full and aggregated lists while aggregating.
#[allow(clippy::too_many_arguments)]
fn append_trial_cut(
    options: &DirectionOptions,
    quantities: &mut Quantities,
    current_objective: f64,
    current_position: &Vector,
    switched_to_full: bool,
    gradient_list: &mut Vec<Rc<Vector>>,
    linear_terms: &mut Vec<f64>,
    gradient_list_aggregated: &mut Vec<Rc<Vector>>,
    linear_terms_aggregated: &mut Vec<f64>,
    gradient_list_new: &mut Vec<Rc<Vector>>,
    linear_terms_new: &mut Vec<f64>,
) {
    let trial = quantities.trial_iterate();
    quantities.push_to_point_set(Rc::clone(&trial));

    let (gradient, cut) = {
        let trial = trial.borrow();
        (
            trial.gradient(),
            downshifted_cut(
                current_objective,
                current_position,
                &trial,
                options.downshift_constant,
            ),
        )
    };

    gradient_list_new.push(Rc::clone(&gradient));
    linear_terms_new.push(cut);
    if options.try_aggregation && !switched_to_full {
        gradient_list.push(Rc::clone(&gradient));
        linear_terms.push(cut);
        gradient_list_aggregated.push(gradient);
        linear_terms_aggregated.push(cut);
    }
}

/// QP failure recovery: rebuild the bundle from the current iterate's cut
/// alone and re-solve, guaranteeing a well-defined direction.
fn reseed_and_resolve(
    gradient_list: &mut Vec<Rc<Vector>>,
    linear_terms: &mut Vec<f64>,
    current_gradient: &Rc<Vector>,
    current_objective: f64,
    quantities: &mut Quantities,
    reporter: &Reporter,
    strategies: &mut Strategies,
) {
    gradient_list.clear();
    linear_terms.clear();
    gradient_list.push(Rc::clone(current_gradient));
    linear_terms.push(current_objective);

    strategies
        .qp_solver_mut()
        .set_gradient_list(gradient_list.clone());
    strategies
        .qp_solver_mut()
        .set_linear_terms(linear_terms.clone());
    strategies.qp_solver_mut().solve_qp(reporter);
    convert_qp_solution_to_step(quantities, strategies);
}

/// The seven fixed-width solve columns shared by the per-inner-iteration and
/// per-iteration lines.
fn print_solve_columns(
    reporter: &Reporter,
    level: ReportLevel,
    quantities: &Quantities,
    qp_solver: &dyn QpSolver,
) {
    reporter.printf(
        level,
        format_args!(
            " {:8} {:8} {:8} {:2} {:+9.2e} {:+9.2e} {:+9.2e}",
            quantities.inner_iteration_counter(),
            qp_solver.gradient_list_length(),
            quantities.qp_iteration_counter(),
            qp_solver.status().code(),
            qp_solver.kkt_error_dual(),
            qp_solver.primal_solution_norm_inf(),
            qp_solver.dual_objective_quadratic_value(),
        ),
    );
}
