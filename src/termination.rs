//! Radius-update termination test.

use crate::quantities::Quantities;
use crate::reporter::Reporter;
use crate::strategies::{QpSolver, Strategy, Termination};
use crate::types::DirectionOptions;

/// Flags a radii update when the QP stationarity measure collapses.
///
/// The measure is `sqrt(max(N_comb, N_prim))`, the larger of the translated
/// combination norm and the primal step norm. Once it falls to
/// `stationarity_update_factor` times the stationarity radius, the current
/// radii have been resolved: the direction computation treats the flag as an
/// escape-success condition and the outer loop shrinks the radii.
pub struct StationarityTermination {
    stationarity_update_factor: f64,
    update_radii: bool,
}

impl StationarityTermination {
    pub fn new(stationarity_update_factor: f64) -> Self {
        Self {
            stationarity_update_factor,
            update_radii: false,
        }
    }
}

impl Default for StationarityTermination {
    /// Factor default: 1e-1.
    fn default() -> Self {
        Self::new(1e-1)
    }
}

impl Strategy for StationarityTermination {
    fn name(&self) -> &str {
        "StationarityTermination"
    }

    fn iteration_header(&self) -> &str {
        " Stat. Meas."
    }

    fn iteration_null_values(&self) -> &str {
        "------------"
    }
}

impl Termination for StationarityTermination {
    fn check_conditions_direction_computation(
        &mut self,
        _options: &DirectionOptions,
        quantities: &Quantities,
        _reporter: &Reporter,
        qp_solver: &dyn QpSolver,
    ) {
        let measure = qp_solver
            .combination_translated_norm2_squared()
            .max(qp_solver.primal_solution_norm2_squared())
            .sqrt();
        self.update_radii =
            measure <= self.stationarity_update_factor * quantities.stationarity_radius();
    }

    fn update_radii_direction_computation(&self) -> bool {
        self.update_radii
    }
}
