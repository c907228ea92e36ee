pub use fixtures::{
    FixtureDir, GBM_INSTRUMENT, banded_matrix, binned_counts, energy_bounds, event_counts,
    poisson_arrival_times, response_library,
};
pub use gaussian::{GaussianError, GaussianLikelihood};

mod fixtures;
mod gaussian;
