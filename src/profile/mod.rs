//! Profile likelihood of a source normalization
//!
//! The likelihood model itself lives behind [LikelihoodEvaluator]. [LikelihoodProfiler] refits it
//! for many trial values of the source normalization, chosen by a short ensemble MCMC run and a
//! logarithmic grid, and collects the minimized `-ln L` values into a [LikelihoodProfile].
//! [ParameterGuard] makes sure the evaluator is handed back in the state it was received.

mod descriptor;
pub use descriptor::ModelDescriptor;

mod evaluator;
pub use evaluator::{LikelihoodEvaluator, ParameterKey};

pub mod flux;

mod guard;
pub use guard::{ParameterGuard, ParameterSnapshot};

mod likelihood_profile;
pub use likelihood_profile::LikelihoodProfile;

mod objective;
pub use objective::ProfileObjective;

mod profiler;
pub use profiler::LikelihoodProfiler;

pub mod sampling;

mod settings;
pub use settings::ProfilerSettings;
