//! Core functionalities.
mod action_set;
mod env;
mod policy;
mod q_function;
mod replay_buffer;
mod step;
pub use action_set::ActionSet;
pub use env::Env;
pub use policy::Policy;
pub use q_function::{QBatch, QFunction};
pub use replay_buffer::{ExperienceBufferBase, ReplayBufferBase};
use std::fmt::Debug;
pub use step::Step;

/// An observation of an environment.
///
/// Observations are opaque to the learner. They are cloned into transitions
/// of the replay memory and handed to [`QFunction::vectorize`].
pub trait Obs: Clone + Debug {}
