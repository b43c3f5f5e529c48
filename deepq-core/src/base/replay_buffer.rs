//! Replay buffer interface.
use anyhow::Result;

/// Interface for buffers that store experiences from environments.
pub trait ExperienceBufferBase {
    /// The type of items stored in the buffer.
    type Item;

    /// Pushes a new experience into the buffer.
    fn push(&mut self, tr: Self::Item) -> Result<()>;

    /// Returns the current number of valid experiences in the buffer.
    fn len(&self) -> usize;

    /// Returns `true` if the buffer has no valid experience.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The maximum number of experiences the buffer keeps.
    fn capacity(&self) -> usize;
}

/// Interface for replay buffers that generate batches for training.
pub trait ReplayBufferBase {
    /// Configuration parameters for the replay buffer.
    type Config: Clone;

    /// The type of batch generated for training.
    type Batch;

    /// Builds a new replay buffer from the given configuration.
    fn build(config: &Self::Config) -> Self;

    /// Constructs a batch of `size` experiences for training.
    fn batch(&mut self, size: usize) -> Result<Self::Batch>;
}
