//! Replay buffer interface.
use anyhow::Result;

/// Interface of buffers receiving experiences from environments.
pub trait ExperienceBufferBase {
    /// Items pushed into the buffer.
    type Item;

    /// Pushes an item into the buffer.
    fn push(&mut self, tr: Self::Item) -> Result<()>;

    /// The number of valid items in the buffer.
    fn len(&self) -> usize;

    /// Returns `true` if the buffer holds no item.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Interface of replay buffers handing batches to agents.
pub trait ReplayBufferBase {
    /// Configuration of the replay buffer.
    type Config: Clone;

    /// Batch generated from the buffer.
    type Batch;

    /// Build a replay buffer from [Self::Config].
    fn build(config: &Self::Config) -> Result<Self>
    where
        Self: Sized;

    /// Constructs a batch of `size` items.
    ///
    /// Fails with
    /// [`DrlaError::InsufficientData`](crate::error::DrlaError::InsufficientData)
    /// if the buffer is empty.
    fn batch(&mut self, size: usize) -> Result<Self::Batch>;
}
