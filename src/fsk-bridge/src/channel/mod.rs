//! The shared storage both sides of the bridge talk through.
//!
//! A [`Channel`] is owned by the runtime's host environment; the bridge only
//! calls it. Two artifact names are ever used: one for requests, one for
//! responses.

mod dir;
mod memory;

pub use dir::DirChannel;
pub use memory::MemoryChannel;

use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;

/// Errors raised by channel operations.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The artifact does not exist.
    #[error("Artifact not found: {0}")]
    NotFound(String),

    /// The artifact name is not a plain file name.
    #[error("Invalid artifact name: {0}")]
    InvalidName(String),

    /// The channel refused the write.
    #[error("Write rejected for {name}: {reason}")]
    WriteRejected { name: String, reason: String },

    /// Artifact content is not valid UTF-8.
    #[error("Artifact {0} is not valid UTF-8")]
    NotUtf8(String),

    /// IO error from a disk-backed channel.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Named-artifact storage shared between the host and the runtime.
pub trait Channel: Send + Sync {
    /// Create or overwrite the artifact `name`.
    fn write(&self, name: &str, content: &str) -> Result<(), ChannelError>;

    /// Read the full content of `name`.
    fn read(&self, name: &str) -> Result<String, ChannelError>;

    /// Check whether `name` currently exists.
    fn exists(&self, name: &str) -> Result<bool, ChannelError>;

    /// Remove `name`.
    fn delete(&self, name: &str) -> Result<(), ChannelError>;
}

/// Read and delete `name` if present.
///
/// Content is only returned once the delete succeeded, so the same artifact
/// can never be handed out twice.
pub fn take(channel: &dyn Channel, name: &str) -> Result<Option<String>, ChannelError> {
    if !channel.exists(name)? {
        return Ok(None);
    }
    let content = channel.read(name)?;
    channel.delete(name)?;
    Ok(Some(content))
}

/// Holder for the channel, empty until the runtime reports ready.
#[derive(Default)]
pub struct ChannelSlot {
    inner: RwLock<Option<Arc<dyn Channel>>>,
}

impl ChannelSlot {
    /// Create an empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the channel. Replaces any previous one.
    pub fn attach(&self, channel: Arc<dyn Channel>) {
        *self.inner.write() = Some(channel);
    }

    /// Remove the channel, returning the slot to the not-ready state.
    pub fn detach(&self) -> Option<Arc<dyn Channel>> {
        self.inner.write().take()
    }

    /// Get the channel if the runtime is ready.
    pub fn get(&self) -> Option<Arc<dyn Channel>> {
        self.inner.read().clone()
    }

    /// Check whether a channel is attached.
    pub fn is_available(&self) -> bool {
        self.inner.read().is_some()
    }
}

impl std::fmt::Debug for ChannelSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelSlot")
            .field("available", &self.is_available())
            .finish()
    }
}
