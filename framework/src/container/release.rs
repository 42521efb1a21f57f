//! Release callbacks and the disposable capability

use std::sync::Arc;

/// Boxed error returned by [`Dispose::dispose`]
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Capability of instances that need explicit cleanup after use
///
/// Register producers of such instances with
/// [`Container::add_disposable`](super::Container::add_disposable).
///
/// # Example
///
/// ```rust
/// use satchel::{BoxError, Dispose};
///
/// struct Connection;
///
/// impl Dispose for Connection {
///     fn dispose(&self) -> Result<(), BoxError> {
///         // close sockets, flush buffers...
///         Ok(())
///     }
/// }
/// ```
pub trait Dispose: Send + Sync + 'static {
    /// Perform cleanup. Errors are reported to the caller but the container
    /// discards them.
    fn dispose(&self) -> Result<(), BoxError>;
}

impl<T: Dispose + ?Sized> Dispose for Arc<T> {
    fn dispose(&self) -> Result<(), BoxError> {
        (**self).dispose()
    }
}

impl<T: Dispose + ?Sized> Dispose for Box<T> {
    fn dispose(&self) -> Result<(), BoxError> {
        (**self).dispose()
    }
}

/// Cleanup action paired with a resolved instance
///
/// Runs at most once: either through [`release`](Release::release) or when
/// dropped.
#[must_use = "dropping a Release runs it immediately"]
pub struct Release {
    action: Option<Box<dyn FnOnce() + Send>>,
}

impl Release {
    /// A release callback that does nothing
    pub fn noop() -> Self {
        Self { action: None }
    }

    pub(crate) fn new(action: impl FnOnce() + Send + 'static) -> Self {
        Self {
            action: Some(Box::new(action)),
        }
    }

    /// Whether releasing has any effect
    pub fn is_noop(&self) -> bool {
        self.action.is_none()
    }

    /// Run the cleanup action now
    pub fn release(mut self) {
        self.run();
    }

    fn run(&mut self) {
        if let Some(action) = self.action.take() {
            action();
        }
    }
}

impl Drop for Release {
    fn drop(&mut self) {
        self.run();
    }
}

impl std::fmt::Debug for Release {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Release")
            .field("noop", &self.is_noop())
            .finish()
    }
}
