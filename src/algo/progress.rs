//! Progress reporting for long-running algorithms.
//!
//! Whole-mesh operations accept a [`Progress`] and call it once per step.
//!
//! # Example
//!
//! ```
//! use tessel::algo::Progress;
//!
//! let progress = Progress::new(|current, total, message| {
//!     if current == total {
//!         println!("{}: done", message);
//!     }
//! });
//! progress.report(3, 3, "Triangulating faces");
//! ```

/// A progress callback that receives updates during long-running operations.
///
/// The callback receives:
/// - `current`: Current step (0-based; equal to `total` when finished)
/// - `total`: Total number of steps
/// - `message`: Description of the current operation
pub struct Progress {
    callback: Option<Box<dyn Fn(usize, usize, &str) + Send + Sync>>,
}

impl Progress {
    /// Create a new progress reporter with the given callback.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(usize, usize, &str) + Send + Sync + 'static,
    {
        Self {
            callback: Some(Box::new(callback)),
        }
    }

    /// Create a progress reporter that discards all updates.
    pub fn none() -> Self {
        Self { callback: None }
    }

    /// Report progress.
    #[inline]
    pub fn report(&self, current: usize, total: usize, message: &str) {
        if let Some(callback) = &self.callback {
            callback(current, total, message);
        }
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::none()
    }
}

impl std::fmt::Debug for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Progress")
            .field("enabled", &self.callback.is_some())
            .finish()
    }
}
