//! Startup self-check outcome.
//!
//! The pipeline is probed once before the listener opens. The result is
//! immutable for the life of the process; a failed probe keeps the
//! server up so health routes can report why.

use std::any::Any;
use std::fmt::Display;
use std::panic::{self, UnwindSafe};

/// Whether the image pipeline passed its startup self-check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartupStatus {
    /// The pipeline processed the test pattern correctly.
    Ready,
    /// The self-check failed or panicked.
    Unavailable {
        /// Human-readable failure description.
        reason: String,
    },
}

impl StartupStatus {
    /// Run [`outline_pipeline::self_check`] and capture its outcome.
    #[must_use]
    pub fn probe() -> Self {
        Self::from_check(outline_pipeline::self_check)
    }

    /// Run `check`, turning an error or a panic into [`Self::Unavailable`].
    #[must_use]
    pub fn from_check<F, E>(check: F) -> Self
    where
        F: FnOnce() -> Result<(), E> + UnwindSafe,
        E: Display,
    {
        match panic::catch_unwind(check) {
            Ok(Ok(())) => Self::Ready,
            Ok(Err(e)) => Self::Unavailable {
                reason: e.to_string(),
            },
            Err(payload) => Self::Unavailable {
                reason: format!("self-check panicked: {}", panic_message(&*payload)),
            },
        }
    }

    /// Returns `true` if the pipeline is usable.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    /// Failure description, if any.
    #[must_use]
    pub const fn reason(&self) -> Option<&str> {
        match self {
            Self::Ready => None,
            Self::Unavailable { reason } => Some(reason.as_str()),
        }
    }
}

/// Best-effort text of a panic payload.
#[must_use]
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_owned())
}
