//! trigger-sequencer: ordered, blocking brew-session steps
//!
//! A brew session is an ordered set of triggers. Each trigger blocks the
//! session worker until its condition holds (elapsed time, a probe reading
//! crossing a threshold), exactly one trigger is active at a time, and
//! status snapshots stay readable while the worker is blocked. Cancellation
//! is cooperative: every wait loop checks a shared token each poll slice.

mod error;
pub use error::{Result, SequenceError};

mod cancel;
pub use cancel::CancelToken;

mod params;
pub use params::StepParams;

mod status;
pub use status::StepStatus;

mod trigger;
pub use trigger::{ProbeSource, Trigger};

mod wait;
pub use wait::WaitTrigger;

mod temperature;
pub use temperature::{Direction, TemperatureTrigger};

mod sequencer;
pub use sequencer::TriggerSequencer;

mod loader;
pub use loader::{build_sequencer, load_plan_file, load_plan_str, SessionPlan, StepSpec};

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Take a lock, recovering the data if a holder panicked.
pub(crate) fn lock_or_recover<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
