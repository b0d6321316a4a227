use crate::{CancelToken, Result, StepParams, StepStatus};
use std::time::Duration;

/// How often blocking waits wake to re-check their condition and the cancel
/// token. Sub-second so cancellation never lags a full poll interval.
pub(crate) const POLL_SLICE: Duration = Duration::from_millis(250);

/// One step of an automated brew sequence.
///
/// Methods take `&self` and rely on interior mutability so that status
/// snapshots never contend with a worker blocked inside `wait_for_trigger`.
pub trait Trigger: Send + Sync {
    /// Variant discriminator ("wait", "temperature").
    fn kind(&self) -> &'static str;

    fn position(&self) -> u32;

    fn set_position(&self, position: u32);

    fn is_active(&self) -> bool;

    fn set_active(&self, active: bool);

    /// Whether the wait condition has been satisfied. Irreversible per
    /// activation.
    fn is_complete(&self) -> bool;

    /// Block the calling worker until the condition holds. The sole
    /// suspension point of a trigger. Completed triggers return immediately;
    /// a tripped token surfaces as `SequenceError::Cancelled` and leaves the
    /// trigger incomplete.
    fn wait_for_trigger(&self, cancel: &CancelToken) -> Result<()>;

    /// Re-parse parameters. Never resets the timestamps or deadline of an
    /// in-flight wait; new values take effect on the next activation.
    fn update(&self, params: &StepParams);

    /// Operator-facing snapshot. Never fails.
    fn status(&self) -> StepStatus;
}

/// Source of calibrated readings for condition triggers. Implemented by the
/// hardware layer; the sequencing engine only sees values.
pub trait ProbeSource: Send + Sync {
    fn name(&self) -> &str;

    fn read(&self) -> std::result::Result<f64, Box<dyn std::error::Error + Send + Sync>>;
}
