use crate::status::{fmt_num, fmt_timestamp};
use crate::trigger::POLL_SLICE;
use crate::{lock_or_recover, CancelToken, Result, SequenceError, StepParams, StepStatus, Trigger};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;
use std::thread;
use std::time::Instant;
use time::OffsetDateTime;
use tracing::debug;

#[derive(Clone, Copy, Debug, Default)]
struct WaitWindow {
    minutes: f64,
    seconds: f64,
}

impl WaitWindow {
    fn duration(self) -> std::time::Duration {
        std::time::Duration::from_secs_f64((self.minutes * 60.0 + self.seconds).max(0.0))
    }
}

/// A trigger that holds the session for a fixed period of time.
///
/// The deadline is computed from the monotonic clock at first invocation;
/// wall-clock timestamps are recorded only for status display. Once elapsed,
/// completion latches and later calls return immediately.
pub struct WaitTrigger {
    position: AtomicU32,
    active: AtomicBool,
    complete: AtomicBool,
    window: Mutex<WaitWindow>,
    started: Mutex<Option<OffsetDateTime>>,
    ended: Mutex<Option<OffsetDateTime>>,
}

impl WaitTrigger {
    pub fn new(position: u32, params: &StepParams) -> Self {
        let trigger = Self {
            position: AtomicU32::new(position),
            active: AtomicBool::new(false),
            complete: AtomicBool::new(false),
            window: Mutex::new(WaitWindow::default()),
            started: Mutex::new(None),
            ended: Mutex::new(None),
        };
        trigger.update(params);
        trigger
    }
}

impl Trigger for WaitTrigger {
    fn kind(&self) -> &'static str {
        "wait"
    }

    fn position(&self) -> u32 {
        self.position.load(Ordering::Acquire)
    }

    fn set_position(&self, position: u32) {
        self.position.store(position, Ordering::Release);
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::Release);
    }

    fn is_complete(&self) -> bool {
        self.complete.load(Ordering::Acquire)
    }

    fn wait_for_trigger(&self, cancel: &CancelToken) -> Result<()> {
        if self.is_complete() {
            return Ok(());
        }
        let target = lock_or_recover(&self.window).duration();
        let deadline = Instant::now() + target;
        *lock_or_recover(&self.started) = Some(OffsetDateTime::now_utc());
        debug!(position = self.position(), secs = target.as_secs_f64(), "wait started");

        loop {
            if cancel.is_cancelled() {
                return Err(SequenceError::Cancelled);
            }
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            thread::sleep((deadline - now).min(POLL_SLICE));
        }

        *lock_or_recover(&self.ended) = Some(OffsetDateTime::now_utc());
        self.complete.store(true, Ordering::Release);
        Ok(())
    }

    fn update(&self, params: &StepParams) {
        let mut window = lock_or_recover(&self.window);
        window.minutes = params.numeric_or_zero("minutes");
        window.seconds = params.numeric_or_zero("seconds");
    }

    fn status(&self) -> StepStatus {
        let window = *lock_or_recover(&self.window);
        let target = format!(
            "{} MIN {} SECS",
            fmt_num(window.minutes),
            fmt_num(window.seconds)
        );
        let start = lock_or_recover(&self.started)
            .map(fmt_timestamp)
            .unwrap_or_default();
        let description = match *lock_or_recover(&self.ended) {
            Some(end) => fmt_timestamp(end),
            None => target.clone(),
        };
        StepStatus {
            position: self.position(),
            kind: self.kind().to_string(),
            start,
            target,
            description,
            active: self.is_active(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    fn two_second_wait() -> WaitTrigger {
        let params = StepParams::new().with("minutes", "0").with("seconds", "2");
        WaitTrigger::new(0, &params)
    }

    #[test]
    fn blocks_for_the_configured_window() {
        let trigger = two_second_wait();
        let started = Instant::now();
        assert!(trigger.wait_for_trigger(&CancelToken::new()).is_ok());
        assert!(started.elapsed() >= Duration::from_millis(2000));
        assert!(trigger.is_complete());
    }

    #[test]
    fn completion_is_idempotent() {
        let params = StepParams::new().with("seconds", "0.2");
        let trigger = WaitTrigger::new(0, &params);
        assert!(trigger.wait_for_trigger(&CancelToken::new()).is_ok());

        let again = Instant::now();
        assert!(trigger.wait_for_trigger(&CancelToken::new()).is_ok());
        assert!(again.elapsed() < Duration::from_millis(50));
    }

    #[test]
    fn status_before_and_after_completion() {
        let trigger = two_second_wait();
        let before = trigger.status();
        assert_eq!(before.start, "");
        assert!(before.target.contains("2 SECS"));
        assert!(before.description.contains("2 SECS"));

        let quick = WaitTrigger::new(1, &StepParams::new().with("seconds", "0.1"));
        assert!(quick.wait_for_trigger(&CancelToken::new()).is_ok());
        let after = quick.status();
        assert_ne!(after.start, "");
        // RFC 3339 end timestamp replaces the target text.
        assert!(after.description.contains('T'), "{}", after.description);
    }

    #[test]
    fn cancellation_interrupts_within_a_slice() {
        let trigger = Arc::new(WaitTrigger::new(0, &StepParams::new().with("minutes", "5")));
        let cancel = CancelToken::new();
        let handle = {
            let trigger = Arc::clone(&trigger);
            let cancel = cancel.clone();
            thread::spawn(move || trigger.wait_for_trigger(&cancel))
        };
        thread::sleep(Duration::from_millis(100));
        let tripped = Instant::now();
        cancel.cancel();
        let result = match handle.join() {
            Ok(r) => r,
            Err(_) => panic!("wait worker panicked"),
        };
        assert!(matches!(result, Err(SequenceError::Cancelled)));
        assert!(tripped.elapsed() < Duration::from_millis(600));
        assert!(!trigger.is_complete());
    }

    #[test]
    fn update_does_not_reset_a_finished_wait() {
        let trigger = WaitTrigger::new(0, &StepParams::new().with("seconds", "0.1"));
        assert!(trigger.wait_for_trigger(&CancelToken::new()).is_ok());
        trigger.update(&StepParams::new().with("minutes", "10"));
        assert!(trigger.is_complete());
        let again = Instant::now();
        assert!(trigger.wait_for_trigger(&CancelToken::new()).is_ok());
        assert!(again.elapsed() < Duration::from_millis(50));
    }

    #[test]
    fn empty_params_default_to_zero_wait() {
        let trigger = WaitTrigger::new(0, &StepParams::new());
        let started = Instant::now();
        assert!(trigger.wait_for_trigger(&CancelToken::new()).is_ok());
        assert!(started.elapsed() < Duration::from_millis(100));
    }
}
