use crate::status::{fmt_num, fmt_timestamp};
use crate::trigger::POLL_SLICE;
use crate::{
    lock_or_recover, CancelToken, ProbeSource, Result, SequenceError, StepParams, StepStatus,
    Trigger,
};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use time::OffsetDateTime;
use tracing::{debug, warn};

// Probe sampling cadence while a temperature step is waiting.
const PROBE_INTERVAL: Duration = Duration::from_secs(1);

/// Which side of the threshold releases the trigger.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Direction {
    #[default]
    Over,
    Under,
}

impl Direction {
    fn from_param(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.eq_ignore_ascii_case("under") => Self::Under,
            _ => Self::Over,
        }
    }

    fn crossed(self, reading: f64, threshold: f64) -> bool {
        match self {
            Self::Over => reading >= threshold,
            Self::Under => reading <= threshold,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Over => "OVER",
            Self::Under => "UNDER",
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct Threshold {
    value: f64,
    direction: Direction,
}

/// A trigger that holds the session until a probe reading crosses a
/// threshold. Probe failures are logged and polling continues; a flaky
/// sensor must not abort a running session.
pub struct TemperatureTrigger {
    position: AtomicU32,
    active: AtomicBool,
    complete: AtomicBool,
    threshold: Mutex<Threshold>,
    probe: Arc<dyn ProbeSource>,
    started: Mutex<Option<OffsetDateTime>>,
    ended: Mutex<Option<OffsetDateTime>>,
    last_reading: Mutex<Option<f64>>,
}

impl TemperatureTrigger {
    pub fn new(position: u32, params: &StepParams, probe: Arc<dyn ProbeSource>) -> Self {
        let trigger = Self {
            position: AtomicU32::new(position),
            active: AtomicBool::new(false),
            complete: AtomicBool::new(false),
            threshold: Mutex::new(Threshold::default()),
            probe,
            started: Mutex::new(None),
            ended: Mutex::new(None),
            last_reading: Mutex::new(None),
        };
        trigger.update(params);
        trigger
    }
}

impl Trigger for TemperatureTrigger {
    fn kind(&self) -> &'static str {
        "temperature"
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
        *lock_or_recover(&self.started) = Some(OffsetDateTime::now_utc());
        debug!(
            position = self.position(),
            probe = self.probe.name(),
            "temperature wait started"
        );

        let mut next_poll = Instant::now();
        loop {
            if cancel.is_cancelled() {
                return Err(SequenceError::Cancelled);
            }
            if Instant::now() >= next_poll {
                let goal = *lock_or_recover(&self.threshold);
                match self.probe.read() {
                    Ok(reading) => {
                        *lock_or_recover(&self.last_reading) = Some(reading);
                        if goal.direction.crossed(reading, goal.value) {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(probe = self.probe.name(), error = %e, "probe read failed");
                    }
                }
                next_poll = Instant::now() + PROBE_INTERVAL;
            }
            thread::sleep(POLL_SLICE);
        }

        *lock_or_recover(&self.ended) = Some(OffsetDateTime::now_utc());
        self.complete.store(true, Ordering::Release);
        Ok(())
    }

    fn update(&self, params: &StepParams) {
        let mut goal = lock_or_recover(&self.threshold);
        goal.value = params.numeric_or_zero("threshold");
        goal.direction = Direction::from_param(params.get("direction"));
    }

    fn status(&self) -> StepStatus {
        let goal = *lock_or_recover(&self.threshold);
        let target = format!("{} {}", fmt_num(goal.value), goal.direction.label());
        let start = lock_or_recover(&self.started)
            .map(fmt_timestamp)
            .unwrap_or_default();
        let description = match *lock_or_recover(&self.ended) {
            Some(end) => fmt_timestamp(end),
            None => match *lock_or_recover(&self.last_reading) {
                Some(reading) => fmt_num(reading),
                None => target.clone(),
            },
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
    use std::sync::atomic::AtomicUsize;

    /// Probe that walks a scripted list of readings, erroring where `None`.
    struct ScriptedProbe {
        readings: Vec<Option<f64>>,
        cursor: AtomicUsize,
    }

    impl ScriptedProbe {
        fn new(readings: Vec<Option<f64>>) -> Arc<Self> {
            Arc::new(Self {
                readings,
                cursor: AtomicUsize::new(0),
            })
        }
    }

    impl ProbeSource for ScriptedProbe {
        fn name(&self) -> &str {
            "scripted"
        }

        fn read(&self) -> std::result::Result<f64, Box<dyn std::error::Error + Send + Sync>> {
            let i = self.cursor.fetch_add(1, Ordering::Relaxed);
            let slot = self
                .readings
                .get(i.min(self.readings.len().saturating_sub(1)))
                .copied()
                .flatten();
            slot.ok_or_else(|| "probe offline".into())
        }
    }

    fn over_params(threshold: &str) -> StepParams {
        StepParams::new().with("threshold", threshold)
    }

    #[test]
    fn releases_once_threshold_crossed() {
        let probe = ScriptedProbe::new(vec![Some(60.0), Some(64.0), Some(67.2)]);
        let trigger = TemperatureTrigger::new(0, &over_params("66.5"), probe);
        assert!(trigger.wait_for_trigger(&CancelToken::new()).is_ok());
        assert!(trigger.is_complete());
        let status = trigger.status();
        assert_ne!(status.start, "");
        assert!(status.target.contains("66.5"));
    }

    #[test]
    fn probe_errors_do_not_abort_the_wait() {
        let probe = ScriptedProbe::new(vec![None, None, Some(70.0)]);
        let trigger = TemperatureTrigger::new(0, &over_params("66.5"), probe);
        assert!(trigger.wait_for_trigger(&CancelToken::new()).is_ok());
    }

    #[test]
    fn under_direction_waits_for_cooling() {
        let params = over_params("20").with("direction", "under");
        let probe = ScriptedProbe::new(vec![Some(80.0), Some(40.0), Some(19.5)]);
        let trigger = TemperatureTrigger::new(0, &params, probe);
        assert!(trigger.wait_for_trigger(&CancelToken::new()).is_ok());
    }

    #[test]
    fn cancellation_leaves_the_trigger_incomplete() {
        let probe = ScriptedProbe::new(vec![Some(10.0)]);
        let trigger = Arc::new(TemperatureTrigger::new(0, &over_params("100"), probe));
        let cancel = CancelToken::new();
        let handle = {
            let trigger = Arc::clone(&trigger);
            let cancel = cancel.clone();
            thread::spawn(move || trigger.wait_for_trigger(&cancel))
        };
        thread::sleep(Duration::from_millis(100));
        cancel.cancel();
        let result = match handle.join() {
            Ok(r) => r,
            Err(_) => panic!("wait worker panicked"),
        };
        assert!(matches!(result, Err(SequenceError::Cancelled)));
        assert!(!trigger.is_complete());
    }
}
