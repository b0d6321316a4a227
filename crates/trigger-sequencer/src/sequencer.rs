use crate::{lock_or_recover, CancelToken, Result, SequenceError, StepParams, StepStatus, Trigger};
use std::sync::{Arc, Mutex};
use std::thread;
use tracing::info;

/// Owner of an ordered trigger set for one brew session.
///
/// Triggers execute strictly in position order, one at a time, on a
/// dedicated worker thread. The trigger list lock is held only for list
/// mutation and snapshotting, never across a blocking wait, so status
/// queries stay responsive while a step runs.
///
/// Positions are unique and dense (0..n): insertion rejects duplicates, and
/// every mutation renumbers the remainder.
pub struct TriggerSequencer {
    triggers: Mutex<Vec<Arc<dyn Trigger>>>,
    cancel: CancelToken,
}

impl Default for TriggerSequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl TriggerSequencer {
    pub fn new() -> Self {
        Self {
            triggers: Mutex::new(Vec::new()),
            cancel: CancelToken::new(),
        }
    }

    /// Token shared with every blocking wait in this session.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Trip the session token; the worker returns `Cancelled`.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn len(&self) -> usize {
        lock_or_recover(&self.triggers).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert a trigger at the position it carries. Equal positions are a
    /// caller error; the sequence is left unchanged.
    pub fn add(&self, trigger: Arc<dyn Trigger>) -> Result<()> {
        let mut list = lock_or_recover(&self.triggers);
        if list.iter().any(|t| t.position() == trigger.position()) {
            return Err(SequenceError::DuplicatePosition(trigger.position()));
        }
        list.push(trigger);
        renumber(&mut list);
        Ok(())
    }

    /// Remove the trigger at `position` and renumber the remainder dense.
    pub fn remove(&self, position: u32) -> Result<Arc<dyn Trigger>> {
        let mut list = lock_or_recover(&self.triggers);
        let idx = list
            .iter()
            .position(|t| t.position() == position)
            .ok_or(SequenceError::PositionNotFound(position))?;
        let removed = list.remove(idx);
        renumber(&mut list);
        Ok(removed)
    }

    /// Move the trigger at `position` to `new_position`, shifting the
    /// triggers in between by one.
    pub fn reorder(&self, position: u32, new_position: u32) -> Result<()> {
        let mut list = lock_or_recover(&self.triggers);
        let idx = list
            .iter()
            .position(|t| t.position() == position)
            .ok_or(SequenceError::PositionNotFound(position))?;
        let moved = list.remove(idx);
        let dest = (new_position as usize).min(list.len());
        list.insert(dest, moved);
        for (i, trigger) in list.iter().enumerate() {
            trigger.set_position(i as u32);
        }
        Ok(())
    }

    /// Re-parse one trigger's parameters in place.
    pub fn update_trigger(&self, position: u32, params: &StepParams) -> Result<()> {
        let list = lock_or_recover(&self.triggers);
        let trigger = list
            .iter()
            .find(|t| t.position() == position)
            .ok_or(SequenceError::PositionNotFound(position))?;
        trigger.update(params);
        Ok(())
    }

    /// Consistent snapshot of every trigger, in position order. Safe to call
    /// while the worker is blocked inside a wait.
    pub fn status(&self) -> Vec<StepStatus> {
        let snapshot: Vec<Arc<dyn Trigger>> = lock_or_recover(&self.triggers).clone();
        snapshot.iter().map(|t| t.status()).collect()
    }

    /// Activate the lowest-position incomplete trigger and block on its
    /// wait. `Complete` signals normal end of sequence.
    pub fn run_next(&self) -> Result<()> {
        let next = {
            let list = lock_or_recover(&self.triggers);
            list.iter().find(|t| !t.is_complete()).cloned()
        };
        let Some(trigger) = next else {
            return Err(SequenceError::Complete);
        };
        trigger.set_active(true);
        info!(
            position = trigger.position(),
            kind = trigger.kind(),
            "step started"
        );
        let result = trigger.wait_for_trigger(&self.cancel);
        trigger.set_active(false);
        match result {
            Ok(()) => {
                info!(
                    position = trigger.position(),
                    kind = trigger.kind(),
                    "step complete"
                );
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Run triggers until the sequence is exhausted.
    pub fn run_to_completion(&self) -> Result<()> {
        loop {
            match self.run_next() {
                Ok(()) => {}
                Err(SequenceError::Complete) => return Ok(()),
                Err(e) => return Err(e),
            }
        }
    }

    /// Dedicated worker thread for this session, so blocking waits never
    /// stall callers querying status.
    pub fn spawn(self: &Arc<Self>) -> thread::JoinHandle<Result<()>> {
        let sequencer = Arc::clone(self);
        thread::spawn(move || sequencer.run_to_completion())
    }
}

fn renumber(list: &mut Vec<Arc<dyn Trigger>>) {
    list.sort_by_key(|t| t.position());
    for (i, trigger) in list.iter().enumerate() {
        trigger.set_position(i as u32);
    }
}
