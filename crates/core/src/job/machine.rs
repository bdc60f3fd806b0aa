//! Per-job state machine.
//!
//! ```text
//! Pending ──start──▶ Encoding(0) ──encoded──▶ Publishing(0) ──published──▶ Encoding(1) ... ──▶ Completed
//!                        │                        │
//!                        └────────fail────────────┴──────────▶ Failed(i)
//! ```
//!
//! The machine owns the completed prefix; the runner hands exactly that
//! prefix to the publisher.

use thiserror::Error;

use super::types::JobState;
use crate::ladder::{Ladder, RenditionSpec};

/// Where a job is in its ladder walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobPhase {
    Pending,
    /// Encoding the rendition at this ladder position.
    Encoding(usize),
    /// Rendition at this position is encoded; manifest not yet rewritten.
    Publishing(usize),
    Completed,
    /// Failed while working on this ladder position.
    Failed(usize),
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid job transition: {action} from {from:?}")]
pub struct TransitionError {
    pub from: JobPhase,
    pub action: &'static str,
}

#[derive(Debug, Clone)]
pub struct JobMachine {
    ladder: Ladder,
    phase: JobPhase,
    completed: Vec<RenditionSpec>,
}

impl JobMachine {
    pub fn new(ladder: Ladder) -> Self {
        Self {
            ladder,
            phase: JobPhase::Pending,
            completed: Vec::new(),
        }
    }

    pub fn phase(&self) -> JobPhase {
        self.phase
    }

    pub fn state(&self) -> JobState {
        match self.phase {
            JobPhase::Pending => JobState::Pending,
            JobPhase::Encoding(_) | JobPhase::Publishing(_) => JobState::Running,
            JobPhase::Completed => JobState::Completed,
            JobPhase::Failed(_) => JobState::Failed,
        }
    }

    /// Renditions whose manifest entry has been published, in ladder order.
    pub fn completed(&self) -> &[RenditionSpec] {
        &self.completed
    }

    /// The rendition the job is currently working on.
    pub fn current(&self) -> Option<&RenditionSpec> {
        match self.phase {
            JobPhase::Encoding(position) | JobPhase::Publishing(position) => {
                self.ladder.get(position)
            }
            _ => None,
        }
    }

    pub fn start(&mut self) -> Result<&RenditionSpec, TransitionError> {
        if self.phase != JobPhase::Pending {
            return Err(self.invalid("start"));
        }
        self.phase = JobPhase::Encoding(0);
        self.ladder.get(0).ok_or(TransitionError {
            from: JobPhase::Pending,
            action: "start",
        })
    }

    /// The current rendition finished encoding. Returns the prefix the
    /// manifest must now list: everything completed plus this rendition.
    pub fn encoded(&mut self) -> Result<Vec<RenditionSpec>, TransitionError> {
        let JobPhase::Encoding(position) = self.phase else {
            return Err(self.invalid("encoded"));
        };
        let rendition = self
            .ladder
            .get(position)
            .cloned()
            .ok_or_else(|| self.invalid("encoded"))?;

        self.phase = JobPhase::Publishing(position);

        let mut prefix = self.completed.clone();
        prefix.push(rendition);
        Ok(prefix)
    }

    /// The manifest for the current rendition is on disk. Returns the next
    /// rendition to encode, or `None` once the ladder is exhausted.
    pub fn published(&mut self) -> Result<Option<&RenditionSpec>, TransitionError> {
        let JobPhase::Publishing(position) = self.phase else {
            return Err(self.invalid("published"));
        };
        let rendition = self
            .ladder
            .get(position)
            .cloned()
            .ok_or_else(|| self.invalid("published"))?;
        self.completed.push(rendition);

        let next = position + 1;
        if next < self.ladder.len() {
            self.phase = JobPhase::Encoding(next);
            Ok(self.ladder.get(next))
        } else {
            self.phase = JobPhase::Completed;
            Ok(None)
        }
    }

    /// Ends the job at the current position. No-op once terminal.
    pub fn fail(&mut self) {
        self.phase = match self.phase {
            JobPhase::Pending => JobPhase::Failed(0),
            JobPhase::Encoding(position) | JobPhase::Publishing(position) => {
                JobPhase::Failed(position)
            }
            terminal => terminal,
        };
    }

    fn invalid(&self, action: &'static str) -> TransitionError {
        TransitionError {
            from: self.phase,
            action,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_step() -> Ladder {
        Ladder::new([(144, 200, "256x144"), (240, 400, "426x240")]).unwrap()
    }

    #[test]
    fn test_full_walk() {
        let mut machine = JobMachine::new(two_step());
        assert_eq!(machine.state(), JobState::Pending);

        assert_eq!(machine.start().unwrap().height, 144);
        assert_eq!(machine.state(), JobState::Running);

        let prefix = machine.encoded().unwrap();
        assert_eq!(prefix.len(), 1);
        assert!(machine.completed().is_empty());

        let next = machine.published().unwrap().cloned();
        assert_eq!(next.map(|r| r.height), Some(240));
        assert_eq!(machine.completed().len(), 1);

        let prefix = machine.encoded().unwrap();
        let heights: Vec<u32> = prefix.iter().map(|r| r.height).collect();
        assert_eq!(heights, vec![144, 240]);

        assert!(machine.published().unwrap().is_none());
        assert_eq!(machine.phase(), JobPhase::Completed);
        assert_eq!(machine.state(), JobState::Completed);
        assert_eq!(machine.completed().len(), 2);
    }

    #[test]
    fn test_fail_keeps_completed_prefix() {
        let mut machine = JobMachine::new(two_step());
        machine.start().unwrap();
        machine.encoded().unwrap();
        machine.published().unwrap();

        machine.fail();

        assert_eq!(machine.phase(), JobPhase::Failed(1));
        assert_eq!(machine.state(), JobState::Failed);
        assert_eq!(machine.completed().len(), 1);
        assert!(machine.current().is_none());
    }

    #[test]
    fn test_fail_is_sticky() {
        let mut machine = JobMachine::new(two_step());
        machine.start().unwrap();
        machine.fail();
        machine.fail();
        assert_eq!(machine.phase(), JobPhase::Failed(0));

        let err = machine.encoded().unwrap_err();
        assert_eq!(err.from, JobPhase::Failed(0));
    }

    #[test]
    fn test_out_of_order_transitions_rejected() {
        let mut machine = JobMachine::new(two_step());
        assert!(machine.encoded().is_err());
        assert!(machine.published().is_err());

        machine.start().unwrap();
        assert!(machine.start().is_err());
        assert!(machine.published().is_err());
    }
}
