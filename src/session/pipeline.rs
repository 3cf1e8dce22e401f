//! Sequential archival of the committed entries.
//!
//! At most one move is outstanding. A completion is accepted only for the
//! index currently in flight; anything else is a [`ProtocolViolation`] and
//! leaves the pipeline untouched.

use super::history::RecentHistory;
use crate::error::ProtocolViolation;
use crate::model::{ArchivalRecord, Entry};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    InFlight(usize),
    Completed,
    Cancelled,
    Failed(usize),
}

/// A move the caller must perform and report back on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRequest {
    pub index: usize,
    pub entry: Arc<Entry>,
}

#[derive(Debug, Clone)]
pub struct Pipeline {
    work: Vec<Arc<Entry>>,
    state: PipelineState,
    history: RecentHistory,
    completed: usize,
    total_elapsed: Duration,
}

impl Pipeline {
    pub fn new(work: Vec<Arc<Entry>>) -> Self {
        Self {
            work,
            state: PipelineState::Idle,
            history: RecentHistory::default(),
            completed: 0,
            total_elapsed: Duration::ZERO,
        }
    }

    /// Issue the first move, or finish immediately when there is no work.
    pub fn start(&mut self) -> Option<MoveRequest> {
        if self.state != PipelineState::Idle {
            return None;
        }
        self.advance_to(0)
    }

    /// Record a finished move and hand out the next one, if any.
    pub fn complete(
        &mut self,
        index: usize,
        elapsed: Duration,
    ) -> Result<Option<MoveRequest>, ProtocolViolation> {
        self.check_in_flight(index)?;
        self.history.push(ArchivalRecord {
            entry: Arc::clone(&self.work[index]),
            elapsed,
        });
        self.completed += 1;
        self.total_elapsed += elapsed;
        Ok(self.advance_to(index + 1))
    }

    /// Stop on the failed move; nothing after it is attempted.
    pub fn fail(&mut self, index: usize) -> Result<Arc<Entry>, ProtocolViolation> {
        self.check_in_flight(index)?;
        self.state = PipelineState::Failed(index);
        Ok(Arc::clone(&self.work[index]))
    }

    /// Returns false when the pipeline had already finished.
    pub fn cancel(&mut self) -> bool {
        match self.state {
            PipelineState::Idle | PipelineState::InFlight(_) => {
                self.state = PipelineState::Cancelled;
                true
            }
            _ => false,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        !matches!(self.state, PipelineState::Idle | PipelineState::InFlight(_))
    }

    pub fn history(&self) -> &RecentHistory {
        &self.history
    }

    pub fn len(&self) -> usize {
        self.work.len()
    }

    /// Number of entries whose move has completed.
    pub fn done(&self) -> usize {
        self.completed
    }

    pub fn in_flight(&self) -> Option<&Arc<Entry>> {
        match self.state {
            PipelineState::InFlight(i) => self.work.get(i),
            _ => None,
        }
    }

    /// Entries already moved, in the order they were archived.
    pub fn archived(&self) -> &[Arc<Entry>] {
        &self.work[..self.completed]
    }

    pub fn total_elapsed(&self) -> Duration {
        self.total_elapsed
    }

    fn check_in_flight(&self, index: usize) -> Result<(), ProtocolViolation> {
        match self.state {
            PipelineState::InFlight(i) if i == index => Ok(()),
            PipelineState::InFlight(i) => Err(ProtocolViolation {
                got: index,
                expected: Some(i),
            }),
            _ => Err(ProtocolViolation {
                got: index,
                expected: None,
            }),
        }
    }

    fn advance_to(&mut self, index: usize) -> Option<MoveRequest> {
        match self.work.get(index) {
            Some(entry) => {
                self.state = PipelineState::InFlight(index);
                Some(MoveRequest {
                    index,
                    entry: Arc::clone(entry),
                })
            }
            None => {
                self.state = PipelineState::Completed;
                None
            }
        }
    }
}
