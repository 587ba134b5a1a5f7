use duet_core::{CallError, Candidate};
use std::collections::VecDeque;
use tracing::warn;

pub const DEFAULT_CANDIDATE_QUEUE_CAPACITY: usize = 64;

/// What to do when a remote candidate arrives and the queue is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverflowPolicy {
    #[default]
    DropOldest,
    FailCall,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateOutcome {
    Applied,
    Queued { dropped: usize },
    /// Belongs to a remote transport that has been replaced.
    Stale,
}

/// Remote candidates that arrived before a remote description, in receipt
/// order.
#[derive(Debug)]
pub struct CandidateQueue {
    items: VecDeque<Candidate>,
    capacity: usize,
    policy: OverflowPolicy,
    dropped_total: usize,
}

impl CandidateQueue {
    pub fn new(capacity: usize, policy: OverflowPolicy) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
            policy,
            dropped_total: 0,
        }
    }

    /// Returns how many queued candidates were evicted to make room.
    pub fn push(&mut self, candidate: Candidate) -> Result<usize, CallError> {
        let mut dropped = 0;
        if self.items.len() >= self.capacity {
            match self.policy {
                OverflowPolicy::FailCall => {
                    return Err(CallError::CandidateOverflow {
                        capacity: self.capacity,
                    });
                }
                OverflowPolicy::DropOldest => {
                    while self.items.len() >= self.capacity {
                        self.items.pop_front();
                        dropped += 1;
                    }
                    self.dropped_total += dropped;
                    warn!(
                        "Candidate queue full ({}), dropped {} oldest",
                        self.capacity, dropped
                    );
                }
            }
        }
        self.items.push_back(candidate);
        Ok(dropped)
    }

    pub fn take_all(&mut self) -> Vec<Candidate> {
        self.items.drain(..).collect()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn policy(&self) -> OverflowPolicy {
        self.policy
    }

    pub fn dropped_total(&self) -> usize {
        self.dropped_total
    }
}

impl Default for CandidateQueue {
    fn default() -> Self {
        Self::new(DEFAULT_CANDIDATE_QUEUE_CAPACITY, OverflowPolicy::default())
    }
}
