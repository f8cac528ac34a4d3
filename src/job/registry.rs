use std::{collections::BTreeMap, fmt::Display};

use parking_lot::RwLock;

use crate::vocab::{JobId, Seq};

/// Append-only record of the runtime identifiers of submitted jobs, by sequence
/// number. Written by the driver, read by whoever monitors the evaluation.
#[derive(Debug, Default)]
pub struct JobRegistry {
    state: RwLock<RegistryState>,
}

#[derive(Debug, Default)]
struct RegistryState {
    expected: usize,
    jobs: BTreeMap<Seq, JobId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub submitted: usize,
    pub expected: usize,
}

impl Display for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{} jobs submitted", self.submitted, self.expected)
    }
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new evaluation made of `expected` jobs, forgetting the jobs of any
    /// earlier one.
    pub fn reset(&self, expected: usize) {
        *self.state.write() = RegistryState {
            expected,
            jobs: BTreeMap::new(),
        };
    }

    /// Records the identifier of job `seq`. Within one evaluation a sequence number is
    /// only ever recorded once.
    pub fn register(&self, seq: Seq, id: JobId) {
        let mut state = self.state.write();
        if let Some(existing) = state.jobs.get(&seq) {
            log::warn!("Job {seq} already registered as {existing}, ignoring {id}");
            return;
        }
        state.jobs.insert(seq, id);
    }

    pub fn job_id(&self, seq: Seq) -> Option<JobId> {
        self.state.read().jobs.get(&seq).cloned()
    }

    /// All registered jobs in sequence number order.
    pub fn jobs(&self) -> Vec<(Seq, JobId)> {
        self.state
            .read()
            .jobs
            .iter()
            .map(|(seq, id)| (*seq, id.clone()))
            .collect()
    }

    pub fn progress(&self) -> Progress {
        let state = self.state.read();
        Progress {
            submitted: state.jobs.len(),
            expected: state.expected,
        }
    }
}
