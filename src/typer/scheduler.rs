//! Parallel execution of sample jobs.
//!
//! Jobs are streamed through a bounded channel into a fixed-size rayon pool.
//! Each worker runs one sample at a time and sends its result to a single
//! collector thread, which owns the aggregator. Results come back in input
//! order no matter which worker finished first.

use crate::typer::{
    aggregator::ResultAggregator,
    workflows::{SampleJob, SampleResult, SampleStatus},
};
use crate::utils::Result;
use crossbeam_channel::{bounded, Sender};
use rayon::{
    iter::{ParallelBridge, ParallelIterator},
    ThreadPoolBuilder,
};
use serde::Serialize;
use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    thread,
};

const CHANNEL_BUFFER_SIZE: usize = 2048;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleState {
    Queued,
    Running,
    Completed,
    Failed,
}

impl SampleState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SampleState::Completed | SampleState::Failed)
    }

    pub fn transition(self, next: SampleState) -> Result<SampleState> {
        match (self, next) {
            (SampleState::Queued, SampleState::Running)
            | (SampleState::Running, SampleState::Completed)
            | (SampleState::Running, SampleState::Failed) => Ok(next),
            _ => Err(format!(
                "Invalid sample state transition {:?} -> {:?}",
                self, next
            )),
        }
    }
}

#[derive(Debug)]
struct StateTable {
    states: Mutex<Vec<SampleState>>,
}

impl StateTable {
    fn new(num_samples: usize) -> Self {
        StateTable {
            states: Mutex::new(vec![SampleState::Queued; num_samples]),
        }
    }

    fn advance(&self, index: usize, next: SampleState) -> Result<()> {
        let mut states = self.states.lock().unwrap_or_else(|p| p.into_inner());
        let state = states
            .get_mut(index)
            .ok_or_else(|| format!("Unknown sample index {}", index))?;
        *state = state.transition(next)?;
        Ok(())
    }

    fn into_states(self) -> Vec<SampleState> {
        self.states.into_inner().unwrap_or_else(|p| p.into_inner())
    }
}

/// Run-wide cancellation flag shared by the scheduler and its workers.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
pub struct RunOutcome {
    /// Reported results in input order.
    pub results: Vec<SampleResult>,
    /// Final state of every submitted sample, by input index.
    pub states: Vec<SampleState>,
    pub cancelled: bool,
}

impl RunOutcome {
    pub fn status_counts(&self) -> BTreeMap<SampleStatus, usize> {
        let mut counts = BTreeMap::new();
        for result in &self.results {
            *counts.entry(result.status).or_insert(0) += 1;
        }
        counts
    }
}

pub struct SampleScheduler {
    num_threads: usize,
    cancel: CancelToken,
}

impl SampleScheduler {
    pub fn new(num_threads: usize) -> Result<Self> {
        if num_threads == 0 {
            return Err("Number of threads must be at least 1".to_string());
        }
        Ok(SampleScheduler {
            num_threads,
            cancel: CancelToken::new(),
        })
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Runs `process` on every job and calls `on_complete` for each reported
    /// result, in completion order, from the collector thread.
    pub fn run<P, C>(&self, jobs: Vec<SampleJob>, process: P, mut on_complete: C) -> Result<RunOutcome>
    where
        P: Fn(&SampleJob, &CancelToken) -> Option<SampleResult> + Sync,
        C: FnMut(&SampleResult) + Send,
    {
        log::debug!("Initializing thread pool with {} threads...", self.num_threads);
        let pool = ThreadPoolBuilder::new()
            .num_threads(self.num_threads)
            .thread_name(|i| format!("ecotyper-{}", i))
            .build()
            .map_err(|e| format!("Failed to initialize thread pool: {}", e))?;

        let states = StateTable::new(jobs.len());
        let cancel = &self.cancel;
        let (sender_job, receiver_job) = bounded(CHANNEL_BUFFER_SIZE);
        let (sender_result, receiver_result) = bounded(CHANNEL_BUFFER_SIZE);

        let aggregator = thread::scope(|scope| -> Result<ResultAggregator> {
            let job_stream_thread = scope.spawn(move || {
                for job in jobs {
                    if cancel.is_cancelled() || sender_job.send(job).is_err() {
                        break;
                    }
                }
            });

            let collector_thread = scope.spawn(move || {
                let aggregator = ResultAggregator::new();
                for result in &receiver_result {
                    on_complete(&result);
                    aggregator.insert(result);
                }
                aggregator
            });

            pool.install(|| {
                receiver_job
                    .into_iter()
                    .par_bridge()
                    .for_each_with(&sender_result, |s, job| {
                        process_job(job, &process, &states, cancel, s)
                    });
            });

            // Clean-up
            drop(sender_result);
            job_stream_thread
                .join()
                .map_err(|_| "Job stream thread panicked".to_string())?;
            collector_thread
                .join()
                .map_err(|_| "Collector thread panicked".to_string())
        })?;

        let cancelled = cancel.is_cancelled();
        if cancelled {
            log::warn!(
                "Run cancelled, {} sample results kept",
                aggregator.len()
            );
        }
        Ok(RunOutcome {
            results: aggregator.finalize(),
            states: states.into_states(),
            cancelled,
        })
    }
}

fn process_job<P>(
    job: SampleJob,
    process: &P,
    states: &StateTable,
    cancel: &CancelToken,
    sender_result: &Sender<SampleResult>,
) where
    P: Fn(&SampleJob, &CancelToken) -> Option<SampleResult>,
{
    if cancel.is_cancelled() {
        log::debug!("{}: not started, run cancelled", job.sample_id);
        return;
    }
    if let Err(e) = states.advance(job.index, SampleState::Running) {
        log::error!("{}: {}", job.sample_id, e);
        return;
    }
    log::info!("{}: typing {}", job.sample_id, job.path.display());

    let result = match process(&job, cancel) {
        Some(result) => result,
        None => {
            log::debug!("{}: abandoned, run cancelled", job.sample_id);
            return;
        }
    };
    let next = if result.is_failed() {
        SampleState::Failed
    } else {
        SampleState::Completed
    };
    if let Err(e) = states.advance(job.index, next) {
        log::error!("{}: {}", job.sample_id, e);
        return;
    }
    log::info!("{}: finished with status {}", job.sample_id, result.status);
    if let Err(e) = sender_result.send(result) {
        log::error!("Failed to send sample result to collector thread: {}", e);
    }
}
