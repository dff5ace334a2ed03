//! Parallel, paginated retrieval of the full commit history.
//!
//! One coordinator hands out `{limit, offset}` pages to a pool of workers.
//! Every non-empty page that comes back triggers the next page at a globally
//! advancing offset, so the offset is only ever touched by the coordinator.
//! A worker that receives an empty page reports exhaustion once and exits;
//! the harvest ends when all workers have done so or the deadline expires.

use crate::deadline::Deadline;
use crate::error::HarvestError;
use crate::git::GitCli;
use crate::model::{Commit, PageRequest};
use indicatif::ProgressBar;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Mutex;
use std::thread;
use tracing::{debug, info, warn};

pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// Something that can return one page of history.
///
/// A fetch still running when `deadline` expires should give up with
/// [`HarvestError::DeadlineExpired`] rather than finish the page.
pub trait PageSource: Sync {
    fn fetch(&self, page: PageRequest, deadline: Deadline) -> Result<Vec<Commit>, HarvestError>;
}

impl PageSource for GitCli {
    fn fetch(&self, page: PageRequest, deadline: Deadline) -> Result<Vec<Commit>, HarvestError> {
        self.log_page(page, deadline)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct HarvestOptions {
    pub workers: usize,
    pub page_size: usize,
}

impl Default for HarvestOptions {
    fn default() -> Self {
        Self {
            workers: num_cpus::get(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Default)]
pub struct HarvestOutcome {
    /// Harvested commits in no particular order.
    pub commits: Vec<Commit>,
    /// The deadline expired before every worker reported exhaustion.
    pub timed_out: bool,
}

enum HarvestEvent {
    Batch(Vec<Commit>),
    Exhausted,
    /// A fetch was abandoned at the deadline.
    Expired,
    Failed(HarvestError),
}

pub fn harvest<S: PageSource>(
    source: &S,
    options: HarvestOptions,
    deadline: Deadline,
    progress: &ProgressBar,
) -> Result<HarvestOutcome, HarvestError> {
    let workers = options.workers.max(1);
    let step = options.page_size.max(1);
    info!(workers, page_size = step, "Harvesting commits");

    let (job_tx, job_rx) = mpsc::channel::<PageRequest>();
    let job_rx = Mutex::new(job_rx);
    let (event_tx, event_rx) = mpsc::channel::<HarvestEvent>();

    thread::scope(|scope| {
        for id in 0..workers {
            let events = event_tx.clone();
            let jobs = &job_rx;
            scope.spawn(move || page_worker(id, source, jobs, events, deadline));
        }
        drop(event_tx);

        let mut last_offset = 0;
        for x in 0..workers {
            last_offset = x * step;
            // Workers hold the receiving end until the scope ends.
            let _ = job_tx.send(PageRequest {
                limit: step,
                offset: last_offset,
            });
        }

        let mut outcome = HarvestOutcome::default();
        let mut exhausted = 0;
        loop {
            let event = match deadline.remaining() {
                Some(left) => match event_rx.recv_timeout(left) {
                    Ok(event) => event,
                    Err(RecvTimeoutError::Timeout) => HarvestEvent::Expired,
                    Err(RecvTimeoutError::Disconnected) => return Err(HarvestError::WorkerLost),
                },
                None => event_rx.recv().map_err(|_| HarvestError::WorkerLost)?,
            };

            match event {
                HarvestEvent::Batch(batch) => {
                    last_offset += step;
                    let _ = job_tx.send(PageRequest {
                        limit: step,
                        offset: last_offset,
                    });
                    outcome.commits.extend(batch);
                    progress.set_position(outcome.commits.len() as u64);
                }
                HarvestEvent::Exhausted => {
                    exhausted += 1;
                    if exhausted == workers {
                        break;
                    }
                }
                HarvestEvent::Expired => {
                    warn!(
                        harvested = outcome.commits.len(),
                        "Time limit exceeded. Couldn't get all the commits."
                    );
                    outcome.timed_out = true;
                    break;
                }
                HarvestEvent::Failed(err) => return Err(err),
            }
        }

        // Closing the queue lets idle workers return.
        drop(job_tx);
        info!(commits = outcome.commits.len(), "Harvest finished");
        Ok(outcome)
    })
}

fn page_worker<S: PageSource>(
    id: usize,
    source: &S,
    jobs: &Mutex<Receiver<PageRequest>>,
    events: Sender<HarvestEvent>,
    deadline: Deadline,
) {
    while let Some(page) = next_job(jobs) {
        match source.fetch(page, deadline) {
            Ok(batch) if batch.is_empty() => {
                debug!(worker = id, offset = page.offset, "No more commits");
                let _ = events.send(HarvestEvent::Exhausted);
                return;
            }
            Ok(batch) => {
                debug!(worker = id, offset = page.offset, count = batch.len(), "Fetched page");
                if events.send(HarvestEvent::Batch(batch)).is_err() {
                    return;
                }
            }
            Err(HarvestError::DeadlineExpired) => {
                debug!(worker = id, offset = page.offset, "Page abandoned at deadline");
                let _ = events.send(HarvestEvent::Expired);
                return;
            }
            Err(err) => {
                let _ = events.send(HarvestEvent::Failed(err));
                return;
            }
        }
    }
}

fn next_job(jobs: &Mutex<Receiver<PageRequest>>) -> Option<PageRequest> {
    // A poisoned lock is treated as a closed queue.
    let guard = jobs.lock().ok()?;
    guard.recv().ok()
}
