//! Per-commit fan-out: language detection and library extraction.

use crate::deadline::Deadline;
use crate::error::GitError;
use crate::git::GitCli;
use crate::language::LanguageDetector;
use crate::libraries::AnalyzerRegistry;
use crate::model::{AnalyzedCommit, ChangedFile, Commit, Libraries};
use crate::util::strip_relative_markers;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Mutex;
use std::thread;
use tracing::{debug, info, warn};

/// Retrieves file content at a given revision.
pub trait ContentSource: Sync {
    fn file_content(&self, hash: &str, path: &str) -> Result<Vec<u8>, GitError>;
}

impl ContentSource for GitCli {
    fn file_content(&self, hash: &str, path: &str) -> Result<Vec<u8>, GitError> {
        GitCli::file_content(self, hash, path)
    }
}

#[derive(Debug)]
pub enum AnalysisEvent {
    Analyzed(AnalyzedCommit),
    /// Sent once by each worker after the job queue is drained.
    WorkerDone,
}

pub struct AnalysisPool<'a, C: ContentSource> {
    content: &'a C,
    registry: &'a AnalyzerRegistry,
    detector: LanguageDetector,
    workers: usize,
    skip_libraries: bool,
    deadline: Deadline,
}

impl<'a, C: ContentSource> AnalysisPool<'a, C> {
    pub fn new(content: &'a C, registry: &'a AnalyzerRegistry) -> Self {
        Self {
            content,
            registry,
            detector: LanguageDetector::new(),
            workers: num_cpus::get(),
            skip_libraries: false,
            deadline: Deadline::never(),
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_skip_libraries(mut self, skip: bool) -> Self {
        self.skip_libraries = skip;
        self
    }

    pub fn with_deadline(mut self, deadline: Deadline) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Analyzes `commits` on the worker pool while `sink` consumes the event
    /// stream on the calling thread. Exactly `self.workers()` `WorkerDone`
    /// events are sent, each after that worker's last `Analyzed` event.
    pub fn run<T>(&self, commits: Vec<Commit>, sink: impl FnOnce(Receiver<AnalysisEvent>) -> T) -> T {
        info!(commits = commits.len(), workers = self.workers, "Analysing libraries");

        let (job_tx, job_rx) = mpsc::channel::<Commit>();
        for commit in commits {
            // The receiver is alive for the whole function.
            let _ = job_tx.send(commit);
        }
        drop(job_tx);
        let jobs = Mutex::new(job_rx);
        let (event_tx, event_rx) = mpsc::channel::<AnalysisEvent>();

        thread::scope(|scope| {
            for id in 0..self.workers {
                let events = event_tx.clone();
                let jobs = &jobs;
                scope.spawn(move || self.worker(id, jobs, events));
            }
            drop(event_tx);
            sink(event_rx)
        })
    }

    fn worker(&self, id: usize, jobs: &Mutex<Receiver<Commit>>, events: Sender<AnalysisEvent>) {
        let mut timed_out = false;
        while let Some(commit) = next_commit(jobs) {
            let analyzed = self.analyze_commit(commit, &mut timed_out);
            if events.send(AnalysisEvent::Analyzed(analyzed)).is_err() {
                debug!(worker = id, "event receiver dropped");
                return;
            }
        }
        let _ = events.send(AnalysisEvent::WorkerDone);
    }

    /// Detects languages and libraries of one commit. After the deadline the
    /// remaining files are left uninspected, but the commit is still returned.
    pub fn analyze_commit(&self, mut commit: Commit, timed_out: &mut bool) -> AnalyzedCommit {
        let mut libraries = Libraries::new();
        let hash = commit.hash.clone();
        for file in commit.changed_files.iter_mut() {
            if self.deadline.expired() {
                if !*timed_out {
                    *timed_out = true;
                    warn!("Time limit exceeded. Couldn't analyze all the commits.");
                }
                break;
            }
            self.analyze_file(&hash, file, &mut libraries);
        }
        AnalyzedCommit { commit, libraries }
    }

    fn analyze_file(&self, hash: &str, file: &mut ChangedFile, libraries: &mut Libraries) {
        let extension = file.extension().to_string();
        if extension.is_empty() {
            return;
        }

        let mut content: Option<Vec<u8>> = None;
        let language = if self.detector.should_use_file(&extension) {
            let Some(bytes) = self.fetch(hash, &file.path) else {
                return;
            };
            let language = self.detector.detect_from_file(&file.path, &bytes);
            content = Some(bytes);
            language
        } else {
            self.detector.detect_from_extension(&extension)
        };

        let Some(language) = language else {
            return;
        };
        file.assign_language(language);

        if self.skip_libraries {
            return;
        }
        let Some(analyzer) = self.registry.get(language) else {
            return;
        };
        let bytes = match content {
            Some(bytes) => bytes,
            None => match self.fetch(hash, &file.path) {
                Some(bytes) => bytes,
                None => return,
            },
        };

        match analyzer.extract_libraries(&String::from_utf8_lossy(&bytes)) {
            Ok(found) => libraries
                .entry(language.to_string())
                .or_default()
                .extend(found.iter().map(|l| strip_relative_markers(l))),
            Err(e) => warn!(language, error = %e, "error extracting libraries"),
        }
    }

    fn fetch(&self, hash: &str, path: &str) -> Option<Vec<u8>> {
        match self.content.file_content(hash, path) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                debug!(commit = hash, path, error = %e, "skipping file without content");
                None
            }
        }
    }
}

fn next_commit(jobs: &Mutex<Receiver<Commit>>) -> Option<Commit> {
    let guard = jobs.lock().ok()?;
    guard.recv().ok()
}
