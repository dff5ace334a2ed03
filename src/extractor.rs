//! Runs the whole pipeline for one repository: harvest, author filter,
//! analysis, aggregation and export.

use crate::aggregate::Aggregator;
use crate::analysis::AnalysisPool;
use crate::deadline::Deadline;
use crate::error::Result;
use crate::export::{export_to_path, ExportSummary};
use crate::git::{GitCli, GitRepo};
use crate::harvest::{harvest, HarvestOptions, DEFAULT_PAGE_SIZE};
use crate::libraries::AnalyzerRegistry;
use crate::model::Commit;
use crate::obfuscate::HashObfuscator;
use crate::select::{candidate_emails, split_email, EmailSelector, SelectAll};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

pub const OUTPUT_SUFFIX: &str = "_history.json";

#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    pub repo: Option<PathBuf>,
    pub output_dir: PathBuf,
    pub git: PathBuf,
    pub workers: usize,
    pub page_size: usize,
    pub skip_libraries: bool,
    /// Anonymise emails and libraries in the export.
    pub hash_important: bool,
    pub user_emails: Vec<String>,
    pub seed: Vec<String>,
    pub time_limit: Option<Duration>,
    pub show_progress: bool,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            repo: None,
            output_dir: PathBuf::from("export"),
            git: PathBuf::from("git"),
            workers: num_cpus::get(),
            page_size: DEFAULT_PAGE_SIZE,
            skip_libraries: false,
            hash_important: false,
            user_emails: Vec::new(),
            seed: Vec::new(),
            time_limit: None,
            show_progress: false,
        }
    }
}

impl ExtractorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_repo(mut self, repo: impl Into<PathBuf>) -> Self {
        self.repo = Some(repo.into());
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_git(mut self, git: impl Into<PathBuf>) -> Self {
        self.git = git.into();
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_skip_libraries(mut self, skip: bool) -> Self {
        self.skip_libraries = skip;
        self
    }

    pub fn with_hash_important(mut self, hash: bool) -> Self {
        self.hash_important = hash;
        self
    }

    pub fn with_user_emails(mut self, emails: Vec<String>) -> Self {
        self.user_emails = emails;
        self
    }

    pub fn with_seed(mut self, seed: Vec<String>) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_time_limit(mut self, limit: Option<Duration>) -> Self {
        self.time_limit = limit;
        self
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn output_path(&self, repo_name: &str) -> PathBuf {
        output_file(&self.output_dir, repo_name)
    }
}

#[derive(Debug, Clone)]
pub struct ExtractionReport {
    pub repo_name: String,
    pub emails: Vec<String>,
    pub harvested: usize,
    pub analyzed: usize,
    /// The time limit cut the harvest short.
    pub harvest_timed_out: bool,
    pub export: ExportSummary,
}

pub struct RepoExtractor {
    config: ExtractorConfig,
    registry: AnalyzerRegistry,
    selector: Box<dyn EmailSelector>,
}

impl RepoExtractor {
    pub fn new(config: ExtractorConfig) -> Result<Self> {
        Ok(Self {
            config,
            registry: AnalyzerRegistry::builtin()?,
            selector: Box::new(SelectAll),
        })
    }

    pub fn with_selector(mut self, selector: impl EmailSelector + 'static) -> Self {
        self.selector = Box::new(selector);
        self
    }

    pub fn with_registry(mut self, registry: AnalyzerRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    pub fn extract(&self) -> Result<ExtractionReport> {
        let repo = GitRepo::open(self.config.repo.as_ref())?;
        let repo_name = repo.name()?;
        let output = self.config.output_path(&repo_name);
        info!(repo = %repo_name, path = %repo.path().display(), "Initializing repository");

        let deadline = Deadline::from_limit(self.config.time_limit);
        let git = GitCli::new(&self.config.git, repo.path());

        let total = if self.config.show_progress {
            match git.count_commits() {
                Ok(n) => Some(n),
                Err(e) => {
                    warn!(error = %e, "Cannot get number of commits, not showing progress");
                    None
                }
            }
        } else {
            None
        };
        let harvest_bar = self.progress_bar(total, "Harvesting commits");
        let outcome = harvest(
            &git,
            HarvestOptions {
                workers: self.config.workers,
                page_size: self.config.page_size,
            },
            deadline,
            &harvest_bar,
        )?;
        harvest_bar.finish();
        let harvested = outcome.commits.len();

        let (emails, commits) = self.filter_authors(outcome.commits);
        info!(selected = commits.len(), harvested, "Selected commits");

        let obfuscator = HashObfuscator::new(&self.config.seed);
        let mut aggregator = Aggregator::new();
        if self.config.hash_important {
            aggregator = aggregator.with_obfuscator(&obfuscator);
        }

        let pool = AnalysisPool::new(&git, &self.registry)
            .with_workers(self.config.workers)
            .with_skip_libraries(self.config.skip_libraries)
            .with_deadline(deadline);
        let workers = pool.workers();
        let analysis_bar = self.progress_bar(Some(commits.len()), "Analysing libraries");
        let analyzed = pool.run(commits, |events| {
            aggregator.consume(events, workers, &analysis_bar)
        });

        let buckets = aggregator.finish();
        let export = export_to_path(&output, &buckets)?;
        info!(path = %export.path.display(), buckets = export.written, "Exported");

        Ok(ExtractionReport {
            repo_name,
            emails,
            harvested,
            analyzed,
            harvest_timed_out: outcome.timed_out,
            export,
        })
    }

    /// Keeps only the commits of the configured or selected authors.
    fn filter_authors(&self, commits: Vec<Commit>) -> (Vec<String>, Vec<Commit>) {
        if commits.is_empty() {
            return (self.config.user_emails.clone(), commits);
        }
        let emails: Vec<String> = if self.config.user_emails.is_empty() {
            self.selector
                .select(&candidate_emails(&commits))
                .iter()
                .map(|c| split_email(c).to_string())
                .collect()
        } else {
            self.config.user_emails.clone()
        };

        let wanted: HashSet<&str> = emails.iter().map(String::as_str).collect();
        let kept = commits
            .into_iter()
            .filter(|c| wanted.contains(c.author_email.as_str()))
            .collect();
        (emails, kept)
    }

    fn progress_bar(&self, total: Option<usize>, message: &'static str) -> ProgressBar {
        let Some(total) = total.filter(|_| self.config.show_progress) else {
            return ProgressBar::hidden();
        };
        let pb = ProgressBar::new(total as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{msg} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        pb.set_message(message);
        pb
    }
}

/// Output file for `repo` under `dir`, as [`RepoExtractor::extract`] writes it.
pub fn output_file(dir: &Path, repo_name: &str) -> PathBuf {
    dir.join(format!("{repo_name}{OUTPUT_SUFFIX}"))
}
