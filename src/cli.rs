use crate::extractor::{ExtractorConfig, RepoExtractor};
use crate::harvest::DEFAULT_PAGE_SIZE;
use crate::select::ConsoleSelector;
use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "histmine")]
#[command(about = "Mine git history into per-day metrics of lines, languages, libraries and authors")]
#[command(version)]
pub struct Cli {
    #[arg(long, help = "Path to git repository")]
    pub repo: Option<PathBuf>,

    #[arg(long, default_value = "export", help = "Directory the export is written to")]
    pub output: PathBuf,

    #[arg(long, env = "HISTMINE_GIT", default_value = "git", help = "Path to the git binary")]
    pub git: PathBuf,

    #[arg(long = "email", help = "Author email to include (repeatable); skips the selection prompt")]
    pub emails: Vec<String>,

    #[arg(long, help = "Only detect languages, do not extract libraries")]
    pub skip_libraries: bool,

    #[arg(long, help = "Anonymise author emails and libraries in the export")]
    pub hash_important: bool,

    #[arg(long, help = "Salt used when anonymising (repeatable)")]
    pub seed: Vec<String>,

    #[arg(long, value_parser = humantime::parse_duration, help = "Stop after this long and export partial results (e.g. 90s, 5m)")]
    pub time_limit: Option<Duration>,

    #[arg(long, help = "Worker threads per stage [default: number of CPUs]")]
    pub workers: Option<usize>,

    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE, help = "Commits requested per git log call")]
    pub page_size: usize,

    #[arg(long, help = "Never prompt; analyse every author")]
    pub no_interactive: bool,

    #[arg(long, short, help = "Only print warnings and errors")]
    pub quiet: bool,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn config(&self) -> ExtractorConfig {
        let mut config = ExtractorConfig::new()
            .with_output_dir(&self.output)
            .with_git(&self.git)
            .with_page_size(self.page_size)
            .with_skip_libraries(self.skip_libraries)
            .with_hash_important(self.hash_important)
            .with_user_emails(self.emails.clone())
            .with_seed(self.seed.clone())
            .with_time_limit(self.time_limit)
            .with_progress(!self.quiet);
        if let Some(repo) = &self.repo {
            config = config.with_repo(repo);
        }
        if let Some(workers) = self.workers {
            config = config.with_workers(workers);
        }
        config
    }

    pub fn execute(self) -> Result<()> {
        let mut extractor =
            RepoExtractor::new(self.config()).context("Failed to build library analyzers")?;
        if self.emails.is_empty() && !self.no_interactive {
            extractor = extractor.with_selector(ConsoleSelector);
        }

        let report = extractor
            .extract()
            .context("Failed to extract repository history")?;

        if !self.quiet {
            println!("{}", style("Exported!").bold().green());
            println!("Repository: {}", style(&report.repo_name).cyan());
            println!(
                "Commits: {} harvested, {} analysed",
                style(report.harvested).cyan(),
                style(report.analyzed).cyan()
            );
            println!(
                "Days: {} written, {} skipped",
                style(report.export.written).green(),
                style(report.export.skipped).red()
            );
            if report.harvest_timed_out {
                println!("{}", style("Time limit reached, results are partial").yellow());
            }
            println!("File is located at {}", style(report.export.path.display()).dim());
        }
        Ok(())
    }
}
