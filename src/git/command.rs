use crate::deadline::Deadline;
use crate::error::{GitError, HarvestError};
use crate::git::log::{parse_log, pretty_format};
use crate::model::{Commit, PageRequest};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use tracing::debug;

/// Runs the git binary against one repository.
///
/// Cheap to clone; every method spawns its own subprocess so one value can be
/// shared across worker threads.
#[derive(Debug, Clone)]
pub struct GitCli {
    git: PathBuf,
    repo: PathBuf,
}

impl GitCli {
    pub fn new(git: impl Into<PathBuf>, repo: impl Into<PathBuf>) -> Self {
        Self {
            git: git.into(),
            repo: repo.into(),
        }
    }

    pub fn repo_path(&self) -> &Path {
        &self.repo
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(&self.git);
        cmd.args(args).current_dir(&self.repo);
        cmd
    }

    fn describe(args: &[&str]) -> String {
        format!("git {}", args.join(" "))
    }

    /// Fetches one page of history across all branches, merges excluded.
    ///
    /// Output is parsed on a helper thread. If `deadline` expires first the
    /// child is killed and [`HarvestError::DeadlineExpired`] is returned.
    pub fn log_page(&self, page: PageRequest, deadline: Deadline) -> Result<Vec<Commit>, HarvestError> {
        if deadline.expired() {
            return Err(HarvestError::DeadlineExpired);
        }
        let skip = format!("--skip={}", page.offset);
        let max_count = format!("--max-count={}", page.limit);
        let pretty = pretty_format();
        let args = [
            "log",
            "--numstat",
            "--all",
            skip.as_str(),
            max_count.as_str(),
            pretty.as_str(),
            "--date=iso-strict",
            "--no-merges",
        ];

        let mut child = ChildGuard::spawn(self.command(&args), Self::describe(&args))?;
        let stdout = child.take_stdout()?;
        let stderr = child.drain_stderr();

        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let _ = tx.send(parse_log(BufReader::new(stdout)));
        });
        let parsed = match deadline.remaining() {
            Some(left) => match rx.recv_timeout(left) {
                Ok(parsed) => parsed,
                // Dropping the guard kills git, which ends the parser thread.
                Err(RecvTimeoutError::Timeout) => return Err(HarvestError::DeadlineExpired),
                Err(RecvTimeoutError::Disconnected) => return Err(HarvestError::WorkerLost),
            },
            None => rx.recv().map_err(|_| HarvestError::WorkerLost)?,
        };
        let commits = parsed?;
        child.wait_success(stderr)?;
        Ok(commits)
    }

    /// Number of non-merge commits across all branches.
    pub fn count_commits(&self) -> Result<usize, GitError> {
        let args = ["--no-pager", "log", "--all", "--no-merges", "--pretty=oneline"];
        let output = self.run(&args)?;
        Ok(output.iter().filter(|&&b| b == b'\n').count())
    }

    /// Contents of `path` at revision `hash`.
    ///
    /// A path that does not exist at that revision yields empty content.
    pub fn file_content(&self, hash: &str, path: &str) -> Result<Vec<u8>, GitError> {
        let object = format!("{hash}:{path}");
        let args = ["--no-pager", "show", object.as_str()];
        match self.run(&args) {
            Ok(bytes) => Ok(bytes),
            Err(GitError::Failed { stderr, .. }) if is_missing_path(&stderr, hash, path) => {
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    fn run(&self, args: &[&str]) -> Result<Vec<u8>, GitError> {
        let command = Self::describe(args);
        let output = self
            .command(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| GitError::Spawn {
                command: command.clone(),
                source,
            })?;
        if !output.status.success() {
            return Err(GitError::Failed {
                command,
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output.stdout)
    }
}

fn is_missing_path(stderr: &str, hash: &str, path: &str) -> bool {
    // Windows git lowercases the first letter of the message.
    let stderr = stderr.to_lowercase();
    let absent = format!("path '{path}' does not exist in '{hash}'").to_lowercase();
    let on_disk = format!("path '{path}' exists on disk, but not in '{hash}'").to_lowercase();
    stderr.contains(&absent) || stderr.contains(&on_disk)
}

/// Owns a spawned child and reaps it on every exit path.
struct ChildGuard {
    child: Option<Child>,
    command: String,
}

impl ChildGuard {
    fn spawn(mut cmd: Command, command: String) -> Result<Self, GitError> {
        let child = cmd
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| GitError::Spawn {
                command: command.clone(),
                source,
            })?;
        Ok(Self {
            child: Some(child),
            command,
        })
    }

    fn take_stdout(&mut self) -> Result<std::process::ChildStdout, GitError> {
        self.child
            .as_mut()
            .and_then(|c| c.stdout.take())
            .ok_or_else(|| GitError::NoStdout(self.command.clone()))
    }

    /// Reads stderr on its own thread so a chatty child never blocks on a
    /// full pipe while stdout is still being consumed.
    fn drain_stderr(&mut self) -> JoinHandle<String> {
        let pipe = self.child.as_mut().and_then(|c| c.stderr.take());
        thread::spawn(move || {
            let mut buf = Vec::new();
            if let Some(mut pipe) = pipe {
                let _ = pipe.read_to_end(&mut buf);
            }
            String::from_utf8_lossy(&buf).trim().to_string()
        })
    }

    fn wait_success(mut self, stderr: JoinHandle<String>) -> Result<(), GitError> {
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };
        let status = child.wait()?;
        if !status.success() {
            return Err(GitError::Failed {
                command: self.command.clone(),
                status,
                stderr: stderr.join().unwrap_or_default(),
            });
        }
        Ok(())
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill() {
                debug!(command = %self.command, error = %e, "child already exited");
            }
            let _ = child.wait();
        }
    }
}
