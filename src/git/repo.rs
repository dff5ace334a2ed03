use crate::error::{HistmineError, Result};
use gix::{discover, Repository};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub struct GitRepo {
    repo: Repository,
    path: PathBuf,
}

impl GitRepo {
    /// Open a repository at `path`, or current dir if `None`
    pub fn open<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        let repo_path = match path {
            Some(p) => p.as_ref().to_path_buf(),
            None => std::env::current_dir()?,
        };

        let repo = discover(&repo_path)?;
        let path = repo.workdir().unwrap_or_else(|| repo.path()).to_path_buf();

        Ok(Self { repo, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn remote_origin_url(&self) -> Option<String> {
        let snapshot = self.repo.config_snapshot();
        let url = snapshot.string("remote.origin.url")?;
        Some(url.to_string().trim_end().to_string())
    }

    /// Short repository name, taken from `remote.origin.url` when present and
    /// from the work-tree directory otherwise.
    pub fn name(&self) -> Result<String> {
        let remote = self.remote_origin_url();
        if remote.is_none() {
            debug!("no remote.origin.url, using directory name");
        }
        let name = repo_name(remote.as_deref().unwrap_or(""), &self.path);
        if name.is_empty() {
            warn!(path = %self.path.display(), "cannot derive repository name");
            return Err(HistmineError::Repository(format!(
                "cannot derive a repository name for {}",
                self.path.display()
            )));
        }
        Ok(name)
    }
}

/// `https://host/owner/name.git` and `git@host:owner/name.git` both resolve
/// to `name`; an empty remote falls back to the last component of `path`.
pub fn repo_name(remote_origin: &str, path: &Path) -> String {
    let remote = remote_origin.trim_end_matches(['\r', '\n']);
    if remote.is_empty() {
        return path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
    }

    let remote = remote.strip_suffix(".git").unwrap_or(remote);
    let tail = if remote.contains("http") {
        remote
    } else {
        remote.rsplit(':').next().unwrap_or(remote)
    };
    tail.rsplit('/').next().unwrap_or(tail).to_string()
}
