use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Libraries extracted from one commit, keyed by language. Lists may hold
/// duplicates until they are folded into a [`DailyBucket`].
pub type Libraries = HashMap<String, Vec<String>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub hash: String,
    pub author_name: String,
    pub author_email: String,
    /// `None` when git printed a date that could not be parsed.
    pub date: Option<DateTime<FixedOffset>>,
    pub changed_files: Vec<ChangedFile>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedFile {
    pub path: String,
    pub insertions: u64,
    pub deletions: u64,
    language: Option<String>,
}

impl ChangedFile {
    pub fn new(path: impl Into<String>, insertions: u64, deletions: u64) -> Self {
        Self {
            path: path.into(),
            insertions,
            deletions,
            language: None,
        }
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    /// Sets the language once. Returns `false` and keeps the existing value
    /// if a language was already assigned.
    pub fn assign_language(&mut self, language: impl Into<String>) -> bool {
        if self.language.is_some() {
            return false;
        }
        self.language = Some(language.into());
        true
    }

    /// Extension without the leading dot, or `""` when the file has none.
    pub fn extension(&self) -> &str {
        std::path::Path::new(&self.path)
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzedCommit {
    pub commit: Commit,
    pub libraries: Libraries,
}

impl AnalyzedCommit {
    pub fn new(commit: Commit) -> Self {
        Self {
            commit,
            libraries: Libraries::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyBucket {
    pub author_emails: Vec<String>,
    pub date: String,
    pub languages: Vec<String>,
    pub libraries: BTreeMap<String, Vec<String>>,
    pub insertions: u64,
    pub deletions: u64,
    pub commits: u32,
}

/// One page of `git log` to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: usize,
    pub offset: usize,
}
