#![allow(dead_code)]

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

pub fn has_git() -> bool {
    Command::new("git").arg("--version").output().is_ok()
}

fn git(dir: &Path, args: &[&str]) {
    assert!(Command::new("git")
        .args(args)
        .current_dir(dir)
        .status()
        .unwrap()
        .success());
}

pub fn init_git_repo(dir: &Path) {
    // init and basic identity
    git(dir, &["init"]);
    git(dir, &["config", "core.autocrlf", "false"]);
    git(dir, &["config", "core.safecrlf", "false"]);
    git(dir, &["config", "user.email", "you@example.com"]);
    git(dir, &["config", "user.name", "Your Name"]);
    git(dir, &["config", "commit.gpgsign", "false"]);
}

/// Writes `name` and commits it as `email` at `date` (RFC 3339).
pub fn commit_file_as(dir: &Path, name: &str, content: &str, email: &str, date: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    let mut f = File::create(&path).unwrap();
    f.write_all(content.as_bytes()).unwrap();
    f.sync_all().unwrap();
    git(dir, &["add", "."]);
    assert!(Command::new("git")
        .args(["commit", "-m", &format!("add {name}")])
        .env("GIT_AUTHOR_EMAIL", email)
        .env("GIT_AUTHOR_DATE", date)
        .env("GIT_COMMITTER_DATE", date)
        .current_dir(dir)
        .status()
        .unwrap()
        .success());
}

pub fn commit_file(dir: &Path, name: &str, content: &str) {
    commit_file_as(dir, name, content, "you@example.com", "2024-01-01T10:00:00+00:00");
}

/// The single `*_history.json` file written into `out`.
pub fn export_file(out: &Path) -> PathBuf {
    let mut files: Vec<PathBuf> = fs::read_dir(out)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| p.to_string_lossy().ends_with("_history.json"))
        .collect();
    assert_eq!(files.len(), 1, "expected one export in {}", out.display());
    files.remove(0)
}

pub fn read_export(out: &Path) -> serde_json::Value {
    let text = fs::read_to_string(export_file(out)).unwrap();
    serde_json::from_str(&text).unwrap()
}

/// A small history over three days with two authors.
pub fn sample_history(dir: &Path) {
    init_git_repo(dir);
    commit_file_as(
        dir,
        "app/main.py",
        "import os\nimport requests as r\n",
        "ann@example.com",
        "2024-01-01T10:00:00+00:00",
    );
    commit_file_as(
        dir,
        "app/util.py",
        "from collections import OrderedDict\nimport os\n",
        "ann@example.com",
        "2024-01-01T23:00:00+00:00",
    );
    commit_file_as(
        dir,
        "web/index.js",
        "import React from 'react';\nconst x = require('../lib/x');\n",
        "bob@example.com",
        "2024-01-01T15:00:00+00:00",
    );
    commit_file_as(
        dir,
        "cmd/main.go",
        "package main\n\nimport \"fmt\"\n",
        "bob@example.com",
        "2024-01-02T00:01:00+00:00",
    );
    commit_file_as(
        dir,
        "README",
        "hello\n",
        "ann@example.com",
        "2024-01-05T09:00:00+00:00",
    );
}
