use crate::error::{HistmineError, Result};
use crate::model::DailyBucket;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{error, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub written: usize,
    pub skipped: usize,
}

/// Streams `buckets` as a JSON array, one compact object per line, sorted by
/// day. A bucket that fails to serialize is logged and left out.
pub fn write_buckets<W: Write>(writer: W, buckets: &[DailyBucket]) -> Result<(usize, usize)> {
    let mut sorted: Vec<&DailyBucket> = buckets.iter().collect();
    sorted.sort_by(|a, b| a.date.cmp(&b.date));

    let mut w = BufWriter::new(writer);
    writeln!(w, "[")?;
    let mut written = 0;
    let mut skipped = 0;
    for bucket in sorted {
        let line = match serde_json::to_string(bucket) {
            Ok(line) => line,
            Err(e) => {
                error!(date = %bucket.date, error = %e, "Couldn't write commit day data");
                skipped += 1;
                continue;
            }
        };
        if written > 0 {
            writeln!(w, ",")?;
        }
        write!(w, "{line}")?;
        written += 1;
    }
    if written > 0 {
        writeln!(w)?;
    }
    writeln!(w, "]")?;
    w.flush()?;
    Ok((written, skipped))
}

/// Replaces the file at `path` with the exported buckets.
pub fn export_to_path(path: &Path, buckets: &[DailyBucket]) -> Result<ExportSummary> {
    info!(path = %path.display(), buckets = buckets.len(), "Creating export");

    if path.exists() {
        fs::remove_file(path)?;
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            HistmineError::Export(format!("cannot create directory {}: {e}", parent.display()))
        })?;
    }
    let file = File::create(path).map_err(|e| {
        HistmineError::Export(format!("cannot create {}: {e}", path.display()))
    })?;

    let (written, skipped) = write_buckets(file, buckets)?;
    Ok(ExportSummary {
        path: path.to_path_buf(),
        written,
        skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    fn bucket(date: &str, commits: u32) -> DailyBucket {
        DailyBucket {
            author_emails: vec!["a@x.io".to_string()],
            date: date.to_string(),
            languages: vec!["Go".to_string()],
            libraries: BTreeMap::from([("Go".to_string(), vec!["fmt".to_string()])]),
            insertions: 10,
            deletions: 2,
            commits,
        }
    }

    #[test]
    fn writes_sorted_json_array() {
        let buckets = vec![
            bucket("2024-01-03 00:00:00 +0000 UTC", 1),
            bucket("2024-01-01 00:00:00 +0000 UTC", 2),
        ];
        let mut out = Vec::new();
        let (written, skipped) = write_buckets(&mut out, &buckets).unwrap();
        assert_eq!((written, skipped), (2, 0));

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "[");
        assert!(lines[1].ends_with(','));
        assert_eq!(lines[3], "]");

        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        let arr = value.as_array().unwrap();
        assert_eq!(arr[0]["date"], "2024-01-01 00:00:00 +0000 UTC");
        assert_eq!(arr[0]["commits"], 2);
        assert_eq!(arr[0]["authorEmails"][0], "a@x.io");
        assert_eq!(arr[0]["libraries"]["Go"][0], "fmt");
        assert_eq!(arr[1]["insertions"], 10);
    }

    #[test]
    fn empty_export_is_valid_json() {
        let mut out = Vec::new();
        write_buckets(&mut out, &[]).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value, serde_json::json!([]));
    }

    #[test]
    fn export_creates_parent_and_replaces_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("repo_history.json");
        export_to_path(&path, &[bucket("2024-01-01 00:00:00 +0000 UTC", 1)]).unwrap();
        let summary = export_to_path(&path, &[]).unwrap();
        assert_eq!(summary.written, 0);
        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value, serde_json::json!([]));
    }
}
