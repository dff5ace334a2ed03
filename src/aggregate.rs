use crate::analysis::AnalysisEvent;
use crate::model::{AnalyzedCommit, DailyBucket};
use crate::obfuscate::Obfuscator;
use crate::util::{day_key, dedup_preserving_order, push_unique};
use indicatif::ProgressBar;
use std::collections::{BTreeMap, HashMap};
use std::sync::mpsc::Receiver;
use tracing::{debug, warn};

/// Folds analyzed commits into one bucket per day.
///
/// The only writer of bucket state. Buckets leave through [`finish`](Self::finish)
/// by value, after which nothing can mutate them.
#[derive(Default)]
pub struct Aggregator<'a> {
    buckets: HashMap<String, DailyBucket>,
    obfuscator: Option<&'a dyn Obfuscator>,
}

impl<'a> Aggregator<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every bucket built from a commit passes through `obfuscator` before
    /// it is created or merged.
    pub fn with_obfuscator(mut self, obfuscator: &'a dyn Obfuscator) -> Self {
        self.obfuscator = Some(obfuscator);
        self
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn fold(&mut self, analyzed: AnalyzedCommit) {
        let mut contribution = commit_bucket(&analyzed);
        if let Some(ob) = self.obfuscator {
            ob.obfuscate(&mut contribution);
        }
        match self.buckets.get_mut(&contribution.date) {
            Some(existing) => merge(existing, contribution),
            None => {
                self.buckets.insert(contribution.date.clone(), contribution);
            }
        }
    }

    /// Drains `events` until `workers` completion messages have arrived.
    /// Returns the number of commits folded.
    pub fn consume(
        &mut self,
        events: Receiver<AnalysisEvent>,
        workers: usize,
        progress: &ProgressBar,
    ) -> usize {
        let mut folded = 0;
        let mut done = 0;
        while done < workers {
            match events.recv() {
                Ok(AnalysisEvent::Analyzed(analyzed)) => {
                    self.fold(analyzed);
                    folded += 1;
                    progress.inc(1);
                }
                Ok(AnalysisEvent::WorkerDone) => {
                    done += 1;
                    debug!(done, workers, "analysis worker finished");
                }
                Err(_) => {
                    warn!(done, workers, "analysis workers disconnected early");
                    break;
                }
            }
        }
        progress.finish();
        folded
    }

    /// Final buckets sorted by day, with every list sorted so the result does
    /// not depend on the order commits arrived in.
    pub fn finish(self) -> Vec<DailyBucket> {
        let mut buckets: Vec<DailyBucket> = self
            .buckets
            .into_values()
            .map(|mut b| {
                b.author_emails.sort();
                b.languages.sort();
                for libs in b.libraries.values_mut() {
                    libs.sort();
                }
                b
            })
            .collect();
        buckets.sort_by(|a, b| a.date.cmp(&b.date));
        buckets
    }
}

fn commit_bucket(analyzed: &AnalyzedCommit) -> DailyBucket {
    let commit = &analyzed.commit;
    let mut languages = Vec::new();
    let mut insertions = 0;
    let mut deletions = 0;
    for file in &commit.changed_files {
        if let Some(lang) = file.language().filter(|l| !l.is_empty()) {
            push_unique(&mut languages, lang);
        }
        insertions += file.insertions;
        deletions += file.deletions;
    }

    let libraries: BTreeMap<String, Vec<String>> = analyzed
        .libraries
        .iter()
        .map(|(lang, libs)| (lang.clone(), dedup_preserving_order(libs)))
        .collect();

    DailyBucket {
        author_emails: vec![commit.author_email.clone()],
        date: day_key(commit.date.as_ref()),
        languages,
        libraries,
        insertions,
        deletions,
        commits: 1,
    }
}

fn merge(target: &mut DailyBucket, other: DailyBucket) {
    target.commits += other.commits;
    target.insertions += other.insertions;
    target.deletions += other.deletions;
    for email in &other.author_emails {
        push_unique(&mut target.author_emails, email);
    }
    for lang in &other.languages {
        push_unique(&mut target.languages, lang);
    }
    for (lang, libs) in other.libraries {
        let entry = target.libraries.entry(lang).or_default();
        for lib in &libs {
            push_unique(entry, lib);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ChangedFile, Commit, Libraries};
    use crate::obfuscate::HashObfuscator;
    use chrono::DateTime;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    fn analyzed(email: &str, date: &str, files: &[(&str, &str, u64, u64)], libs: &[(&str, &[&str])]) -> AnalyzedCommit {
        let changed_files = files
            .iter()
            .map(|(path, lang, ins, del)| {
                let mut f = ChangedFile::new(*path, *ins, *del);
                if !lang.is_empty() {
                    f.assign_language(*lang);
                }
                f
            })
            .collect();
        let libraries: Libraries = libs
            .iter()
            .map(|(lang, l)| (lang.to_string(), l.iter().map(|s| s.to_string()).collect()))
            .collect();
        AnalyzedCommit {
            commit: Commit {
                hash: format!("{email}-{date}"),
                author_name: "Dev".to_string(),
                author_email: email.to_string(),
                date: DateTime::parse_from_rfc3339(date).ok(),
                changed_files,
            },
            libraries,
        }
    }

    fn sample() -> Vec<AnalyzedCommit> {
        vec![
            analyzed(
                "a@x.io",
                "2024-01-01T10:00:00Z",
                &[("a.py", "Python", 5, 1), ("README", "", 2, 0)],
                &[("Python", &["os", "os", "numpy"])],
            ),
            analyzed(
                "b@x.io",
                "2024-01-01T23:00:00Z",
                &[("b.go", "Go", 3, 3)],
                &[("Go", &["fmt"]), ("Python", &["numpy", "requests"])],
            ),
            analyzed(
                "a@x.io",
                "2024-01-01T12:30:00Z",
                &[("c.py", "Python", 1, 1)],
                &[("Python", &["os"])],
            ),
            analyzed("c@x.io", "2024-01-02T00:01:00Z", &[("d.rs", "Rust", 7, 0)], &[]),
        ]
    }

    fn fold_all(commits: Vec<AnalyzedCommit>) -> Vec<DailyBucket> {
        let mut agg = Aggregator::new();
        for c in commits {
            agg.fold(c);
        }
        agg.finish()
    }

    #[test]
    fn same_day_commits_share_a_bucket() {
        let buckets = fold_all(sample());
        assert_eq!(buckets.len(), 2);

        let first = &buckets[0];
        assert_eq!(first.date, "2024-01-01 00:00:00 +0000 UTC");
        assert_eq!(first.commits, 3);
        assert_eq!(first.insertions, 11);
        assert_eq!(first.deletions, 5);
        assert_eq!(first.author_emails, vec!["a@x.io", "b@x.io"]);
        assert_eq!(first.languages, vec!["Go", "Python"]);
        assert_eq!(first.libraries["Python"], vec!["numpy", "os", "requests"]);
        assert_eq!(first.libraries["Go"], vec!["fmt"]);

        assert_eq!(buckets[1].date, "2024-01-02 00:00:00 +0000 UTC");
        assert_eq!(buckets[1].commits, 1);
    }

    #[test]
    fn same_author_twice_is_listed_once() {
        let buckets = fold_all(vec![
            analyzed("a@x.io", "2024-05-05T08:00:00Z", &[], &[]),
            analyzed("a@x.io", "2024-05-05T18:00:00Z", &[], &[]),
        ]);
        assert_eq!(buckets[0].author_emails, vec!["a@x.io"]);
        assert_eq!(buckets[0].commits, 2);
    }

    #[test]
    fn fold_is_order_independent() {
        let forward = fold_all(sample());
        let mut reversed = sample();
        reversed.reverse();
        assert_eq!(fold_all(reversed), forward);

        let mut rotated = sample();
        rotated.rotate_left(2);
        assert_eq!(fold_all(rotated), forward);
    }

    #[test]
    fn library_lists_have_no_duplicates() {
        for bucket in fold_all(sample()) {
            for libs in bucket.libraries.values() {
                let unique: HashSet<_> = libs.iter().collect();
                assert_eq!(unique.len(), libs.len());
            }
        }
    }

    #[test]
    fn obfuscation_applies_to_every_contribution() {
        let ob = HashObfuscator::new(&["seed".to_string()]);
        let mut agg = Aggregator::new().with_obfuscator(&ob);
        for c in sample() {
            agg.fold(c);
        }
        let buckets = agg.finish();
        for email in &buckets[0].author_emails {
            assert!(!email.contains('@'));
        }
        assert_eq!(buckets[0].author_emails.len(), 2);
        assert_eq!(buckets[0].commits, 3);
    }

    #[test]
    fn consume_stops_after_every_worker_is_done() {
        let (tx, rx) = std::sync::mpsc::channel();
        for c in sample() {
            tx.send(AnalysisEvent::Analyzed(c)).unwrap();
        }
        tx.send(AnalysisEvent::WorkerDone).unwrap();
        tx.send(AnalysisEvent::WorkerDone).unwrap();

        let mut agg = Aggregator::new();
        let folded = agg.consume(rx, 2, &ProgressBar::hidden());
        assert_eq!(folded, 4);
        assert_eq!(agg.len(), 2);
        // The sender is still alive, so only the done count ended the loop.
        drop(tx);
    }
}
