//! Choosing whose commits are analysed.
//!
//! Candidates are offered as `"name -> email"` strings.

use crate::model::Commit;
use console::{style, Term};
use std::collections::HashSet;
use tracing::warn;

pub const NAME_EMAIL_SEP: &str = " -> ";

pub trait EmailSelector {
    /// Returns the chosen subset of `candidates`.
    fn select(&self, candidates: &[String]) -> Vec<String>;
}

/// Picks every candidate.
#[derive(Debug, Default, Clone, Copy)]
pub struct SelectAll;

impl EmailSelector for SelectAll {
    fn select(&self, candidates: &[String]) -> Vec<String> {
        candidates.to_vec()
    }
}

/// Numbered prompt on the terminal. A blank answer selects everyone.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSelector;

impl EmailSelector for ConsoleSelector {
    fn select(&self, candidates: &[String]) -> Vec<String> {
        let term = Term::stderr();
        let _ = term.write_line(&style("Select your emails").bold().to_string());
        for (i, candidate) in candidates.iter().enumerate() {
            let _ = term.write_line(&format!("  {:>3}) {candidate}", i + 1));
        }
        let _ = term.write_str("Numbers separated by commas (blank for all): ");

        match term.read_line() {
            Ok(answer) => parse_choice(&answer, candidates),
            Err(e) => {
                warn!(error = %e, "cannot read selection, using every author");
                candidates.to_vec()
            }
        }
    }
}

fn parse_choice(answer: &str, candidates: &[String]) -> Vec<String> {
    if answer.trim().is_empty() {
        return candidates.to_vec();
    }
    let mut chosen = Vec::new();
    for part in answer.split(',') {
        match part.trim().parse::<usize>() {
            Ok(n) if (1..=candidates.len()).contains(&n) => chosen.push(candidates[n - 1].clone()),
            _ => warn!(choice = part.trim(), "ignoring invalid selection"),
        }
    }
    chosen
}

/// One `"name -> email"` entry per distinct author email, in first-seen order.
pub fn candidate_emails(commits: &[Commit]) -> Vec<String> {
    let mut seen = HashSet::new();
    commits
        .iter()
        .filter(|c| seen.insert(c.author_email.as_str()))
        .map(|c| format!("{}{NAME_EMAIL_SEP}{}", c.author_name, c.author_email))
        .collect()
}

/// Email part of a `"name -> email"` candidate.
pub fn split_email(candidate: &str) -> &str {
    candidate
        .rsplit_once(NAME_EMAIL_SEP)
        .map(|(_, email)| email)
        .unwrap_or(candidate)
}
