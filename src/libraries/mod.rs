//! Per-language extraction of imported libraries.
//!
//! The registry is built once before the pipeline starts and then only read,
//! so it is shared by reference across the analysis workers.

pub mod languages;

use crate::error::AnalyzerError;
use regex::Regex;
use std::collections::HashMap;

pub trait LibraryAnalyzer: Send + Sync {
    /// Import identifiers found in `contents`, in order of appearance.
    fn extract_libraries(&self, contents: &str) -> Result<Vec<String>, AnalyzerError>;
}

/// Analyzer driven by a list of patterns; every non-empty capture group of
/// every match is an identifier.
#[derive(Debug)]
pub struct RegexAnalyzer {
    patterns: Vec<Regex>,
}

impl RegexAnalyzer {
    pub fn new(language: &str, patterns: &[&str]) -> Result<Self, AnalyzerError> {
        let patterns = patterns
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|source| AnalyzerError::Pattern {
                    language: language.to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }
}

impl LibraryAnalyzer for RegexAnalyzer {
    fn extract_libraries(&self, contents: &str) -> Result<Vec<String>, AnalyzerError> {
        Ok(execute_regexes(contents, &self.patterns))
    }
}

pub(crate) fn execute_regexes(contents: &str, patterns: &[Regex]) -> Vec<String> {
    let mut found = Vec::new();
    for re in patterns {
        for caps in re.captures_iter(contents) {
            for group in caps.iter().skip(1).flatten() {
                let value = group.as_str().trim();
                if !value.is_empty() {
                    found.push(value.to_string());
                }
            }
        }
    }
    found
}

#[derive(Default)]
pub struct AnalyzerRegistry {
    analyzers: HashMap<String, Box<dyn LibraryAnalyzer>>,
}

impl AnalyzerRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry with the built-in analyzers for every supported language.
    pub fn builtin() -> Result<Self, AnalyzerError> {
        let mut registry = Self::empty();
        for (language, patterns) in languages::REGEX_PATTERNS {
            registry.register(*language, RegexAnalyzer::new(language, patterns)?);
        }
        registry.register("Go", languages::GoAnalyzer::new()?);
        Ok(registry)
    }

    pub fn register(&mut self, language: impl Into<String>, analyzer: impl LibraryAnalyzer + 'static) {
        self.analyzers.insert(language.into(), Box::new(analyzer));
    }

    pub fn get(&self, language: &str) -> Option<&dyn LibraryAnalyzer> {
        self.analyzers.get(language).map(|a| a.as_ref())
    }

    pub fn languages(&self) -> Vec<&str> {
        let mut langs: Vec<&str> = self.analyzers.keys().map(String::as_str).collect();
        langs.sort_unstable();
        langs
    }
}

impl std::fmt::Debug for AnalyzerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalyzerRegistry")
            .field("languages", &self.languages())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_covers_known_languages() {
        let registry = AnalyzerRegistry::builtin().unwrap();
        assert_eq!(
            registry.languages(),
            vec![
                "C", "C#", "C++", "Go", "Java", "JavaScript", "Kotlin", "PHP", "Perl", "Python",
                "Ruby", "Swift", "TypeScript"
            ]
        );
        assert!(registry.get("Rust").is_none());
    }

    #[test]
    fn bad_pattern_fails_construction() {
        let err = RegexAnalyzer::new("Broken", &["import ("]).unwrap_err();
        assert!(err.to_string().contains("Broken"));
    }

    #[test]
    fn custom_analyzer_can_be_registered() {
        struct Fixed;
        impl LibraryAnalyzer for Fixed {
            fn extract_libraries(&self, _: &str) -> Result<Vec<String>, AnalyzerError> {
                Ok(vec!["std".to_string()])
            }
        }
        let mut registry = AnalyzerRegistry::empty();
        registry.register("Rust", Fixed);
        let libs = registry.get("Rust").unwrap().extract_libraries("").unwrap();
        assert_eq!(libs, vec!["std"]);
    }
}
