use super::{execute_regexes, LibraryAnalyzer};
use crate::error::AnalyzerError;
use regex::Regex;

/// Languages whose imports are captured by plain patterns.
pub const REGEX_PATTERNS: &[(&str, &[&str])] = &[
    ("C", &[r#"#\s*include\s*[<"]([^>"]+)[>"]"#]),
    ("C++", &[r#"#\s*include\s*[<"]([^>"]+)[>"]"#]),
    ("C#", &[r"(?m)^\s*using\s+(?:static\s+)?([A-Za-z_][\w.]*)\s*;"]),
    (
        "Java",
        &[r"(?m)^\s*import\s+(?:static\s+)?([A-Za-z_][\w.]*?)(?:\.\*)?\s*;"],
    ),
    ("Kotlin", &[r"(?m)^\s*import\s+([A-Za-z_][\w.]*)"]),
    (
        "JavaScript",
        &[
            r#"(?m)^\s*import\s+(?:[\w*{}\s,$]+\s+from\s+)?['"]([^'"]+)['"]"#,
            r#"require\(\s*['"]([^'"]+)['"]\s*\)"#,
        ],
    ),
    (
        "TypeScript",
        &[
            r#"(?m)^\s*import\s+(?:type\s+)?(?:[\w*{}\s,$]+\s+from\s+)?['"]([^'"]+)['"]"#,
            r#"require\(\s*['"]([^'"]+)['"]\s*\)"#,
        ],
    ),
    ("Perl", &[r"(?m)^\s*(?:use|require)\s+([A-Za-z][\w:]*)"]),
    (
        "PHP",
        &[
            r"(?m)^\s*use\s+([A-Za-z_\\][\w\\]*)",
            r#"(?:require|include)(?:_once)?\s*\(?\s*['"]([^'"]+)['"]"#,
        ],
    ),
    (
        "Python",
        &[r"from (.+) import", r"import ([a-zA-Z0-9_-]+)(?:\s| as)"],
    ),
    (
        "Ruby",
        &[r#"(?m)^\s*require(?:_relative)?\s*\(?\s*['"]([^'"]+)['"]"#],
    ),
    (
        "Swift",
        &[r"(?m)^\s*(?:@testable\s+)?import\s+(?:(?:typealias|struct|class|enum|protocol|var|func|let)\s+)?([A-Za-z_][\w.]*)"],
    ),
];

/// Go imports come either as single statements or as parenthesised blocks.
#[derive(Debug)]
pub struct GoAnalyzer {
    single: Regex,
    block: Regex,
    quoted: Regex,
}

impl GoAnalyzer {
    pub fn new() -> Result<Self, AnalyzerError> {
        let compile = |p: &str| {
            Regex::new(p).map_err(|source| AnalyzerError::Pattern {
                language: "Go".to_string(),
                source,
            })
        };
        Ok(Self {
            single: compile(r#"(?m)^\s*import\s+(?:[\w.]+\s+)?"([^"]+)""#)?,
            block: compile(r"(?s)import\s*\((.*?)\)")?,
            quoted: compile(r#""([^"]+)""#)?,
        })
    }
}

impl LibraryAnalyzer for GoAnalyzer {
    fn extract_libraries(&self, contents: &str) -> Result<Vec<String>, AnalyzerError> {
        let mut found = execute_regexes(contents, std::slice::from_ref(&self.single));
        for block in self.block.captures_iter(contents) {
            if let Some(body) = block.get(1) {
                found.extend(execute_regexes(body.as_str(), std::slice::from_ref(&self.quoted)));
            }
        }
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libraries::AnalyzerRegistry;
    use pretty_assertions::assert_eq;

    fn extract(language: &str, source: &str) -> Vec<String> {
        let registry = AnalyzerRegistry::builtin().unwrap();
        registry
            .get(language)
            .unwrap()
            .extract_libraries(source)
            .unwrap()
    }

    #[test]
    fn python_imports() {
        let src = "import os\nimport numpy as np\nfrom django.db import models\n";
        assert_eq!(extract("Python", src), vec!["django.db", "os", "numpy", "models"]);
    }

    #[test]
    fn go_single_and_block_imports() {
        let src = "package main\n\nimport \"fmt\"\n\nimport (\n\t\"os\"\n\tlog \"github.com/sirupsen/logrus\"\n)\n";
        assert_eq!(extract("Go", src), vec!["fmt", "os", "github.com/sirupsen/logrus"]);
    }

    #[test]
    fn javascript_import_and_require() {
        let src = "import React, { useState } from 'react';\nimport './styles.css';\nconst fs = require(\"fs\");\n";
        assert_eq!(extract("JavaScript", src), vec!["react", "./styles.css", "fs"]);
    }

    #[test]
    fn java_imports_drop_wildcards() {
        let src = "import java.util.List;\nimport static org.junit.Assert.*;\n";
        assert_eq!(extract("Java", src), vec!["java.util.List", "org.junit.Assert"]);
    }

    #[test]
    fn c_includes() {
        let src = "#include <stdio.h>\n#include \"../util/list.h\"\n";
        assert_eq!(extract("C", src), vec!["stdio.h", "../util/list.h"]);
    }

    #[test]
    fn ruby_requires() {
        let src = "require 'json'\nrequire_relative \"lib/thing\"\n";
        assert_eq!(extract("Ruby", src), vec!["json", "lib/thing"]);
    }

    #[test]
    fn arbitrary_text_never_fails() {
        let registry = AnalyzerRegistry::builtin().unwrap();
        for language in registry.languages() {
            let analyzer = registry.get(language).unwrap();
            assert!(analyzer.extract_libraries("\u{0}\u{ffff} import ( \" ").is_ok());
        }
    }
}
