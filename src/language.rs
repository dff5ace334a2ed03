//! Maps file extensions, and file content when the extension is ambiguous, to
//! canonical language names.

use std::path::Path;

/// Extensions shared by several languages; these need the file content.
const AMBIGUOUS: &[&str] = &["h", "m", "pl", "inc", "v"];

const BY_EXTENSION: &[(&str, &str)] = &[
    ("c", "C"),
    ("cc", "C++"),
    ("cpp", "C++"),
    ("cxx", "C++"),
    ("hh", "C++"),
    ("hpp", "C++"),
    ("hxx", "C++"),
    ("cs", "C#"),
    ("go", "Go"),
    ("java", "Java"),
    ("js", "JavaScript"),
    ("jsx", "JavaScript"),
    ("mjs", "JavaScript"),
    ("cjs", "JavaScript"),
    ("ts", "TypeScript"),
    ("tsx", "TypeScript"),
    ("kt", "Kotlin"),
    ("kts", "Kotlin"),
    ("pm", "Perl"),
    ("php", "PHP"),
    ("py", "Python"),
    ("pyw", "Python"),
    ("rb", "Ruby"),
    ("swift", "Swift"),
    ("rs", "Rust"),
    ("scala", "Scala"),
    ("dart", "Dart"),
    ("lua", "Lua"),
    ("r", "R"),
    ("sh", "Shell"),
    ("bash", "Shell"),
    ("zsh", "Shell"),
    ("sql", "SQL"),
    ("html", "HTML"),
    ("htm", "HTML"),
    ("css", "CSS"),
    ("scss", "SCSS"),
    ("vue", "Vue"),
    ("ex", "Elixir"),
    ("exs", "Elixir"),
    ("erl", "Erlang"),
    ("hs", "Haskell"),
    ("clj", "Clojure"),
    ("fs", "F#"),
    ("mm", "Objective-C++"),
    ("sv", "SystemVerilog"),
];

#[derive(Debug, Default, Clone, Copy)]
pub struct LanguageDetector;

impl LanguageDetector {
    pub fn new() -> Self {
        Self
    }

    /// Whether `extension` needs content inspection instead of a table lookup.
    pub fn should_use_file(&self, extension: &str) -> bool {
        let ext = extension.to_ascii_lowercase();
        AMBIGUOUS.contains(&ext.as_str())
    }

    pub fn detect_from_extension(&self, extension: &str) -> Option<&'static str> {
        let ext = extension.to_ascii_lowercase();
        BY_EXTENSION
            .iter()
            .find(|(e, _)| *e == ext)
            .map(|(_, lang)| *lang)
    }

    pub fn detect_from_file(&self, path: &str, content: &[u8]) -> Option<&'static str> {
        let ext = Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())?;
        let text = String::from_utf8_lossy(content);

        match ext.as_str() {
            "h" => Some(classify_header(&text)),
            "m" => Some(if is_objective_c(&text) {
                "Objective-C"
            } else {
                "MATLAB"
            }),
            "pl" => Some(if text.contains(":-") && !text.contains("my ") {
                "Prolog"
            } else {
                "Perl"
            }),
            "inc" => Some(if text.contains("<?php") { "PHP" } else { "Pascal" }),
            "v" => Some(if text.contains("module ") && text.contains("endmodule") {
                "Verilog"
            } else {
                "Coq"
            }),
            _ => self.detect_from_extension(&ext),
        }
    }
}

fn classify_header(text: &str) -> &'static str {
    if is_objective_c(text) {
        return "Objective-C";
    }
    const CPP_MARKERS: &[&str] = &[
        "class ",
        "namespace ",
        "template<",
        "template <",
        "std::",
        "#include <iostream>",
        "public:",
        "private:",
    ];
    if CPP_MARKERS.iter().any(|m| text.contains(m)) {
        "C++"
    } else {
        "C"
    }
}

fn is_objective_c(text: &str) -> bool {
    text.contains("@interface") || text.contains("@implementation") || text.contains("#import")
}
