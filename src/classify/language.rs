//! Programming language names, file extensions and detection

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// Extension used when a language is not recognised
pub const FALLBACK_EXTENSION: &str = "txt";

/// Languages the assistant can generate code for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Python,
    JavaScript,
    TypeScript,
    Java,
    Cpp,
    C,
    CSharp,
    Go,
    Rust,
    Php,
    Ruby,
    Swift,
    Kotlin,
    Html,
    Css,
    Sql,
    Bash,
    PowerShell,
    Yaml,
    Json,
    Xml,
}

impl Language {
    pub const ALL: [Self; 21] = [
        Self::Python,
        Self::JavaScript,
        Self::TypeScript,
        Self::Java,
        Self::Cpp,
        Self::C,
        Self::CSharp,
        Self::Go,
        Self::Rust,
        Self::Php,
        Self::Ruby,
        Self::Swift,
        Self::Kotlin,
        Self::Html,
        Self::Css,
        Self::Sql,
        Self::Bash,
        Self::PowerShell,
        Self::Yaml,
        Self::Json,
        Self::Xml,
    ];

    /// Canonical lowercase key
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Python => "python",
            Self::JavaScript => "javascript",
            Self::TypeScript => "typescript",
            Self::Java => "java",
            Self::Cpp => "cpp",
            Self::C => "c",
            Self::CSharp => "csharp",
            Self::Go => "go",
            Self::Rust => "rust",
            Self::Php => "php",
            Self::Ruby => "ruby",
            Self::Swift => "swift",
            Self::Kotlin => "kotlin",
            Self::Html => "html",
            Self::Css => "css",
            Self::Sql => "sql",
            Self::Bash => "bash",
            Self::PowerShell => "powershell",
            Self::Yaml => "yaml",
            Self::Json => "json",
            Self::Xml => "xml",
        }
    }

    /// Name as it should be spoken
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Python => "Python",
            Self::JavaScript => "JavaScript",
            Self::TypeScript => "TypeScript",
            Self::Java => "Java",
            Self::Cpp => "C++",
            Self::C => "C",
            Self::CSharp => "C#",
            Self::Go => "Go",
            Self::Rust => "Rust",
            Self::Php => "PHP",
            Self::Ruby => "Ruby",
            Self::Swift => "Swift",
            Self::Kotlin => "Kotlin",
            Self::Html => "HTML",
            Self::Css => "CSS",
            Self::Sql => "SQL",
            Self::Bash => "Bash",
            Self::PowerShell => "PowerShell",
            Self::Yaml => "YAML",
            Self::Json => "JSON",
            Self::Xml => "XML",
        }
    }

    /// File extension without the leading dot
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Python => "py",
            Self::JavaScript => "js",
            Self::TypeScript => "ts",
            Self::Java => "java",
            Self::Cpp => "cpp",
            Self::C => "c",
            Self::CSharp => "cs",
            Self::Go => "go",
            Self::Rust => "rs",
            Self::Php => "php",
            Self::Ruby => "rb",
            Self::Swift => "swift",
            Self::Kotlin => "kt",
            Self::Html => "html",
            Self::Css => "css",
            Self::Sql => "sql",
            Self::Bash => "sh",
            Self::PowerShell => "ps1",
            Self::Yaml => "yaml",
            Self::Json => "json",
            Self::Xml => "xml",
        }
    }

    /// YAML, JSON and XML
    #[must_use]
    pub const fn is_data_format(self) -> bool {
        matches!(self, Self::Yaml | Self::Json | Self::Xml)
    }

    /// Look up a language by key or common alias
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized = name.trim().to_lowercase();
        let language = match normalized.as_str() {
            "python" | "py" | "python3" => Self::Python,
            "javascript" | "js" | "node" | "nodejs" | "java script" => Self::JavaScript,
            "typescript" | "ts" | "type script" => Self::TypeScript,
            "java" => Self::Java,
            "cpp" | "c++" | "c plus plus" | "cplusplus" => Self::Cpp,
            "c" => Self::C,
            "csharp" | "c#" | "c sharp" | "cs" => Self::CSharp,
            "go" | "golang" => Self::Go,
            "rust" | "rs" => Self::Rust,
            "php" => Self::Php,
            "ruby" | "rb" => Self::Ruby,
            "swift" => Self::Swift,
            "kotlin" | "kt" => Self::Kotlin,
            "html" => Self::Html,
            "css" => Self::Css,
            "sql" => Self::Sql,
            "bash" | "shell" | "sh" => Self::Bash,
            "powershell" | "ps1" | "power shell" => Self::PowerShell,
            "yaml" | "yml" => Self::Yaml,
            "json" => Self::Json,
            "xml" => Self::Xml,
            _ => return None,
        };
        Some(language)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Extension for a language name, `txt` when unknown
#[must_use]
pub fn extension_for(name: &str) -> &'static str {
    Language::from_name(name).map_or(FALLBACK_EXTENSION, Language::extension)
}

/// Spoken mentions, longest and most specific first
static MENTIONS: LazyLock<Vec<(Regex, Language)>> = LazyLock::new(|| {
    [
        (r"\btype ?script\b", Language::TypeScript),
        (r"\bjava ?script\b|\bnode(\.?js)?\b", Language::JavaScript),
        (r"\bpower ?shell\b", Language::PowerShell),
        (r"\bjava\b", Language::Java),
        (r"\bpython\b", Language::Python),
        (r"c\+\+|\bc plus plus\b|\bcpp\b", Language::Cpp),
        (r"c#|\bc sharp\b|\bcsharp\b", Language::CSharp),
        (r"\bgolang\b|\bin go\b|\bgo language\b|\bgo program\b", Language::Go),
        (r"\brust\b", Language::Rust),
        (r"\bphp\b", Language::Php),
        (r"\bruby\b", Language::Ruby),
        (r"\bswift\b", Language::Swift),
        (r"\bkotlin\b", Language::Kotlin),
        (r"\bhtml\b|\bweb ?page\b", Language::Html),
        (r"\bcss\b|\bstylesheet\b", Language::Css),
        (r"\bsql\b|\bsequel\b", Language::Sql),
        (r"\bbash\b|\bshell script\b", Language::Bash),
        (
            r"\b(?:in|as|into) ya?ml\b|\ban? ya?ml (?:file|document|config)\b",
            Language::Yaml,
        ),
        (
            r"\b(?:in|as|into) json\b|\ba json (?:file|document|config)\b",
            Language::Json,
        ),
        (
            r"\b(?:in|as|into) xml\b|\ban xml (?:file|document|config)\b",
            Language::Xml,
        ),
        (r"\bin c\b|\bc language\b|\bc program\b", Language::C),
    ]
    .into_iter()
    .map(|(pattern, language)| (Regex::new(pattern).expect("valid regex"), language))
    .collect()
});

/// Find the language a spoken request asks for
///
/// Data formats only count when named as the output ("in json", "a yaml
/// file"); a request that merely mentions one is about some other language.
#[must_use]
pub fn detect_requested_language(text: &str) -> Option<Language> {
    let lower = text.to_lowercase();
    MENTIONS
        .iter()
        .find(|(re, _)| re.is_match(&lower))
        .map(|(_, language)| *language)
}

/// Find the language in an answer to "which language?"
///
/// Unlike a request, a bare format name is a choice here.
#[must_use]
pub fn detect_answered_language(text: &str) -> Option<Language> {
    detect_requested_language(text).or_else(|| {
        text.to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter_map(Language::from_name)
            .find(|language| language.is_data_format())
    })
}

/// Guess the language of a source snippet from syntax cues
#[must_use]
pub fn detect_code_language(code: &str) -> Option<Language> {
    let has = |needle: &str| code.contains(needle);

    if has("<?php") {
        Some(Language::Php)
    } else if has("<!DOCTYPE html") || has("<html") {
        Some(Language::Html)
    } else if has("#include") {
        if has("std::") || has("cout") || has("namespace") {
            Some(Language::Cpp)
        } else {
            Some(Language::C)
        }
    } else if has("using System") || has("Console.WriteLine") {
        Some(Language::CSharp)
    } else if has("package main") || (has("func ") && has(":=")) {
        Some(Language::Go)
    } else if has("fn ") && (has("let ") || has("println!") || has("->")) {
        Some(Language::Rust)
    } else if has("public class") || has("System.out.println") || has("public static void") {
        Some(Language::Java)
    } else if has("fun ") && (has("val ") || has("println(")) {
        Some(Language::Kotlin)
    } else if has("interface ") && (has(": string") || has(": number")) {
        Some(Language::TypeScript)
    } else if has("function ") || has("const ") || has("=>") || has("console.log") {
        Some(Language::JavaScript)
    } else if (has("def ") && has(":")) || (has("import ") && has("print(")) {
        Some(Language::Python)
    } else if (has("def ") && has("end")) || has("puts ") {
        Some(Language::Ruby)
    } else if has("#!/bin/bash") || has("#!/bin/sh") || has("echo ") {
        Some(Language::Bash)
    } else if ["SELECT ", "CREATE TABLE", "INSERT INTO"]
        .iter()
        .any(|kw| code.to_uppercase().contains(kw))
    {
        Some(Language::Sql)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_table() {
        let expected = [
            ("python", "py"),
            ("javascript", "js"),
            ("typescript", "ts"),
            ("java", "java"),
            ("cpp", "cpp"),
            ("csharp", "cs"),
            ("go", "go"),
            ("rust", "rs"),
            ("ruby", "rb"),
            ("kotlin", "kt"),
            ("bash", "sh"),
            ("powershell", "ps1"),
        ];
        for (name, ext) in expected {
            assert_eq!(extension_for(name), ext, "{name}");
        }
        assert_eq!(extension_for("cobol"), "txt");
    }

    #[test]
    fn test_every_language_round_trips_through_key() {
        for language in Language::ALL {
            assert_eq!(Language::from_name(language.key()), Some(language));
        }
    }

    #[test]
    fn test_detect_requested_language() {
        assert_eq!(
            detect_requested_language("create a hello world in JavaScript"),
            Some(Language::JavaScript)
        );
        assert_eq!(
            detect_requested_language("write a java class for users"),
            Some(Language::Java)
        );
        assert_eq!(
            detect_requested_language("a C++ program that sorts"),
            Some(Language::Cpp)
        );
        assert_eq!(detect_requested_language("go ahead and write it"), None);
        assert_eq!(detect_requested_language("write a function"), None);
    }

    #[test]
    fn test_data_formats_need_target_phrasing() {
        assert_eq!(
            detect_requested_language("write a function that parses json"),
            None
        );
        assert_eq!(
            detect_requested_language("load the yaml config and print it"),
            None
        );
        assert_eq!(
            detect_requested_language("a python script that reads xml"),
            Some(Language::Python)
        );
        assert_eq!(
            detect_requested_language("write the settings in json"),
            Some(Language::Json)
        );
        assert_eq!(
            detect_requested_language("create a yaml file for the pipeline"),
            Some(Language::Yaml)
        );
    }

    #[test]
    fn test_bare_format_is_a_valid_answer() {
        assert_eq!(detect_answered_language("JSON."), Some(Language::Json));
        assert_eq!(detect_answered_language("yml please"), Some(Language::Yaml));
        assert_eq!(detect_answered_language("rust"), Some(Language::Rust));
        assert_eq!(detect_answered_language("whatever you like"), None);
    }

    #[test]
    fn test_detect_code_language() {
        assert_eq!(
            detect_code_language("def add(a, b):\n    return a + b"),
            Some(Language::Python)
        );
        assert_eq!(
            detect_code_language("fn main() {\n    println!(\"hi\");\n}"),
            Some(Language::Rust)
        );
        assert_eq!(
            detect_code_language("const add = (a, b) => a + b;"),
            Some(Language::JavaScript)
        );
        assert_eq!(
            detect_code_language("#include <iostream>\nint main() { std::cout << 1; }"),
            Some(Language::Cpp)
        );
        assert_eq!(detect_code_language("just some prose"), None);
    }
}
