//! Code generation: model-first with a deterministic template fallback

use crate::classify::{FALLBACK_EXTENSION, Language};
use crate::ports::{CompletionOptions, TextCompletion};
use crate::prompt;

use super::templates::{self, Blueprint};

/// Words that describe the request rather than name the thing being built
const STOP_WORDS: &[&str] = &[
    "a", "an", "the", "to", "for", "of", "that", "which", "and", "in", "on", "with", "me", "my",
    "please", "can", "could", "you", "i", "want", "would", "like", "create", "write", "make",
    "build", "generate", "implement", "code", "program", "function", "method", "class", "script",
    "simple", "new", "some", "called", "named",
];

/// Longest title carried into a template
const MAX_TITLE_CHARS: usize = 100;

/// Rough shape of the requested code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskType {
    HelloWorld,
    Function,
    Class,
    Api,
    Web,
    Database,
    Test,
    Script,
}

impl TaskType {
    /// Infer the task shape from the request wording
    #[must_use]
    pub fn infer(request: &str) -> Self {
        let lower = request.to_lowercase();
        let words: Vec<&str> = lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();
        let has = |candidates: &[&str]| words.iter().any(|w| candidates.contains(w));

        if lower.contains("hello world") || lower.contains("hello, world") {
            Self::HelloWorld
        } else if has(&["test", "tests", "unittest"]) {
            Self::Test
        } else if has(&["api", "endpoint", "endpoints", "server", "rest"]) {
            Self::Api
        } else if has(&["database", "sql", "schema", "table"]) {
            Self::Database
        } else if has(&["web", "website", "webpage", "html", "page"]) {
            Self::Web
        } else if has(&["class", "object"]) {
            Self::Class
        } else if has(&["function", "method"]) {
            Self::Function
        } else {
            Self::Script
        }
    }

    /// File stem for code of this shape
    #[must_use]
    pub const fn file_stem(self) -> &'static str {
        match self {
            Self::HelloWorld => "hello_world",
            Self::Api => "api_server",
            Self::Class => "main_class",
            Self::Web => "index",
            Self::Database => "database_schema",
            Self::Test => "test_main",
            Self::Function => "main_function",
            Self::Script => "main",
        }
    }
}

/// A generated source file, not yet written anywhere
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedCode {
    pub source: String,
    pub filename: String,
    /// Language the source is written in; `None` for unsupported languages
    pub language: Option<Language>,
}

/// Template-based code for `request`
///
/// `language` is a free-form name. Unsupported names get the Python template
/// saved with the fallback extension. The result is never empty.
#[must_use]
pub fn generate_code(
    request: &str,
    todos: &[String],
    language: &str,
    task_type: TaskType,
) -> GeneratedCode {
    let resolved = Language::from_name(language);
    let snake = identifier(request);
    let blueprint = Blueprint {
        title: sanitize(request),
        todos: todos.iter().map(|t| sanitize(t)).collect(),
        task_type,
        snake: &snake,
    };

    let (source, extension) = match resolved {
        Some(language) => (templates::render(language, &blueprint), language.extension()),
        None => (templates::python(&blueprint), FALLBACK_EXTENSION),
    };

    GeneratedCode {
        source,
        filename: format!("{}.{extension}", task_type.file_stem()),
        language: resolved,
    }
}

/// Everything the model needs to write or revise code
#[derive(Debug, Clone, Copy)]
pub struct CodeRequest<'a> {
    pub request: &'a str,
    /// Todos to cover so far
    pub todos: &'a [String],
    pub language: Language,
    /// Adjustments the user asked for between todos
    pub notes: &'a [String],
    /// Code being revised
    pub previous: Option<&'a str>,
    pub feedback: Option<&'a str>,
}

/// Ask the model for code, falling back to [`generate_code`]
pub async fn draft_code(
    completion: &dyn TextCompletion,
    req: &CodeRequest<'_>,
    temperature: f32,
) -> GeneratedCode {
    let task_type = TaskType::infer(req.request);
    let prompt = prompt::code_prompt(
        req.request,
        req.todos,
        req.language,
        req.notes,
        req.previous,
        req.feedback,
    );
    let options = CompletionOptions::default()
        .with_system(prompt::CODE_SYSTEM)
        .with_temperature(temperature)
        .with_max_tokens(2000);

    match completion.complete(&prompt, &options).await {
        Ok(reply) => {
            let source = strip_code_fences(&reply);
            if !source.trim().is_empty() {
                tracing::debug!(language = req.language.key(), "model generated code");
                return GeneratedCode {
                    source,
                    filename: format!("{}.{}", task_type.file_stem(), req.language.extension()),
                    language: Some(req.language),
                };
            }
            tracing::warn!("model returned no code, using template");
        }
        Err(e) => tracing::warn!(error = %e, "code generation failed, using template"),
    }

    generate_code(req.request, req.todos, req.language.key(), task_type)
}

/// Extract the body of the first fenced block, or the whole reply if unfenced
#[must_use]
pub fn strip_code_fences(reply: &str) -> String {
    let mut lines = reply.lines();
    if !reply.contains("```") {
        return reply.trim().to_string() + "\n";
    }

    lines
        .by_ref()
        .find(|line| line.trim_start().starts_with("```"));
    let body: Vec<&str> = lines
        .take_while(|line| !line.trim_start().starts_with("```"))
        .collect();
    let mut out = body.join("\n");
    out.push('\n');
    out
}

/// Remove characters that would break out of comments or string literals
fn sanitize(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .filter(|c| !matches!(c, '"' | '\'' | '\\' | '`' | '<' | '>' | '*' | '{' | '}' | '$'))
        .collect();
    let mut title = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    if let Some((cut, _)) = title.char_indices().nth(MAX_TITLE_CHARS) {
        title.truncate(cut);
    }
    if title.is_empty() {
        "Generated code".to_string()
    } else {
        title
    }
}

/// `snake_case` name for the main function or type
fn identifier(request: &str) -> String {
    let lower = request.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty() && !STOP_WORDS.contains(w))
        .take(3)
        .collect();

    match words.first() {
        None => "run_task".to_string(),
        Some(first) if first.starts_with(|c: char| c.is_ascii_digit()) => {
            format!("task_{}", words.join("_"))
        }
        Some(_) => words.join("_"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn todos() -> Vec<String> {
        vec!["Create file".to_string(), "Implement function".to_string()]
    }

    #[test]
    fn test_every_language_matches_extension_table() {
        for language in Language::ALL {
            for task_type in [TaskType::Function, TaskType::Class, TaskType::HelloWorld] {
                let code = generate_code("add two numbers", &todos(), language.key(), task_type);
                assert!(!code.source.trim().is_empty(), "{language:?} {task_type:?}");
                let extension = code.filename.rsplit('.').next().unwrap();
                assert_eq!(extension, language.extension(), "{language:?}");
            }
        }
    }

    #[test]
    fn test_javascript_extension() {
        let code = generate_code("sort a list", &todos(), "javascript", TaskType::Function);
        assert_eq!(code.filename, "main_function.js");
        assert!(code.source.contains("function sortList"));
    }

    #[test]
    fn test_unsupported_language_falls_back() {
        let code = generate_code("sort a list", &todos(), "cobol", TaskType::Script);
        assert_eq!(code.filename, "main.txt");
        assert!(code.language.is_none());
        assert!(code.source.contains("def sort_list"));
    }

    #[test]
    fn test_hello_world_prints_greeting() {
        let request = "create a function to print hello world";
        let task_type = TaskType::infer(request);
        assert_eq!(task_type, TaskType::HelloWorld);

        let code = generate_code(request, &todos(), "python", task_type);
        assert_eq!(code.filename, "hello_world.py");
        assert!(code.source.contains("def hello_world():"));
        assert!(code.source.contains("print(\"Hello, World!\")"));
    }

    #[test]
    fn test_infer_task_types() {
        assert_eq!(TaskType::infer("build a REST api for books"), TaskType::Api);
        assert_eq!(TaskType::infer("make a user class"), TaskType::Class);
        assert_eq!(TaskType::infer("a landing page"), TaskType::Web);
        assert_eq!(TaskType::infer("design a database for orders"), TaskType::Database);
        assert_eq!(TaskType::infer("write tests for the parser"), TaskType::Test);
        assert_eq!(TaskType::infer("a function to reverse words"), TaskType::Function);
        assert_eq!(TaskType::infer("rename my photos"), TaskType::Script);
    }

    #[test]
    fn test_file_stems() {
        let web = generate_code("a landing page", &[], "html", TaskType::Web);
        assert_eq!(web.filename, "index.html");
        let db = generate_code("orders", &[], "sql", TaskType::Database);
        assert_eq!(db.filename, "database_schema.sql");
        assert!(db.source.contains("CREATE TABLE IF NOT EXISTS orders"));
    }

    #[test]
    fn test_request_text_cannot_break_out() {
        let code = generate_code(
            "print \"\"\" and */ stuff",
            &[],
            "python",
            TaskType::Function,
        );
        assert_eq!(code.source.matches("\"\"\"").count(), 2);
    }

    #[test]
    fn test_identifier() {
        assert_eq!(identifier("create a function to add two numbers"), "add_two_numbers");
        assert_eq!(identifier("make a user class"), "user");
        assert_eq!(identifier("a function"), "run_task");
        assert_eq!(identifier("3d renderer"), "task_3d_renderer");
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(
            strip_code_fences("Here you go:\n```python\nprint(1)\n```\nEnjoy"),
            "print(1)\n"
        );
        assert_eq!(strip_code_fences("print(2)\n\n"), "print(2)\n");
    }
}
