//! File operations confined to the workspace directory

use std::path::{Component, Path, PathBuf};

use crate::{Error, Result, tasks};

/// Files named in a listing
const MAX_LISTED: usize = 10;
/// Characters of a file read aloud
const MAX_READ_CHARS: usize = 500;
/// How deep the fuzzy search descends
const MAX_SEARCH_DEPTH: usize = 4;

const KNOWN_EXTENSIONS: &[&str] = &[
    "py", "js", "ts", "html", "css", "txt", "md", "json", "yml", "yaml", "xml", "rs", "go", "java",
    "sh", "toml",
];
const COMMON_NAMES: &[&str] = &["main", "index", "app", "config", "requirements", "readme"];
const SKIPPED_DIRS: &[&str] = &["target", "node_modules", "__pycache__", "venv"];

/// What the user wants done with files
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOperation {
    List,
    Read(Option<String>),
    Open(Option<String>),
}

impl FileOperation {
    /// Parse a spoken file request
    #[must_use]
    pub fn from_request(request: &str) -> Self {
        let lower = request.to_lowercase();
        let has_any = |candidates: &[&str]| {
            lower
                .split(|c: char| !c.is_alphanumeric())
                .any(|w| candidates.contains(&w))
        };
        let filename = extract_filename(request);

        if has_any(&["open", "launch", "start"]) {
            Self::Open(filename)
        } else if has_any(&["read", "show", "display", "contents"]) {
            Self::Read(filename)
        } else if has_any(&["list", "files", "directory", "folder"]) {
            Self::List
        } else {
            Self::Open(filename)
        }
    }
}

/// Pick a filename out of a request
///
/// Prefers a word with a known extension, then a common file name.
#[must_use]
pub fn extract_filename(request: &str) -> Option<String> {
    let words: Vec<&str> = request
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| matches!(c, ',' | '?' | '!' | '"' | '\'')))
        .map(|w| w.trim_end_matches('.'))
        .filter(|w| !w.is_empty())
        .collect();

    let with_extension = words.iter().find(|w| {
        w.rsplit_once('.')
            .is_some_and(|(stem, ext)| !stem.is_empty() && KNOWN_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
    });
    let common = || {
        words
            .iter()
            .find(|w| COMMON_NAMES.contains(&w.to_lowercase().as_str()))
    };

    with_extension.or_else(common).map(|w| (*w).to_string())
}

/// The directory generated code is written to and file requests are served from
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Join a relative name onto the workspace root
    ///
    /// # Errors
    ///
    /// Returns error for absolute paths and any `..` component
    pub fn resolve(&self, name: &str) -> Result<PathBuf> {
        let path = Path::new(name);
        let escapes = path.components().any(|c| {
            matches!(
                c,
                Component::ParentDir | Component::RootDir | Component::Prefix(_)
            )
        });
        if escapes || path.is_absolute() {
            return Err(Error::Workspace(format!(
                "{name} is outside the workspace"
            )));
        }
        Ok(self.root.join(path))
    }

    /// Find a file by name, trying known extensions and then a shallow search
    ///
    /// # Errors
    ///
    /// Returns error if `name` escapes the workspace
    pub fn find(&self, name: &str) -> Result<Option<PathBuf>> {
        let exact = self.resolve(name)?;
        if exact.is_file() {
            return self.confined(exact);
        }

        for ext in KNOWN_EXTENSIONS {
            let candidate = self.resolve(&format!("{name}.{ext}"))?;
            if candidate.is_file() {
                return self.confined(candidate);
            }
        }

        let needle = name.to_lowercase();
        match search(&self.root, &needle, 0) {
            Some(found) => self.confined(found),
            None => Ok(None),
        }
    }

    /// Reject files that resolve outside the root through a symlink
    fn confined(&self, path: PathBuf) -> Result<Option<PathBuf>> {
        let root = self.root.canonicalize()?;
        let real = path.canonicalize()?;
        if real.starts_with(&root) {
            Ok(Some(path))
        } else {
            Err(Error::Workspace(format!(
                "{} links outside the workspace",
                path.display()
            )))
        }
    }

    /// Visible files at the top of the workspace, sorted
    ///
    /// # Errors
    ///
    /// Returns error if the directory can't be read
    pub fn list_files(&self) -> Result<Vec<String>> {
        let mut files: Vec<String> = std::fs::read_dir(&self.root)?
            .filter_map(std::result::Result::ok)
            .filter(|entry| entry.path().is_file())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| !name.starts_with('.'))
            .collect();
        files.sort();
        Ok(files)
    }

    /// Carry out `op` and describe the result for speech
    ///
    /// # Errors
    ///
    /// Returns error if a filename escapes the workspace or the directory
    /// can't be listed
    pub async fn perform(&self, op: &FileOperation) -> Result<String> {
        match op {
            FileOperation::List => self.describe_listing(),
            FileOperation::Read(None) => Ok("Please tell me which file you'd like me to read.".to_string()),
            FileOperation::Open(None) => Ok("I need a filename to open. Please tell me which file you'd like to open.".to_string()),
            FileOperation::Read(Some(name)) => match self.find(name)? {
                Some(path) => Ok(read_for_speech(&path)),
                None => Ok(not_found(name)),
            },
            FileOperation::Open(Some(name)) => match self.find(name)? {
                Some(path) => Ok(open_with_system(&path).await),
                None => Ok(not_found(name)),
            },
        }
    }

    fn describe_listing(&self) -> Result<String> {
        let files = self.list_files()?;
        Ok(match files.len() {
            0 => "There are no files in the workspace.".to_string(),
            n if n > MAX_LISTED => format!(
                "Here are the first {MAX_LISTED} files: {}. There are {n} files in total.",
                files[..MAX_LISTED].join(", ")
            ),
            _ => format!("Here are the files in the workspace: {}.", files.join(", ")),
        })
    }
}

fn not_found(name: &str) -> String {
    format!("I couldn't find {name} in the workspace. Could you check the filename?")
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}

fn read_for_speech(path: &Path) -> String {
    let name = display_name(path);
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let content = tasks::shorten_for_speech(
                content.trim(),
                MAX_READ_CHARS,
                "The file continues. Would you like me to open it instead?",
            );
            tracing::info!(path = %path.display(), "read file");
            format!("Here are the contents of {name}: {content}")
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to read file");
            format!("I had trouble reading {name}. Please make sure it's a text file.")
        }
    }
}

async fn open_with_system(path: &Path) -> String {
    let name = display_name(path);
    let mut command = if cfg!(target_os = "macos") {
        tokio::process::Command::new("open")
    } else if cfg!(target_os = "windows") {
        let mut cmd = tokio::process::Command::new("cmd");
        cmd.args(["/C", "start", ""]);
        cmd
    } else {
        tokio::process::Command::new("xdg-open")
    };

    match command.arg(path).status().await {
        Ok(status) if status.success() => {
            tracing::info!(path = %path.display(), "opened file");
            format!("I've opened {name} in your default editor.")
        }
        Ok(status) => {
            tracing::warn!(path = %path.display(), code = ?status.code(), "opener failed");
            format!("I had trouble opening {name}. Please check you have a default editor set up.")
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to spawn opener");
            format!("I had trouble opening {name}. Please check you have a default editor set up.")
        }
    }
}

/// Depth-limited search for a file whose name contains `needle`
fn search(dir: &Path, needle: &str, depth: usize) -> Option<PathBuf> {
    if depth > MAX_SEARCH_DEPTH {
        return None;
    }
    let mut entries: Vec<_> = std::fs::read_dir(dir)
        .ok()?
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .collect();
    entries.sort();

    let hidden_or_skipped = |path: &Path| {
        path.file_name()
            .and_then(|n| n.to_str())
            .is_none_or(|n| n.starts_with('.') || SKIPPED_DIRS.contains(&n))
    };

    entries
        .iter()
        .filter(|path| path.is_file() && !hidden_or_skipped(path))
        .find(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.to_lowercase().contains(needle))
        })
        .cloned()
        .or_else(|| {
            entries
                .iter()
                .filter(|path| path.is_dir() && !hidden_or_skipped(path))
                .find_map(|path| search(path, needle, depth + 1))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_filename() {
        assert_eq!(
            extract_filename("please read main.py for me"),
            Some("main.py".to_string())
        );
        assert_eq!(
            extract_filename("open the readme"),
            Some("readme".to_string())
        );
        assert_eq!(extract_filename("open something"), None);
    }

    #[test]
    fn test_operation_parsing() {
        assert_eq!(FileOperation::from_request("list the files"), FileOperation::List);
        assert_eq!(
            FileOperation::from_request("show me app.js"),
            FileOperation::Read(Some("app.js".to_string()))
        );
        assert_eq!(
            FileOperation::from_request("open index.html"),
            FileOperation::Open(Some("index.html".to_string()))
        );
    }

    #[test]
    fn test_keywords_match_whole_words() {
        assert_eq!(
            FileOperation::from_request("read restart.py"),
            FileOperation::Read(Some("restart.py".to_string()))
        );
        assert_eq!(
            FileOperation::from_request("show the startup script startup.sh"),
            FileOperation::Read(Some("startup.sh".to_string()))
        );
        assert_eq!(
            FileOperation::from_request("what's in the reopened folder"),
            FileOperation::List
        );
        assert_eq!(
            FileOperation::from_request("please start app.py"),
            FileOperation::Open(Some("app.py".to_string()))
        );
    }

    #[test]
    fn test_resolve_rejects_escape() {
        let workspace = Workspace::new("/tmp/ws");
        assert!(workspace.resolve("../etc/passwd").is_err());
        assert!(workspace.resolve("/etc/passwd").is_err());
        assert!(workspace.resolve("src/../../x").is_err());
        assert_eq!(
            workspace.resolve("src/main.py").unwrap(),
            PathBuf::from("/tmp/ws/src/main.py")
        );
    }

    #[test]
    fn test_find_and_list() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("app.py"), "print('hi')").unwrap();
        std::fs::write(dir.path().join(".hidden"), "").unwrap();
        std::fs::create_dir(dir.path().join("lib")).unwrap();
        std::fs::write(dir.path().join("lib").join("helpers.js"), "").unwrap();

        let workspace = Workspace::new(dir.path());
        assert_eq!(workspace.list_files().unwrap(), vec!["app.py"]);
        assert!(workspace.find("app").unwrap().unwrap().ends_with("app.py"));
        assert!(
            workspace
                .find("helpers")
                .unwrap()
                .unwrap()
                .ends_with("lib/helpers.js")
        );
        assert!(workspace.find("missing").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_read_truncates_for_speech() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("long.txt"), "word ".repeat(300)).unwrap();

        let workspace = Workspace::new(dir.path());
        let spoken = workspace
            .perform(&FileOperation::Read(Some("long.txt".to_string())))
            .await
            .unwrap();
        assert!(spoken.starts_with("Here are the contents of long.txt"));
        assert!(spoken.ends_with("Would you like me to open it instead?"));
    }
}
