//! Markdown documents in the data directory and their HTML rendering.

use std::path::{Component, Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum DocumentError {
    /// Missing, unreadable, or a name that is not a single plain file name.
    #[error("document not found: {0}")]
    NotFound(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("conversion failed: {0}")]
    Converter(String),
}

/// Read-only view over the `*.md` files of one directory, plus a converter
/// for turning them into HTML.
#[derive(Debug, Clone)]
pub struct DocumentLibrary {
    root: PathBuf,
    converter: String,
    timeout: Duration,
}

impl DocumentLibrary {
    pub fn new(root: impl Into<PathBuf>, converter: impl Into<String>, timeout: Duration) -> Self {
        Self {
            root: root.into(),
            converter: converter.into(),
            timeout,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Names of the markdown files, sorted.
    pub async fn list_markdown(&self) -> Result<Vec<String>, DocumentError> {
        let io_err = |source| DocumentError::Io {
            path: self.root.clone(),
            source,
        };
        let mut entries = tokio::fs::read_dir(&self.root).await.map_err(io_err)?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(io_err)? {
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if !name.ends_with(".md") {
                continue;
            }
            if entry.file_type().await.map(|t| t.is_file()).unwrap_or(false) {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    pub async fn read_markdown(&self, name: &str) -> Result<String, DocumentError> {
        let path = self.resolve(name)?;
        tokio::fs::read_to_string(&path).await.map_err(|e| {
            debug!(path = %path.display(), error = %e, "markdown unreadable");
            DocumentError::NotFound(name.to_string())
        })
    }

    /// Render `name` to HTML, with citations when `bibliography` exists.
    pub async fn render(&self, name: &str, bibliography: Option<&str>) -> Result<String, DocumentError> {
        let source = self.resolve(name)?;
        if !is_file(&source).await {
            return Err(DocumentError::NotFound(name.to_string()));
        }

        // Path-qualified so a leading `-` is never read as an option.
        let mut args = vec![format!("./{name}"), "-f".into(), "markdown".into(), "-t".into(), "html".into()];
        if let Some(bib) = bibliography.filter(|b| !b.is_empty()) {
            match self.resolve(bib) {
                Ok(path) if is_file(&path).await => {
                    args.push("--citeproc".into());
                    args.push(format!("--bibliography={bib}"));
                }
                _ => warn!(bibliography = bib, "bibliography not found; rendering without citations"),
            }
        }

        let mut cmd = tokio::process::Command::new(&self.converter);
        cmd.args(&args)
            .current_dir(&self.root)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| DocumentError::Converter(format!("timed out after {:?}", self.timeout)))?
            .map_err(|e| DocumentError::Converter(format!("failed to run {}: {e}", self.converter)))?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            warn!(document = name, stderr = %stderr.trim(), "converter reported diagnostics");
        }
        if !output.status.success() {
            let detail = if stderr.trim().is_empty() {
                format!("{} exited with {}", self.converter, output.status)
            } else {
                stderr.trim().to_string()
            };
            return Err(DocumentError::Converter(detail));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Map a document name to a path directly inside the root.
    fn resolve(&self, name: &str) -> Result<PathBuf, DocumentError> {
        let mut components = Path::new(name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(leaf)), None) if leaf == name => Ok(self.root.join(leaf)),
            _ => Err(DocumentError::NotFound(name.to_string())),
        }
    }
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path).await.map(|m| m.is_file()).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn library(dir: &Path, converter: &str) -> DocumentLibrary {
        DocumentLibrary::new(dir, converter, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn lists_only_markdown_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.md", "a.md", "comments.json", "notes.txt"] {
            std::fs::write(dir.path().join(name), "x").unwrap();
        }
        std::fs::create_dir(dir.path().join("dir.md")).unwrap();

        let names = library(dir.path(), "pandoc").list_markdown().await.unwrap();
        assert_eq!(names, ["a.md", "b.md"]);
    }

    #[tokio::test]
    async fn reads_markdown_and_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("doc.md"), "# Title\n").unwrap();
        let lib = library(dir.path(), "pandoc");

        assert_eq!(lib.read_markdown("doc.md").await.unwrap(), "# Title\n");
        for bad in ["missing.md", "../doc.md", "sub/doc.md", "/etc/passwd", "..", "", "./doc.md"] {
            assert!(
                matches!(lib.read_markdown(bad).await, Err(DocumentError::NotFound(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn render_of_missing_document_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = library(dir.path(), "pandoc").render("nope.md", None).await.unwrap_err();
        assert!(matches!(err, DocumentError::NotFound(_)));
    }

    #[tokio::test]
    async fn missing_converter_is_a_conversion_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("doc.md"), "text").unwrap();
        let err = library(dir.path(), "definitely-not-a-converter")
            .render("doc.md", None)
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentError::Converter(_)));
    }

    // `echo` stands in for the converter: its stdout shows the arguments.
    #[cfg(unix)]
    #[tokio::test]
    async fn bibliography_is_passed_only_when_present() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("doc.md"), "text").unwrap();
        std::fs::write(dir.path().join("refs.bib"), "@book{}").unwrap();
        let lib = library(dir.path(), "echo");

        let with_bib = lib.render("doc.md", Some("refs.bib")).await.unwrap();
        assert_eq!(
            with_bib.trim(),
            "./doc.md -f markdown -t html --citeproc --bibliography=refs.bib"
        );

        let without = lib.render("doc.md", Some("missing.bib")).await.unwrap();
        assert_eq!(without.trim(), "./doc.md -f markdown -t html");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn dash_prefixed_names_are_not_converter_options() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("-n"), "text").unwrap();
        std::fs::write(dir.path().join("--version"), "text").unwrap();
        let lib = library(dir.path(), "echo");

        let rendered = lib.render("-n", None).await.unwrap();
        assert_eq!(rendered, "./-n -f markdown -t html\n");
        let rendered = lib.render("--version", None).await.unwrap();
        assert_eq!(rendered.trim(), "./--version -f markdown -t html");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_converter_reports_stderr() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("doc.md"), "text").unwrap();
        let err = library(dir.path(), "false").render("doc.md", None).await.unwrap_err();
        assert!(matches!(err, DocumentError::Converter(msg) if msg.contains("exited")));
    }
}
