//! Indexing a source tree into the vector store.

use crate::retrieval::DocumentMetadata;
use crate::{ChromaRetriever, NeuraError, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

const SOURCE_EXTENSIONS: &[&str] = &[
    "ts", "tsx", "js", "jsx", "json", "py", "java", "cpp", "c", "h", "hpp", "cs", "go", "rs", "php",
];

const SKIPPED_DIRS: &[&str] = &["node_modules", ".git"];

/// Outcome of an indexing pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexReport {
    pub indexed: usize,
    pub failed: usize,
}

/// Find indexable source files under `root`, sorted by path.
///
/// Hidden entries, `node_modules` and `.git` are skipped, as is anything
/// ignored by the tree's git ignore rules.
pub fn scan_source_files(root: &Path) -> Vec<PathBuf> {
    let mut builder = WalkBuilder::new(root);
    builder
        .hidden(true)
        .git_ignore(true)
        .git_exclude(true)
        .filter_entry(|entry| {
            entry
                .file_name()
                .to_str()
                .is_none_or(|name| !SKIPPED_DIRS.contains(&name))
        });

    let mut files = Vec::new();
    for result in builder.build() {
        match result {
            Ok(entry) => {
                if !entry.file_type().is_some_and(|t| t.is_file()) {
                    continue;
                }
                if is_source_file(entry.path()) {
                    files.push(entry.into_path());
                }
            }
            Err(e) => tracing::warn!(target: "neura::index", "Failed to read entry: {}", e),
        }
    }

    files.sort();
    tracing::info!(target: "neura::index", "Found {} files to index", files.len());
    files
}

fn is_source_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext))
}

impl ChromaRetriever {
    /// Upsert every source file under `root`, keyed by its root-relative path.
    ///
    /// Files that cannot be read or uploaded are logged and counted as failed.
    /// A `root` that is missing or not a directory is an error.
    pub async fn index_codebase(&self, root: &Path) -> Result<IndexReport> {
        if !tokio::fs::metadata(root).await?.is_dir() {
            return Err(NeuraError::Io(std::io::Error::new(
                std::io::ErrorKind::NotADirectory,
                format!("{} is not a directory", root.display()),
            )));
        }

        let mut report = IndexReport::default();

        for file in scan_source_files(root) {
            let relative = file
                .strip_prefix(root)
                .unwrap_or(&file)
                .to_string_lossy()
                .replace('\\', "/");

            let content = match tokio::fs::read_to_string(&file).await {
                Ok(content) => content,
                Err(e) => {
                    tracing::warn!(target: "neura::index", "Failed to read {}: {}", file.display(), e);
                    report.failed += 1;
                    continue;
                }
            };

            let metadata = DocumentMetadata {
                path: relative.clone(),
                kind: "code".to_string(),
                last_modified: last_modified(&file).await,
            };

            match self.upsert(&relative, &content, &metadata).await {
                Ok(()) => {
                    tracing::info!(target: "neura::index", "Indexed: {}", relative);
                    report.indexed += 1;
                }
                Err(e) => {
                    tracing::warn!(target: "neura::index", "Failed to index {}: {}", relative, e);
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }
}

/// File modification time as RFC 3339, or now if the filesystem cannot say.
async fn last_modified(path: &Path) -> String {
    let modified = tokio::fs::metadata(path)
        .await
        .and_then(|meta| meta.modified())
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| Utc::now());
    modified.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_scan_filters_and_skips() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
        fs::create_dir_all(root.join(".cache")).unwrap();
        fs::write(root.join("src/main.rs"), "fn main() {}").unwrap();
        fs::write(root.join("app.py"), "print(1)").unwrap();
        fs::write(root.join("README.md"), "# readme").unwrap();
        fs::write(root.join("node_modules/pkg/index.js"), "module.exports = 1").unwrap();
        fs::write(root.join(".cache/tmp.rs"), "").unwrap();

        let files: Vec<_> = scan_source_files(root)
            .into_iter()
            .map(|p| p.strip_prefix(root).unwrap().to_path_buf())
            .collect();

        assert_eq!(files, vec![PathBuf::from("app.py"), PathBuf::from("src/main.rs")]);
    }

    #[test]
    fn test_is_source_file() {
        assert!(is_source_file(Path::new("a/b.tsx")));
        assert!(is_source_file(Path::new("lib.rs")));
        assert!(!is_source_file(Path::new("notes.txt")));
        assert!(!is_source_file(Path::new("Makefile")));
    }
}
