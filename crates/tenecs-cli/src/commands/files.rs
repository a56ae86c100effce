//! Shared file collection utilities for CLI commands.

use anyhow::Context;
use std::path::{Path, PathBuf};
use tenecs_engine::{FileTopLevel, SourceFile};

/// Extension of parsed files
const PARSED_EXTENSION: &str = "json";

/// Extension of the source a parsed file came from
const SOURCE_EXTENSION: &str = "10x";

/// A parsed file, with its source text when it sits next to it
pub struct LoadedFile {
    pub file: SourceFile,
    pub source: Option<String>,
}

/// Collect all parsed files from the given paths (files or directories).
pub fn collect_parsed_files(paths: &[String]) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path_str in paths {
        let path = Path::new(path_str);
        if path.is_file() {
            files.push(path.to_path_buf());
        } else if path.is_dir() {
            collect_in_dir(path, &mut files)?;
        } else {
            anyhow::bail!("no such file or directory: {}", path_str);
        }
    }

    files.sort();
    Ok(files)
}

/// Recursively collect parsed files in a directory.
fn collect_in_dir(dir: &Path, files: &mut Vec<PathBuf>) -> anyhow::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() {
            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            if name_str.starts_with('.') || name_str == "target" {
                continue;
            }
            collect_in_dir(&path, files)?;
        } else if path.extension().and_then(|e| e.to_str()) == Some(PARSED_EXTENSION) {
            files.push(path);
        }
    }
    Ok(())
}

/// Read a parsed file and, if present, the `.10x` source beside it
///
/// Errors are reported against the source path when there is one.
pub fn load(path: &Path) -> anyhow::Result<LoadedFile> {
    let content = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let top_level: FileTopLevel =
        serde_json::from_str(&content).with_context(|| format!("{} is not a parsed file", path.display()))?;

    let source_path = path.with_extension(SOURCE_EXTENSION);
    let (name, source) = match std::fs::read_to_string(&source_path) {
        Ok(source) => (source_path.display().to_string(), Some(source)),
        Err(_) => (path.display().to_string(), None),
    };
    Ok(LoadedFile {
        file: SourceFile::new(name, top_level),
        source,
    })
}

pub fn load_all(paths: &[String]) -> anyhow::Result<Vec<LoadedFile>> {
    let found = collect_parsed_files(paths)?;
    if found.is_empty() {
        anyhow::bail!("no parsed files found in {:?}", paths);
    }
    tracing::debug!(files = found.len(), "loading parsed files");
    found.iter().map(|path| load(path)).collect()
}
