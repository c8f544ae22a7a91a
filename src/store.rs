//! Frame discovery for sequence directories

use std::fs;
use std::ops::Index;
use std::path::{Path, PathBuf};

use regex::Regex;
use tracing::{debug, info};

/// Errors raised while discovering a sequence.
///
/// An empty match is not an error; it yields an empty [`Sequence`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Invalid file pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Cannot read sequence directory {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Ordered, duplicate-free list of frame files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sequence {
    paths: Vec<PathBuf>,
}

impl Sequence {
    /// Build a sequence, dropping repeated paths while keeping first occurrence order.
    pub fn new(paths: Vec<PathBuf>) -> Self {
        let mut unique: Vec<PathBuf> = Vec::with_capacity(paths.len());
        for path in paths {
            if !unique.contains(&path) {
                unique.push(path);
            }
        }
        Self { paths: unique }
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Path> {
        self.paths.get(index).map(PathBuf::as_path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.paths.iter().map(PathBuf::as_path)
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
}

impl Index<usize> for Sequence {
    type Output = Path;

    fn index(&self, index: usize) -> &Path {
        &self.paths[index]
    }
}

/// Compile a file name pattern so it has to match the whole name.
pub fn compile_pattern(pattern: &str) -> Result<Regex, StoreError> {
    Regex::new(&format!("^(?:{})$", pattern)).map_err(|source| StoreError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

/// List regular files directly inside `directory` whose name matches `pattern`.
///
/// With `sort` the result is ordered lexicographically by path; otherwise the
/// order is whatever the directory enumeration returns.
pub fn discover(directory: &Path, pattern: &str, sort: bool) -> Result<Sequence, StoreError> {
    let regex = compile_pattern(pattern)?;
    let unreadable = |source| StoreError::Unreadable {
        path: directory.to_path_buf(),
        source,
    };

    let mut paths = Vec::new();
    for entry in fs::read_dir(directory).map_err(unreadable)? {
        let entry = entry.map_err(unreadable)?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let matches = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| regex.is_match(name));
        if matches {
            paths.push(path);
        }
    }

    if sort {
        paths.sort();
    }

    let sequence = Sequence::new(paths);
    info!(
        directory = %directory.display(),
        frames = sequence.len(),
        "Sequence loaded"
    );
    for path in sequence.iter() {
        debug!("{}", path.display());
    }
    Ok(sequence)
}

/// Discovery settings for one sequence directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceStore {
    directory: PathBuf,
    pattern: String,
    sort: bool,
}

impl SequenceStore {
    pub fn new(directory: impl Into<PathBuf>, pattern: impl Into<String>, sort: bool) -> Self {
        Self {
            directory: directory.into(),
            pattern: pattern.into(),
            sort,
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn sorted(&self) -> bool {
        self.sort
    }

    /// Re-scan the directory. Every call builds a fresh sequence.
    pub fn discover(&self) -> Result<Sequence, StoreError> {
        discover(&self.directory, &self.pattern, self.sort)
    }
}
