//! Wildcard file-set resolution.
//!
//! A wildcard parameter such as `sfx/ui/*.wav` is split at its last separator.
//! The directory part narrows the search root, the file part is matched against
//! every file name below it, recursively. Results are relative to the original
//! root and sorted.

use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{CommandError, CommandResult};

/// Path separators accepted inside wildcard parameters
const SEPARATORS: [char; 2] = ['/', '\\'];

/// Wildcard parameter split into search sub-directory and file pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSetSpec {
    /// File-name pattern (`*` and `?` allowed)
    pub wildcard_pattern: String,
    /// Directory prefix including its trailing separator, or empty
    pub relative_subdir: String,
}

impl FileSetSpec {
    pub fn parse(wildcard: &str) -> Self {
        match wildcard.rfind(SEPARATORS) {
            Some(pos) => Self {
                wildcard_pattern: wildcard[pos + 1..].to_string(),
                relative_subdir: wildcard[..=pos].to_string(),
            },
            None => Self {
                wildcard_pattern: wildcard.to_string(),
                relative_subdir: String::new(),
            },
        }
    }

    /// Directory to search, below `root`
    pub fn search_root(&self, root: &Path) -> PathBuf {
        self.relative_subdir
            .split(SEPARATORS)
            .filter(|part| !part.is_empty())
            .fold(root.to_path_buf(), |path, part| path.join(part))
    }
}

/// Match a file name against a `*`/`?` pattern, ignoring ASCII case
pub fn wildcard_match(pattern: &str, name: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let name: Vec<char> = name.chars().collect();

    let (mut p, mut n) = (0, 0);
    // Position of the last `*` seen and the name index it was tried at
    let mut backtrack: Option<(usize, usize)> = None;

    while n < name.len() {
        if p < pattern.len() && pattern[p] == '*' {
            backtrack = Some((p, n));
            p += 1;
        } else if p < pattern.len()
            && (pattern[p] == '?' || pattern[p].eq_ignore_ascii_case(&name[n]))
        {
            p += 1;
            n += 1;
        } else if let Some((star, tried)) = backtrack {
            p = star + 1;
            n = tried + 1;
            backtrack = Some((star, tried + 1));
        } else {
            return false;
        }
    }

    pattern[p..].iter().all(|&c| c == '*')
}

/// Resolve a wildcard parameter against `root`.
///
/// Returns every matching file below the search root, as paths relative to
/// `root`, in lexicographic order.
pub fn resolve(wildcard: &str, root: &Path) -> CommandResult<Vec<PathBuf>> {
    let spec = FileSetSpec::parse(wildcard);
    let search_root = spec.search_root(root);

    for dir in [root, search_root.as_path()] {
        fs::metadata(dir).map_err(|source| CommandError::SearchRoot {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(&search_root).follow_links(true) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy();
        if !wildcard_match(&spec.wildcard_pattern, &name) {
            continue;
        }

        if let Ok(relative) = entry.path().strip_prefix(root) {
            files.push(relative.to_path_buf());
        }
    }

    files.sort();
    Ok(files)
}
