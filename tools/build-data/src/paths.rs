//! Path helpers shared by the build commands.

use filetime::FileTime;
use std::fs;
use std::io;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};

use crate::error::{CommandError, CommandResult};

/// Output path relative to the output root, with the extension swapped if the
/// command produces a different format
pub fn output_relative(relative: &Path, extension: Option<&str>) -> PathBuf {
    match extension {
        Some(ext) => relative.with_extension(ext),
        None => relative.to_path_buf(),
    }
}

/// Create the directory that will hold `path`
pub fn ensure_parent_dir(path: &Path) -> CommandResult<()> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if parent.as_os_str().is_empty() || parent.is_dir() {
        return Ok(());
    }
    fs::create_dir_all(parent).map_err(|source| CommandError::CreateDir {
        path: parent.to_path_buf(),
        source,
    })
}

/// Give `target` the modification time of `source`.
///
/// Works on read-only targets: `fs::copy` carries the source permissions over.
pub fn copy_modified_time(source: &Path, target: &Path) -> CommandResult<()> {
    let meta = fs::metadata(source).map_err(|err| timestamp_error(source, err))?;
    let modified = FileTime::from_last_modification_time(&meta);

    filetime::set_file_mtime(target, modified).map_err(|err| timestamp_error(target, err))
}

fn timestamp_error(path: &Path, source: io::Error) -> CommandError {
    CommandError::Timestamp {
        path: path.to_path_buf(),
        source,
    }
}

/// Render a source-relative path for the build log
pub fn display_source(relative: &Path) -> String {
    format!("$(SourcePath){}{}", MAIN_SEPARATOR, relative.display())
}

/// Render an output-relative path for the build log
pub fn display_output(relative: &Path) -> String {
    format!("$(OutputPath){}{}", MAIN_SEPARATOR, relative.display())
}
