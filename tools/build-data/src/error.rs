//! Error types for script runs.
//!
//! [`ScriptError`] aborts the whole run. [`CommandError`] is scoped to a single
//! script line: the interpreter reports it and moves on to the next command.

use std::io;
use std::path::PathBuf;

/// Fatal errors that stop a run before any command executes
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    /// Script file missing or unreadable
    #[error("failed to read script {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Tool settings file missing, unreadable or malformed
    #[error("invalid tool settings {}: {message}", path.display())]
    Settings { path: PathBuf, message: String },
}

/// Failure of a single script command
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// Verb not found in the dispatch table
    #[error("invalid command: {0}")]
    UnknownVerb(String),

    /// Verb given the wrong number of parameters
    #[error("{verb} needs {expected} arguments: source-wildcard-list relative-target-path (got {found})")]
    ParameterCount {
        verb: String,
        expected: usize,
        found: usize,
    },

    /// Root or sub-directory of a wildcard could not be searched
    #[error("cannot search {}: {source}", path.display())]
    SearchRoot {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Directory walk failed part way through
    #[error("failed to list files: {0}")]
    Walk(#[from] walkdir::Error),

    /// Target directory could not be created
    #[error("failed to create directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// File copy failed
    #[error("failed to copy {} to {}: {source}", from.display(), to.display())]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Modification time could not be read or written
    #[error("failed to transfer modification time to {}: {source}", path.display())]
    Timestamp {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// External tool could not be started
    #[error("failed to launch {}: {source}", tool.display())]
    ToolLaunch {
        tool: PathBuf,
        #[source]
        source: io::Error,
    },

    /// External tool exited with a non-recoverable status
    #[error("{tool} returned error ({})", describe_exit(*code))]
    ToolFailed { tool: String, code: Option<i32> },
}

/// Result alias for operations scoped to one command
pub type CommandResult<T> = Result<T, CommandError>;

fn describe_exit(code: Option<i32>) -> String {
    code.map(|c| format!("exit code {}", c))
        .unwrap_or_else(|| "terminated by signal".to_string())
}
