//! build-data library
//!
//! Command-script interpreter and incremental build engine for staging raw game
//! assets into a shippable data tree. Scripts are read line by line, each line
//! names a verb and a source wildcard, and every matched file is copied or
//! transcoded into the output tree only when it is stale.

pub mod config;
pub mod error;
pub mod fileset;
pub mod interpreter;
pub mod paths;
pub mod script;
pub mod staleness;
pub mod tokenizer;
pub mod transcode;

pub use config::{BuildConfig, ToolSettings};
pub use error::{CommandError, CommandResult, ScriptError};
pub use fileset::{resolve, wildcard_match, FileSetSpec};
pub use interpreter::{
    validate_source, CommandReport, FileOutcome, Interpreter, RunReport, ScriptIssue,
};
pub use script::{parse_line, parse_script, strip_comments, ScriptCommand, Verb};
pub use staleness::{decide, needs_rebuild, BuildDecision};
pub use tokenizer::split_parameters;
pub use transcode::{ProcessRunner, SystemRunner, ToolExit, TranscodeJob, Transcoder};
