//! Script interpreter
//!
//! Executes script commands strictly in order. Each command resolves its source
//! wildcard, then builds every stale file into the output tree at the same
//! relative path. A failing command is reported and the run moves on; only an
//! unreadable script stops the run.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::BuildConfig;
use crate::error::{CommandError, CommandResult, ScriptError};
use crate::fileset;
use crate::paths::{
    copy_modified_time, display_output, display_source, ensure_parent_dir, output_relative,
};
use crate::script::{parse_script, ScriptCommand, Verb};
use crate::staleness::{decide, BuildDecision};
use crate::transcode::{ProcessRunner, Transcoder};

/// Result of one resolved file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOutcome {
    /// Path relative to the source root
    pub relative: PathBuf,
    /// Path relative to the output root
    pub output: PathBuf,
    pub decision: BuildDecision,
}

/// Result of one script command
#[derive(Debug)]
pub struct CommandReport {
    pub line: usize,
    pub verb: String,
    /// Files completed before the command finished or failed
    pub files: Vec<FileOutcome>,
    pub error: Option<CommandError>,
}

impl CommandReport {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Summary of a whole script run
#[derive(Debug, Default)]
pub struct RunReport {
    pub commands: Vec<CommandReport>,
}

impl RunReport {
    /// Files that were copied or transcoded
    pub fn rebuilt_count(&self) -> usize {
        self.count_files(BuildDecision::Rebuild)
    }

    /// Files skipped as already current
    pub fn up_to_date_count(&self) -> usize {
        self.count_files(BuildDecision::UpToDate)
    }

    /// Commands that reported an error
    pub fn failed_count(&self) -> usize {
        self.commands.iter().filter(|c| !c.succeeded()).count()
    }

    fn count_files(&self, decision: BuildDecision) -> usize {
        self.commands
            .iter()
            .flat_map(|c| &c.files)
            .filter(|f| f.decision == decision)
            .count()
    }
}

/// Problem found by [`validate_source`]
#[derive(Debug)]
pub struct ScriptIssue {
    pub line: usize,
    pub error: CommandError,
}

/// Look up the verb of a command and check its parameter count
fn check_command(command: &ScriptCommand) -> CommandResult<Verb> {
    let verb =
        Verb::parse(&command.verb).ok_or_else(|| CommandError::UnknownVerb(command.verb.clone()))?;

    if command.parameters.len() != verb.arity() {
        return Err(CommandError::ParameterCount {
            verb: command.verb.clone(),
            expected: verb.arity(),
            found: command.parameters.len(),
        });
    }

    Ok(verb)
}

/// Check every command of a script without touching the filesystem
pub fn validate_source(text: &str) -> Vec<ScriptIssue> {
    parse_script(text)
        .iter()
        .filter_map(|command| {
            check_command(command).err().map(|error| ScriptIssue {
                line: command.line,
                error,
            })
        })
        .collect()
}

/// Executes build scripts against one [`BuildConfig`]
pub struct Interpreter<'a, R> {
    config: &'a BuildConfig,
    transcoder: Transcoder<R>,
}

impl<'a, R: ProcessRunner> Interpreter<'a, R> {
    pub fn new(config: &'a BuildConfig, runner: R) -> Self {
        Self {
            config,
            transcoder: Transcoder::new(config, runner),
        }
    }

    pub fn transcoder(&self) -> &Transcoder<R> {
        &self.transcoder
    }

    /// Read and run the configured script
    pub fn run_script(&self) -> Result<RunReport, ScriptError> {
        let path = &self.config.script_path;
        let text = fs::read_to_string(path).map_err(|source| ScriptError::Read {
            path: path.clone(),
            source,
        })?;
        Ok(self.run_source(&text))
    }

    /// Run script text. Never fails: command errors end up in the report.
    pub fn run_source(&self, text: &str) -> RunReport {
        let mut report = RunReport::default();

        for command in parse_script(text) {
            let mut files = Vec::new();
            let result = self.execute(&command, &mut files);
            if let Err(e) = &result {
                println!("Error executing command [{}]: {}", command.verb, e);
            }
            println!();

            report.commands.push(CommandReport {
                line: command.line,
                verb: command.verb,
                files,
                error: result.err(),
            });
        }

        println!("Done.");
        report
    }

    fn execute(&self, command: &ScriptCommand, files: &mut Vec<FileOutcome>) -> CommandResult<()> {
        let verb = check_command(command)?;
        let wildcard = &command.parameters[0];
        let label = &command.parameters[1];

        let file_list = fileset::resolve(wildcard, &self.config.source_root)?;

        let title = match verb {
            Verb::Copy => "Copy",
            Verb::WaveToOgg => "Convert Wave to Ogg Vorbis",
            Verb::WaveToOggMono => "Convert Wave to Ogg Vorbis, downmix to mono",
            Verb::Mp3ToOgg => "Convert mp3 to Ogg Vorbis",
        };
        println!(
            "{} [{}, {} files] => [{}]",
            title,
            display_source(Path::new(wildcard)),
            file_list.len(),
            display_output(Path::new(label))
        );

        for relative in file_list {
            let output = output_relative(&relative, verb.output_extension());
            let source = self.config.source_root.join(&relative);
            let target = self.config.output_root.join(&output);

            ensure_parent_dir(&target)?;

            let decision = decide(&source, &target);
            println!(
                "  [{}] => [{}]{}",
                display_source(&relative),
                display_output(&output),
                match decision {
                    BuildDecision::Rebuild => "",
                    BuildDecision::UpToDate => " -> already up-to date",
                }
            );

            if decision.is_rebuild() {
                self.build(verb, &source, &target)?;
            }

            files.push(FileOutcome {
                relative,
                output,
                decision,
            });
        }

        Ok(())
    }

    fn build(&self, verb: Verb, source: &Path, target: &Path) -> CommandResult<()> {
        match verb {
            Verb::Copy => {
                fs::copy(source, target).map_err(|e| CommandError::Copy {
                    from: source.to_path_buf(),
                    to: target.to_path_buf(),
                    source: e,
                })?;
            }
            Verb::WaveToOgg => self.transcoder.wave_to_ogg(source, target, false)?,
            Verb::WaveToOggMono => self.transcoder.wave_to_ogg(source, target, true)?,
            Verb::Mp3ToOgg => self.transcoder.mp3_to_ogg(source, target)?,
        }

        // Outputs carry the source timestamp so the next run sees them as current
        copy_modified_time(source, target)
    }
}
