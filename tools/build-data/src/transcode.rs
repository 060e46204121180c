//! External transcoder invocation
//!
//! Encoders run as blocking subprocesses behind the [`ProcessRunner`] seam. The
//! exit code is classified into a [`ToolExit`]: the Ogg encoder's "already
//! mono" status when down-mixing is a retry without `--downmix`, not a failure.
//! MP3 input goes through an intermediate WAV file that is removed on every
//! exit path.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::config::BuildConfig;
use crate::error::{CommandError, CommandResult};

/// Encoder exit code meaning "input is already mono" when `--downmix` was given
pub const ALREADY_MONO_EXIT_CODE: i32 = 1;

/// One external process launch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodeJob {
    pub executable: PathBuf,
    pub arguments: Vec<OsString>,
    pub source: PathBuf,
    pub target: PathBuf,
}

impl TranscodeJob {
    /// Command line for logging
    fn command_line(&self) -> String {
        let mut line = self.executable.display().to_string();
        for arg in &self.arguments {
            line.push(' ');
            line.push_str(&arg.to_string_lossy());
        }
        line
    }

    /// Executable file name, used in error messages
    fn tool_name(&self) -> String {
        self.executable
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.executable.display().to_string())
    }
}

/// Runs a job to completion and reports its exit code
pub trait ProcessRunner {
    /// Returns the exit code, or `None` if the process was killed by a signal
    fn run(&self, job: &TranscodeJob) -> io::Result<Option<i32>>;
}

/// Launches real subprocesses, inheriting stdout and stderr
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, job: &TranscodeJob) -> io::Result<Option<i32>> {
        let status = Command::new(&job.executable)
            .args(&job.arguments)
            .status()?;
        Ok(status.code())
    }
}

/// Classified transcoder exit status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolExit {
    Success,
    /// Down-mix requested on a mono input; retry without down-mix
    AlreadyMono,
    Failed(Option<i32>),
}

impl ToolExit {
    pub fn classify(code: Option<i32>, downmix: bool) -> Self {
        match code {
            Some(0) => Self::Success,
            Some(ALREADY_MONO_EXIT_CODE) if downmix => Self::AlreadyMono,
            other => Self::Failed(other),
        }
    }
}

/// Intermediate file deleted when dropped
struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                "Failed to remove intermediate file {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}

/// Audio transcoding through the external encoder binaries
pub struct Transcoder<R> {
    ogg_encoder: PathBuf,
    mp3_decoder: PathBuf,
    quality: u8,
    runner: R,
}

impl<R: ProcessRunner> Transcoder<R> {
    pub fn new(config: &BuildConfig, runner: R) -> Self {
        let ogg_encoder = config.tool_path(&config.tools.ogg_encoder);
        let mp3_decoder = config.tool_path(&config.tools.mp3_decoder);
        tracing::debug!("Ogg encoder: {}", ogg_encoder.display());
        tracing::debug!("MP3 decoder: {}", mp3_decoder.display());

        Self {
            ogg_encoder,
            mp3_decoder,
            quality: config.tools.quality,
            runner,
        }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Build the encoder job for a WAV file
    pub fn ogg_job(&self, source: &Path, target: &Path, downmix: bool) -> TranscodeJob {
        let mut arguments: Vec<OsString> = Vec::new();
        if downmix {
            arguments.push("--downmix".into());
        }
        arguments.push("--quality".into());
        arguments.push(self.quality.to_string().into());

        let mut output = OsString::from("--output=");
        output.push(target);
        arguments.push(output);
        arguments.push(source.into());

        TranscodeJob {
            executable: self.ogg_encoder.clone(),
            arguments,
            source: source.to_path_buf(),
            target: target.to_path_buf(),
        }
    }

    /// Build the decoder job for an MP3 file
    pub fn wave_job(&self, source: &Path, target: &Path) -> TranscodeJob {
        let mut output = OsString::from("--output=wave:");
        output.push(target);

        TranscodeJob {
            executable: self.mp3_decoder.clone(),
            arguments: vec![output, source.into()],
            source: source.to_path_buf(),
            target: target.to_path_buf(),
        }
    }

    fn launch(&self, job: &TranscodeJob) -> CommandResult<Option<i32>> {
        tracing::debug!("Running {}", job.command_line());
        self.runner
            .run(job)
            .map_err(|source| CommandError::ToolLaunch {
                tool: job.executable.clone(),
                source,
            })
    }

    /// Encode a WAV file to Ogg Vorbis.
    ///
    /// If down-mixing is requested and the encoder reports a mono input, the
    /// file is encoded once more without down-mixing.
    pub fn wave_to_ogg(&self, source: &Path, target: &Path, downmix: bool) -> CommandResult<()> {
        let job = self.ogg_job(source, target, downmix);
        let code = self.launch(&job)?;

        match ToolExit::classify(code, downmix) {
            ToolExit::Success => Ok(()),
            ToolExit::AlreadyMono => {
                println!(
                    "Wave file {} is already mono, not downmixing...",
                    source.display()
                );
                self.wave_to_ogg(source, target, false)
            }
            ToolExit::Failed(code) => Err(CommandError::ToolFailed {
                tool: job.tool_name(),
                code,
            }),
        }
    }

    /// Decode an MP3 file to WAV
    pub fn mp3_to_wave(&self, source: &Path, target: &Path) -> CommandResult<()> {
        let job = self.wave_job(source, target);
        match self.launch(&job)? {
            Some(0) => Ok(()),
            code => Err(CommandError::ToolFailed {
                tool: job.tool_name(),
                code,
            }),
        }
    }

    /// Decode an MP3 file and encode the result to Ogg Vorbis.
    ///
    /// The intermediate WAV sits next to `target` and is always removed.
    pub fn mp3_to_ogg(&self, source: &Path, target: &Path) -> CommandResult<()> {
        let scratch = ScratchFile::new(target.with_extension("wav"));
        self.mp3_to_wave(source, &scratch.path)?;
        self.wave_to_ogg(&scratch.path, target, false)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use tempfile::tempdir;

    /// Records every job and answers with scripted exit codes.
    ///
    /// Successful jobs write a small file at the path given by `--output=`,
    /// like the real tools would.
    #[derive(Default)]
    pub(crate) struct FakeRunner {
        pub(crate) jobs: RefCell<Vec<TranscodeJob>>,
        pub(crate) exit_codes: RefCell<VecDeque<Option<i32>>>,
    }

    impl FakeRunner {
        pub(crate) fn with_exit_codes(codes: &[Option<i32>]) -> Self {
            Self {
                jobs: RefCell::default(),
                exit_codes: RefCell::new(codes.iter().copied().collect()),
            }
        }

        pub(crate) fn job_count(&self) -> usize {
            self.jobs.borrow().len()
        }

        pub(crate) fn arguments(&self, index: usize) -> Vec<String> {
            self.jobs.borrow()[index]
                .arguments
                .iter()
                .map(|a| a.to_string_lossy().into_owned())
                .collect()
        }
    }

    impl ProcessRunner for FakeRunner {
        fn run(&self, job: &TranscodeJob) -> io::Result<Option<i32>> {
            self.jobs.borrow_mut().push(job.clone());
            let code = self.exit_codes.borrow_mut().pop_front().unwrap_or(Some(0));
            if code == Some(0) {
                fs::write(&job.target, b"encoded")?;
            }
            Ok(code)
        }
    }

    struct MissingBinary;

    impl ProcessRunner for MissingBinary {
        fn run(&self, _job: &TranscodeJob) -> io::Result<Option<i32>> {
            Err(io::Error::new(io::ErrorKind::NotFound, "no such file"))
        }
    }

    fn config(tools_root: &Path) -> BuildConfig {
        BuildConfig::new("data.cfg", "src", "out", tools_root)
    }

    #[test]
    fn test_classify_exit_codes() {
        assert_eq!(ToolExit::classify(Some(0), true), ToolExit::Success);
        assert_eq!(ToolExit::classify(Some(0), false), ToolExit::Success);
        assert_eq!(ToolExit::classify(Some(1), true), ToolExit::AlreadyMono);
        assert_eq!(ToolExit::classify(Some(1), false), ToolExit::Failed(Some(1)));
        assert_eq!(ToolExit::classify(Some(2), true), ToolExit::Failed(Some(2)));
        assert_eq!(ToolExit::classify(None, true), ToolExit::Failed(None));
    }

    #[test]
    fn test_ogg_job_arguments() {
        let dir = tempdir().unwrap();
        let transcoder = Transcoder::new(&config(dir.path()), FakeRunner::default());
        let job = transcoder.ogg_job(Path::new("in.wav"), Path::new("out.ogg"), false);
        let args: Vec<_> = job.arguments.iter().map(|a| a.to_string_lossy()).collect();
        assert_eq!(args, vec!["--quality", "4", "--output=out.ogg", "in.wav"]);

        let job = transcoder.ogg_job(Path::new("in.wav"), Path::new("out.ogg"), true);
        assert_eq!(job.arguments[0], OsString::from("--downmix"));
        assert_eq!(job.arguments.len(), 5);
    }

    #[test]
    fn test_wave_job_arguments() {
        let dir = tempdir().unwrap();
        let transcoder = Transcoder::new(&config(dir.path()), FakeRunner::default());
        let job = transcoder.wave_job(Path::new("theme.mp3"), Path::new("theme.wav"));
        let args: Vec<_> = job.arguments.iter().map(|a| a.to_string_lossy()).collect();
        assert_eq!(args, vec!["--output=wave:theme.wav", "theme.mp3"]);
    }

    #[test]
    fn test_quality_from_settings() {
        let dir = tempdir().unwrap();
        let settings = crate::config::ToolSettings {
            quality: 7,
            ..Default::default()
        };
        let transcoder = Transcoder::new(
            &config(dir.path()).with_tools(settings),
            FakeRunner::default(),
        );
        let job = transcoder.ogg_job(Path::new("a.wav"), Path::new("a.ogg"), false);
        assert_eq!(job.arguments[1], OsString::from("7"));
    }

    #[test]
    fn test_mono_fallback_retries_once_without_downmix() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("voice.ogg");
        let runner = FakeRunner::with_exit_codes(&[Some(1), Some(0)]);
        let transcoder = Transcoder::new(&config(dir.path()), runner);

        transcoder
            .wave_to_ogg(&dir.path().join("voice.wav"), &target, true)
            .unwrap();

        let runner = transcoder.runner();
        assert_eq!(runner.job_count(), 2);
        assert_eq!(runner.arguments(0)[0], "--downmix");
        assert!(!runner.arguments(1).iter().any(|a| a == "--downmix"));
        assert!(target.exists());
    }

    #[test]
    fn test_exit_one_after_retry_is_failure() {
        let dir = tempdir().unwrap();
        let runner = FakeRunner::with_exit_codes(&[Some(1), Some(1)]);
        let transcoder = Transcoder::new(&config(dir.path()), runner);

        let err = transcoder
            .wave_to_ogg(
                &dir.path().join("voice.wav"),
                &dir.path().join("voice.ogg"),
                true,
            )
            .unwrap_err();
        assert!(matches!(err, CommandError::ToolFailed { code: Some(1), .. }));
        assert_eq!(transcoder.runner().job_count(), 2);
    }

    #[test]
    fn test_exit_one_without_downmix_is_failure() {
        let dir = tempdir().unwrap();
        let runner = FakeRunner::with_exit_codes(&[Some(1)]);
        let transcoder = Transcoder::new(&config(dir.path()), runner);

        let err = transcoder
            .wave_to_ogg(&dir.path().join("a.wav"), &dir.path().join("a.ogg"), false)
            .unwrap_err();
        assert!(err.to_string().contains("oggenc2 returned error"));
        assert_eq!(transcoder.runner().job_count(), 1);
    }

    #[test]
    fn test_other_exit_code_with_downmix_is_failure() {
        let dir = tempdir().unwrap();
        let runner = FakeRunner::with_exit_codes(&[Some(2)]);
        let transcoder = Transcoder::new(&config(dir.path()), runner);

        let result =
            transcoder.wave_to_ogg(&dir.path().join("a.wav"), &dir.path().join("a.ogg"), true);
        assert!(matches!(
            result,
            Err(CommandError::ToolFailed { code: Some(2), .. })
        ));
        assert_eq!(transcoder.runner().job_count(), 1);
    }

    #[test]
    fn test_launch_failure() {
        let dir = tempdir().unwrap();
        let transcoder = Transcoder::new(&config(dir.path()), MissingBinary);
        let err = transcoder
            .wave_to_ogg(Path::new("a.wav"), Path::new("a.ogg"), false)
            .unwrap_err();
        assert!(matches!(err, CommandError::ToolLaunch { .. }));
    }

    #[test]
    fn test_mp3_pipeline_removes_intermediate() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("theme.ogg");
        let transcoder = Transcoder::new(&config(dir.path()), FakeRunner::default());

        transcoder
            .mp3_to_ogg(&dir.path().join("theme.mp3"), &target)
            .unwrap();

        let runner = transcoder.runner();
        assert_eq!(runner.job_count(), 2);
        let wave = dir.path().join("theme.wav");
        assert_eq!(runner.jobs.borrow()[0].target, wave);
        assert_eq!(runner.jobs.borrow()[1].source, wave);
        assert!(!runner.arguments(1).iter().any(|a| a == "--downmix"));
        assert!(target.exists());
        assert!(!wave.exists());
    }

    #[test]
    fn test_mp3_pipeline_removes_intermediate_on_encoder_failure() {
        let dir = tempdir().unwrap();
        let runner = FakeRunner::with_exit_codes(&[Some(0), Some(5)]);
        let transcoder = Transcoder::new(&config(dir.path()), runner);

        let err = transcoder
            .mp3_to_ogg(&dir.path().join("theme.mp3"), &dir.path().join("theme.ogg"))
            .unwrap_err();
        assert!(matches!(err, CommandError::ToolFailed { code: Some(5), .. }));
        assert!(!dir.path().join("theme.wav").exists());
    }

    #[test]
    fn test_mp3_decoder_failure_skips_encoder() {
        let dir = tempdir().unwrap();
        let runner = FakeRunner::with_exit_codes(&[Some(1)]);
        let transcoder = Transcoder::new(&config(dir.path()), runner);

        let err = transcoder
            .mp3_to_ogg(&dir.path().join("theme.mp3"), &dir.path().join("theme.ogg"))
            .unwrap_err();
        assert!(err.to_string().contains("madplay returned error"));
        assert_eq!(transcoder.runner().job_count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_system_runner_reports_exit_code() {
        let job = TranscodeJob {
            executable: PathBuf::from("sh"),
            arguments: vec!["-c".into(), "exit 3".into()],
            source: PathBuf::new(),
            target: PathBuf::new(),
        };
        assert_eq!(SystemRunner.run(&job).unwrap(), Some(3));
    }
}
