//! Build configuration
//!
//! [`BuildConfig`] is assembled once by the CLI and passed by reference to the
//! interpreter and transcoder. [`ToolSettings`] optionally comes from a TOML
//! file next to the script:
//!
//! ```toml
//! ogg_encoder = "oggenc"
//! mp3_decoder = "madplay"
//! quality = 4
//! ```

use serde::Deserialize;
use std::env::consts::EXE_SUFFIX;
use std::path::{Path, PathBuf};

use crate::error::ScriptError;

/// Immutable settings for one build run
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Command script to execute
    pub script_path: PathBuf,
    /// Root that source wildcards are resolved against
    pub source_root: PathBuf,
    /// Root that outputs are written below
    pub output_root: PathBuf,
    /// Directory searched first for the external encoder binaries
    pub tools_root: PathBuf,
    pub tools: ToolSettings,
}

impl BuildConfig {
    pub fn new(
        script_path: impl Into<PathBuf>,
        source_root: impl Into<PathBuf>,
        output_root: impl Into<PathBuf>,
        tools_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            script_path: script_path.into(),
            source_root: source_root.into(),
            output_root: output_root.into(),
            tools_root: tools_root.into(),
            tools: ToolSettings::default(),
        }
    }

    pub fn with_tools(mut self, tools: ToolSettings) -> Self {
        self.tools = tools;
        self
    }

    /// Locate an external tool.
    ///
    /// Looks in `tools_root` first, then on `PATH`. If neither has it the
    /// `tools_root` path is returned so the launch error names it.
    pub fn tool_path(&self, name: &str) -> PathBuf {
        let bundled = self.tools_root.join(format!("{}{}", name, EXE_SUFFIX));
        if bundled.is_file() {
            return bundled;
        }

        match which::which(name) {
            Ok(path) => path,
            Err(_) => bundled,
        }
    }
}

/// Names and options of the external transcoders
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolSettings {
    /// WAV to Ogg Vorbis encoder
    pub ogg_encoder: String,
    /// MP3 to WAV decoder
    pub mp3_decoder: String,
    /// Vorbis quality level passed to the encoder
    pub quality: u8,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            ogg_encoder: "oggenc2".to_string(),
            mp3_decoder: "madplay".to_string(),
            quality: 4,
        }
    }
}

impl ToolSettings {
    /// Parse settings from TOML text
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load settings from a TOML file
    pub fn load(path: &Path) -> Result<Self, ScriptError> {
        let settings_error = |message: String| ScriptError::Settings {
            path: path.to_path_buf(),
            message,
        };

        let content = std::fs::read_to_string(path).map_err(|e| settings_error(e.to_string()))?;
        Self::parse(&content).map_err(|e| settings_error(e.to_string()))
    }
}
