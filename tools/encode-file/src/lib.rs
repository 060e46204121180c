//! encode-file library
//!
//! XOR obfuscation of built data files with a fixed repeating key. The
//! transform is its own inverse, so the same key decodes the output.

use anyhow::{Context, Result};
use rand::Rng;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use build_data::wildcard_match;

/// Length of the repeating key
pub const KEY_LEN: usize = 19;

/// Key baked into the game client
pub const ENCODE_KEY: [u8; KEY_LEN] = [
    240, 59, 117, 142, 148, 192, 244, 244, 25, 47, 54, 229, 223, 162, 66, 201, 28, 251, 16,
];

/// Suffix appended to the file name of encoded outputs
pub const ENCODED_SUFFIX: &str = "x";

const BUFFER_SIZE: usize = 1024;

/// Repeating-key XOR state. The key position carries over between calls.
#[derive(Debug, Clone)]
pub struct XorCipher<'k> {
    key: &'k [u8; KEY_LEN],
    position: usize,
}

impl<'k> XorCipher<'k> {
    pub fn new(key: &'k [u8; KEY_LEN]) -> Self {
        Self { key, position: 0 }
    }

    pub fn apply(&mut self, buffer: &mut [u8]) {
        for byte in buffer {
            *byte ^= self.key[self.position];
            self.position = (self.position + 1) % KEY_LEN;
        }
    }
}

/// Copy `input` to `output`, XORing every byte. Returns the byte count.
pub fn encode_stream<R: Read, W: Write>(
    input: R,
    output: W,
    key: &[u8; KEY_LEN],
) -> io::Result<u64> {
    let mut input = input;
    let mut output = output;
    let mut cipher = XorCipher::new(key);
    let mut buffer = [0u8; BUFFER_SIZE];
    let mut total = 0u64;

    loop {
        let read = match input.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        cipher.apply(&mut buffer[..read]);
        output.write_all(&buffer[..read])?;
        total += read as u64;
    }

    output.flush()?;
    Ok(total)
}

/// Encode one file into `target`
pub fn encode_file(source: &Path, target: &Path, key: &[u8; KEY_LEN]) -> Result<u64> {
    let input = File::open(source)
        .with_context(|| format!("Failed to open: {}", source.display()))?;
    let output = File::create(target)
        .with_context(|| format!("Failed to create: {}", target.display()))?;

    encode_stream(BufReader::new(input), BufWriter::new(output), key)
        .with_context(|| format!("Failed to encode: {}", source.display()))
}

/// Sibling path the encoded copy of `path` is written to
pub fn encoded_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(ENCODED_SUFFIX);
    PathBuf::from(name)
}

/// Expand a path pattern such as `data/levels/*.dat` recursively.
///
/// The directory part is searched, the file-name part may hold `*` and `?`.
pub fn expand_pattern(pattern: &Path) -> Result<Vec<PathBuf>> {
    let dir = match pattern.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let file_pattern = pattern
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .with_context(|| format!("Pattern has no file name: {}", pattern.display()))?;

    if !dir.is_dir() {
        anyhow::bail!("Directory not found: {}", dir.display());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).follow_links(true) {
        let entry = entry.with_context(|| format!("Failed to list: {}", dir.display()))?;
        if entry.file_type().is_file()
            && wildcard_match(&file_pattern, &entry.file_name().to_string_lossy())
        {
            files.push(entry.into_path());
        }
    }

    files.sort();
    Ok(files)
}

/// Encode every file matched by `patterns`. Returns the written paths.
pub fn encode_patterns(patterns: &[PathBuf], key: &[u8; KEY_LEN]) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();

    for pattern in patterns {
        for source in expand_pattern(pattern)? {
            let target = encoded_path(&source);
            println!("Encoding file {}", target.display());
            let bytes = encode_file(&source, &target, key)?;
            tracing::debug!("{} bytes written", bytes);
            written.push(target);
        }
    }

    Ok(written)
}

/// Fresh random key for embedding in the tool and the client
pub fn generate_key<R: Rng>(rng: &mut R) -> [u8; KEY_LEN] {
    let mut key = [0u8; KEY_LEN];
    rng.fill(&mut key[..]);
    key
}

/// Render a key as a comma-separated byte list
pub fn format_key(key: &[u8]) -> String {
    key.iter().map(|b| format!("{}, ", b)).collect()
}
