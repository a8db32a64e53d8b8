//! File-level dump, inject, inspect and verify
//!
//! Every operation reads its inputs fully into memory, works on the buffers
//! and only then writes its outputs. Outputs go to a temporary file in the
//! destination directory that is renamed into place, so a failed run never
//! leaves a truncated file behind.

use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::config::TagRules;
use crate::error::{Error, FilePurpose, Result};
use crate::formats::script::decoder::ScriptSummary;
use crate::formats::script::{
    InjectOutput, decode_script, dump_script, inject_script, parse_translation_lines,
};

/// Extension appended to the text output path for the debug report.
pub const DEBUG_EXTENSION: &str = ".debug";

/// Summary of a finished dump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpReport {
    pub text_path: PathBuf,
    pub debug_path: PathBuf,
    /// Number of text lines written.
    pub lines: usize,
    /// Number of decoded units.
    pub units: usize,
}

/// Outcome of an in-memory dump/inject round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyReport {
    /// Size of the original script.
    pub size: usize,
    /// Size of the re-injected script.
    pub rebuilt_size: usize,
    /// Number of dumped lines.
    pub lines: usize,
    /// First address at which the two scripts differ.
    pub first_difference: Option<usize>,
}

impl VerifyReport {
    pub fn is_identical(&self) -> bool {
        self.first_difference.is_none()
    }
}

/// Path of the debug report written next to `text_path`.
pub fn debug_path_for(text_path: &Path) -> PathBuf {
    let mut name = OsString::from(text_path.as_os_str());
    name.push(DEBUG_EXTENSION);
    PathBuf::from(name)
}

fn read_input(path: &Path, purpose: FilePurpose) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| Error::file_access(path, purpose, e))
}

/// Write `bytes` to `path` through a temporary file in the same directory.
///
/// # Errors
///
/// Returns [`Error::FileAccess`] if the temporary file cannot be created,
/// written or moved into place.
pub fn write_atomically(path: &Path, bytes: &[u8], purpose: FilePurpose) -> Result<()> {
    let file = stage(path, bytes, purpose)?;
    commit(file, path, purpose)
}

/// Write `bytes` to a temporary file next to `path` without touching `path`.
fn stage(path: &Path, bytes: &[u8], purpose: FilePurpose) -> Result<NamedTempFile> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file =
        NamedTempFile::new_in(dir).map_err(|e| Error::file_access(path, purpose, e))?;
    file.write_all(bytes)
        .and_then(|()| file.flush())
        .map_err(|e| Error::file_access(path, purpose, e))?;
    tracing::debug!("Staged {} bytes for {}", bytes.len(), path.display());
    Ok(file)
}

/// Move a staged file into place.
fn commit(file: NamedTempFile, path: &Path, purpose: FilePurpose) -> Result<()> {
    file.persist(path)
        .map_err(|e| Error::file_access(path, purpose, e.error))?;
    tracing::debug!("Wrote {}", path.display());
    Ok(())
}

/// Dump the script at `script_path` to `text_path`, plus a debug report at
/// `<text_path>.debug`.
///
/// Nothing is written if the script fails to decode. Both outputs are staged
/// before either is moved into place, and the text file is removed again if
/// the debug report cannot be committed.
pub fn dump_file(script_path: &Path, text_path: &Path, rules: &TagRules) -> Result<DumpReport> {
    let data = read_input(script_path, FilePurpose::ScriptInput)?;
    let output = dump_script(&data, rules)?;

    let debug_path = debug_path_for(text_path);
    let text_file = stage(text_path, &output.text, FilePurpose::TextOutput)?;
    let debug_file = stage(&debug_path, &output.debug, FilePurpose::DebugOutput)?;

    commit(text_file, text_path, FilePurpose::TextOutput)?;
    if let Err(err) = commit(debug_file, &debug_path, FilePurpose::DebugOutput) {
        if let Err(remove_err) = std::fs::remove_file(text_path) {
            tracing::warn!(
                "Could not remove {} after a failed dump: {remove_err}",
                text_path.display()
            );
        }
        return Err(err);
    }

    Ok(DumpReport {
        text_path: text_path.to_path_buf(),
        debug_path,
        lines: output.lines,
        units: output.units,
    })
}

/// Inject the lines of `text_path` into the script at `script_path` and write
/// the result to `output_path`.
///
/// The output file is only created once injection and relocation succeed.
pub fn inject_file(script_path: &Path, text_path: &Path, output_path: &Path) -> Result<InjectOutput> {
    let data = read_input(script_path, FilePurpose::ScriptInput)?;
    let text = read_input(text_path, FilePurpose::TranslationInput)?;
    let lines = parse_translation_lines(&text);
    tracing::debug!("Read {} translation lines from {}", lines.len(), text_path.display());

    let output = inject_script(&data, &lines)?;
    write_atomically(output_path, &output.script, FilePurpose::ScriptOutput)?;
    Ok(output)
}

/// Decode the script at `script_path` and count what it contains.
pub fn inspect_file(script_path: &Path) -> Result<ScriptSummary> {
    let data = read_input(script_path, FilePurpose::ScriptInput)?;
    let commands = decode_script(&data)?;
    Ok(ScriptSummary::from_commands(&data, &commands))
}

/// Dump `data` and inject the untouched dump back into it.
pub fn verify_script(data: &[u8], rules: &TagRules) -> Result<VerifyReport> {
    let dump = dump_script(data, rules)?;
    let lines = parse_translation_lines(&dump.text);
    let rebuilt = inject_script(data, &lines)?;

    let first_difference = data
        .iter()
        .zip(&rebuilt.script)
        .position(|(a, b)| a != b)
        .or_else(|| {
            (data.len() != rebuilt.script.len()).then_some(data.len().min(rebuilt.script.len()))
        });

    Ok(VerifyReport {
        size: data.len(),
        rebuilt_size: rebuilt.script.len(),
        lines: dump.lines,
        first_difference,
    })
}

/// [`verify_script`] on the script at `script_path`.
pub fn verify_file(script_path: &Path, rules: &TagRules) -> Result<VerifyReport> {
    let data = read_input(script_path, FilePurpose::ScriptInput)?;
    verify_script(&data, rules)
}
