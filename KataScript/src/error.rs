//! Error types for `KataScript`

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// What a file was being opened or written for.
///
/// Carried by [`Error::FileAccess`] so an operator can tell which of the
/// several paths handed to a command was the problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilePurpose {
    /// The original bytecode script.
    ScriptInput,
    /// The translated text stream fed to inject.
    TranslationInput,
    /// The dump text stream.
    TextOutput,
    /// The `.debug` report written next to the dump.
    DebugOutput,
    /// The re-encoded bytecode script.
    ScriptOutput,
    /// A TOML dump profile.
    Profile,
}

impl fmt::Display for FilePurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::ScriptInput => "script input",
            Self::TranslationInput => "translation input",
            Self::TextOutput => "text output",
            Self::DebugOutput => "debug output",
            Self::ScriptOutput => "script output",
            Self::Profile => "dump profile",
        };
        f.write_str(label)
    }
}

/// The error type for `KataScript` operations.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum Error {
    // ==================== IO Errors ====================
    /// IO error from file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A file could not be read or written.
    #[error("cannot access {purpose} file {}: {source}", path.display())]
    FileAccess {
        /// The path that failed.
        path: PathBuf,
        /// What the file was for.
        purpose: FilePurpose,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    // ==================== Script Format Errors ====================
    /// A byte that starts no known unit (terminator, instruction or raw text).
    #[error("unknown unit tag {tag:#04x} at {address:#x}")]
    UnknownUnitTag {
        /// The offending byte.
        tag: u8,
        /// Its address in the script.
        address: usize,
    },

    /// An operand tag missing from the opcode table.
    #[error("unknown operand tag {tag:#04x} at {address:#x}")]
    UnknownOperandTag {
        /// The offending tag byte.
        tag: u8,
        /// Its address in the script.
        address: usize,
    },

    /// A unit or operand runs past the end of the script.
    #[error("unexpected end of script: {needed} byte(s) needed at {address:#x}")]
    UnexpectedEof {
        /// Where the read started.
        address: usize,
        /// How many bytes the read wanted.
        needed: usize,
    },

    // ==================== Translation Errors ====================
    /// A text-bearing unit was reached after every translation line was used.
    #[error("not enough translation lines: ran out at unit {address:#x} after {consumed} line(s)")]
    TranslationExhausted {
        /// Original address of the unit left without a line.
        address: usize,
        /// Number of lines consumed before running out.
        consumed: usize,
    },

    /// A relocated jump no longer fits the 32-bit operand.
    #[error("relocated jump at {site:#x} is out of range: {value}")]
    JumpOutOfRange {
        /// Output address of the jump operand.
        site: usize,
        /// The corrected value that did not fit.
        value: i64,
    },

    // ==================== Configuration Errors ====================
    /// A dump profile could not be parsed.
    #[error("invalid dump profile: {0}")]
    Config(#[from] toml::de::Error),
}

impl Error {
    /// Wrap an IO error with the path and purpose of the file involved.
    pub fn file_access(path: impl Into<PathBuf>, purpose: FilePurpose, source: std::io::Error) -> Self {
        Error::FileAccess {
            path: path.into(),
            purpose,
            source,
        }
    }
}

/// A specialized Result type for `KataScript` operations.
pub type Result<T> = std::result::Result<T, Error>;
