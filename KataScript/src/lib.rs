//! # KataScript
//!
//! Tools for translating the bytecode scripts of the Katakoi no Tsuki family
//! of visual novels.
//!
//! A script interleaves instructions with text. Text sits either in
//! length-prefixed string operands or in raw runs of printable bytes, and
//! jumps address other units by absolute byte offset. This crate decodes the
//! format, dumps every piece of text to a line-based file, and injects edited
//! lines back at whatever length they now have, fixing up the jumps.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::path::Path;
//! use katascript::config::TagRules;
//! use katascript::operations::{dump_file, inject_file};
//!
//! dump_file(Path::new("scenario.bin"), Path::new("scenario.txt"), &TagRules::default())?;
//! // ... translate scenario.txt ...
//! let output = inject_file(
//!     Path::new("scenario.bin"),
//!     Path::new("scenario.txt"),
//!     Path::new("scenario.new.bin"),
//! )?;
//! println!("Relocated {} jumps", output.jump_sites.len());
//! # Ok::<(), katascript::Error>(())
//! ```
//!
//! ### Working with Buffers
//!
//! ```
//! use katascript::prelude::*;
//!
//! let script = b"!hi\x1A";
//! let dump = dump_script(script, &TagRules::default())?;
//! assert_eq!(dump.text, b"0:::::!hi\n");
//!
//! let lines = parse_translation_lines(b"0:::::hi there\n");
//! let output = inject_script(script, &lines)?;
//! assert_eq!(output.script, b"hi there\x1A");
//! # Ok::<(), katascript::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` - Enables the `katascript` command-line binary

pub mod config;
pub mod error;
pub mod formats;
pub mod operations;

// Re-exports for convenience
pub use error::{Error, Result};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::config::TagRules;
    pub use crate::error::{Error, FilePurpose, Result};
    pub use crate::formats::script::{
        Command, DumpOutput, InjectOutput, InjectWarning, SentenceLedger, decode_script,
        dump_script, inject_script, parse_translation_lines,
    };
    pub use crate::operations::{dump_file, inject_file, inspect_file, verify_file};
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// CLI module (feature-gated)
#[cfg(feature = "cli")]
pub mod cli;
