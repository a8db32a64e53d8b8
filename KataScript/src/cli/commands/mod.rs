use clap::Subcommand;
use std::path::PathBuf;

mod execute;
pub mod script;

#[derive(Subcommand)]
pub enum Commands {
    /// Dump the text of a script to a line-based file (plus a .debug report)
    Dump {
        /// Source script
        script: PathBuf,

        /// Output text file; the report goes to <TEXT>.debug
        text: PathBuf,

        /// TOML profile overriding the text category rules
        #[arg(short, long)]
        profile: Option<PathBuf>,
    },

    /// Inject translated lines into a script, relocating jumps
    Inject {
        /// Original script the text was dumped from
        script: PathBuf,

        /// Translated text file, one line per dumped line
        text: PathBuf,

        /// Output script
        output: PathBuf,
    },

    /// Show what a script contains
    Info {
        /// Script to inspect
        script: PathBuf,
    },

    /// Check that dumping and re-injecting a script reproduces it exactly
    Verify {
        /// Script to check
        script: PathBuf,

        /// TOML profile overriding the text category rules
        #[arg(short, long)]
        profile: Option<PathBuf>,
    },
}
