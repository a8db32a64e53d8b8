//! Command execution implementations

use super::Commands;
use super::script;

impl Commands {
    /// Execute the selected command.
    ///
    /// # Errors
    /// Returns an error if the underlying command fails.
    pub fn execute(&self) -> anyhow::Result<()> {
        match self {
            Commands::Dump {
                script: source,
                text,
                profile,
            } => script::dump(source, text, profile.as_deref()),
            Commands::Inject {
                script: source,
                text,
                output,
            } => script::inject(source, text, output),
            Commands::Info { script: source } => script::info(source),
            Commands::Verify {
                script: source,
                profile,
            } => script::verify(source, profile.as_deref()),
        }
    }
}
