//! Dump profiles
//!
//! Which text category a string operand is tagged with depends on the game
//! the script comes from. The built-in profile matches the Katakoi no Tsuki
//! family; another title can supply its own rules as TOML:
//!
//! ```toml
//! spec3 = [0x1f9]
//! pre_unfinish = [0x1f8]
//!
//! [[spec1]]
//! executor = 0x1c
//! argument_id = 0x02
//! ordinal = 3
//! ```
//!
//! Fields left out of a profile keep their built-in values.

use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, FilePurpose, Result};
use crate::formats::script::ArgumentHeader;
use crate::formats::script::dump::TextCategory;

/// Matches a string operand by where it sits in an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ArgumentRule {
    /// Executor type of the owning instruction.
    pub executor: u16,
    /// Id of the owning argument.
    pub argument_id: u8,
    /// 1-based argument position; any position when absent.
    #[serde(default)]
    pub ordinal: Option<usize>,
}

impl ArgumentRule {
    fn matches(&self, executor: u16, argument: &ArgumentHeader) -> bool {
        self.executor == executor
            && self.argument_id == argument.id
            && self.ordinal.is_none_or(|ordinal| ordinal == argument.ordinal)
    }
}

/// Rules for tagging dumped string operands.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TagRules {
    /// String operands tagged `[Spec1]`.
    pub spec1: Vec<ArgumentRule>,
    /// Executor types whose strings are tagged `[Spec3]`.
    pub spec3: Vec<u16>,
    /// Executor types that emit a `[pre_unfinish]` marker when they start.
    pub pre_unfinish: Vec<u16>,
}

impl Default for TagRules {
    fn default() -> Self {
        Self {
            spec1: vec![
                ArgumentRule {
                    executor: 0x1C,
                    argument_id: 0x02,
                    ordinal: Some(3),
                },
                ArgumentRule {
                    executor: 0x28,
                    argument_id: 0x02,
                    ordinal: Some(3),
                },
                ArgumentRule {
                    executor: 0x200,
                    argument_id: 0x00,
                    ordinal: None,
                },
            ],
            spec3: vec![0x1F9],
            pre_unfinish: vec![0x1F8],
        }
    }
}

impl TagRules {
    /// Parse a profile from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load a profile from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::file_access(path, FilePurpose::Profile, e))?;
        let rules = Self::from_toml_str(&text)?;
        tracing::info!("Loaded dump profile from {}", path.display());
        Ok(rules)
    }

    /// Category of a string operand inside `argument` of an `executor` instruction.
    pub fn category(&self, executor: u16, argument: &ArgumentHeader) -> TextCategory {
        if self.spec1.iter().any(|rule| rule.matches(executor, argument)) {
            TextCategory::Spec1
        } else if self.spec3.contains(&executor) {
            TextCategory::Spec3
        } else {
            TextCategory::Spec2
        }
    }

    /// Whether an instruction of this executor type flags the next line unfinished.
    pub fn marks_unfinished(&self, executor: u16) -> bool {
        self.pre_unfinish.contains(&executor)
    }
}
