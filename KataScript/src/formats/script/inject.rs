//! Inject translated text into a script
//!
//! Inject replays the walk used by dump over the original script. Every
//! string operand and raw text run takes the next translation line; all other
//! bytes are copied through. Replacing text changes the length of the script,
//! so afterwards every enrolled absolute jump is moved by the sum of the
//! length changes that happened before its target.

use std::fmt;

use byteorder::{ByteOrder, LittleEndian};

use super::classifier::absolute_target;
use super::ledger::{JumpSite, Sentence, SentenceLedger};
use super::translation::strip_translation_line;
use super::walker::{ScriptVisitor, walk_script};
use super::{ArgumentHeader, InstructionHeader, Operand, OperandSite, TextRun};
use crate::error::{Error, Result};

/// Non-fatal problems found while injecting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InjectWarning {
    /// More translation lines were supplied than the script has text units.
    TranslationSurplus {
        /// Number of lines left unused.
        count: usize,
    },
}

impl fmt::Display for InjectWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TranslationSurplus { count } => {
                write!(f, "{count} translation line(s) left over and ignored")
            }
        }
    }
}

/// Result of injecting a script.
#[derive(Debug, Clone, Default)]
pub struct InjectOutput {
    /// The re-encoded script.
    pub script: Vec<u8>,
    /// Every replaced text unit.
    pub sentences: SentenceLedger,
    /// Every relocated jump operand.
    pub jump_sites: Vec<JumpSite>,
    pub warnings: Vec<InjectWarning>,
}

/// Copies the source script into a new buffer, swapping text as it goes.
struct Substitution<'s, 'l> {
    source: &'s [u8],
    lines: &'l [Vec<u8>],
    consumed: usize,
    /// Source bytes before this address are already in `out`.
    copied: usize,
    out: Vec<u8>,
    sentences: SentenceLedger,
    jump_sites: Vec<JumpSite>,
}

impl<'s, 'l> Substitution<'s, 'l> {
    fn new(source: &'s [u8], lines: &'l [Vec<u8>]) -> Self {
        Self {
            source,
            lines,
            consumed: 0,
            copied: 0,
            out: Vec::with_capacity(source.len()),
            sentences: SentenceLedger::new(),
            jump_sites: Vec::new(),
        }
    }

    fn next_line(&mut self, address: usize) -> Result<Vec<u8>> {
        let line = self
            .lines
            .get(self.consumed)
            .ok_or(Error::TranslationExhausted {
                address,
                consumed: self.consumed,
            })?;
        self.consumed += 1;
        Ok(strip_translation_line(line))
    }

    fn copy_through(&mut self, address: usize) {
        self.out.extend_from_slice(&self.source[self.copied..address]);
        self.copied = address;
    }

    /// Output address of a source byte that has not been copied yet.
    fn output_address_of(&self, address: usize) -> usize {
        self.out.len() + (address - self.copied)
    }

    fn finish(mut self) -> (Vec<u8>, SentenceLedger, Vec<JumpSite>, usize) {
        self.copy_through(self.source.len());
        (self.out, self.sentences, self.jump_sites, self.consumed)
    }
}

impl<'s> ScriptVisitor<'s> for Substitution<'s, '_> {
    fn operand(
        &mut self,
        _instruction: &InstructionHeader,
        _argument: &ArgumentHeader,
        site: &OperandSite<'s>,
    ) -> Result<()> {
        if let Some((payload_address, payload)) = site.string_payload() {
            let line = self.next_line(site.address)?;

            self.copy_through(site.value_address);
            let mut prefix = [0u8; 4];
            LittleEndian::write_u32(&mut prefix, line.len() as u32);
            self.out.extend_from_slice(&prefix);
            self.out.extend_from_slice(&line);
            self.copied = site.end;

            self.sentences.record(Sentence {
                address: payload_address,
                original_len: payload.len(),
                new_len: line.len(),
            });
            return Ok(());
        }

        // Only the plain int32 shape is relocated; the variants are left alone.
        match site.value {
            Operand::Int32(value) if absolute_target(self.source, value).is_some() => {
                let output_address = self.output_address_of(site.value_address);
                tracing::debug!(
                    "Enrolled jump at {:#x} (output {output_address:#x}) to {value:#x}",
                    site.value_address
                );
                self.jump_sites.push(JumpSite {
                    output_address,
                    source_address: site.value_address,
                    value,
                });
            }
            _ => {}
        }
        Ok(())
    }

    fn raw_text(&mut self, run: &TextRun<'s>) -> Result<()> {
        let line = self.next_line(run.address)?;
        self.copy_through(run.address);
        self.out.extend_from_slice(&line);
        self.copied = run.end();

        self.sentences.record(Sentence {
            address: run.address,
            original_len: run.bytes.len(),
            new_len: line.len(),
        });
        Ok(())
    }
}

/// Move every enrolled jump in `script` by the length changes before its target.
///
/// # Errors
///
/// Returns [`Error::JumpOutOfRange`] if a corrected value leaves the `u32` range.
pub fn relocate(script: &mut [u8], sites: &[JumpSite], sentences: &SentenceLedger) -> Result<()> {
    for site in sites {
        let target = site.value as usize;
        let corrected = i64::from(site.value) + sentences.delta_before(target);
        let value = u32::try_from(corrected).map_err(|_| Error::JumpOutOfRange {
            site: site.output_address,
            value: corrected,
        })?;

        let slot = &mut script[site.output_address..site.output_address + 4];
        debug_assert_eq!(LittleEndian::read_i32(slot), site.value);
        LittleEndian::write_u32(slot, value);
    }
    Ok(())
}

/// Inject `lines` into the script `data`.
///
/// Lines are matched to text units in address order and may still carry the
/// address, category tag or unfinished marker written by dump; see
/// [`strip_translation_line`].
///
/// # Errors
///
/// Fails on any decode error, with [`Error::TranslationExhausted`] when the
/// script has more text units than `lines`, and with [`Error::JumpOutOfRange`]
/// if relocation overflows. Leftover lines are only a warning.
pub fn inject_script(data: &[u8], lines: &[Vec<u8>]) -> Result<InjectOutput> {
    let mut substitution = Substitution::new(data, lines);
    walk_script(data, &mut substitution)?;
    let (mut script, sentences, jump_sites, consumed) = substitution.finish();

    relocate(&mut script, &jump_sites, &sentences)?;

    let mut warnings = Vec::new();
    let surplus = lines.len() - consumed;
    if surplus > 0 {
        tracing::warn!("{surplus} translation line(s) were not used");
        warnings.push(InjectWarning::TranslationSurplus { count: surplus });
    }

    tracing::info!(
        "Injected {} sentences, relocated {} jumps, size {} -> {}",
        sentences.len(),
        jump_sites.len(),
        data.len(),
        script.len()
    );

    Ok(InjectOutput {
        script,
        sentences,
        jump_sites,
        warnings,
    })
}
