//! Script decoding into [`Command`] trees

use super::classifier::{absolute_target, relative_target};
use super::walker::{ScriptVisitor, walk_script};
use super::{
    Argument, ArgumentHeader, Command, Instruction, InstructionHeader, Operand, OperandSite,
    TextRun,
};
use crate::error::Result;

/// Builds commands from walker events.
#[derive(Default)]
struct CommandBuilder<'a> {
    commands: Vec<Command<'a>>,
    instruction: Option<Instruction<'a>>,
}

impl<'a> ScriptVisitor<'a> for CommandBuilder<'a> {
    fn terminator(&mut self, address: usize) -> Result<()> {
        self.commands.push(Command::Terminator { address });
        Ok(())
    }

    fn instruction_start(&mut self, header: &InstructionHeader) -> Result<()> {
        self.instruction = Some(Instruction {
            header: *header,
            arguments: Vec::new(),
            end: header.address,
        });
        Ok(())
    }

    fn argument_start(&mut self, argument: &ArgumentHeader) -> Result<()> {
        if let Some(instruction) = self.instruction.as_mut() {
            instruction.arguments.push(Argument {
                header: *argument,
                operands: Vec::new(),
            });
        }
        Ok(())
    }

    fn operand(
        &mut self,
        _instruction: &InstructionHeader,
        _argument: &ArgumentHeader,
        site: &OperandSite<'a>,
    ) -> Result<()> {
        if let Some(argument) = self
            .instruction
            .as_mut()
            .and_then(|instruction| instruction.arguments.last_mut())
        {
            argument.operands.push(*site);
        }
        Ok(())
    }

    fn instruction_end(&mut self, _header: &InstructionHeader, end: usize) -> Result<()> {
        if let Some(mut instruction) = self.instruction.take() {
            instruction.end = end;
            self.commands.push(Command::Instruction(instruction));
        }
        Ok(())
    }

    fn raw_text(&mut self, run: &TextRun<'a>) -> Result<()> {
        self.commands.push(Command::RawText(*run));
        Ok(())
    }
}

/// Decode a whole script.
///
/// The returned commands are in address order and tile `data` exactly.
///
/// # Errors
///
/// Fails on the first byte that cannot be classified; see
/// [`walk_script`](super::walk_script).
pub fn decode_script(data: &[u8]) -> Result<Vec<Command<'_>>> {
    let mut builder = CommandBuilder::default();
    walk_script(data, &mut builder)?;
    tracing::debug!(
        "Decoded {} units from {} bytes",
        builder.commands.len(),
        data.len()
    );
    Ok(builder.commands)
}

/// Counts gathered from a decoded script.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptSummary {
    /// Script size in bytes.
    pub size: usize,
    pub terminators: usize,
    pub instructions: usize,
    pub raw_text_runs: usize,
    pub string_operands: usize,
    /// Int32 and Int32-variant operands.
    pub jump_shaped_operands: usize,
    /// Jump-shaped operands whose value is a plausible absolute address.
    pub absolute_candidates: usize,
    /// Jump-shaped operands whose value is a plausible relative displacement.
    pub relative_candidates: usize,
    /// Absolute candidates that inject will relocate.
    pub relocatable_sites: usize,
}

impl ScriptSummary {
    /// Summarize `commands` decoded from `data`.
    pub fn from_commands(data: &[u8], commands: &[Command<'_>]) -> Self {
        let mut summary = Self {
            size: data.len(),
            ..Self::default()
        };

        for command in commands {
            match command {
                Command::Terminator { .. } => summary.terminators += 1,
                Command::RawText(_) => summary.raw_text_runs += 1,
                Command::Instruction(instruction) => {
                    summary.instructions += 1;
                    let operands = instruction
                        .arguments
                        .iter()
                        .flat_map(|argument| &argument.operands);
                    for site in operands {
                        summary.count_operand(data, site);
                    }
                }
            }
        }

        summary
    }

    fn count_operand(&mut self, data: &[u8], site: &OperandSite<'_>) {
        if matches!(site.value, Operand::Bytes(_)) {
            self.string_operands += 1;
            return;
        }
        let Some(value) = site.value.jump_value() else {
            return;
        };

        self.jump_shaped_operands += 1;
        if absolute_target(data, value).is_some() {
            self.absolute_candidates += 1;
            if site.shape.is_relocatable() {
                self.relocatable_sites += 1;
            }
        }
        if relative_target(data, value, site.end).is_some() {
            self.relative_candidates += 1;
        }
    }

    /// Number of lines a dump of this script contains.
    pub fn text_units(&self) -> usize {
        self.raw_text_runs + self.string_operands
    }
}
