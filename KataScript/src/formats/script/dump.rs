//! Dump a script to a translation text stream and a debug report

use std::io::Write;

use super::classifier::{JumpHint, classify};
use super::decoder::decode_script;
use super::translation::{ADDRESS_SEPARATOR, PRE_UNFINISH, escape_line_breaks};
use super::{Command, Instruction, Operand, OperandSite, TextRun};
use crate::config::TagRules;
use crate::error::Result;

/// Category tag written in front of a dumped string operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextCategory {
    Spec1,
    Spec2,
    Spec3,
}

impl TextCategory {
    /// The tag as it appears in the text stream.
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::Spec1 => "[Spec1]",
            Self::Spec2 => "[Spec2]",
            Self::Spec3 => "[Spec3]",
        }
    }
}

/// Result of dumping a script.
#[derive(Debug, Clone, Default)]
pub struct DumpOutput {
    /// One line per text-bearing unit.
    pub text: Vec<u8>,
    /// Jump diagnostics followed by a listing of every decoded unit.
    pub debug: Vec<u8>,
    /// Number of text lines written.
    pub lines: usize,
    /// Number of decoded units.
    pub units: usize,
}

/// Dump `data` using `rules` to tag string operands.
///
/// # Errors
///
/// Fails if the script does not decode; nothing is produced in that case.
pub fn dump_script(data: &[u8], rules: &TagRules) -> Result<DumpOutput> {
    let commands = decode_script(data)?;

    let mut output = DumpOutput {
        units: commands.len(),
        ..DumpOutput::default()
    };

    for command in &commands {
        match command {
            Command::Terminator { .. } => {}
            Command::Instruction(instruction) => {
                write_instruction_lines(&mut output, instruction, rules)?;
            }
            Command::RawText(run) => write_raw_line(&mut output, run)?,
        }
    }

    write_jump_diagnostics(&mut output.debug, data, &commands)?;
    write_command_listing(&mut output.debug, data, &commands)?;

    tracing::info!(
        "Dumped {} text lines from {} units",
        output.lines,
        output.units
    );
    Ok(output)
}

fn write_instruction_lines(
    output: &mut DumpOutput,
    instruction: &Instruction<'_>,
    rules: &TagRules,
) -> Result<()> {
    let header = &instruction.header;
    // The marker goes out before the instruction's own lines and sticks to
    // whichever line is written next.
    if rules.marks_unfinished(header.executor) {
        output.text.extend_from_slice(PRE_UNFINISH);
    }

    for argument in &instruction.arguments {
        for site in &argument.operands {
            let Operand::Bytes(payload) = site.value else {
                continue;
            };
            let category = rules.category(header.executor, &argument.header);
            write!(output.text, "{}", header.address)?;
            output.text.extend_from_slice(ADDRESS_SEPARATOR);
            output.text.extend_from_slice(category.tag().as_bytes());
            output.text.extend_from_slice(&escape_line_breaks(payload));
            output.text.push(b'\n');
            output.lines += 1;
        }
    }
    Ok(())
}

fn write_raw_line(output: &mut DumpOutput, run: &TextRun<'_>) -> Result<()> {
    write!(output.text, "{}", run.address)?;
    output.text.extend_from_slice(ADDRESS_SEPARATOR);
    output.text.extend_from_slice(run.bytes);
    output.text.push(b'\n');
    output.lines += 1;
    Ok(())
}

fn jump_operands<'c, 'a>(
    commands: &'c [Command<'a>],
) -> impl Iterator<Item = &'c OperandSite<'a>> {
    commands
        .iter()
        .filter_map(|command| match command {
            Command::Instruction(instruction) => Some(instruction),
            _ => None,
        })
        .flat_map(|instruction| &instruction.arguments)
        .flat_map(|argument| &argument.operands)
        .filter(|site| site.shape.is_jump_shaped())
}

fn write_jump_diagnostics(debug: &mut Vec<u8>, data: &[u8], commands: &[Command<'_>]) -> Result<()> {
    for site in jump_operands(commands) {
        let Some(value) = site.value.jump_value() else {
            continue;
        };
        let kind = match site.value {
            Operand::Int32Variant { kind, .. } => Some(kind),
            _ => None,
        };

        for hint in classify(data, value, site.end) {
            match (hint, kind) {
                (JumpHint::Absolute(target), _) => writeln!(
                    debug,
                    "MaybeAbsoluteJump at {:#x}, target: {target:#x}",
                    site.value_address
                )?,
                (JumpHint::Relative(target), None) => writeln!(
                    debug,
                    "MaybeRelativeJump at {:#x}, target: {target:#x}",
                    site.value_address
                )?,
                (JumpHint::Relative(target), Some(kind)) => writeln!(
                    debug,
                    "MaybeRelativeJump{kind} at {:#x}, target: {target:#x}, rel: {value:#x}",
                    site.value_address
                )?,
            }
        }
    }
    Ok(())
}

fn write_command_listing(debug: &mut Vec<u8>, data: &[u8], commands: &[Command<'_>]) -> Result<()> {
    writeln!(debug, "Command Address, Executor Type, Command Text")?;
    for command in commands {
        write!(debug, "{:#08x}, {:#04x}, ", command.address(), command.executor())?;
        describe_command(debug, data, command)?;
        debug.push(b'\n');
    }
    Ok(())
}

fn describe_command(out: &mut Vec<u8>, data: &[u8], command: &Command<'_>) -> Result<()> {
    match command {
        Command::Terminator { .. } => out.extend_from_slice(b"0x1A"),
        Command::RawText(run) => {
            out.extend_from_slice(b"RawText: ");
            out.extend_from_slice(run.bytes);
        }
        Command::Instruction(instruction) if instruction.arguments.is_empty() => {
            out.extend_from_slice(b"Empty");
        }
        Command::Instruction(instruction) => {
            for argument in &instruction.arguments {
                write!(out, "ArgId.{:#x}< ", argument.header.id)?;
                for site in &argument.operands {
                    describe_operand(out, data, site)?;
                }
                out.extend_from_slice(b"> | ");
            }
        }
    }
    Ok(())
}

fn describe_operand(out: &mut Vec<u8>, data: &[u8], site: &OperandSite<'_>) -> Result<()> {
    match site.value {
        Operand::Int32(value) => write!(out, "ReadInt32[{value:#x}]")?,
        Operand::Int32Variant { kind, value } => write!(out, "ReadInt32_AsType{kind}[{value:#x}]")?,
        Operand::Int16(value) => write!(out, "ReadInt16[{value:#x}]")?,
        Operand::Int8(value) => write!(out, "ReadInt8[{value:#x}]")?,
        Operand::Float64(value) => write!(out, "ReadDouble[{value}]")?,
        Operand::Marker => write!(out, "Marker[{:#x}]", site.tag)?,
        Operand::Bytes(payload) => {
            out.extend_from_slice(b"ReadString[");
            out.extend_from_slice(&escape_line_breaks(payload));
            out.push(b']');
        }
    }

    if let Some(value) = site.value.jump_value() {
        for hint in classify(data, value, site.end) {
            match hint {
                JumpHint::Absolute(target) => write!(out, "[MaybeAbsoluteJump to {target:#x}]")?,
                JumpHint::Relative(target) => write!(out, "[MaybeRelativeJump to {target:#x}]")?,
            }
        }
    }

    out.extend_from_slice(b", ");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dump(data: &[u8]) -> DumpOutput {
        dump_script(data, &TagRules::default()).unwrap()
    }

    fn text(output: &DumpOutput) -> String {
        String::from_utf8(output.text.clone()).unwrap()
    }

    #[test]
    fn test_dump_raw_run() {
        let output = dump(&[0x21, b'h', b'i', 0x1A]);
        assert_eq!(text(&output), "0:::::!hi\n");
        assert_eq!(output.lines, 1);
        assert_eq!(output.units, 2);
    }

    #[test]
    fn test_dump_string_uses_instruction_address_and_escapes() {
        let mut data = vec![0x1A, 0x1B, 0x05, 0x00, 0x00, 0x04];
        data.extend_from_slice(&4u32.to_le_bytes());
        data.extend_from_slice(b"a\r\nb");
        data.extend_from_slice(&[0xFF, 0xFF]);

        let output = dump(&data);
        assert_eq!(text(&output), "1:::::[Spec2]a[r][n]b\n");
    }

    #[test]
    fn test_dump_spec3_and_pre_unfinish() {
        let mut data = vec![0x1B, 0xF8, 0x01, 0xFF]; // unfinished marker, no text
        data.extend_from_slice(b"next");
        data.extend_from_slice(&[0x1B, 0xF9, 0x01, 0x00, 0x04, 0x01, 0x00, 0x00, 0x00, b'z', 0xFF, 0xFF]);

        let output = dump(&data);
        assert_eq!(text(&output), "[pre_unfinish]4:::::next\n8:::::[Spec3]z\n");
    }

    #[test]
    fn test_dump_trailing_marker_has_no_newline() {
        let output = dump(&[0x1A, 0x1B, 0xF8, 0x01, 0xFF]);
        assert_eq!(text(&output), "[pre_unfinish]");
        assert_eq!(output.lines, 0);
    }

    #[test]
    fn test_debug_report_lists_jumps_and_units() {
        // int32 operand pointing at the terminator at address 11
        let mut data = vec![0x1B, 0x02, 0x00, 0x01, 0x01];
        data.extend_from_slice(&11i32.to_le_bytes());
        data.extend_from_slice(&[0xFF, 0xFF, 0x1A]);
        assert_eq!(data[11], 0x1A);

        let output = dump(&data);
        let debug = String::from_utf8(output.debug).unwrap();
        let lines: Vec<&str> = debug.lines().collect();

        assert_eq!(lines[0], "MaybeAbsoluteJump at 0x5, target: 0xb");
        assert_eq!(lines[1], "Command Address, Executor Type, Command Text");
        assert_eq!(
            lines[2],
            "0x000000, 0x02, ArgId.0x1< ReadInt32[0xb][MaybeAbsoluteJump to 0xb], > | "
        );
        assert_eq!(lines[3], "0x00000b, 0x00, 0x1A");
    }

    #[test]
    fn test_debug_report_numbers_variant_relative_jumps() {
        // variant 2 with displacement 0 lands on the terminator right after it
        let mut data = vec![0x1B, 0x02, 0x00, 0x01, 0x11];
        data.extend_from_slice(&2i32.to_le_bytes());
        data.extend_from_slice(&[0xFF, 0xFF, 0x1A]);

        let output = dump(&data);
        let debug = String::from_utf8(output.debug).unwrap();
        assert!(debug.starts_with("MaybeRelativeJump2 at 0x5, target: 0xb, rel: 0x2\n"));
    }
}
