//! Bytecode script format
//!
//! A script is a flat little-endian byte stream of units, each starting with
//! a tag byte:
//!
//! - `0x1A` terminator, no payload
//! - `0x1B` instruction: a `u16` executor type, then a list of arguments
//!   closed by `0xFF`; each argument is an id byte followed by a list of
//!   typed operands closed by `0xFF`
//! - any byte `>= 0x20` starts a raw text run that extends while bytes stay
//!   `>= 0x20`
//!
//! Text lives in two places: length-prefixed string operands and raw text
//! runs. Both are dumped for translation and replaced on inject, after which
//! absolute jump operands are relocated to account for the length changes.

pub mod classifier;
pub mod decoder;
pub mod dump;
pub mod inject;
pub mod ledger;
pub mod opcode;
pub mod translation;
pub mod walker;

pub use decoder::decode_script;
pub use dump::{DumpOutput, dump_script};
pub use inject::{InjectOutput, InjectWarning, inject_script};
pub use ledger::{JumpSite, Sentence, SentenceLedger};
pub use opcode::{OperandShape, describe};
pub use translation::{parse_translation_lines, strip_translation_line};
pub use walker::{ScriptVisitor, walk_script};

/// Unit tag of a terminator.
pub const TERMINATOR: u8 = 0x1A;

/// Unit tag of an instruction.
pub const INSTRUCTION: u8 = 0x1B;

/// Closes both argument lists and operand lists.
pub const LIST_END: u8 = 0xFF;

/// Bytes at or above this value belong to raw text runs.
pub const TEXT_FLOOR: u8 = 0x20;

/// A decoded operand value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operand<'a> {
    /// Plain 32-bit integer (tag `0x01`), the only relocated jump shape.
    Int32(i32),
    /// One of the four 32-bit variants (tags `0x10`-`0x13`); `kind` is 1-4.
    Int32Variant { kind: u8, value: i32 },
    /// 16-bit integer.
    Int16(i16),
    /// 8-bit integer.
    Int8(i8),
    /// Length-prefixed string payload (length prefix excluded).
    Bytes(&'a [u8]),
    /// IEEE-754 double.
    Float64(f64),
    /// Zero-width marker tag.
    Marker,
}

impl Operand<'_> {
    /// The value of a jump-shaped operand, if this is one.
    pub fn jump_value(&self) -> Option<i32> {
        match *self {
            Operand::Int32(value) | Operand::Int32Variant { value, .. } => Some(value),
            _ => None,
        }
    }
}

/// An operand together with where it sits in the script.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OperandSite<'a> {
    /// The operand tag byte.
    pub tag: u8,
    /// Address of the tag byte.
    pub address: usize,
    /// Address of the first value byte (the length prefix for strings).
    pub value_address: usize,
    /// Address one past the last byte of the operand.
    pub end: usize,
    /// Shape from the opcode table.
    pub shape: OperandShape,
    /// Decoded value.
    pub value: Operand<'a>,
}

impl<'a> OperandSite<'a> {
    /// Payload of a string operand along with its start address.
    pub fn string_payload(&self) -> Option<(usize, &'a [u8])> {
        match self.value {
            Operand::Bytes(bytes) => Some((self.value_address + 4, bytes)),
            _ => None,
        }
    }
}

/// Head of an instruction as seen by the walker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstructionHeader {
    /// Address of the `0x1B` tag.
    pub address: usize,
    /// 16-bit executor type.
    pub executor: u16,
}

/// Head of one argument as seen by the walker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArgumentHeader {
    /// Address of the argument id byte.
    pub address: usize,
    /// The argument id.
    pub id: u8,
    /// 1-based position of this id among the argument-list bytes of the instruction.
    pub ordinal: usize,
}

/// A raw text run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextRun<'a> {
    /// Address of the first byte of the run.
    pub address: usize,
    /// The run, including its first byte.
    pub bytes: &'a [u8],
}

impl TextRun<'_> {
    /// Address one past the run.
    pub fn end(&self) -> usize {
        self.address + self.bytes.len()
    }
}

/// One argument of a decoded instruction.
#[derive(Debug, Clone, PartialEq)]
pub struct Argument<'a> {
    pub header: ArgumentHeader,
    pub operands: Vec<OperandSite<'a>>,
}

/// A decoded instruction.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction<'a> {
    pub header: InstructionHeader,
    pub arguments: Vec<Argument<'a>>,
    /// Address one past the closing `0xFF` of the argument list.
    pub end: usize,
}

/// One decoded unit of a script.
#[derive(Debug, Clone, PartialEq)]
pub enum Command<'a> {
    Terminator { address: usize },
    Instruction(Instruction<'a>),
    RawText(TextRun<'a>),
}

impl Command<'_> {
    /// Address of the unit's first byte.
    pub fn address(&self) -> usize {
        match self {
            Command::Terminator { address } => *address,
            Command::Instruction(instruction) => instruction.header.address,
            Command::RawText(run) => run.address,
        }
    }

    /// Address one past the unit's last byte.
    pub fn end(&self) -> usize {
        match self {
            Command::Terminator { address } => address + 1,
            Command::Instruction(instruction) => instruction.end,
            Command::RawText(run) => run.end(),
        }
    }

    /// Executor type, or zero for units that are not instructions.
    pub fn executor(&self) -> u16 {
        match self {
            Command::Instruction(instruction) => instruction.header.executor,
            _ => 0,
        }
    }
}
