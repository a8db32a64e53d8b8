//! Single-pass script walker
//!
//! Dump and inject both need to enumerate units, operands and text in exactly
//! the same order. Rather than keeping two copies of the loop, the walk lives
//! here once and callers plug in a [`ScriptVisitor`].

use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt};

use super::opcode::{OperandShape, describe};
use super::{
    ArgumentHeader, INSTRUCTION, InstructionHeader, LIST_END, Operand, OperandSite, TERMINATOR,
    TEXT_FLOOR, TextRun,
};
use crate::error::{Error, Result};

/// Receives the units of a script in address order.
///
/// Every method defaults to doing nothing, so a visitor only implements the
/// events it cares about. Returning an error stops the walk.
pub trait ScriptVisitor<'a> {
    /// A `0x1A` terminator at `address`.
    fn terminator(&mut self, _address: usize) -> Result<()> {
        Ok(())
    }

    /// An instruction tag and executor type have been read.
    fn instruction_start(&mut self, _header: &InstructionHeader) -> Result<()> {
        Ok(())
    }

    /// An argument id (not the list terminator) has been read.
    fn argument_start(&mut self, _argument: &ArgumentHeader) -> Result<()> {
        Ok(())
    }

    /// One operand of the current argument.
    fn operand(
        &mut self,
        _instruction: &InstructionHeader,
        _argument: &ArgumentHeader,
        _site: &OperandSite<'a>,
    ) -> Result<()> {
        Ok(())
    }

    /// The operand list of the current argument is closed.
    fn argument_end(&mut self, _argument: &ArgumentHeader) -> Result<()> {
        Ok(())
    }

    /// The argument list is closed; `end` is the address after it.
    fn instruction_end(&mut self, _header: &InstructionHeader, _end: usize) -> Result<()> {
        Ok(())
    }

    /// A maximal run of bytes `>= 0x20`.
    fn raw_text(&mut self, _run: &TextRun<'a>) -> Result<()> {
        Ok(())
    }
}

fn truncated(address: usize, needed: usize) -> impl FnOnce(std::io::Error) -> Error {
    move |_| Error::UnexpectedEof { address, needed }
}

/// Cursor over a script that reports truncation as a format error.
struct ScriptReader<'a> {
    data: &'a [u8],
    cursor: Cursor<&'a [u8]>,
}

impl<'a> ScriptReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            cursor: Cursor::new(data),
        }
    }

    fn position(&self) -> usize {
        self.cursor.position() as usize
    }

    fn is_at_end(&self) -> bool {
        self.position() >= self.data.len()
    }

    fn read_u8(&mut self) -> Result<u8> {
        let eof = truncated(self.position(), 1);
        self.cursor.read_u8().map_err(eof)
    }

    fn read_i8(&mut self) -> Result<i8> {
        let eof = truncated(self.position(), 1);
        self.cursor.read_i8().map_err(eof)
    }

    fn read_u16(&mut self) -> Result<u16> {
        let eof = truncated(self.position(), 2);
        self.cursor.read_u16::<LittleEndian>().map_err(eof)
    }

    fn read_i16(&mut self) -> Result<i16> {
        let eof = truncated(self.position(), 2);
        self.cursor.read_i16::<LittleEndian>().map_err(eof)
    }

    fn read_u32(&mut self) -> Result<u32> {
        let eof = truncated(self.position(), 4);
        self.cursor.read_u32::<LittleEndian>().map_err(eof)
    }

    fn read_i32(&mut self) -> Result<i32> {
        let eof = truncated(self.position(), 4);
        self.cursor.read_i32::<LittleEndian>().map_err(eof)
    }

    fn read_f64(&mut self) -> Result<f64> {
        let eof = truncated(self.position(), 8);
        self.cursor.read_f64::<LittleEndian>().map_err(eof)
    }

    fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        let start = self.position();
        let end = start
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or(Error::UnexpectedEof {
                address: start,
                needed: len,
            })?;
        self.cursor.set_position(end as u64);
        Ok(&self.data[start..end])
    }

    /// Fail unless `needed` more bytes are available.
    fn ensure(&self, needed: usize) -> Result<()> {
        let start = self.position();
        if self.data.len().saturating_sub(start) < needed {
            return Err(Error::UnexpectedEof {
                address: start,
                needed,
            });
        }
        Ok(())
    }

    /// Consume the rest of a text run whose first byte sits at `start`.
    fn read_text_run(&mut self, start: usize) -> &'a [u8] {
        let mut end = self.position();
        while end < self.data.len() && self.data[end] >= TEXT_FLOOR {
            end += 1;
        }
        self.cursor.set_position(end as u64);
        &self.data[start..end]
    }

    fn read_operand(&mut self, shape: OperandShape) -> Result<Operand<'a>> {
        let operand = match shape {
            OperandShape::Int32 => Operand::Int32(self.read_i32()?),
            OperandShape::Int32Variant(kind) => Operand::Int32Variant {
                kind,
                value: self.read_i32()?,
            },
            OperandShape::Int16 => Operand::Int16(self.read_i16()?),
            OperandShape::Int8 => Operand::Int8(self.read_i8()?),
            OperandShape::String => {
                let len = self.read_u32()? as usize;
                Operand::Bytes(self.read_bytes(len)?)
            }
            OperandShape::Float64 => Operand::Float64(self.read_f64()?),
            OperandShape::Marker => Operand::Marker,
        };
        Ok(operand)
    }
}

/// Walk every unit of `data`, reporting each to `visitor`.
///
/// # Errors
///
/// Returns [`Error::UnknownUnitTag`] for a byte that starts no unit,
/// [`Error::UnknownOperandTag`] for a tag missing from the opcode table and
/// [`Error::UnexpectedEof`] when a unit is cut short. Errors raised by the
/// visitor are passed through unchanged.
pub fn walk_script<'a, V: ScriptVisitor<'a>>(data: &'a [u8], visitor: &mut V) -> Result<()> {
    let mut reader = ScriptReader::new(data);

    while !reader.is_at_end() {
        let address = reader.position();
        let tag = reader.read_u8()?;
        match tag {
            TERMINATOR => visitor.terminator(address)?,
            INSTRUCTION => walk_instruction(&mut reader, address, visitor)?,
            _ if tag >= TEXT_FLOOR => {
                let bytes = reader.read_text_run(address);
                visitor.raw_text(&TextRun { address, bytes })?;
            }
            _ => return Err(Error::UnknownUnitTag { tag, address }),
        }
    }

    Ok(())
}

fn walk_instruction<'a, V: ScriptVisitor<'a>>(
    reader: &mut ScriptReader<'a>,
    address: usize,
    visitor: &mut V,
) -> Result<()> {
    let executor = reader.read_u16()?;
    let header = InstructionHeader { address, executor };
    visitor.instruction_start(&header)?;

    let mut ordinal = 0;
    loop {
        let argument_address = reader.position();
        let id = reader.read_u8()?;
        ordinal += 1;
        if id == LIST_END {
            break;
        }

        let argument = ArgumentHeader {
            address: argument_address,
            id,
            ordinal,
        };
        visitor.argument_start(&argument)?;

        loop {
            let tag_address = reader.position();
            let tag = reader.read_u8()?;
            if tag == LIST_END {
                break;
            }
            let shape = describe(tag).ok_or(Error::UnknownOperandTag {
                tag,
                address: tag_address,
            })?;

            let value_address = reader.position();
            if let Some(width) = shape.fixed_width() {
                reader.ensure(width)?;
            }
            let value = reader.read_operand(shape)?;
            let site = OperandSite {
                tag,
                address: tag_address,
                value_address,
                end: reader.position(),
                shape,
                value,
            };
            visitor.operand(&header, &argument, &site)?;
        }

        visitor.argument_end(&argument)?;
    }

    visitor.instruction_end(&header, reader.position())
}
