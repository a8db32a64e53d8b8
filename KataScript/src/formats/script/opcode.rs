//! Operand tag table
//!
//! Maps an operand tag byte to the shape of the bytes that follow it. Both
//! the decoder and the inject encoder go through [`describe`], so the two
//! passes cannot disagree on widths.

/// Tag of the plain 32-bit integer operand.
pub const TAG_INT32: u8 = 0x01;
/// Tag of the 16-bit integer operand.
pub const TAG_INT16: u8 = 0x02;
/// Tag of the 8-bit integer operand.
pub const TAG_INT8: u8 = 0x03;
/// Tag of the length-prefixed string operand.
pub const TAG_STRING: u8 = 0x04;
/// Tag of the double operand.
pub const TAG_FLOAT64: u8 = 0x05;
/// First of the four 32-bit integer variant tags (`0x10`-`0x13`).
pub const TAG_INT32_VARIANT_FIRST: u8 = 0x10;
/// Last of the four 32-bit integer variant tags.
pub const TAG_INT32_VARIANT_LAST: u8 = 0x13;

/// Inclusive ranges of the zero-width marker tags.
const MARKER_RANGES: [(u8, u8); 5] = [
    (0x80, 0xB8),
    (0xC0, 0xC0),
    (0xC8, 0xC9),
    (0xD0, 0xD2),
    (0xD4, 0xDE),
];

const MARKER_TABLE: [bool; 256] = build_marker_table();

const fn build_marker_table() -> [bool; 256] {
    let mut table = [false; 256];
    let mut r = 0;
    while r < MARKER_RANGES.len() {
        let (low, high) = MARKER_RANGES[r];
        let mut tag = low as usize;
        while tag <= high as usize {
            table[tag] = true;
            tag += 1;
        }
        r += 1;
    }
    table
}

/// How the bytes after an operand tag are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandShape {
    /// Signed 32-bit integer; jump-shaped and relocated on inject.
    Int32,
    /// Signed 32-bit integer variant 1-4; jump-shaped but never relocated.
    Int32Variant(u8),
    /// Signed 16-bit integer.
    Int16,
    /// Signed 8-bit integer.
    Int8,
    /// `u32` length followed by that many bytes.
    String,
    /// IEEE-754 double.
    Float64,
    /// No payload.
    Marker,
}

impl OperandShape {
    /// Width of the payload in bytes, or `None` when it depends on a length prefix.
    #[must_use]
    pub fn fixed_width(self) -> Option<usize> {
        match self {
            Self::Int32 | Self::Int32Variant(_) => Some(4),
            Self::Int16 => Some(2),
            Self::Int8 => Some(1),
            Self::String => None,
            Self::Float64 => Some(8),
            Self::Marker => Some(0),
        }
    }

    /// Whether the value may be read as an absolute or relative buffer address.
    #[must_use]
    pub fn is_jump_shaped(self) -> bool {
        matches!(self, Self::Int32 | Self::Int32Variant(_))
    }

    /// Whether inject rewrites the value after text lengths change.
    ///
    /// Only the plain `Int32` tag qualifies. The four variants are reported
    /// as jump candidates by dump but left untouched by inject; their
    /// runtime meaning has not been confirmed.
    #[must_use]
    pub fn is_relocatable(self) -> bool {
        matches!(self, Self::Int32)
    }
}

/// Whether `tag` is one of the zero-width marker tags.
#[must_use]
pub fn is_marker(tag: u8) -> bool {
    MARKER_TABLE[tag as usize]
}

/// Look up the shape of an operand tag.
///
/// Returns `None` for tags outside the table; callers must abort, since an
/// unknown width makes every following byte ambiguous.
#[must_use]
pub fn describe(tag: u8) -> Option<OperandShape> {
    match tag {
        TAG_INT32 => Some(OperandShape::Int32),
        TAG_INT16 => Some(OperandShape::Int16),
        TAG_INT8 => Some(OperandShape::Int8),
        TAG_STRING => Some(OperandShape::String),
        TAG_FLOAT64 => Some(OperandShape::Float64),
        TAG_INT32_VARIANT_FIRST..=TAG_INT32_VARIANT_LAST => {
            Some(OperandShape::Int32Variant(tag - TAG_INT32_VARIANT_FIRST + 1))
        }
        _ if is_marker(tag) => Some(OperandShape::Marker),
        _ => None,
    }
}
