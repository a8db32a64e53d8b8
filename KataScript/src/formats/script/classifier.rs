//! Heuristic jump classification
//!
//! The format does not say which integer operands are addresses. These checks
//! guess by looking at what the value would point at: an instruction, a
//! terminator, or something that reads like CP932 text. The guess is
//! advisory. Arbitrary data can pass the text check and real targets can
//! fail it, so nothing here is part of the structural decode.

use super::{INSTRUCTION, TERMINATOR};

/// Bytes strictly above this may start CP932 text.
const TEXT_LEAD_FLOOR: u8 = 0x80;

const CR: u8 = 0x0D;
const LF: u8 = 0x0A;

/// A guessed jump target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpHint {
    /// The value itself is a plausible address.
    Absolute(usize),
    /// The value added to the operand's end address is a plausible address.
    Relative(usize),
}

/// Whether `bytes` looks like CP932 text.
///
/// Control bytes other than CR/LF and half-width katakana are rejected; a
/// lead byte must be followed by a trail byte in `0x40..=0xFC`. A lead byte
/// at the very end is paired with an implicit NUL and fails.
pub fn is_plausible_cp932(bytes: &[u8]) -> bool {
    if bytes.is_empty() {
        return false;
    }

    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if (b < 0x20 && b != CR && b != LF) || (0xA0..0xE0).contains(&b) {
            return false;
        }
        if matches!(b, 0x81..=0x9F | 0xE0..=0xFC) {
            let trail = bytes.get(i + 1).copied().unwrap_or(0);
            if !(0x40..=0xFC).contains(&trail) {
                return false;
            }
            i += 2;
        } else {
            i += 1;
        }
    }
    true
}

/// Whether `address` plausibly starts a decoded unit of `data`.
///
/// Text candidates are checked up to the next NUL byte (or the end of the
/// buffer), the way a C string view of the script would see them.
pub fn is_plausible_target(data: &[u8], address: usize) -> bool {
    let Some(&first) = data.get(address) else {
        return false;
    };
    if first == INSTRUCTION || first == TERMINATOR {
        return true;
    }
    if first <= TEXT_LEAD_FLOOR {
        return false;
    }

    let tail = &data[address..];
    let len = memchr::memchr(0, tail).unwrap_or(tail.len());
    is_plausible_cp932(&tail[..len])
}

/// Treat `value` as an absolute address.
pub fn absolute_target(data: &[u8], value: i32) -> Option<usize> {
    let address = usize::try_from(value).ok().filter(|&a| a != 0)?;
    is_plausible_target(data, address).then_some(address)
}

/// Treat `value` as a displacement from `operand_end`, with 32-bit wraparound.
pub fn relative_target(data: &[u8], value: i32, operand_end: usize) -> Option<usize> {
    let address = (value as u32).wrapping_add(operand_end as u32) as usize;
    is_plausible_target(data, address).then_some(address)
}

/// Every reading of `value` that lands on a plausible boundary.
pub fn classify(data: &[u8], value: i32, operand_end: usize) -> Vec<JumpHint> {
    let mut hints = Vec::new();
    if let Some(target) = absolute_target(data, value) {
        hints.push(JumpHint::Absolute(target));
    }
    if let Some(target) = relative_target(data, value, operand_end) {
        hints.push(JumpHint::Relative(target));
    }
    hints
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cp932_check() {
        // "あい" in CP932
        assert!(is_plausible_cp932(&[0x82, 0xA0, 0x82, 0xA2]));
        assert!(is_plausible_cp932(b"plain ascii\r\n"));
        assert!(!is_plausible_cp932(&[]));
        // Half-width katakana block is rejected.
        assert!(!is_plausible_cp932(&[0xB1]));
        // Control byte.
        assert!(!is_plausible_cp932(&[0x82, 0xA0, 0x1B]));
        // Bad trail byte.
        assert!(!is_plausible_cp932(&[0x82, 0x20]));
        // Dangling lead byte.
        assert!(!is_plausible_cp932(&[0x41, 0x82]));
        // Trail byte just below the allowed range.
        assert!(!is_plausible_cp932(&[0xE0, 0x3F]));
    }

    #[test]
    fn test_plausible_target_markers() {
        let data = [0x00, 0x1B, 0x1A, 0x41];
        assert!(is_plausible_target(&data, 1));
        assert!(is_plausible_target(&data, 2));
        // ASCII is not a text lead.
        assert!(!is_plausible_target(&data, 3));
        assert!(!is_plausible_target(&data, 4));
    }

    #[test]
    fn test_plausible_target_text_stops_at_nul() {
        let data = [0x1A, 0x82, 0xA0, 0x00, 0x1B];
        assert!(is_plausible_target(&data, 1));

        // Without the NUL the scan reaches the 0x1B and fails.
        let data = [0x1A, 0x82, 0xA0, 0x1B];
        assert!(!is_plausible_target(&data, 1));
    }

    #[test]
    fn test_absolute_excludes_zero_and_negative() {
        let data = [0x1B, 0x1A, 0x1A];
        assert_eq!(absolute_target(&data, 0), None);
        assert_eq!(absolute_target(&data, -1), None);
        assert_eq!(absolute_target(&data, 2), Some(2));
        assert_eq!(absolute_target(&data, 3), None);
    }

    #[test]
    fn test_relative_wraps_backwards() {
        let data = [0x1B, 0x00, 0x00, 0x00, 0x00, 0x00];
        assert_eq!(relative_target(&data, -6, 6), Some(0));
        assert_eq!(relative_target(&data, 0, 0), Some(0));
        assert_eq!(relative_target(&data, -7, 6), None);
    }

    #[test]
    fn test_classify_reports_both_readings() {
        let data = [0x1A, 0x1A, 0x1A, 0x1A];
        assert_eq!(
            classify(&data, 1, 2),
            vec![JumpHint::Absolute(1), JumpHint::Relative(3)]
        );
        assert_eq!(classify(&data, 0, 2), vec![JumpHint::Relative(2)]);
    }
}
