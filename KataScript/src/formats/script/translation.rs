//! Text stream lines shared by dump and inject
//!
//! # Line format
//!
//! ```text
//! <address>:::::[Spec1]string operand with[r][n]escaped line breaks
//! <address>:::::raw text run
//! [pre_unfinish]<address>:::::[Spec2]line after an unfinished marker
//! ```
//!
//! Lines are raw bytes. Script text is CP932 and is never transcoded.

use memchr::memmem;

/// Separates the address from the payload.
pub const ADDRESS_SEPARATOR: &[u8] = b":::::";

/// Prefix of the category tags (`[Spec1]`, `[Spec2]`, `[Spec3]`).
pub const CATEGORY_PREFIX: &[u8] = b"[Spec";

/// Length of a full category tag.
pub const CATEGORY_TAG_LEN: usize = 7;

/// Marker written before the line following an unfinished-text instruction.
pub const PRE_UNFINISH: &[u8] = b"[pre_unfinish]";

const ESCAPED_CR: &[u8] = b"[r]";
const ESCAPED_LF: &[u8] = b"[n]";

/// Replace every non-overlapping occurrence of `from` with `to`, left to right.
fn replace_all(bytes: &[u8], from: &[u8], to: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len());
    let mut last = 0;
    for pos in memmem::find_iter(bytes, from) {
        out.extend_from_slice(&bytes[last..pos]);
        out.extend_from_slice(to);
        last = pos + from.len();
    }
    out.extend_from_slice(&bytes[last..]);
    out
}

/// Escape CR and LF so a payload fits on one line.
pub fn escape_line_breaks(bytes: &[u8]) -> Vec<u8> {
    let escaped = replace_all(bytes, b"\r", ESCAPED_CR);
    replace_all(&escaped, b"\n", ESCAPED_LF)
}

/// Undo [`escape_line_breaks`].
///
/// A payload that already contained a literal `[r]` or `[n]` cannot be told
/// apart from an escaped break and comes back as a real one.
pub fn unescape_line_breaks(bytes: &[u8]) -> Vec<u8> {
    let unescaped = replace_all(bytes, ESCAPED_CR, b"\r");
    replace_all(&unescaped, ESCAPED_LF, b"\n")
}

/// Split a text file into lines.
///
/// Lines end at LF; one trailing CR per line is dropped so CRLF files work.
/// Text after the last LF forms a final line; an empty tail does not.
pub fn parse_translation_lines(data: &[u8]) -> Vec<Vec<u8>> {
    let mut lines: Vec<Vec<u8>> = data
        .split(|&b| b == b'\n')
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line).to_vec())
        .collect();
    if data.is_empty() || data.ends_with(b"\n") {
        lines.pop();
    }
    lines
}

/// Reduce a dumped (and translated) line to the bytes inject writes.
///
/// 1. Everything up to and including the first `:::::` is dropped.
/// 2. A leading `[Spec#]` tag is dropped and `[r]`/`[n]` are un-escaped.
/// 3. Otherwise a leading `[pre_unfinish]` is dropped, with no un-escaping.
///
/// The two prefix checks are exclusive. A line that still reads
/// `[pre_unfinish][Spec2]...` after step 1 only loses the marker; its tag and
/// escapes survive into the script. Dumps always put the address after the
/// marker, so this only happens to lines whose address was removed by hand.
pub fn strip_translation_line(line: &[u8]) -> Vec<u8> {
    let line = match memmem::find(line, ADDRESS_SEPARATOR) {
        Some(pos) => &line[pos + ADDRESS_SEPARATOR.len()..],
        None => line,
    };

    if line.starts_with(CATEGORY_PREFIX) {
        let payload = line.get(CATEGORY_TAG_LEN..).unwrap_or_default();
        unescape_line_breaks(payload)
    } else if let Some(rest) = line.strip_prefix(PRE_UNFINISH) {
        rest.to_vec()
    } else {
        line.to_vec()
    }
}
