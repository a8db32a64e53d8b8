//! End-to-end dump and inject through the file system

use std::path::Path;

use katascript::config::TagRules;
use katascript::error::{Error, FilePurpose};
use katascript::formats::script::{InjectWarning, decode_script};
use katascript::operations::{debug_path_for, dump_file, inject_file, inspect_file, verify_file};
use pretty_assertions::assert_eq;

/// Builds scripts byte by byte.
#[derive(Default)]
struct ScriptBuilder {
    bytes: Vec<u8>,
}

impl ScriptBuilder {
    fn new() -> Self {
        Self::default()
    }

    fn raw(mut self, text: &[u8]) -> Self {
        self.bytes.extend_from_slice(text);
        self
    }

    fn terminator(mut self) -> Self {
        self.bytes.push(0x1A);
        self
    }

    fn instruction(mut self, executor: u16) -> Self {
        self.bytes.push(0x1B);
        self.bytes.extend_from_slice(&executor.to_le_bytes());
        self
    }

    fn argument(mut self, id: u8) -> Self {
        self.bytes.push(id);
        self
    }

    fn string(mut self, text: &[u8]) -> Self {
        self.bytes.push(0x04);
        self.bytes.extend_from_slice(&(text.len() as u32).to_le_bytes());
        self.bytes.extend_from_slice(text);
        self
    }

    fn int32(mut self, tag: u8, value: i32) -> Self {
        self.bytes.push(tag);
        self.bytes.extend_from_slice(&value.to_le_bytes());
        self
    }

    /// Closes an operand list or an argument list.
    fn end(mut self) -> Self {
        self.bytes.push(0xFF);
        self
    }

    fn build(self) -> Vec<u8> {
        self.bytes
    }
}

/// Address of the unfinished-text instruction in [`scene`].
const MARKER: usize = 61;

/// A scene: a name tag, a line of dialogue, a jump to the unfinished-text
/// marker and the narration that follows it.
fn scene() -> Vec<u8> {
    let data = ScriptBuilder::new()
        .instruction(0x1C)
        .argument(0x00)
        .end()
        .argument(0x01)
        .end()
        .argument(0x02)
        .string(b"Name\r\nTag")
        .end()
        .end()
        .raw("「こんにちは」".as_bytes())
        .instruction(0x05)
        .argument(0x00)
        .int32(0x01, MARKER as i32)
        .int32(0x11, 0)
        .end()
        .end()
        .instruction(0x1F8)
        .end()
        .raw(b"Narration.")
        .terminator()
        .build();
    assert_eq!(data[MARKER], 0x1B);
    data
}

fn write(dir: &Path, name: &str, bytes: &[u8]) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

#[test]
fn test_unmodified_dump_reinjects_identically() {
    let dir = tempfile::tempdir().unwrap();
    let script = write(dir.path(), "scene.bin", &scene());
    let text = dir.path().join("scene.txt");
    let output = dir.path().join("scene.new.bin");

    let report = dump_file(&script, &text, &TagRules::default()).unwrap();
    assert_eq!(report.lines, 3);
    assert!(report.debug_path.exists());

    let result = inject_file(&script, &text, &output).unwrap();
    assert!(result.warnings.is_empty());
    assert_eq!(std::fs::read(&output).unwrap(), scene());
}

#[test]
fn test_dump_text_format() {
    let dir = tempfile::tempdir().unwrap();
    let script = write(dir.path(), "scene.bin", &scene());
    let text = dir.path().join("scene.txt");

    dump_file(&script, &text, &TagRules::default()).unwrap();

    let mut expected = b"0:::::[Spec1]Name[r][n]Tag\n24:::::".to_vec();
    expected.extend_from_slice("「こんにちは」".as_bytes());
    expected.extend_from_slice(b"\n[pre_unfinish]65:::::Narration.\n");
    assert_eq!(std::fs::read(&text).unwrap(), expected);

    let debug = std::fs::read_to_string(debug_path_for(&text)).unwrap();
    assert!(debug.contains("MaybeAbsoluteJump at 0x32, target: 0x3d"));
    assert!(debug.contains("Command Address, Executor Type, Command Text"));
}

#[test]
fn test_translated_lines_relocate_jump() {
    let dir = tempfile::tempdir().unwrap();
    let original = scene();
    let script = write(dir.path(), "scene.bin", &original);
    let text = write(
        dir.path(),
        "scene.txt",
        b"0:::::[Spec1]Hero[n]\n24:::::\"Hello\"\n[pre_unfinish]65:::::Narration, translated.\n",
    );
    let output = dir.path().join("scene.new.bin");

    let result = inject_file(&script, &text, &output).unwrap();
    let rebuilt = std::fs::read(&output).unwrap();

    // Both the name tag (-4) and the dialogue (-14) come before the target.
    assert_eq!(result.jump_sites.len(), 1);
    let site = result.jump_sites[0];
    let target = i32::from_le_bytes(rebuilt[site.output_address..][..4].try_into().unwrap());
    assert_eq!(target, 43);
    assert_eq!(rebuilt[43], 0x1B);
    assert_eq!(&rebuilt[13..18], b"Hero\n");
    assert_eq!(&rebuilt[20..27], b"\"Hello\"");

    // The relative variant is copied untouched.
    let variant = site.output_address + 5;
    assert_eq!(rebuilt[variant - 1], 0x11);
    assert_eq!(&rebuilt[variant..variant + 4], &0i32.to_le_bytes());

    // Still a well-formed script with the same shape.
    let commands = decode_script(&rebuilt).unwrap();
    assert_eq!(commands.len(), decode_script(&original).unwrap().len());
    assert!(rebuilt.ends_with(b"Narration, translated.\x1A"));
}

#[test]
fn test_missing_lines_write_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let script = write(dir.path(), "scene.bin", &scene());
    let text = write(dir.path(), "scene.txt", b"0:::::[Spec1]Name\n");
    let output = dir.path().join("scene.new.bin");

    let err = inject_file(&script, &text, &output).unwrap_err();
    assert!(matches!(err, Error::TranslationExhausted { consumed: 1, .. }));
    assert!(!output.exists());
}

#[test]
fn test_surplus_lines_warn_with_count() {
    let dir = tempfile::tempdir().unwrap();
    let script = write(dir.path(), "scene.bin", &scene());
    let text = dir.path().join("scene.txt");
    dump_file(&script, &text, &TagRules::default()).unwrap();

    let mut lines = std::fs::read(&text).unwrap();
    lines.extend_from_slice(b"spare one\nspare two\n");
    std::fs::write(&text, lines).unwrap();

    let output = dir.path().join("scene.new.bin");
    let result = inject_file(&script, &text, &output).unwrap();
    assert_eq!(result.warnings, vec![InjectWarning::TranslationSurplus { count: 2 }]);
    assert_eq!(std::fs::read(&output).unwrap(), scene());
}

#[test]
fn test_spec1_newline_survives_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let original = ScriptBuilder::new()
        .instruction(0x1C)
        .argument(0x00)
        .end()
        .argument(0x01)
        .end()
        .argument(0x02)
        .string(b"old")
        .end()
        .end()
        .build();
    let script = write(dir.path(), "line.bin", &original);
    let text = dir.path().join("line.txt");
    dump_file(&script, &text, &TagRules::default()).unwrap();
    assert_eq!(std::fs::read(&text).unwrap(), b"0:::::[Spec1]old\n");

    // A translator adds a line break inside the string.
    std::fs::write(&text, b"0:::::[Spec1]first[n]second\n").unwrap();
    let output = dir.path().join("line.new.bin");
    inject_file(&script, &text, &output).unwrap();

    let expected = ScriptBuilder::new()
        .instruction(0x1C)
        .argument(0x00)
        .end()
        .argument(0x01)
        .end()
        .argument(0x02)
        .string(b"first\nsecond")
        .end()
        .end()
        .build();
    assert_eq!(std::fs::read(&output).unwrap(), expected);
}

#[test]
fn test_marker_before_tag_is_not_unescaped() {
    // A line whose address was removed keeps its tag when the unfinished
    // marker comes first.
    let dir = tempfile::tempdir().unwrap();
    let original = ScriptBuilder::new()
        .instruction(0x05)
        .argument(0x00)
        .string(b"x")
        .end()
        .end()
        .build();
    let script = write(dir.path(), "quirk.bin", &original);
    let text = write(dir.path(), "quirk.txt", b"[pre_unfinish][Spec2]a[n]b\n");
    let output = dir.path().join("quirk.new.bin");

    inject_file(&script, &text, &output).unwrap();

    let expected = ScriptBuilder::new()
        .instruction(0x05)
        .argument(0x00)
        .string(b"[Spec2]a[n]b")
        .end()
        .end()
        .build();
    assert_eq!(std::fs::read(&output).unwrap(), expected);
}

#[test]
fn test_raw_text_replaced_whole() {
    let dir = tempfile::tempdir().unwrap();
    let script = write(dir.path(), "raw.bin", b"!hi\x1A");
    let text = dir.path().join("raw.txt");
    dump_file(&script, &text, &TagRules::default()).unwrap();
    assert_eq!(std::fs::read(&text).unwrap(), b"0:::::!hi\n");

    std::fs::write(&text, b"hi there\n").unwrap();
    let output = dir.path().join("raw.new.bin");
    inject_file(&script, &text, &output).unwrap();
    assert_eq!(std::fs::read(&output).unwrap(), b"hi there\x1A");
}

#[test]
fn test_unknown_unit_aborts_dump() {
    let dir = tempfile::tempdir().unwrap();
    let mut data = scene();
    let bad = data.len();
    data.push(0x00);
    let script = write(dir.path(), "bad.bin", &data);
    let text = dir.path().join("bad.txt");

    let err = dump_file(&script, &text, &TagRules::default()).unwrap_err();
    assert!(matches!(err, Error::UnknownUnitTag { tag: 0x00, address } if address == bad));
    assert!(!text.exists());
    assert!(!debug_path_for(&text).exists());
}

#[test]
fn test_missing_script_reports_purpose() {
    let dir = tempfile::tempdir().unwrap();
    let err = inject_file(
        &dir.path().join("nope.bin"),
        &dir.path().join("nope.txt"),
        &dir.path().join("out.bin"),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        Error::FileAccess {
            purpose: FilePurpose::ScriptInput,
            ..
        }
    ));
}

#[test]
fn test_profile_changes_categories() {
    let dir = tempfile::tempdir().unwrap();
    let script = write(dir.path(), "scene.bin", &scene());
    let profile = write(dir.path(), "profile.toml", b"spec1 = []\npre_unfinish = []\n");
    let rules = TagRules::load(&profile).unwrap();
    let text = dir.path().join("scene.txt");

    dump_file(&script, &text, &rules).unwrap();
    let dumped = std::fs::read(&text).unwrap();
    assert!(dumped.starts_with(b"0:::::[Spec2]Name"));
    assert!(dumped.ends_with(b"\n65:::::Narration.\n"));
}

#[test]
fn test_info_and_verify() {
    let dir = tempfile::tempdir().unwrap();
    let script = write(dir.path(), "scene.bin", &scene());

    let summary = inspect_file(&script).unwrap();
    assert_eq!(summary.instructions, 3);
    assert_eq!(summary.raw_text_runs, 2);
    assert_eq!(summary.string_operands, 1);
    assert_eq!(summary.terminators, 1);
    assert_eq!(summary.relocatable_sites, 1);

    let report = verify_file(&script, &TagRules::default()).unwrap();
    assert!(report.is_identical());
    assert_eq!(report.lines, 3);
}
