//! CLI commands for script dump/inject operations

use std::path::Path;

use crate::config::TagRules;
use crate::operations;

fn load_rules(profile: Option<&Path>) -> anyhow::Result<TagRules> {
    match profile {
        Some(path) => Ok(TagRules::load(path)?),
        None => Ok(TagRules::default()),
    }
}

/// Dump a script's text and debug report
pub fn dump(script: &Path, text: &Path, profile: Option<&Path>) -> anyhow::Result<()> {
    let rules = load_rules(profile)?;
    let report = operations::dump_file(script, text, &rules)?;

    println!(
        "Dumped {} lines from {} units to {}",
        report.lines,
        report.units,
        report.text_path.display()
    );
    println!("Debug report: {}", report.debug_path.display());
    Ok(())
}

/// Inject translated text into a script
pub fn inject(script: &Path, text: &Path, output: &Path) -> anyhow::Result<()> {
    let result = operations::inject_file(script, text, output)?;

    for warning in &result.warnings {
        eprintln!("Warning: {warning}");
    }

    println!(
        "Injected {} sentences ({:+} bytes), relocated {} jumps",
        result.sentences.len(),
        result.sentences.total_delta(),
        result.jump_sites.len()
    );
    println!("Output saved to {}", output.display());
    Ok(())
}

/// Print a summary of a script
pub fn info(script: &Path) -> anyhow::Result<()> {
    let summary = operations::inspect_file(script)?;

    println!("Script: {}", script.display());
    println!("  Size:              {} bytes", summary.size);
    println!("  Instructions:      {}", summary.instructions);
    println!("  Terminators:       {}", summary.terminators);
    println!("  Raw text runs:     {}", summary.raw_text_runs);
    println!("  String operands:   {}", summary.string_operands);
    println!("  Text lines:        {}", summary.text_units());
    println!("  Jump-shaped ints:  {}", summary.jump_shaped_operands);
    println!("    absolute:        {}", summary.absolute_candidates);
    println!("    relative:        {}", summary.relative_candidates);
    println!("    relocatable:     {}", summary.relocatable_sites);
    Ok(())
}

/// Round-trip a script through dump and inject
pub fn verify(script: &Path, profile: Option<&Path>) -> anyhow::Result<()> {
    let rules = load_rules(profile)?;
    let report = operations::verify_file(script, &rules)?;

    match report.first_difference {
        None => {
            println!(
                "OK: {} lines round-trip to an identical {} byte script",
                report.lines, report.size
            );
            Ok(())
        }
        Some(address) => anyhow::bail!(
            "round trip differs at {address:#x} ({} bytes in, {} bytes out)",
            report.size,
            report.rebuilt_size
        ),
    }
}
