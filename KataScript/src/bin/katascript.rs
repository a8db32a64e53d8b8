//! KataScript command-line binary

fn main() -> anyhow::Result<()> {
    katascript::cli::run_cli()
}
