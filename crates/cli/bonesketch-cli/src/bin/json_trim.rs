//! Rename bones and drop keys in every snapshot of a folder.

use std::path::PathBuf;

use anyhow::{Context, Result};
use bonesketch_trim_core::{trim_dir, ExcludeKeys, RenameTable, TrimOptions};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "json-trim")]
#[command(about = "Rename bones through a CSV table and strip unwanted keys")]
struct Args {
    /// Folder of snapshot files
    #[arg(short = 'i', long)]
    input_dir: PathBuf,

    /// Rename table: header row, then original_name,new_name
    #[arg(short = 'c', long)]
    csv_path: PathBuf,

    /// Keys to remove, one per line
    #[arg(short = 'e', long)]
    exclude_keys_file: Option<PathBuf>,

    /// Output folder (default: the input folder)
    #[arg(short = 'o', long)]
    output_dir: Option<PathBuf>,

    /// Appended to output file stems
    #[arg(short = 's', long, default_value = "_trim")]
    suffix: String,

    /// Keep the input file names
    #[arg(long)]
    no_suffix: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    bonesketch_cli::init_logging();

    let table = RenameTable::from_csv_path(&args.csv_path)
        .with_context(|| format!("loading rename table {}", args.csv_path.display()))?;
    let exclude = match &args.exclude_keys_file {
        Some(path) => ExcludeKeys::from_path(path)
            .with_context(|| format!("loading exclude keys {}", path.display()))?,
        None => ExcludeKeys::default(),
    };
    let options = TrimOptions {
        input_dir: args.input_dir,
        output_dir: args.output_dir,
        suffix: args.suffix,
        no_suffix: args.no_suffix,
    };

    let summary = trim_dir(&options, &table, &exclude)?;
    log::info!(
        "trimmed {} file(s), {} failed",
        summary.written.len(),
        summary.failed.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn flags_parse() {
        Args::command().debug_assert();
        let args = Args::parse_from(["json-trim", "-i", "poses", "-c", "names.csv", "--no-suffix"]);
        assert_eq!(args.suffix, "_trim");
        assert!(args.no_suffix);
        assert!(Args::try_parse_from(["json-trim", "-i", "poses"]).is_err());
    }
}
