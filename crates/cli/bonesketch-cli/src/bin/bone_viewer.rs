//! Render pose snapshots with a drawing instruction file.

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use bonesketch_cli::session::Session;
use bonesketch_draw_core::{render_path, CustomRegistry, DrawProgram, RenderConfig, Renderer};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "bone-viewer")]
#[command(about = "Draw pose snapshots as images; interactive when paths are missing")]
struct Args {
    /// Snapshot file or folder of snapshots
    #[arg(short = 'j', long = "json")]
    json: Option<PathBuf>,

    /// Drawing instruction file
    #[arg(short = 'd', long = "drawing-instructions")]
    drawing_instructions: Option<PathBuf>,

    /// Output image file or folder
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Appended to output file stems
    #[arg(short = 's', long)]
    suffix: Option<String>,

    /// Renderer config file (JSON); flags override it
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    bonesketch_cli::init_logging();

    let mut config = match &args.config {
        Some(path) => RenderConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => RenderConfig::default(),
    };
    if let Some(suffix) = &args.suffix {
        config.output_suffix = suffix.clone();
    }

    let registry = CustomRegistry::with_builtins();
    let mut renderer = Renderer::new(config);

    match (&args.json, &args.drawing_instructions, &args.output) {
        (Some(input), Some(instructions), Some(output)) => {
            let program = DrawProgram::from_json_file(instructions, &registry)
                .with_context(|| format!("loading instructions {}", instructions.display()))?;
            let suffix = renderer.config().output_suffix.clone();
            let summary = render_path(&mut renderer, &program, input, Some(output), &suffix)?;
            log::info!(
                "rendered {} image(s), {} failed",
                summary.written.len(),
                summary.failed.len()
            );
        }
        _ => {
            let preview_path = std::env::current_dir()
                .context("resolving working directory")?
                .join("preview.png");
            let stdin = io::stdin();
            let written = Session::new(&mut renderer, &registry, preview_path)
                .prefill(args.json.clone(), args.drawing_instructions.clone())
                .run(stdin.lock(), io::stdout())?;
            log::info!("{written} preview(s) rendered");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn flags_parse() {
        Args::command().debug_assert();
        let args = Args::parse_from(["bone-viewer", "-j", "in", "-d", "draw.json", "-s", ""]);
        assert_eq!(args.json, Some(PathBuf::from("in")));
        assert_eq!(args.output, None);
        assert_eq!(args.suffix.as_deref(), Some(""));
    }
}
