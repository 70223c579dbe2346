//! Export per-frame pose snapshots from a recorded scene.

use std::path::PathBuf;

use anyhow::{Context, Result};
use bonesketch_export_core::{ExportConfig, Exporter, RecordedScene};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "bone-export")]
#[command(about = "Write one pose snapshot per frame of a recorded scene")]
struct Args {
    /// Scene recording (JSON)
    #[arg(long)]
    scene: PathBuf,

    /// Directory for the snapshots (default: derived from the render output path)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Export only this frame
    #[arg(long)]
    frame: Option<i32>,

    /// Leave shape key weights out of the snapshots
    #[arg(long)]
    no_shape_keys: bool,

    /// Vertex group to capture; repeat to list several (replaces the default list)
    #[arg(long = "vertex-group")]
    vertex_groups: Vec<String>,

    /// Exporter config file (JSON); flags override it
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    bonesketch_cli::init_logging();

    let mut config = match &args.config {
        Some(path) => ExportConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ExportConfig::default(),
    };
    if args.output_dir.is_some() {
        config.output_dir = args.output_dir.clone();
    }
    if args.no_shape_keys {
        config.export_shape_keys = false;
    }
    if !args.vertex_groups.is_empty() {
        config.vertex_groups = args.vertex_groups.clone();
    }

    let mut scene = RecordedScene::from_json_file(&args.scene)
        .with_context(|| format!("loading scene {}", args.scene.display()))?;
    let exporter = Exporter::new(config);

    match args.frame {
        Some(frame) => match exporter.export_frame(&mut scene, frame) {
            Ok(path) => log::info!("saved frame {frame} to '{}'", path.display()),
            Err(err) => log::error!("frame {frame}: export failed: {err}"),
        },
        None => {
            let summary = exporter.export_range(&mut scene)?;
            log::info!(
                "exported {} frame(s), {} failed",
                summary.written.len(),
                summary.failed.len()
            );
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
        let args = Args::parse_from([
            "bone-export", "--scene", "s.json", "--vertex-group", "arm", "--vertex-group", "leg",
            "--no-shape-keys", "--frame", "4",
        ]);
        assert_eq!(args.vertex_groups, vec!["arm", "leg"]);
        assert!(args.no_shape_keys);
        assert_eq!(args.frame, Some(4));
    }
}
