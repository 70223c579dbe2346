//! Rendering snapshot files and folders to PNG images.

use std::fs;
use std::path::{Path, PathBuf};

use bonesketch_api_core::json::{derived_path, json_files_in, read_json_file};
use image::imageops::{self, FilterType};
use image::RgbImage;
use log::{info, warn};

use crate::error::DrawError;
use crate::interpreter::{DrawProgram, RenderReport, Renderer};

/// Outcome of a batch render.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchSummary {
    pub written: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}

impl BatchSummary {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Render one snapshot file and save the image at `output`.
pub fn render_file(
    renderer: &mut Renderer,
    program: &DrawProgram,
    input: &Path,
    output: &Path,
) -> Result<RenderReport, DrawError> {
    let data = read_json_file(input)?;
    let rendered = renderer.render(&data, program)?;
    save_image(&rendered.image, output)?;
    info!("saved image to '{}'", output.display());
    Ok(rendered.report)
}

/// Save `image`, creating the parent directory when needed. The format
/// follows the file extension.
pub fn save_image(image: &RgbImage, output: &Path) -> Result<(), DrawError> {
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| DrawError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    image.save(output).map_err(|source| DrawError::Write {
        path: output.to_path_buf(),
        source,
    })
}

/// Render `input`, a snapshot file or a folder of them.
///
/// Folder: each `*.json` becomes `<output dir>/<stem><suffix>.png`, the output
/// directory defaulting to the input folder. File: an existing output
/// directory gets the same naming, any other output is the target path, and
/// no output writes next to the input.
///
/// Only an unreadable input folder is an error; per-file failures are logged
/// and collected.
pub fn render_path(
    renderer: &mut Renderer,
    program: &DrawProgram,
    input: &Path,
    output: Option<&Path>,
    suffix: &str,
) -> Result<BatchSummary, DrawError> {
    let mut summary = BatchSummary::default();
    let jobs: Vec<(PathBuf, PathBuf)> = if input.is_dir() {
        let dir = output.unwrap_or(input);
        json_files_in(input)?
            .into_iter()
            .map(|file| {
                let out = derived_path(&file, dir, suffix, "png");
                (file, out)
            })
            .collect()
    } else {
        let out = match output {
            Some(dir) if dir.is_dir() => derived_path(input, dir, suffix, "png"),
            Some(path) => path.to_path_buf(),
            None => derived_path(input, input.parent().unwrap_or(Path::new("")), suffix, "png"),
        };
        vec![(input.to_path_buf(), out)]
    };

    for (file, out) in jobs {
        match render_file(renderer, program, &file, &out) {
            Ok(_) => summary.written.push(out),
            Err(err) => {
                warn!("{}: {err}", file.display());
                summary.failed.push((file, err.to_string()));
            }
        }
    }
    Ok(summary)
}

/// Largest size within `max_w` x `max_h` keeping the aspect ratio: the width
/// is fitted first, then the height.
pub fn fit_within(width: u32, height: u32, max_w: u32, max_h: u32) -> (u32, u32) {
    let (mut w, mut h) = (f64::from(width), f64::from(height));
    if w > f64::from(max_w) {
        h = (h * f64::from(max_w) / w).trunc();
        w = f64::from(max_w);
    }
    if h > f64::from(max_h) {
        w = (w * f64::from(max_h) / h).trunc();
        h = f64::from(max_h);
    }
    ((w as u32).max(1), (h as u32).max(1))
}

/// `image` scaled down to fit the preview bounds; smaller images are kept.
pub fn preview(image: &RgbImage, max_w: u32, max_h: u32) -> RgbImage {
    let (w, h) = fit_within(image.width(), image.height(), max_w, max_h);
    if (w, h) == image.dimensions() {
        return image.clone();
    }
    imageops::resize(image, w, h, FilterType::Triangle)
}
