//! Font lookup and centred text rendering.
//!
//! A family resolves, in order, to: an existing font file path, a file in one
//! of the configured font directories, a file in the system font directories.
//! Files match when their stem equals the family, ignoring case. Lookups are
//! cached per family, misses included.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ab_glyph::{FontVec, PxScale};
use hashbrown::HashMap;
use image::RgbImage;
use imageproc::drawing::{draw_text_mut, text_size};

use crate::color::Color;
use crate::error::DrawError;

const FONT_EXTENSIONS: &[&str] = &["ttf", "otf"];

fn system_font_dirs() -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = [
        "/usr/share/fonts",
        "/usr/local/share/fonts",
        "/Library/Fonts",
        "/System/Library/Fonts",
        "C:\\Windows\\Fonts",
    ]
    .iter()
    .map(PathBuf::from)
    .collect();
    if let Some(home) = std::env::var_os("HOME") {
        let home = PathBuf::from(home);
        dirs.push(home.join(".fonts"));
        dirs.push(home.join(".local/share/fonts"));
    }
    dirs
}

#[derive(Default)]
pub struct FontBook {
    dirs: Vec<PathBuf>,
    cache: HashMap<String, Option<Arc<FontVec>>>,
}

impl FontBook {
    /// Search `extra_dirs` first, then the system font directories.
    pub fn new(extra_dirs: &[PathBuf]) -> Self {
        let mut dirs = extra_dirs.to_vec();
        dirs.extend(system_font_dirs());
        FontBook {
            dirs,
            cache: HashMap::new(),
        }
    }

    /// Only the given directories, no system fallback.
    pub fn with_dirs_only(dirs: Vec<PathBuf>) -> Self {
        FontBook {
            dirs,
            cache: HashMap::new(),
        }
    }

    pub fn font(&mut self, family: &str) -> Result<Arc<FontVec>, DrawError> {
        let key = family.to_lowercase();
        if let Some(cached) = self.cache.get(&key) {
            return cached
                .clone()
                .ok_or_else(|| DrawError::FontNotFound(family.to_string()));
        }
        let loaded = match self.locate(family) {
            Some(path) => Some(Arc::new(load_font(&path)?)),
            None => None,
        };
        self.cache.insert(key, loaded.clone());
        loaded.ok_or_else(|| DrawError::FontNotFound(family.to_string()))
    }

    fn locate(&self, family: &str) -> Option<PathBuf> {
        let direct = Path::new(family);
        if direct.is_file() {
            return Some(direct.to_path_buf());
        }
        let wanted = family.to_lowercase();
        self.dirs.iter().find_map(|dir| find_font_file(dir, &wanted))
    }
}

fn load_font(path: &Path) -> Result<FontVec, DrawError> {
    let bytes = fs::read(path).map_err(|e| DrawError::Font {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    FontVec::try_from_vec(bytes).map_err(|e| DrawError::Font {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

fn find_font_file(dir: &Path, wanted: &str) -> Option<PathBuf> {
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)
        .ok()?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .collect();
    entries.sort();
    let mut subdirs = Vec::new();
    for path in entries {
        if path.is_dir() {
            subdirs.push(path);
            continue;
        }
        let ext_ok = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| FONT_EXTENSIONS.iter().any(|f| e.eq_ignore_ascii_case(f)));
        let stem_ok = path
            .file_stem()
            .and_then(|s| s.to_str())
            .is_some_and(|s| s.to_lowercase() == wanted);
        if ext_ok && stem_ok {
            return Some(path);
        }
    }
    subdirs.iter().find_map(|d| find_font_file(d, wanted))
}

/// Draw `text` with its bounding box centred on `(cx, cy)`.
pub fn draw_centered(
    image: &mut RgbImage,
    font: &FontVec,
    size: f32,
    cx: f64,
    cy: f64,
    text: &str,
    color: Color,
) {
    let scale = PxScale::from(size);
    let (w, h) = text_size(scale, font, text);
    let x = (cx - f64::from(w) / 2.0).round() as i32;
    let y = (cy - f64::from(h) / 2.0).round() as i32;
    draw_text_mut(image, color.to_rgb(), x, y, scale, font, text);
}
