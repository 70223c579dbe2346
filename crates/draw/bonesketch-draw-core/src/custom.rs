//! Registered drawing callbacks for `custom` instructions.
//!
//! A `custom` instruction names a `library` and a `function`; the pair is
//! looked up as `"<library>.<function>"` in a [`CustomRegistry`] when the
//! program is built. The callback returns an image that the renderer
//! composites over the canvas at the origin.

use std::fmt;
use std::io::Cursor;
use std::sync::Arc;

use bonesketch_api_core::{ConstantNamespace, OFFSCREEN};
use hashbrown::HashMap;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut, draw_polygon_mut};
use imageproc::point::Point;
use serde_json::Value as JsonValue;

use crate::color::Color;
use crate::error::DrawError;

pub type CustomDrawError = Box<dyn std::error::Error + Send + Sync>;

/// Everything a callback may look at.
pub struct CustomDrawContext<'a> {
    /// The pose snapshot being rendered.
    pub data: &'a JsonValue,
    pub width: u32,
    pub height: u32,
    pub namespace: &'a ConstantNamespace,
    /// The instruction's `params` object.
    pub params: &'a JsonValue,
}

/// Anything able to encode itself as an image file in memory.
pub trait SaveToBuffer {
    fn save_to_buffer(&self) -> Result<Vec<u8>, CustomDrawError>;
}

impl SaveToBuffer for DynamicImage {
    fn save_to_buffer(&self) -> Result<Vec<u8>, CustomDrawError> {
        let mut buf = Vec::new();
        self.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
        Ok(buf)
    }
}

impl SaveToBuffer for RgbaImage {
    fn save_to_buffer(&self) -> Result<Vec<u8>, CustomDrawError> {
        let mut buf = Vec::new();
        self.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
        Ok(buf)
    }
}

pub enum CustomOutput {
    /// An encoded image (PNG, BMP, JPEG).
    Encoded(Vec<u8>),
    Buffered(Box<dyn SaveToBuffer>),
    /// A result the renderer cannot turn into an image.
    Unsupported(String),
}

impl fmt::Debug for CustomOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CustomOutput::Encoded(bytes) => write!(f, "Encoded({} bytes)", bytes.len()),
            CustomOutput::Buffered(_) => f.write_str("Buffered(..)"),
            CustomOutput::Unsupported(what) => write!(f, "Unsupported({what:?})"),
        }
    }
}

impl CustomOutput {
    pub fn into_image(self, key: &str) -> Result<RgbaImage, DrawError> {
        let bytes = match self {
            CustomOutput::Encoded(bytes) => bytes,
            CustomOutput::Buffered(source) => {
                source.save_to_buffer().map_err(|e| DrawError::Custom {
                    key: key.to_string(),
                    reason: e.to_string(),
                })?
            }
            CustomOutput::Unsupported(what) => {
                return Err(DrawError::Custom {
                    key: key.to_string(),
                    reason: format!("cannot convert {what} to an image"),
                })
            }
        };
        let decoded = image::load_from_memory(&bytes).map_err(DrawError::CustomImage)?;
        Ok(decoded.to_rgba8())
    }
}

pub trait CustomDraw: Send + Sync {
    fn draw(&self, ctx: &CustomDrawContext<'_>) -> Result<CustomOutput, CustomDrawError>;
}

impl<F> CustomDraw for F
where
    F: Fn(&CustomDrawContext<'_>) -> Result<CustomOutput, CustomDrawError> + Send + Sync,
{
    fn draw(&self, ctx: &CustomDrawContext<'_>) -> Result<CustomOutput, CustomDrawError> {
        self(ctx)
    }
}

pub fn custom_key(library: &str, function: &str) -> String {
    format!("{library}.{function}")
}

#[derive(Clone, Default)]
pub struct CustomRegistry {
    entries: HashMap<String, Arc<dyn CustomDraw>>,
}

impl fmt::Debug for CustomRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&String> = self.entries.keys().collect();
        keys.sort();
        f.debug_struct("CustomRegistry").field("keys", &keys).finish()
    }
}

impl CustomRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the bundled callbacks (`skeleton.bones`).
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("skeleton", "bones", skeleton_bones);
        registry
    }

    pub fn register(
        &mut self,
        library: &str,
        function: &str,
        callback: impl CustomDraw + 'static,
    ) -> &mut Self {
        self.entries
            .insert(custom_key(library, function), Arc::new(callback));
        self
    }

    pub fn get(&self, key: &str) -> Option<Arc<dyn CustomDraw>> {
        self.entries.get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
}

/// Stick figure from the snapshot's `bones` section: a segment from each
/// bone's head to every child's head and a dot per joint.
///
/// Params: `color` (black), `width` (2), `joint_radius` (3).
pub fn skeleton_bones(ctx: &CustomDrawContext<'_>) -> Result<CustomOutput, CustomDrawError> {
    let color = match ctx.params.get("color") {
        Some(value) if !value.is_null() => Color::from_json(value)?,
        _ => Color::BLACK,
    };
    let width = ctx.params.get("width").and_then(JsonValue::as_f64).unwrap_or(2.0);
    let radius = ctx
        .params
        .get("joint_radius")
        .and_then(JsonValue::as_f64)
        .unwrap_or(3.0) as i32;
    let ink = Rgba([color.r, color.g, color.b, color.a]);

    let mut layer = RgbaImage::new(ctx.width, ctx.height);
    let Some(bones) = ctx.data.get("bones").and_then(JsonValue::as_object) else {
        return Ok(CustomOutput::Buffered(Box::new(layer)));
    };
    let head = |name: &str| -> Option<(f64, f64)> {
        let coords = bones.get(name)?.get("screen_coords")?.as_array()?;
        let x = coords.first()?.as_f64()?;
        let y = coords.get(1)?.as_f64()?;
        let sentinel = [OFFSCREEN[0] as f64, OFFSCREEN[1] as f64];
        (x != sentinel[0] || y != sentinel[1]).then_some((x, y))
    };

    for (name, bone) in bones {
        let Some(from) = head(name.as_str()) else { continue };
        let children = bone
            .get("children")
            .and_then(JsonValue::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        for child in children.iter().filter_map(JsonValue::as_str) {
            if let Some(to) = head(child) {
                thick_segment(&mut layer, from, to, width, ink);
            }
        }
    }
    for name in bones.keys() {
        if let Some((x, y)) = head(name.as_str()) {
            draw_filled_circle_mut(&mut layer, (x.round() as i32, y.round() as i32), radius, ink);
        }
    }
    Ok(CustomOutput::Buffered(Box::new(layer)))
}

fn thick_segment(layer: &mut RgbaImage, from: (f64, f64), to: (f64, f64), width: f64, ink: Rgba<u8>) {
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let len = dx.hypot(dy);
    if width <= 1.0 || len == 0.0 {
        draw_line_segment_mut(
            layer,
            (from.0 as f32, from.1 as f32),
            (to.0 as f32, to.1 as f32),
            ink,
        );
        return;
    }
    let (nx, ny) = (-dy / len * width / 2.0, dx / len * width / 2.0);
    let mut quad: Vec<Point<i32>> = [
        (from.0 + nx, from.1 + ny),
        (to.0 + nx, to.1 + ny),
        (to.0 - nx, to.1 - ny),
        (from.0 - nx, from.1 - ny),
    ]
    .iter()
    .map(|&(x, y)| Point::new(x.round() as i32, y.round() as i32))
    .collect();
    quad.dedup();
    if quad.len() < 3 || quad.first() == quad.last() {
        draw_line_segment_mut(
            layer,
            (from.0 as f32, from.1 as f32),
            (to.0 as f32, to.1 as f32),
            ink,
        );
    } else {
        draw_polygon_mut(layer, &quad, ink);
    }
}
