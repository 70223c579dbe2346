//! The drawing primitives.
//!
//! An [`Instruction`] compiles into a [`Shape`] once, when the program is
//! built: expressions are parsed, colours decoded and custom callbacks looked
//! up. Drawing a shape only evaluates its expressions against the current
//! namespace.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use bonesketch_api_core::ConstantNamespace;
use serde_json::Value as JsonValue;

use crate::canvas::Canvas;
use crate::color::Color;
use crate::custom::{custom_key, CustomDraw, CustomDrawContext, CustomRegistry};
use crate::error::DrawError;
use crate::instruction::{DrawType, Instruction};
use crate::params::{resolve_points, Param, Params, PointParam};
use crate::text::{draw_centered, FontBook};

/// What drawing a shape did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Drawn,
    Skipped(String),
}

impl Outcome {
    fn skipped(reason: impl Into<String>) -> Self {
        Outcome::Skipped(reason.into())
    }
}

/// Per-document state the shapes draw against.
pub struct DrawContext<'a> {
    pub data: &'a JsonValue,
    pub ns: &'a ConstantNamespace,
    pub fonts: &'a mut FontBook,
}

pub enum Shape {
    Circle {
        center: PointParam,
        color: Color,
        size: Param,
    },
    Ellipse {
        center: PointParam,
        radius_x: Param,
        radius_y: Param,
        fill: Option<Color>,
        outline: Option<Color>,
        width: Param,
    },
    Line {
        start: PointParam,
        end: PointParam,
        color: Color,
        size: Param,
    },
    Polyline {
        points: Vec<PointParam>,
        color: Color,
        width: Param,
        joint: String,
    },
    Rectangle {
        center: PointParam,
        width: Param,
        height: Param,
        color: Color,
    },
    Arc {
        center: PointParam,
        start_angle: Param,
        end_angle: Param,
        width: Param,
        height: Param,
        color: Color,
    },
    Point {
        at: PointParam,
        color: Color,
    },
    Polygon {
        points: Vec<PointParam>,
        outline: Color,
        fill: Option<Color>,
    },
    PieSlice {
        center: PointParam,
        start_angle: Param,
        end_angle: Param,
        radius: Param,
        color: Color,
    },
    Chord {
        center: PointParam,
        start_angle: Param,
        end_angle: Param,
        radius: Param,
        outline: Color,
        fill: Option<Color>,
    },
    Bitmap {
        at: PointParam,
        image_path: Option<PathBuf>,
        color: Color,
    },
    Text {
        at: PointParam,
        text: String,
        color: Color,
        font_size: Param,
        font_family: String,
    },
    Custom {
        key: String,
        callback: Arc<dyn CustomDraw>,
        params: JsonValue,
    },
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Custom { key, .. } => write!(f, "Shape::Custom({key})"),
            other => write!(f, "Shape::{}", other.draw_type()),
        }
    }
}

impl Shape {
    pub fn compile(instr: &Instruction, registry: &CustomRegistry) -> Result<Self, DrawError> {
        let draw_type: DrawType = instr.draw_type.parse()?;
        let p = Params::new(&instr.params);
        let shape = match draw_type {
            DrawType::Circle => Shape::Circle {
                center: p.point("x", "y")?,
                color: p.color("color", Color::BLACK)?,
                size: p.number("size")?,
            },
            DrawType::Ellipse => {
                let color = p.color("color", Color::BLACK)?;
                Shape::Ellipse {
                    center: p.point("x", "y")?,
                    radius_x: p.number("radius_x")?,
                    radius_y: p.number("radius_y")?,
                    fill: p.optional_color("fill")?,
                    outline: p.color_or_disabled("outline", color)?,
                    width: p.number("width")?,
                }
            }
            DrawType::Line => Shape::Line {
                start: p.point("start_x", "start_y")?,
                end: p.point("end_x", "end_y")?,
                color: p.color("color", Color::BLACK)?,
                size: p.number("size")?,
            },
            DrawType::Polyline => Shape::Polyline {
                points: p.points()?,
                color: p.color("color", Color::BLACK)?,
                width: p.number("width")?,
                joint: p.text("joint", "curve"),
            },
            DrawType::Rectangle => Shape::Rectangle {
                center: p.point("x", "y")?,
                width: p.number("width")?,
                height: p.number("height")?,
                color: p.color("color", Color::BLACK)?,
            },
            DrawType::Arc => Shape::Arc {
                center: p.point("x", "y")?,
                start_angle: p.number("start_angle")?,
                end_angle: p.number("end_angle")?,
                width: p.number("width")?,
                height: p.number("height")?,
                color: p.color("color", Color::BLACK)?,
            },
            DrawType::Point => Shape::Point {
                at: p.point("x", "y")?,
                color: p.color("color", Color::BLACK)?,
            },
            DrawType::Polygon => Shape::Polygon {
                points: p.points()?,
                outline: p.color("color", Color::BLACK)?,
                fill: p.optional_color("fill")?,
            },
            DrawType::PieSlice => Shape::PieSlice {
                center: p.point("x", "y")?,
                start_angle: p.number("start_angle")?,
                end_angle: p.number("end_angle")?,
                radius: p.number("radius")?,
                color: p.color("color", Color::BLACK)?,
            },
            DrawType::Chord => Shape::Chord {
                center: p.point("x", "y")?,
                start_angle: p.number("start_angle")?,
                end_angle: p.number("end_angle")?,
                radius: p.number("radius")?,
                outline: p.color("color", Color::BLACK)?,
                fill: p.optional_color("fill")?,
            },
            DrawType::Bitmap => Shape::Bitmap {
                at: p.point("x", "y")?,
                image_path: p.optional_text("image_path").map(PathBuf::from),
                color: p.color("color", Color::BLACK)?,
            },
            DrawType::Text => Shape::Text {
                at: p.point("x", "y")?,
                text: p.text("text", ""),
                color: p.color("color", Color::BLACK)?,
                font_size: p.number("font_size")?,
                font_family: p.text("font_family", "arial"),
            },
            DrawType::Custom => {
                let library = p
                    .optional_text("library")
                    .ok_or_else(|| DrawError::param("library", "missing"))?;
                let function = p
                    .optional_text("function")
                    .ok_or_else(|| DrawError::param("function", "missing"))?;
                let key = custom_key(&library, &function);
                let callback = registry
                    .get(&key)
                    .ok_or_else(|| DrawError::UnresolvedCustom(key.clone()))?;
                Shape::Custom {
                    key,
                    callback,
                    params: p
                        .raw("params")
                        .cloned()
                        .unwrap_or_else(|| JsonValue::Object(Default::default())),
                }
            }
        };
        Ok(shape)
    }

    pub fn draw_type(&self) -> DrawType {
        match self {
            Shape::Circle { .. } => DrawType::Circle,
            Shape::Ellipse { .. } => DrawType::Ellipse,
            Shape::Line { .. } => DrawType::Line,
            Shape::Polyline { .. } => DrawType::Polyline,
            Shape::Rectangle { .. } => DrawType::Rectangle,
            Shape::Arc { .. } => DrawType::Arc,
            Shape::Point { .. } => DrawType::Point,
            Shape::Polygon { .. } => DrawType::Polygon,
            Shape::PieSlice { .. } => DrawType::PieSlice,
            Shape::Chord { .. } => DrawType::Chord,
            Shape::Bitmap { .. } => DrawType::Bitmap,
            Shape::Text { .. } => DrawType::Text,
            Shape::Custom { .. } => DrawType::Custom,
        }
    }

    pub fn draw(&self, canvas: &mut Canvas, ctx: &mut DrawContext<'_>) -> Result<Outcome, DrawError> {
        let ns = ctx.ns;
        let limit = canvas.max_extent();
        match self {
            Shape::Circle { center, color, size } => {
                let Some((x, y)) = on_canvas(canvas, center, ns)? else {
                    return Ok(Outcome::skipped("centre unresolved or off canvas"));
                };
                canvas.filled_circle(x, y, pixels(size, ns, 5, limit)?, *color);
            }
            Shape::Ellipse {
                center,
                radius_x,
                radius_y,
                fill,
                outline,
                width,
            } => {
                let Some((x, y)) = on_canvas(canvas, center, ns)? else {
                    return Ok(Outcome::skipped("centre unresolved or off canvas"));
                };
                canvas.ellipse(
                    x,
                    y,
                    pixels(radius_x, ns, 25, limit)?,
                    pixels(radius_y, ns, 15, limit)?,
                    *fill,
                    *outline,
                    pixels(width, ns, 1, limit)?,
                );
            }
            Shape::Line {
                start,
                end,
                color,
                size,
            } => {
                let (Some(from), Some(to)) = (start.resolve(ns)?, end.resolve(ns)?) else {
                    return Ok(Outcome::skipped("endpoints unresolved"));
                };
                canvas.line(from, to, pixels(size, ns, 2, limit)?, *color);
            }
            Shape::Polyline {
                points,
                color,
                width,
                joint,
            } => {
                let points = resolve_points(points, ns)?;
                if points.is_empty() {
                    return Ok(Outcome::skipped("no resolvable points"));
                }
                let width = pixels(width, ns, 2, limit)?;
                if joint == "curve" {
                    canvas.polygon(&points, None, Some(*color), width);
                } else {
                    canvas.polyline(&points, width, *color);
                }
            }
            Shape::Rectangle {
                center,
                width,
                height,
                color,
            } => {
                let Some((x, y)) = on_canvas(canvas, center, ns)? else {
                    return Ok(Outcome::skipped("centre unresolved or off canvas"));
                };
                let w = pixels(width, ns, 10, limit)?.max(0);
                let h = pixels(height, ns, 5, limit)?.max(0);
                canvas.filled_rect(
                    x - f64::from(w) / 2.0,
                    y - f64::from(h) / 2.0,
                    w as u32,
                    h as u32,
                    *color,
                );
            }
            Shape::Arc {
                center,
                start_angle,
                end_angle,
                width,
                height,
                color,
            } => {
                let Some((x, y)) = center.resolve(ns)? else {
                    return Ok(Outcome::skipped("centre unresolved"));
                };
                let rx = f64::from(pixels(width, ns, 50, limit)?) / 2.0;
                let ry = f64::from(pixels(height, ns, 50, limit)?) / 2.0;
                let (start, end) = angles(start_angle, end_angle, ns)?;
                canvas.arc(x, y, rx, ry, start, end, *color);
            }
            Shape::Point { at, color } => {
                let Some((x, y)) = at.resolve(ns)? else {
                    return Ok(Outcome::skipped("position unresolved"));
                };
                canvas.point(x, y, *color);
            }
            Shape::Polygon {
                points,
                outline,
                fill,
            } => {
                let points = resolve_points(points, ns)?;
                if points.is_empty() {
                    return Ok(Outcome::skipped("no resolvable points"));
                }
                canvas.polygon(&points, *fill, Some(*outline), 1);
            }
            Shape::PieSlice {
                center,
                start_angle,
                end_angle,
                radius,
                color,
            } => {
                let Some((x, y)) = center.resolve(ns)? else {
                    return Ok(Outcome::skipped("centre unresolved"));
                };
                let (start, end) = angles(start_angle, end_angle, ns)?;
                canvas.pieslice(x, y, f64::from(pixels(radius, ns, 50, limit)?), start, end, *color);
            }
            Shape::Chord {
                center,
                start_angle,
                end_angle,
                radius,
                outline,
                fill,
            } => {
                let Some((x, y)) = center.resolve(ns)? else {
                    return Ok(Outcome::skipped("centre unresolved"));
                };
                let (start, end) = angles(start_angle, end_angle, ns)?;
                let r = f64::from(pixels(radius, ns, 50, limit)?);
                canvas.chord(x, y, r, start, end, *fill, Some(*outline));
            }
            Shape::Bitmap {
                at,
                image_path,
                color,
            } => {
                let Some((x, y)) = at.resolve(ns)? else {
                    return Ok(Outcome::skipped("position unresolved"));
                };
                let Some(path) = image_path else {
                    return Ok(Outcome::skipped("no image_path"));
                };
                let mask = image::open(path)
                    .map_err(|source| DrawError::Bitmap {
                        path: path.clone(),
                        source,
                    })?
                    .to_luma_alpha8();
                canvas.stamp(x.trunc() as i64, y.trunc() as i64, &mask, *color);
            }
            Shape::Text {
                at,
                text,
                color,
                font_size,
                font_family,
            } => {
                let Some((x, y)) = at.resolve(ns)? else {
                    return Ok(Outcome::skipped("position unresolved"));
                };
                if text.is_empty() {
                    return Ok(Outcome::skipped("empty text"));
                }
                let tallest = i32::try_from(canvas.height()).unwrap_or(i32::MAX);
                let size = pixels(font_size, ns, 12, tallest)?;
                let font = ctx.fonts.font(font_family)?;
                draw_centered(canvas.image_mut(), &font, size as f32, x, y, text, *color);
            }
            Shape::Custom {
                key,
                callback,
                params,
            } => {
                let cx = CustomDrawContext {
                    data: ctx.data,
                    width: canvas.width(),
                    height: canvas.height(),
                    namespace: ns,
                    params,
                };
                let layer = callback
                    .draw(&cx)
                    .map_err(|e| DrawError::Custom {
                        key: key.clone(),
                        reason: e.to_string(),
                    })?
                    .into_image(key)?;
                canvas.overlay(&layer);
            }
        }
        Ok(Outcome::Drawn)
    }
}

/// Resolved point, `None` when unresolved or outside the canvas.
fn on_canvas(
    canvas: &Canvas,
    point: &PointParam,
    ns: &ConstantNamespace,
) -> Result<Option<(f64, f64)>, DrawError> {
    Ok(point
        .resolve(ns)?
        .filter(|&(x, y)| canvas.contains(x, y)))
}

/// Whole pixels, kept within `limit` either way.
fn pixels(param: &Param, ns: &ConstantNamespace, default: i64, limit: i32) -> Result<i32, DrawError> {
    let v = param.pixels_or(ns, default)?;
    let limit = i64::from(limit);
    Ok(v.clamp(-limit, limit) as i32)
}

fn angles(start: &Param, end: &Param, ns: &ConstantNamespace) -> Result<(f64, f64), DrawError> {
    Ok((start.resolve_or(ns, 0.0)?, end.resolve_or(ns, 90.0)?))
}
