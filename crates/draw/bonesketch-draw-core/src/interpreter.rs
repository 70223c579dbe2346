//! Runs a compiled drawing program against pose snapshots.

use std::fmt;
use std::path::Path;

use bonesketch_api_core::{ConstantNamespace, Scalar};
use image::RgbImage;
use log::{debug, warn};
use serde_json::Value as JsonValue;

use crate::canvas::Canvas;
use crate::config::RenderConfig;
use crate::custom::CustomRegistry;
use crate::error::DrawError;
use crate::instruction::InstructionSet;
use crate::shapes::{DrawContext, Outcome, Shape};
use crate::text::FontBook;

/// Largest accepted canvas side, in pixels.
pub const MAX_CANVAS_SIDE: u32 = 32_768;

struct Step {
    index: f64,
    draw_type: String,
    shape: Result<Shape, DrawError>,
}

/// Instructions sorted by `index` and compiled once. Instructions that fail
/// to compile stay in the program and are reported as failed on every render.
pub struct DrawProgram {
    steps: Vec<Step>,
}

impl fmt::Debug for DrawProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DrawProgram")
            .field("steps", &self.steps.len())
            .finish()
    }
}

impl DrawProgram {
    pub fn build(set: InstructionSet, registry: &CustomRegistry) -> Self {
        let steps = set
            .sorted()
            .into_iter()
            .map(|instr| {
                let shape = Shape::compile(&instr, registry);
                if let Err(err) = &shape {
                    warn!("instruction {} ({}): {err}", instr.index, instr.draw_type);
                }
                Step {
                    index: instr.index,
                    draw_type: instr.draw_type,
                    shape,
                }
            })
            .collect();
        DrawProgram { steps }
    }

    pub fn from_json_file(
        path: impl AsRef<Path>,
        registry: &CustomRegistry,
    ) -> Result<Self, DrawError> {
        Ok(Self::build(InstructionSet::from_json_file(path)?, registry))
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Indices of instructions that failed to compile, with the reason.
    pub fn build_errors(&self) -> Vec<(f64, &DrawError)> {
        self.steps
            .iter()
            .filter_map(|s| s.shape.as_ref().err().map(|e| (s.index, e)))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepStatus {
    Drawn,
    Skipped(String),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    pub index: f64,
    pub draw_type: String,
    pub status: StepStatus,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderReport {
    pub steps: Vec<StepReport>,
}

impl RenderReport {
    fn count(&self, pred: impl Fn(&StepStatus) -> bool) -> usize {
        self.steps.iter().filter(|s| pred(&s.status)).count()
    }

    pub fn drawn(&self) -> usize {
        self.count(|s| matches!(s, StepStatus::Drawn))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, StepStatus::Skipped(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, StepStatus::Failed(_)))
    }

    pub fn failures(&self) -> impl Iterator<Item = &StepReport> {
        self.steps
            .iter()
            .filter(|s| matches!(s.status, StepStatus::Failed(_)))
    }
}

#[derive(Debug)]
pub struct Rendered {
    pub image: RgbImage,
    pub report: RenderReport,
}

pub struct Renderer {
    config: RenderConfig,
    fonts: FontBook,
}

impl Renderer {
    pub fn new(config: RenderConfig) -> Self {
        let fonts = FontBook::new(&config.font_dirs);
        Renderer { config, fonts }
    }

    pub fn with_fonts(config: RenderConfig, fonts: FontBook) -> Self {
        Renderer { config, fonts }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Draw `program` over a fresh canvas sized from the snapshot's camera.
    ///
    /// Only a missing or unusable canvas size fails the whole document; every
    /// other failure is confined to its instruction and recorded in the report.
    pub fn render(&mut self, data: &JsonValue, program: &DrawProgram) -> Result<Rendered, DrawError> {
        let ns = ConstantNamespace::flatten(data);
        let (width, height) = canvas_size(&ns)?;
        let mut canvas = Canvas::new(width, height, self.config.background);
        let mut ctx = DrawContext {
            data,
            ns: &ns,
            fonts: &mut self.fonts,
        };

        let mut report = RenderReport::default();
        for step in &program.steps {
            let result = match &step.shape {
                Ok(shape) => shape.draw(&mut canvas, &mut ctx).map_err(|e| e.to_string()),
                Err(err) => Err(err.to_string()),
            };
            let status = match result {
                Ok(Outcome::Drawn) => {
                    debug!("instruction {} ({}) drawn", step.index, step.draw_type);
                    StepStatus::Drawn
                }
                Ok(Outcome::Skipped(reason)) => {
                    debug!("instruction {} ({}) skipped: {reason}", step.index, step.draw_type);
                    StepStatus::Skipped(reason)
                }
                Err(reason) => {
                    warn!("instruction {} ({}) failed: {reason}", step.index, step.draw_type);
                    StepStatus::Failed(reason)
                }
            };
            report.steps.push(StepReport {
                index: step.index,
                draw_type: step.draw_type.clone(),
                status,
            });
        }

        Ok(Rendered {
            image: canvas.into_image(),
            report,
        })
    }
}

/// `int(CAMERA_RESOLUTION_X)` x `int(CAMERA_RESOLUTION_Y)`.
pub fn canvas_size(ns: &ConstantNamespace) -> Result<(u32, u32), DrawError> {
    let side = |name: &str| -> Result<u32, DrawError> {
        let value = match ns.get(name) {
            Some(Scalar::Text(text)) => text.trim().parse::<f64>().ok(),
            Some(other) => other.as_number(),
            None => None,
        };
        let Some(value) = value.filter(|v| v.is_finite()) else {
            return Err(DrawError::CanvasSize(format!("{name} is missing or not a number")));
        };
        let pixels = value.trunc();
        if pixels < 1.0 || pixels > f64::from(MAX_CANVAS_SIDE) {
            return Err(DrawError::CanvasSize(format!(
                "{name} = {value} is outside 1..={MAX_CANVAS_SIDE}"
            )));
        }
        Ok(pixels as u32)
    };
    Ok((side("CAMERA_RESOLUTION_X")?, side("CAMERA_RESOLUTION_Y")?))
}
