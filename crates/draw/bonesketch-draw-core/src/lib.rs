//! bonesketch-draw-core: renders pose snapshots to images by following a list
//! of drawing instructions whose coordinates are expressions over the
//! snapshot's flattened constants.

pub mod batch;
pub mod canvas;
pub mod color;
pub mod config;
pub mod custom;
pub mod error;
pub mod expr;
pub mod instruction;
pub mod interpreter;
pub mod params;
pub mod shapes;
pub mod text;

pub use batch::{fit_within, preview, render_file, render_path, save_image, BatchSummary};
pub use canvas::Canvas;
pub use color::{Color, ColorError};
pub use config::RenderConfig;
pub use custom::{
    CustomDraw, CustomDrawContext, CustomDrawError, CustomOutput, CustomRegistry, SaveToBuffer,
};
pub use error::DrawError;
pub use expr::{ExprError, Expression};
pub use instruction::{DrawType, Instruction, InstructionSet};
pub use interpreter::{
    canvas_size, DrawProgram, RenderReport, Rendered, Renderer, StepReport, StepStatus,
};
pub use shapes::{Outcome, Shape};
pub use text::FontBook;
