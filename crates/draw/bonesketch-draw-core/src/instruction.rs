//! Drawing instruction documents:
//!
//! ```json
//! { "bones": [
//!     {"index": 0, "draw_type": "line",
//!      "start_x": "BONES_HIPS_SCREEN_COORDS_0", "start_y": "BONES_HIPS_SCREEN_COORDS_1",
//!      "end_x": "BONES_HEAD_SCREEN_COORDS_0", "end_y": "BONES_HEAD_SCREEN_COORDS_1",
//!      "color": "navy", "size": 3},
//!     {"index": 1, "draw_type": "circle", "x": 10, "y": 10}
//! ] }
//! ```

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use bonesketch_api_core::json::read_typed;
use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue};

use crate::error::DrawError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstructionSet {
    pub bones: Vec<Instruction>,
}

impl InstructionSet {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, DrawError> {
        Ok(read_typed(path)?)
    }

    /// Instructions ordered by `index`; equal indices keep file order.
    pub fn sorted(mut self) -> Vec<Instruction> {
        self.bones.sort_by(|a, b| a.index.total_cmp(&b.index));
        self.bones
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    /// Draw order. Any JSON number; `1` and `1.0` are the same position.
    pub index: f64,
    pub draw_type: String,
    /// Every other key of the instruction object.
    #[serde(flatten)]
    pub params: JsonMap<String, JsonValue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrawType {
    Circle,
    Ellipse,
    Line,
    Polyline,
    Rectangle,
    Arc,
    Point,
    Polygon,
    PieSlice,
    Chord,
    Bitmap,
    Text,
    Custom,
}

impl DrawType {
    pub const ALL: [DrawType; 13] = [
        DrawType::Circle,
        DrawType::Ellipse,
        DrawType::Line,
        DrawType::Polyline,
        DrawType::Rectangle,
        DrawType::Arc,
        DrawType::Point,
        DrawType::Polygon,
        DrawType::PieSlice,
        DrawType::Chord,
        DrawType::Bitmap,
        DrawType::Text,
        DrawType::Custom,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DrawType::Circle => "circle",
            DrawType::Ellipse => "ellipse",
            DrawType::Line => "line",
            DrawType::Polyline => "polyline",
            DrawType::Rectangle => "rectangle",
            DrawType::Arc => "arc",
            DrawType::Point => "point",
            DrawType::Polygon => "polygon",
            DrawType::PieSlice => "pieslice",
            DrawType::Chord => "chord",
            DrawType::Bitmap => "bitmap",
            DrawType::Text => "text",
            DrawType::Custom => "custom",
        }
    }
}

impl fmt::Display for DrawType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DrawType {
    type Err = DrawError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DrawType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| DrawError::UnknownDrawType(s.to_string()))
    }
}
