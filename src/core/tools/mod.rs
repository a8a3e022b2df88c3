//! Canvas tool catalog.
//!
//! The model drives the browser canvas through three functions. Only
//! `paintCanvas` takes parameters, described by a JSON schema document loaded
//! from disk at startup and passed to the vendor verbatim. Tool-call
//! arguments are never validated against it here; the browser owns that.

use std::path::Path;

use serde_json::Value;

use crate::config::{ConfigError, ConfigResult};
use crate::core::realtime::openai::ToolDef;

/// Tool type for every canvas tool.
const FUNCTION_TOOL_TYPE: &str = "function";

/// Functions the browser canvas client implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanvasTool {
    GetCanvasSize,
    ClearCanvas,
    PaintCanvas,
}

impl CanvasTool {
    /// Function name as the model and the browser see it.
    pub fn name(&self) -> &'static str {
        match self {
            Self::GetCanvasSize => "getCanvasSize",
            Self::ClearCanvas => "clearCanvas",
            Self::PaintCanvas => "paintCanvas",
        }
    }

    /// Description shown to the model.
    pub fn description(&self) -> &'static str {
        match self {
            Self::GetCanvasSize => {
                "Retrieves the current canvas dimensions in pixels, returning both width and height values."
            }
            Self::ClearCanvas => {
                "Clears the entire canvas, removing all previously drawn content and resetting it to a blank state."
            }
            Self::PaintCanvas => {
                "Executes painting operations on the canvas using the provided drawing instructions. \
                 The instructions must be a valid JSON object that conforms to the predefined schema \
                 and contains canvas drawing commands such as paths, shapes, colors, and transformations."
            }
        }
    }

    /// All tools in catalog order.
    pub fn all() -> &'static [CanvasTool] {
        &[Self::GetCanvasSize, Self::ClearCanvas, Self::PaintCanvas]
    }
}

/// Tool definitions advertised in the session configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCatalog {
    tools: Vec<ToolDef>,
}

impl ToolCatalog {
    /// Build the canvas catalog around the drawing-instruction schema.
    pub fn canvas(paint_schema: Value) -> Self {
        let mut paint_schema = Some(paint_schema);
        let tools = CanvasTool::all()
            .iter()
            .map(|tool| ToolDef {
                tool_type: FUNCTION_TOOL_TYPE.to_string(),
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                parameters: match tool {
                    CanvasTool::PaintCanvas => paint_schema.take(),
                    _ => None,
                },
            })
            .collect();

        Self { tools }
    }

    /// Tool definitions in catalog order.
    pub fn definitions(&self) -> &[ToolDef] {
        &self.tools
    }

    /// Whether a function name is part of the catalog.
    pub fn contains(&self, name: &str) -> bool {
        self.tools.iter().any(|tool| tool.name == name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Load the drawing-instruction JSON schema.
///
/// The document must be a JSON object; its contents are otherwise opaque.
pub fn load_tool_schema(path: &Path) -> ConfigResult<Value> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    let schema: Value = serde_json::from_str(&contents).map_err(|e| {
        ConfigError::InvalidSchema(format!("{}: {}", path.display(), e))
    })?;

    if !schema.is_object() {
        return Err(ConfigError::InvalidSchema(format!(
            "{}: schema must be a JSON object",
            path.display()
        )));
    }

    Ok(schema)
}
