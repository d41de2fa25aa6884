//! Capabilities the debugger panel needs from an embedded text-editing widget.
//!
//! The widget is split in two: [`SourceEditor`] covers text and highlighting,
//! [`DebugOverlay`] covers the breakpoint gutter and the execution marker.
//! All line arguments here are zero-based, as widgets count rows.

use serde::{Deserialize, Serialize};

mod buffer;

pub use buffer::TextBufferEditor;

/// Content types that switch the widget into script-aware highlighting.
const SCRIPT_CONTENT_TYPES: &[&str] = &[
    "text/javascript",
    "application/javascript",
    "application/x-javascript",
    "application/ecmascript",
    "text/ecmascript",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditorMode {
    Text,
    JavaScript,
}

impl EditorMode {
    /// Picks the highlighting mode for a source content type. Media type
    /// parameters such as `charset` are ignored.
    pub fn for_content_type(content_type: &str) -> Self {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        if SCRIPT_CONTENT_TYPES.contains(&essence.as_str()) {
            Self::JavaScript
        } else {
            Self::Text
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorConfig {
    pub read_only: bool,
    pub line_numbers: bool,
    pub breakpoint_gutter: bool,
    pub code_folding: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            read_only: true,
            line_numbers: true,
            breakpoint_gutter: true,
            code_folding: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MouseButton {
    Primary,
    Middle,
    Secondary,
}

/// Click in the breakpoint gutter, as reported by the widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GutterClick {
    pub line: u32,
    pub button: MouseButton,
}

impl GutterClick {
    pub fn primary(line: u32) -> Self {
        Self {
            line,
            button: MouseButton::Primary,
        }
    }
}

pub trait SourceEditor: Send {
    fn configure(&mut self, config: &EditorConfig);
    fn set_text(&mut self, text: &str);
    fn set_mode(&mut self, mode: EditorMode);
}

pub trait DebugOverlay: Send {
    fn clear_breakpoints(&mut self);
    fn add_breakpoint(&mut self, line: u32);
    /// Marks a gutter line whose last breakpoint operation failed.
    fn add_breakpoint_error(&mut self, line: u32);
    fn set_debug_location(&mut self, line: u32);
    fn clear_debug_location(&mut self);
}
