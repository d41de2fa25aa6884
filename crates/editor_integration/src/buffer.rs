use std::collections::BTreeSet;

use crate::{DebugOverlay, EditorConfig, EditorMode, SourceEditor};

/// In-memory widget that keeps its buffer and markers as plain data.
///
/// Used by headless hosts to print the editor pane and by tests to observe
/// what the panel pushed into the widget.
#[derive(Debug, Clone, Default)]
pub struct TextBufferEditor {
    config: EditorConfig,
    lines: Vec<String>,
    mode: Option<EditorMode>,
    breakpoints: BTreeSet<u32>,
    breakpoint_errors: BTreeSet<u32>,
    debug_location: Option<u32>,
    text_replacements: usize,
}

impl TextBufferEditor {
    pub fn new(config: EditorConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn mode(&self) -> Option<EditorMode> {
        self.mode
    }

    pub fn breakpoints(&self) -> Vec<u32> {
        self.breakpoints.iter().copied().collect()
    }

    pub fn breakpoint_errors(&self) -> Vec<u32> {
        self.breakpoint_errors.iter().copied().collect()
    }

    pub fn debug_location(&self) -> Option<u32> {
        self.debug_location
    }

    /// Number of `set_text` calls received so far.
    pub fn text_replacements(&self) -> usize {
        self.text_replacements
    }

    /// Renders the buffer with gutter markers: `*` breakpoint, `!` failed
    /// breakpoint, `>` execution point.
    pub fn render_lines(&self) -> Vec<String> {
        let width = self.lines.len().to_string().len();
        self.lines
            .iter()
            .enumerate()
            .map(|(index, line)| {
                let row = index as u32;
                let marker = if self.breakpoint_errors.contains(&row) {
                    '!'
                } else if self.breakpoints.contains(&row) {
                    '*'
                } else {
                    ' '
                };
                let pointer = if self.debug_location == Some(row) {
                    '>'
                } else {
                    ' '
                };
                if self.config.line_numbers {
                    format!("{marker}{pointer}{:>width$} | {line}", index + 1)
                } else {
                    format!("{marker}{pointer} {line}")
                }
            })
            .collect()
    }
}

impl SourceEditor for TextBufferEditor {
    fn configure(&mut self, config: &EditorConfig) {
        self.config = config.clone();
    }

    fn set_text(&mut self, text: &str) {
        self.lines = text.lines().map(str::to_owned).collect();
        self.text_replacements += 1;
    }

    fn set_mode(&mut self, mode: EditorMode) {
        self.mode = Some(mode);
    }
}

impl DebugOverlay for TextBufferEditor {
    fn clear_breakpoints(&mut self) {
        self.breakpoints.clear();
        self.breakpoint_errors.clear();
    }

    fn add_breakpoint(&mut self, line: u32) {
        self.breakpoints.insert(line);
    }

    fn add_breakpoint_error(&mut self, line: u32) {
        self.breakpoint_errors.insert(line);
    }

    fn set_debug_location(&mut self, line: u32) {
        self.debug_location = Some(line);
    }

    fn clear_debug_location(&mut self) {
        self.debug_location = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_markers_in_gutter() {
        let mut editor = TextBufferEditor::new(EditorConfig::default());
        editor.set_text("let a = 1;\nlet b = 2;\nlet c = 3;");
        editor.add_breakpoint(0);
        editor.add_breakpoint_error(2);
        editor.set_debug_location(1);

        assert_eq!(
            editor.render_lines(),
            vec![
                "* 1 | let a = 1;".to_string(),
                " >2 | let b = 2;".to_string(),
                "! 3 | let c = 3;".to_string(),
            ]
        );
    }

    #[test]
    fn clearing_breakpoints_drops_error_markers() {
        let mut editor = TextBufferEditor::default();
        editor.add_breakpoint(4);
        editor.add_breakpoint_error(5);
        editor.clear_breakpoints();
        assert!(editor.breakpoints().is_empty());
        assert!(editor.breakpoint_errors().is_empty());
    }

    #[test]
    fn counts_text_replacements() {
        let mut editor = TextBufferEditor::default();
        editor.set_text("one");
        editor.set_text("two");
        assert_eq!(editor.text_replacements(), 2);
        assert_eq!(editor.text(), "two");
    }
}
