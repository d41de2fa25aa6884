//! Display surfaces the projected UI tree is committed to.

use editor_integration::{DebugOverlay, EditorConfig, GutterClick, MouseButton, SourceEditor};
use shared::domain::LineNumber;

use crate::view::{DisplayIdentity, PanelView, SourceDisplayView};

pub trait RenderSurface: Send {
    fn commit(&mut self, view: &PanelView);
}

/// Maps a gutter click to the breakpoint line it toggles. Only the primary
/// button toggles.
pub fn translate_gutter_click(click: GutterClick) -> Option<LineNumber> {
    match click.button {
        MouseButton::Primary => Some(LineNumber::from_zero_based(click.line)),
        MouseButton::Middle | MouseButton::Secondary => None,
    }
}

/// Source display view: keeps an embedded editor widget in sync with the
/// projected display on every commit.
pub struct EditorSurface<E> {
    editor: E,
    shown: Option<DisplayIdentity>,
}

impl<E: SourceEditor + DebugOverlay> EditorSurface<E> {
    pub fn new(mut editor: E, config: &EditorConfig) -> Self {
        editor.configure(config);
        Self {
            editor,
            shown: None,
        }
    }

    pub fn editor(&self) -> &E {
        &self.editor
    }

    pub fn into_editor(self) -> E {
        self.editor
    }

    pub fn sync(&mut self, display: &SourceDisplayView) {
        let identity = display.identity();
        if self.shown.as_ref() != Some(&identity) {
            self.editor.set_text(&display.text());
            self.shown = Some(identity);
        }

        self.editor.set_mode(display.mode());

        self.editor.clear_breakpoints();
        for marker in display.breakpoints() {
            let line = marker.line.zero_based();
            if marker.failed {
                self.editor.add_breakpoint_error(line);
            } else {
                self.editor.add_breakpoint(line);
            }
        }

        match display.debug_line() {
            Some(line) => self.editor.set_debug_location(line.zero_based()),
            None => self.editor.clear_debug_location(),
        }
    }
}

impl<E: SourceEditor + DebugOverlay> RenderSurface for EditorSurface<E> {
    fn commit(&mut self, view: &PanelView) {
        self.sync(&view.source_display);
    }
}

#[cfg(test)]
#[path = "tests/surface_tests.rs"]
mod tests;
