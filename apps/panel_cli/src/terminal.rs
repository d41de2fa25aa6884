use std::io::Write;

use editor_integration::{EditorConfig, TextBufferEditor};
use panel_core::{
    view::{PanelView, SourceDisplayView},
    EditorSurface, RenderSurface,
};
use tokio::sync::watch;
use tracing::warn;

/// Prints every committed frame: control bar, source list, then the editor
/// pane as kept in sync by [`EditorSurface`].
pub struct TerminalSurface<W> {
    editor: EditorSurface<TextBufferEditor>,
    out: W,
    frames: usize,
    latest: watch::Sender<Option<PanelView>>,
}

impl<W: Write + Send> TerminalSurface<W> {
    pub fn new(config: &EditorConfig, out: W) -> Self {
        Self {
            editor: EditorSurface::new(TextBufferEditor::new(config.clone()), config),
            out,
            frames: 0,
            latest: watch::channel(None).0,
        }
    }

    /// Follows the most recently committed frame.
    pub fn subscribe(&self) -> watch::Receiver<Option<PanelView>> {
        self.latest.subscribe()
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn into_writer(self) -> W {
        self.out
    }

    fn write_frame(&mut self, view: &PanelView) -> std::io::Result<()> {
        writeln!(self.out, "== frame {} ==", self.frames)?;
        writeln!(self.out, "[{}]", view.control_bar.label())?;

        let entries: Vec<String> = view
            .source_list
            .entries
            .iter()
            .map(|entry| {
                if entry.selected {
                    format!("<{}>", entry.label)
                } else {
                    entry.label.clone()
                }
            })
            .collect();
        writeln!(self.out, "sources: {}", entries.join(" "))?;

        match &view.source_display {
            SourceDisplayView::Empty => writeln!(self.out, "(no source selected)")?,
            SourceDisplayView::Loading { url } | SourceDisplayView::Error { url, .. } => {
                writeln!(self.out, "{url}")?
            }
            SourceDisplayView::Document(document) => {
                writeln!(self.out, "{} ({:?})", document.url, document.mode)?
            }
        }
        for line in self.editor.editor().render_lines() {
            writeln!(self.out, "{line}")?;
        }
        self.out.flush()
    }
}

impl<W: Write + Send> RenderSurface for TerminalSurface<W> {
    fn commit(&mut self, view: &PanelView) {
        self.editor.sync(&view.source_display);
        self.frames += 1;
        if let Err(err) = self.write_frame(view) {
            warn!("failed to print frame: {err}");
        }
        self.latest.send_replace(Some(view.clone()));
    }
}
