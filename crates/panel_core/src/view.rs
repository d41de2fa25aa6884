//! Render projection: session state to UI tree.

use editor_integration::EditorMode;
use shared::domain::{LineNumber, Source, SourceUrl};

use crate::{
    action::PanelAction,
    state::{SelectedSource, SessionState},
};

/// Text shown in the editor while a source is being fetched.
pub const LOADING_TEXT: &str = "loading";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelView {
    pub control_bar: ControlBarView,
    pub source_list: SourceListView,
    pub source_display: SourceDisplayView,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlBarView {
    pub paused: bool,
}

impl ControlBarView {
    pub fn label(&self) -> &'static str {
        if self.paused {
            "->"
        } else {
            "||"
        }
    }

    pub fn on_click(&self) -> PanelAction {
        PanelAction::TogglePaused
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceListView {
    pub entries: Vec<SourceEntryView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntryView {
    pub source: Source,
    pub label: String,
    pub selected: bool,
}

impl SourceEntryView {
    pub fn on_click(&self) -> PanelAction {
        PanelAction::SelectSource(self.source.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakpointMarker {
    pub line: LineNumber,
    pub failed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocumentView {
    pub url: SourceUrl,
    pub text: String,
    pub mode: EditorMode,
    pub breakpoints: Vec<BreakpointMarker>,
    pub debug_line: Option<LineNumber>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceDisplayView {
    Empty,
    Loading { url: SourceUrl },
    Error { url: SourceUrl, message: String },
    Document(SourceDocumentView),
}

/// What the editor is showing, used to decide when its text must be replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayIdentity {
    Empty,
    Loading(SourceUrl),
    Error(SourceUrl),
    Document(SourceUrl),
}

impl SourceDisplayView {
    pub fn identity(&self) -> DisplayIdentity {
        match self {
            Self::Empty => DisplayIdentity::Empty,
            Self::Loading { url } => DisplayIdentity::Loading(url.clone()),
            Self::Error { url, .. } => DisplayIdentity::Error(url.clone()),
            Self::Document(document) => DisplayIdentity::Document(document.url.clone()),
        }
    }

    pub fn text(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Loading { .. } => LOADING_TEXT.to_string(),
            Self::Error { message, .. } => format!("error: {message}"),
            Self::Document(document) => document.text.clone(),
        }
    }

    pub fn mode(&self) -> EditorMode {
        match self {
            Self::Document(document) => document.mode,
            _ => EditorMode::Text,
        }
    }

    pub fn breakpoints(&self) -> &[BreakpointMarker] {
        match self {
            Self::Document(document) => &document.breakpoints,
            _ => &[],
        }
    }

    pub fn debug_line(&self) -> Option<LineNumber> {
        match self {
            Self::Document(document) => document.debug_line,
            _ => None,
        }
    }
}

pub fn project(state: &SessionState) -> PanelView {
    let selected_url = state.selected.as_ref().map(SelectedSource::url);
    PanelView {
        control_bar: ControlBarView {
            paused: state.paused,
        },
        source_list: SourceListView {
            entries: state
                .sources
                .iter()
                .map(|source| SourceEntryView {
                    source: source.clone(),
                    label: source.url.display_name(),
                    selected: selected_url == Some(&source.url),
                })
                .collect(),
        },
        source_display: project_display(state),
    }
}

fn project_display(state: &SessionState) -> SourceDisplayView {
    match &state.selected {
        None => SourceDisplayView::Empty,
        Some(SelectedSource::Loading { url }) => SourceDisplayView::Loading { url: url.clone() },
        Some(SelectedSource::Error { url, message }) => SourceDisplayView::Error {
            url: url.clone(),
            message: message.clone(),
        },
        Some(SelectedSource::Loaded(loaded)) => SourceDisplayView::Document(SourceDocumentView {
            url: loaded.url.clone(),
            text: loaded.text.clone(),
            mode: EditorMode::for_content_type(&loaded.content_type),
            breakpoints: state
                .breakpoints
                .for_url(&loaded.url)
                .map(|breakpoint| BreakpointMarker {
                    line: breakpoint.location.line,
                    failed: breakpoint.is_failed(),
                })
                .collect(),
            debug_line: loaded.debug_line,
        }),
    }
}

#[cfg(test)]
#[path = "tests/view_tests.rs"]
mod tests;
