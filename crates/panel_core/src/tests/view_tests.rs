use super::*;
use crate::{
    state::{Breakpoint, LoadedSource},
    test_support::stub_handle,
};
use shared::domain::BreakpointLocation;

fn loaded_state(content_type: &str) -> SessionState {
    let mut state = SessionState::default();
    state.sources = vec![
        Source::new("http://example.com/js/a.js", "text/javascript"),
        Source::new("http://example.com/js/b.js", "text/javascript"),
    ];
    state.selected = Some(SelectedSource::Loaded(LoadedSource {
        url: SourceUrl::new("http://example.com/js/a.js"),
        text: "one\ntwo\nthree".to_string(),
        content_type: content_type.to_string(),
        debug_line: Some(LineNumber(2)),
    }));
    state
}

#[test]
fn control_bar_reflects_pause_state() {
    let mut state = SessionState::default();
    assert_eq!(project(&state).control_bar.label(), "||");
    state.paused = true;
    let view = project(&state);
    assert_eq!(view.control_bar.label(), "->");
    assert_eq!(view.control_bar.on_click(), PanelAction::TogglePaused);
}

#[test]
fn source_list_has_one_entry_per_source() {
    let state = loaded_state("text/javascript");
    let view = project(&state);

    let labels: Vec<&str> = view
        .source_list
        .entries
        .iter()
        .map(|entry| entry.label.as_str())
        .collect();
    assert_eq!(labels, vec!["a.js", "b.js"]);
    assert!(view.source_list.entries[0].selected);
    assert!(!view.source_list.entries[1].selected);
    assert_eq!(
        view.source_list.entries[1].on_click(),
        PanelAction::SelectSource(state.sources[1].clone())
    );
}

#[test]
fn document_view_carries_markers_mode_and_debug_line() {
    let mut state = loaded_state("text/javascript");
    let url = SourceUrl::new("http://example.com/js/a.js");
    state.breakpoints.insert(Breakpoint::active(
        BreakpointLocation::new(url.clone(), LineNumber(3)),
        stub_handle("bp-3"),
    ));
    state.breakpoints.insert(Breakpoint::failed(
        BreakpointLocation::new(url.clone(), LineNumber(1)),
        "noScript",
    ));
    state.breakpoints.insert(Breakpoint::active(
        BreakpointLocation::new(SourceUrl::new("other.js"), LineNumber(1)),
        stub_handle("bp-other"),
    ));

    let view = project(&state);
    let SourceDisplayView::Document(document) = &view.source_display else {
        panic!("expected a document, got {:?}", view.source_display);
    };
    assert_eq!(document.mode, EditorMode::JavaScript);
    assert_eq!(document.debug_line, Some(LineNumber(2)));
    assert_eq!(
        document.breakpoints,
        vec![
            BreakpointMarker {
                line: LineNumber(1),
                failed: true
            },
            BreakpointMarker {
                line: LineNumber(3),
                failed: false
            },
        ]
    );
}

#[test]
fn plain_content_types_use_text_mode() {
    let view = project(&loaded_state("text/css"));
    assert_eq!(view.source_display.mode(), EditorMode::Text);
}

#[test]
fn placeholders_render_status_text() {
    let mut state = SessionState::default();
    assert_eq!(project(&state).source_display, SourceDisplayView::Empty);

    state.selected = Some(SelectedSource::Loading {
        url: SourceUrl::new("a.js"),
    });
    let loading = project(&state).source_display;
    assert_eq!(loading.text(), LOADING_TEXT);
    assert!(loading.breakpoints().is_empty());

    state.selected = Some(SelectedSource::Error {
        url: SourceUrl::new("a.js"),
        message: "noSuchSource".to_string(),
    });
    let error = project(&state).source_display;
    assert_eq!(error.text(), "error: noSuchSource");
    assert_ne!(error.identity(), loading.identity());
}

#[test]
fn projection_is_repeatable() {
    let state = loaded_state("text/javascript");
    assert_eq!(project(&state), project(&state));
}
