//! Pure session transitions. Protocol calls come back as [`Effect`]s.

use std::sync::Arc;

use shared::{
    domain::{BreakpointLocation, LineNumber, Source, SourceUrl},
    protocol::{PausePacket, SourceText},
};
use tracing::debug;

use crate::{
    state::{Breakpoint, LoadedSource, SelectedSource, SessionState},
    BreakpointHandle,
};

#[derive(Clone)]
pub enum Effect {
    FetchSource {
        generation: u64,
        source: Source,
        debug_line: Option<LineNumber>,
    },
    SetBreakpoint {
        location: BreakpointLocation,
    },
    RemoveBreakpoint {
        location: BreakpointLocation,
        handle: Arc<dyn BreakpointHandle>,
    },
    Interrupt,
    Resume,
}

impl Effect {
    pub fn name(&self) -> &'static str {
        match self {
            Self::FetchSource { .. } => "fetch_source",
            Self::SetBreakpoint { .. } => "set_breakpoint",
            Self::RemoveBreakpoint { .. } => "remove_breakpoint",
            Self::Interrupt => "interrupt",
            Self::Resume => "resume",
        }
    }
}

impl std::fmt::Debug for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FetchSource {
                generation,
                source,
                debug_line,
            } => f
                .debug_struct("FetchSource")
                .field("generation", generation)
                .field("url", &source.url)
                .field("debug_line", debug_line)
                .finish(),
            Self::SetBreakpoint { location } => f
                .debug_struct("SetBreakpoint")
                .field("location", location)
                .finish(),
            Self::RemoveBreakpoint { location, handle } => f
                .debug_struct("RemoveBreakpoint")
                .field("location", location)
                .field("actor", &handle.actor())
                .finish(),
            Self::Interrupt => f.write_str("Interrupt"),
            Self::Resume => f.write_str("Resume"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectOptions {
    pub debug_line: Option<LineNumber>,
}

#[derive(Debug)]
pub struct Transition {
    pub state: SessionState,
    pub effects: Vec<Effect>,
    pub render: bool,
}

impl Transition {
    fn render(state: SessionState) -> Self {
        Self {
            state,
            effects: Vec::new(),
            render: true,
        }
    }

    fn unchanged(state: SessionState) -> Self {
        Self {
            state,
            effects: Vec::new(),
            render: false,
        }
    }

    fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Starts a new session. Breakpoints survive; everything else is dropped and
/// fetches from the previous session become stale.
pub fn reset_session(previous: SessionState) -> Transition {
    Transition::render(SessionState::carry_over(previous))
}

pub fn sources_listed(mut state: SessionState, sources: Vec<Source>) -> Transition {
    state.sources.extend(sources);
    Transition::render(state)
}

pub fn source_discovered(mut state: SessionState, source: Source) -> Transition {
    state.sources.push(source);
    Transition::render(state)
}

pub fn paused(mut state: SessionState, packet: &PausePacket) -> Transition {
    state.paused = true;
    let Some(location) = packet.breakpoint_location() else {
        return Transition::render(state);
    };
    let Some(source) = state.find_source(&location.url).cloned() else {
        debug!(url = %location.url, "paused in a source the panel has not seen");
        return Transition::render(state);
    };
    select_source(
        state,
        source,
        SelectOptions {
            debug_line: Some(location.line),
        },
    )
}

pub fn resumed(mut state: SessionState) -> Transition {
    state.paused = false;
    if let Some(SelectedSource::Loaded(loaded)) = &mut state.selected {
        loaded.debug_line = None;
    }
    Transition::render(state)
}

/// Pause control from the control bar. State only changes once the client
/// reports the resulting pause or resume.
pub fn toggle_paused(state: SessionState) -> Transition {
    let effect = if state.paused {
        Effect::Resume
    } else {
        Effect::Interrupt
    };
    Transition::unchanged(state).with_effect(effect)
}

pub fn select_source(
    mut state: SessionState,
    source: Source,
    options: SelectOptions,
) -> Transition {
    let generation = state.next_generation();
    state.selected = Some(SelectedSource::Loading {
        url: source.url.clone(),
    });
    Transition::render(state).with_effect(Effect::FetchSource {
        generation,
        source,
        debug_line: options.debug_line,
    })
}

pub fn source_fetched(
    mut state: SessionState,
    generation: u64,
    url: SourceUrl,
    debug_line: Option<LineNumber>,
    result: Result<SourceText, String>,
) -> Transition {
    if generation != state.selection_generation() {
        debug!(
            %url,
            generation,
            current = state.selection_generation(),
            "discarding stale source fetch"
        );
        return Transition::unchanged(state);
    }

    state.selected = Some(match result {
        Ok(fetched) => SelectedSource::Loaded(LoadedSource {
            url,
            text: fetched.text,
            content_type: fetched.content_type,
            // A resume that raced the fetch already cleared the pause.
            debug_line: debug_line.filter(|_| state.paused),
        }),
        Err(message) => SelectedSource::Error { url, message },
    });
    Transition::render(state)
}

pub fn toggle_breakpoint(mut state: SessionState, line: LineNumber) -> Transition {
    let Some(url) = state.active_url().cloned() else {
        return Transition::unchanged(state);
    };
    let location = BreakpointLocation::new(url, line);

    if state.breakpoints.is_in_flight(&location) {
        debug!(%location, "breakpoint round-trip already in flight");
        return Transition::unchanged(state);
    }

    let existing_handle = state
        .breakpoints
        .get(&location)
        .map(|breakpoint| breakpoint.handle.clone());

    match existing_handle {
        Some(Some(handle)) => {
            state.breakpoints.begin_round_trip(location.clone());
            Transition::unchanged(state).with_effect(Effect::RemoveBreakpoint { location, handle })
        }
        Some(None) => {
            // Never reached the client; nothing to remove remotely.
            state.breakpoints.remove(&location);
            Transition::render(state)
        }
        None => {
            state.breakpoints.begin_round_trip(location.clone());
            Transition::unchanged(state).with_effect(Effect::SetBreakpoint { location })
        }
    }
}

pub fn breakpoint_set(
    mut state: SessionState,
    location: BreakpointLocation,
    result: Result<Arc<dyn BreakpointHandle>, String>,
) -> Transition {
    state.breakpoints.finish_round_trip(&location);
    let breakpoint = match result {
        Ok(handle) => Breakpoint::active(location, handle),
        Err(message) => Breakpoint::failed(location, message),
    };
    state.breakpoints.insert(breakpoint);
    Transition::render(state)
}

pub fn breakpoint_removed(
    mut state: SessionState,
    location: BreakpointLocation,
    result: Result<(), String>,
) -> Transition {
    state.breakpoints.finish_round_trip(&location);
    match result {
        Ok(()) => {
            state.breakpoints.remove(&location);
        }
        Err(message) => {
            if let Some(breakpoint) = state.breakpoints.get_mut(&location) {
                breakpoint.error = Some(message);
            }
        }
    }
    Transition::render(state)
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;
