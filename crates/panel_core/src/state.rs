//! Session state owned by the panel's store.

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    sync::Arc,
};

use shared::domain::{BreakpointLocation, LineNumber, Source, SourceUrl};

use crate::BreakpointHandle;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedSource {
    pub url: SourceUrl,
    pub text: String,
    pub content_type: String,
    pub debug_line: Option<LineNumber>,
}

/// What the source display currently shows. Replaced wholesale on every
/// selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectedSource {
    Loading { url: SourceUrl },
    Error { url: SourceUrl, message: String },
    Loaded(LoadedSource),
}

impl SelectedSource {
    pub fn url(&self) -> &SourceUrl {
        match self {
            Self::Loading { url } | Self::Error { url, .. } => url,
            Self::Loaded(loaded) => &loaded.url,
        }
    }

    pub fn debug_line(&self) -> Option<LineNumber> {
        match self {
            Self::Loaded(loaded) => loaded.debug_line,
            _ => None,
        }
    }
}

#[derive(Clone)]
pub struct Breakpoint {
    pub location: BreakpointLocation,
    /// Removal capability returned by the protocol client. `None` when the
    /// set request failed.
    pub handle: Option<Arc<dyn BreakpointHandle>>,
    /// Failure of the last set/remove round-trip for this line.
    pub error: Option<String>,
}

impl Breakpoint {
    pub fn active(location: BreakpointLocation, handle: Arc<dyn BreakpointHandle>) -> Self {
        Self {
            location,
            handle: Some(handle),
            error: None,
        }
    }

    pub fn failed(location: BreakpointLocation, error: impl Into<String>) -> Self {
        Self {
            location,
            handle: None,
            error: Some(error.into()),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

impl fmt::Debug for Breakpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Breakpoint")
            .field("location", &self.location)
            .field("handle", &self.handle.as_ref().map(|handle| handle.actor()))
            .field("error", &self.error)
            .finish()
    }
}

/// Breakpoints keyed by `(url, line)`, plus the locations whose protocol
/// round-trip has not completed yet.
#[derive(Debug, Clone, Default)]
pub struct BreakpointBook {
    by_url: BTreeMap<SourceUrl, BTreeMap<LineNumber, Breakpoint>>,
    in_flight: BTreeSet<BreakpointLocation>,
}

impl BreakpointBook {
    pub fn get(&self, location: &BreakpointLocation) -> Option<&Breakpoint> {
        self.by_url
            .get(&location.url)
            .and_then(|lines| lines.get(&location.line))
    }

    pub fn get_mut(&mut self, location: &BreakpointLocation) -> Option<&mut Breakpoint> {
        self.by_url
            .get_mut(&location.url)
            .and_then(|lines| lines.get_mut(&location.line))
    }

    /// Inserts or replaces the entry at the breakpoint's location.
    pub fn insert(&mut self, breakpoint: Breakpoint) {
        self.by_url
            .entry(breakpoint.location.url.clone())
            .or_default()
            .insert(breakpoint.location.line, breakpoint);
    }

    pub fn remove(&mut self, location: &BreakpointLocation) -> Option<Breakpoint> {
        let lines = self.by_url.get_mut(&location.url)?;
        let removed = lines.remove(&location.line);
        if lines.is_empty() {
            self.by_url.remove(&location.url);
        }
        removed
    }

    /// Entries for one source, ordered by line.
    pub fn for_url<'a>(&'a self, url: &SourceUrl) -> impl Iterator<Item = &'a Breakpoint> + 'a {
        self.by_url
            .get(url)
            .into_iter()
            .flat_map(|lines| lines.values())
    }

    pub fn locations(&self) -> Vec<BreakpointLocation> {
        self.by_url
            .values()
            .flat_map(|lines| lines.values().map(|bp| bp.location.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.by_url.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_url.is_empty()
    }

    pub fn is_in_flight(&self, location: &BreakpointLocation) -> bool {
        self.in_flight.contains(location)
    }

    pub(crate) fn begin_round_trip(&mut self, location: BreakpointLocation) {
        self.in_flight.insert(location);
    }

    pub(crate) fn finish_round_trip(&mut self, location: &BreakpointLocation) {
        self.in_flight.remove(location);
    }

    /// Forgets round-trips whose completion will never arrive.
    pub(crate) fn abandon_round_trips(&mut self) {
        self.in_flight.clear();
    }
}

#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub paused: bool,
    pub sources: Vec<Source>,
    pub selected: Option<SelectedSource>,
    pub breakpoints: BreakpointBook,
    generation: u64,
}

impl SessionState {
    /// Fresh session that keeps the breakpoints of `previous`.
    pub fn carry_over(previous: SessionState) -> Self {
        Self {
            paused: false,
            sources: Vec::new(),
            selected: None,
            breakpoints: previous.breakpoints,
            generation: previous.generation + 1,
        }
    }

    /// Generation of the current selection. Fetch completions tagged with an
    /// older generation are stale.
    pub fn selection_generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// URL of the loaded source, the only selection breakpoints apply to.
    pub fn active_url(&self) -> Option<&SourceUrl> {
        match &self.selected {
            Some(SelectedSource::Loaded(loaded)) => Some(&loaded.url),
            _ => None,
        }
    }

    /// First source whose URL matches.
    pub fn find_source(&self, url: &SourceUrl) -> Option<&Source> {
        self.sources.iter().find(|source| &source.url == url)
    }
}
