//! Recorded debugging session replayed through the panel's capability traits.

use std::{
    collections::{BTreeSet, HashMap},
    fs,
    path::Path,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
    },
};

use anyhow::{Context, Result};
use async_trait::async_trait;
use editor_integration::GutterClick;
use panel_core::{BreakpointHandle, DebugTarget, PanelAction, PanelView, ProtocolClient};
use serde::Deserialize;
use shared::{
    domain::{BreakpointLocation, LineNumber, Source, SourceUrl},
    error::{ErrorCode, ProtocolFailure},
    protocol::{PausePacket, ProtocolEvent, SourceText},
};
use tokio::sync::{broadcast, Mutex};
use tracing::debug;

#[derive(Debug, Clone, Deserialize)]
pub struct SessionFixture {
    pub sources: Vec<FixtureSource>,
    /// Breakpoint lines the target refuses, with the reported reason.
    #[serde(default)]
    pub rejected_breakpoints: Vec<RejectedBreakpoint>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FixtureSource {
    pub url: SourceUrl,
    pub content_type: String,
    #[serde(default)]
    pub text: String,
    /// When set, fetching this source fails with the message.
    #[serde(default)]
    pub fetch_error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RejectedBreakpoint {
    pub url: SourceUrl,
    pub line: LineNumber,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    Select { url: SourceUrl },
    ToggleBreakpoint { line: LineNumber },
    GutterClick(GutterClick),
    TogglePaused,
    Event { event: ProtocolEvent },
}

impl SessionFixture {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read session fixture '{}'", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("invalid session fixture '{}'", path.display()))
    }
}

pub struct ReplayClient {
    sources: Vec<Source>,
    texts: HashMap<SourceUrl, Result<SourceText, String>>,
    rejected: HashMap<BreakpointLocation, String>,
    installed: Arc<Mutex<BTreeSet<BreakpointLocation>>>,
    next_actor: AtomicU64,
    paused: AtomicBool,
    events: broadcast::Sender<ProtocolEvent>,
}

impl ReplayClient {
    pub fn new(fixture: &SessionFixture, event_capacity: usize) -> Self {
        let (events, _) = broadcast::channel(event_capacity.max(1));
        let mut sources = Vec::new();
        let mut texts = HashMap::new();
        for entry in &fixture.sources {
            sources.push(Source {
                url: entry.url.clone(),
                content_type: entry.content_type.clone(),
            });
            let text = match &entry.fetch_error {
                Some(err) => Err(err.clone()),
                None => Ok(SourceText {
                    text: entry.text.clone(),
                    content_type: entry.content_type.clone(),
                }),
            };
            texts.insert(entry.url.clone(), text);
        }
        let rejected = fixture
            .rejected_breakpoints
            .iter()
            .map(|entry| {
                (
                    BreakpointLocation::new(entry.url.clone(), entry.line),
                    entry.reason.clone(),
                )
            })
            .collect();

        Self {
            sources,
            texts,
            rejected,
            installed: Arc::new(Mutex::new(BTreeSet::new())),
            next_actor: AtomicU64::new(1),
            paused: AtomicBool::new(false),
            events,
        }
    }

    /// Delivers an event to subscribers, tracking the pause state it implies.
    pub fn emit(&self, event: ProtocolEvent) {
        match &event {
            ProtocolEvent::Paused(_) => self.paused.store(true, Ordering::SeqCst),
            ProtocolEvent::Resumed | ProtocolEvent::WillNavigate => {
                self.paused.store(false, Ordering::SeqCst)
            }
            ProtocolEvent::NewSource { .. } => {}
        }
        debug!(?event, "replaying protocol event");
        // No subscriber simply means the panel is gone.
        let _ = self.events.send(event);
    }

    /// Breakpoints currently installed in the target.
    pub async fn installed(&self) -> Vec<BreakpointLocation> {
        self.installed.lock().await.iter().cloned().collect()
    }
}

/// What the replay loop does for one fixture step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepInput {
    Action(PanelAction),
    Event(ProtocolEvent),
}

/// Resolves a step against the last rendered frame. `select` and
/// `toggle_paused` click the source entry and the control bar.
pub fn input_for(step: &Step, view: &PanelView) -> Result<StepInput> {
    let input = match step {
        Step::Select { url } => {
            let entry = view
                .source_list
                .entries
                .iter()
                .find(|entry| &entry.source.url == url)
                .with_context(|| format!("source list has no entry for '{url}'"))?;
            StepInput::Action(entry.on_click())
        }
        Step::ToggleBreakpoint { line } => StepInput::Action(PanelAction::ToggleBreakpoint(*line)),
        Step::GutterClick(click) => StepInput::Action(PanelAction::GutterClick(*click)),
        Step::TogglePaused => StepInput::Action(view.control_bar.on_click()),
        Step::Event { event } => StepInput::Event(event.clone()),
    };
    Ok(input)
}

#[async_trait]
impl ProtocolClient for ReplayClient {
    async fn list_sources(&self) -> Result<Vec<Source>> {
        Ok(self.sources.clone())
    }

    async fn fetch_source_text(&self, source: &Source) -> Result<SourceText> {
        match self.texts.get(&source.url) {
            Some(Ok(text)) => Ok(text.clone()),
            Some(Err(message)) => {
                Err(ProtocolFailure::new(ErrorCode::Unavailable, message.clone()).into())
            }
            None => Err(ProtocolFailure::new(
                ErrorCode::NoSuchSource,
                format!("no source at {}", source.url),
            )
            .into()),
        }
    }

    async fn set_breakpoint(
        &self,
        location: &BreakpointLocation,
    ) -> Result<Arc<dyn BreakpointHandle>> {
        if let Some(reason) = self.rejected.get(location) {
            return Err(ProtocolFailure::new(ErrorCode::NoScript, reason.clone()).into());
        }
        self.installed.lock().await.insert(location.clone());
        let id = self.next_actor.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(ReplayBreakpoint {
            actor: format!("breakpoint{id}"),
            location: location.clone(),
            installed: Arc::clone(&self.installed),
        }))
    }

    async fn interrupt(&self) -> Result<()> {
        if self.paused.load(Ordering::SeqCst) {
            return Err(
                ProtocolFailure::new(ErrorCode::WrongState, "thread already paused").into(),
            );
        }
        self.emit(ProtocolEvent::Paused(PausePacket::interrupted()));
        Ok(())
    }

    async fn resume(&self) -> Result<()> {
        if !self.paused.load(Ordering::SeqCst) {
            return Err(ProtocolFailure::new(ErrorCode::WrongState, "thread is running").into());
        }
        self.emit(ProtocolEvent::Resumed);
        Ok(())
    }

    fn subscribe_events(&self) -> broadcast::Receiver<ProtocolEvent> {
        self.events.subscribe()
    }
}

struct ReplayBreakpoint {
    actor: String,
    location: BreakpointLocation,
    installed: Arc<Mutex<BTreeSet<BreakpointLocation>>>,
}

#[async_trait]
impl BreakpointHandle for ReplayBreakpoint {
    fn actor(&self) -> &str {
        &self.actor
    }

    async fn remove(&self) -> Result<()> {
        if self.installed.lock().await.remove(&self.location) {
            Ok(())
        } else {
            Err(ProtocolFailure::new(
                ErrorCode::NoSuchActor,
                format!("{} is not installed", self.actor),
            )
            .into())
        }
    }
}

pub struct ReplayTarget {
    client: Arc<ReplayClient>,
}

impl ReplayTarget {
    pub fn new(client: Arc<ReplayClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DebugTarget for ReplayTarget {
    async fn attach_thread(&self) -> Result<Arc<dyn ProtocolClient>> {
        let client: Arc<dyn ProtocolClient> = self.client.clone();
        Ok(client)
    }
}

#[cfg(test)]
#[path = "tests/replay_tests.rs"]
mod tests;
