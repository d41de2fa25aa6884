use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex as StdMutex,
    },
};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use shared::{
    domain::{BreakpointLocation, Source, SourceUrl},
    protocol::{PausePacket, ProtocolEvent, SourceText},
};
use tokio::sync::{broadcast, Mutex, Notify};

use crate::{
    view::PanelView, BreakpointHandle, DebugTarget, ProtocolClient, RenderSurface,
};

pub(crate) struct StubHandle {
    actor: String,
    removals: Arc<Mutex<Vec<String>>>,
    fail_with: Option<String>,
}

#[async_trait]
impl BreakpointHandle for StubHandle {
    fn actor(&self) -> &str {
        &self.actor
    }

    async fn remove(&self) -> Result<()> {
        if let Some(err) = &self.fail_with {
            return Err(anyhow!(err.clone()));
        }
        self.removals.lock().await.push(self.actor.clone());
        Ok(())
    }
}

pub(crate) fn stub_handle(actor: &str) -> Arc<dyn BreakpointHandle> {
    Arc::new(StubHandle {
        actor: actor.to_string(),
        removals: Arc::new(Mutex::new(Vec::new())),
        fail_with: None,
    })
}

pub(crate) struct FakeClient {
    sources: Vec<Source>,
    texts: HashMap<SourceUrl, SourceText>,
    gates: Mutex<HashMap<SourceUrl, Arc<Notify>>>,
    set_gate: Mutex<Option<Arc<Notify>>>,
    echo_controls: bool,
    fail_list: bool,
    fail_set: Option<String>,
    fail_remove: Option<String>,
    next_actor: AtomicUsize,
    pub(crate) fetches: Mutex<Vec<SourceUrl>>,
    pub(crate) set_calls: Mutex<Vec<BreakpointLocation>>,
    pub(crate) removals: Arc<Mutex<Vec<String>>>,
    pub(crate) control_calls: Mutex<Vec<&'static str>>,
    events: broadcast::Sender<ProtocolEvent>,
}

impl FakeClient {
    pub(crate) fn new() -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            sources: Vec::new(),
            texts: HashMap::new(),
            gates: Mutex::new(HashMap::new()),
            set_gate: Mutex::new(None),
            echo_controls: false,
            fail_list: false,
            fail_set: None,
            fail_remove: None,
            next_actor: AtomicUsize::new(1),
            fetches: Mutex::new(Vec::new()),
            set_calls: Mutex::new(Vec::new()),
            removals: Arc::new(Mutex::new(Vec::new())),
            control_calls: Mutex::new(Vec::new()),
            events,
        }
    }

    /// Registers a listed source; its fetch resolves with `text`.
    pub(crate) fn with_source(mut self, url: &str, content_type: &str, text: &str) -> Self {
        self.sources.push(Source::new(url, content_type));
        self.texts.insert(
            SourceUrl::new(url),
            SourceText {
                text: text.to_string(),
                content_type: content_type.to_string(),
            },
        );
        self
    }

    /// Registers a listed source whose fetch fails.
    pub(crate) fn with_broken_source(mut self, url: &str) -> Self {
        self.sources.push(Source::new(url, "text/javascript"));
        self
    }

    pub(crate) fn failing_list(mut self) -> Self {
        self.fail_list = true;
        self
    }

    pub(crate) fn failing_set(mut self, err: &str) -> Self {
        self.fail_set = Some(err.to_string());
        self
    }

    pub(crate) fn failing_remove(mut self, err: &str) -> Self {
        self.fail_remove = Some(err.to_string());
        self
    }

    /// `interrupt`/`resume` emit the matching pause event, as a live thread does.
    pub(crate) fn echoing_controls(mut self) -> Self {
        self.echo_controls = true;
        self
    }

    pub(crate) fn sources(&self) -> Vec<Source> {
        self.sources.clone()
    }

    pub(crate) fn source(&self, url: &str) -> Source {
        self.sources
            .iter()
            .find(|source| source.url.as_str() == url)
            .cloned()
            .expect("registered source")
    }

    /// Holds fetches of `url` until the returned gate is notified.
    pub(crate) async fn gate(&self, url: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates
            .lock()
            .await
            .insert(SourceUrl::new(url), Arc::clone(&gate));
        gate
    }

    /// Holds every `set_breakpoint` call until the returned gate is notified.
    pub(crate) async fn gate_breakpoints(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.set_gate.lock().await = Some(Arc::clone(&gate));
        gate
    }

    pub(crate) fn emit(&self, event: ProtocolEvent) {
        let _ = self.events.send(event);
    }
}

#[async_trait]
impl ProtocolClient for FakeClient {
    async fn list_sources(&self) -> Result<Vec<Source>> {
        if self.fail_list {
            return Err(anyhow!("noSuchActor: thread detached"));
        }
        Ok(self.sources.clone())
    }

    async fn fetch_source_text(&self, source: &Source) -> Result<SourceText> {
        self.fetches.lock().await.push(source.url.clone());
        let gate = self.gates.lock().await.get(&source.url).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.texts
            .get(&source.url)
            .cloned()
            .ok_or_else(|| anyhow!("noSuchSource: {}", source.url))
    }

    async fn set_breakpoint(
        &self,
        location: &BreakpointLocation,
    ) -> Result<Arc<dyn BreakpointHandle>> {
        self.set_calls.lock().await.push(location.clone());
        let gate = self.set_gate.lock().await.clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if let Some(err) = &self.fail_set {
            return Err(anyhow!(err.clone()));
        }
        let id = self.next_actor.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(StubHandle {
            actor: format!("bp-{id}"),
            removals: Arc::clone(&self.removals),
            fail_with: self.fail_remove.clone(),
        }))
    }

    async fn interrupt(&self) -> Result<()> {
        self.control_calls.lock().await.push("interrupt");
        if self.echo_controls {
            self.emit(ProtocolEvent::Paused(PausePacket::interrupted()));
        }
        Ok(())
    }

    async fn resume(&self) -> Result<()> {
        self.control_calls.lock().await.push("resume");
        if self.echo_controls {
            self.emit(ProtocolEvent::Resumed);
        }
        Ok(())
    }

    fn subscribe_events(&self) -> broadcast::Receiver<ProtocolEvent> {
        self.events.subscribe()
    }
}

pub(crate) struct FakeTarget {
    pub(crate) client: Option<Arc<FakeClient>>,
}

#[async_trait]
impl DebugTarget for FakeTarget {
    async fn attach_thread(&self) -> Result<Arc<dyn ProtocolClient>> {
        match &self.client {
            Some(client) => {
                let client: Arc<dyn ProtocolClient> = client.clone();
                Ok(client)
            }
            None => Err(anyhow!("wrongState: thread already attached")),
        }
    }
}

#[derive(Default)]
pub(crate) struct RecordingSurface {
    pub(crate) frames: Vec<PanelView>,
    mirror: Option<Arc<StdMutex<Vec<PanelView>>>>,
}

impl RecordingSurface {
    /// Surface whose frames stay observable while the event loop owns it.
    pub(crate) fn mirrored() -> (Self, Arc<StdMutex<Vec<PanelView>>>) {
        let mirror = Arc::new(StdMutex::new(Vec::new()));
        let surface = Self {
            frames: Vec::new(),
            mirror: Some(Arc::clone(&mirror)),
        };
        (surface, mirror)
    }

    pub(crate) fn last(&self) -> &PanelView {
        self.frames.last().expect("at least one frame")
    }
}

impl RenderSurface for RecordingSurface {
    fn commit(&mut self, view: &PanelView) {
        self.frames.push(view.clone());
        if let Some(mirror) = &self.mirror {
            mirror.lock().expect("mirror lock").push(view.clone());
        }
    }
}
