use std::sync::Arc;

use futures::{future::BoxFuture, stream::FuturesUnordered, FutureExt, StreamExt};
use shared::{
    domain::{BreakpointLocation, LineNumber, Source, SourceUrl},
    protocol::{ProtocolEvent, SourceText},
};
use tokio::{
    sync::{
        broadcast::{
            self,
            error::{RecvError, TryRecvError},
        },
        mpsc, oneshot,
    },
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::{
    action::{queue_action, Command, PanelAction},
    error::PanelError,
    state::SessionState,
    store::{self, Effect, SelectOptions, Transition},
    surface::{translate_gutter_click, RenderSurface},
    view::project,
    BreakpointHandle, DebugTarget, ProtocolClient,
};

const DEFAULT_ACTION_QUEUE_CAPACITY: usize = 64;

enum Completion {
    SourceFetched {
        generation: u64,
        url: SourceUrl,
        debug_line: Option<LineNumber>,
        result: Result<SourceText, String>,
    },
    BreakpointSet {
        location: BreakpointLocation,
        result: Result<Arc<dyn BreakpointHandle>, String>,
    },
    BreakpointRemoved {
        location: BreakpointLocation,
        result: Result<(), String>,
    },
    ControlSent {
        command: &'static str,
        result: Result<(), String>,
    },
}

pub struct DebuggerPanel<S> {
    client: Arc<dyn ProtocolClient>,
    surface: S,
    state: SessionState,
    in_flight: FuturesUnordered<BoxFuture<'static, Completion>>,
    renders: u64,
}

impl<S: RenderSurface> DebuggerPanel<S> {
    /// Creates a panel around an attached client. `initial` usually comes
    /// from a previous [`Teardown`] so its breakpoints survive; call
    /// [`DebuggerPanel::reset_session`] before use.
    pub fn new(client: Arc<dyn ProtocolClient>, surface: S, initial: SessionState) -> Self {
        Self {
            client,
            surface,
            state: initial,
            in_flight: FuturesUnordered::new(),
            renders: 0,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn render_count(&self) -> u64 {
        self.renders
    }

    pub fn pending_calls(&self) -> usize {
        self.in_flight.len()
    }

    pub fn reset_session(&mut self) {
        self.apply(store::reset_session);
    }

    pub fn sources_listed(&mut self, sources: Vec<Source>) {
        self.apply(|state| store::sources_listed(state, sources));
    }

    pub fn handle_event(&mut self, event: ProtocolEvent) {
        match event {
            ProtocolEvent::NewSource { source } => {
                self.apply(|state| store::source_discovered(state, source))
            }
            ProtocolEvent::Paused(packet) => self.apply(|state| store::paused(state, &packet)),
            ProtocolEvent::Resumed => self.apply(store::resumed),
            ProtocolEvent::WillNavigate => {
                info!("target navigating; starting a new session");
                self.reset_session();
            }
        }
    }

    pub fn handle_action(&mut self, action: PanelAction) {
        match action {
            PanelAction::SelectSource(source) => {
                self.apply(|state| store::select_source(state, source, SelectOptions::default()))
            }
            PanelAction::ToggleBreakpoint(line) => {
                self.apply(|state| store::toggle_breakpoint(state, line))
            }
            PanelAction::GutterClick(click) => {
                if let Some(line) = translate_gutter_click(click) {
                    self.apply(|state| store::toggle_breakpoint(state, line));
                }
            }
            PanelAction::TogglePaused => self.apply(store::toggle_paused),
        }
    }

    pub async fn next_completion(&mut self) -> bool {
        match self.in_flight.next().await {
            Some(completion) => {
                self.complete(completion);
                true
            }
            None => false,
        }
    }

    pub async fn settle(&mut self) {
        while self.next_completion().await {}
    }

    // Events before completions before user actions.
    pub(crate) async fn run(
        mut self,
        mut events: broadcast::Receiver<ProtocolEvent>,
        mut commands: mpsc::Receiver<Command>,
    ) -> Self {
        loop {
            tokio::select! {
                biased;
                event = events.recv() => match event {
                    Ok(event) => self.handle_event(event),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "panel lagged behind protocol events");
                    }
                    Err(RecvError::Closed) => {
                        info!("protocol event stream closed");
                        break;
                    }
                },
                Some(completion) = self.in_flight.next(), if !self.in_flight.is_empty() => {
                    self.complete(completion);
                }
                command = commands.recv() => match command {
                    Some(Command::Action(action)) => self.handle_action(action),
                    Some(Command::Flush(done)) => {
                        self.drain(&mut events).await;
                        let _ = done.send(());
                    }
                    Some(Command::Shutdown) | None => break,
                },
            }
        }
        self
    }

    // Also applies events raised by the settled calls, e.g. the pause after an interrupt.
    async fn drain(&mut self, events: &mut broadcast::Receiver<ProtocolEvent>) {
        loop {
            self.settle().await;
            match events.try_recv() {
                Ok(event) => self.handle_event(event),
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "panel lagged behind protocol events");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
    }

    fn apply(&mut self, transition: impl FnOnce(SessionState) -> Transition) {
        let Transition {
            state,
            effects,
            render,
        } = transition(std::mem::take(&mut self.state));
        self.state = state;
        for effect in effects {
            self.start(effect);
        }
        if render {
            self.render();
        }
    }

    fn render(&mut self) {
        let view = project(&self.state);
        self.surface.commit(&view);
        self.renders += 1;
    }

    fn start(&mut self, effect: Effect) {
        debug!(call = effect.name(), "starting protocol call");
        let client = Arc::clone(&self.client);
        let call = match effect {
            Effect::FetchSource {
                generation,
                source,
                debug_line,
            } => async move {
                let result = client
                    .fetch_source_text(&source)
                    .await
                    .map_err(|err| format!("{err:#}"));
                Completion::SourceFetched {
                    generation,
                    url: source.url,
                    debug_line,
                    result,
                }
            }
            .boxed(),
            Effect::SetBreakpoint { location } => async move {
                let result = client
                    .set_breakpoint(&location)
                    .await
                    .map_err(|err| format!("{err:#}"));
                Completion::BreakpointSet { location, result }
            }
            .boxed(),
            Effect::RemoveBreakpoint { location, handle } => async move {
                let result = handle.remove().await.map_err(|err| format!("{err:#}"));
                Completion::BreakpointRemoved { location, result }
            }
            .boxed(),
            Effect::Interrupt => async move {
                let result = client.interrupt().await.map_err(|err| format!("{err:#}"));
                Completion::ControlSent {
                    command: "interrupt",
                    result,
                }
            }
            .boxed(),
            Effect::Resume => async move {
                let result = client.resume().await.map_err(|err| format!("{err:#}"));
                Completion::ControlSent {
                    command: "resume",
                    result,
                }
            }
            .boxed(),
        };
        self.in_flight.push(call);
    }

    fn complete(&mut self, completion: Completion) {
        match completion {
            Completion::SourceFetched {
                generation,
                url,
                debug_line,
                result,
            } => {
                if let Err(err) = &result {
                    warn!(%url, "source fetch failed: {err}");
                }
                self.apply(|state| store::source_fetched(state, generation, url, debug_line, result));
            }
            Completion::BreakpointSet { location, result } => {
                if let Err(err) = &result {
                    warn!(%location, "failed to set breakpoint: {err}");
                }
                self.apply(|state| store::breakpoint_set(state, location, result));
            }
            Completion::BreakpointRemoved { location, result } => {
                if let Err(err) = &result {
                    warn!(%location, "failed to remove breakpoint: {err}");
                }
                self.apply(|state| store::breakpoint_removed(state, location, result));
            }
            Completion::ControlSent { command, result } => match result {
                Ok(()) => debug!(command, "pause control acknowledged"),
                Err(err) => warn!(command, "pause control failed: {err}"),
            },
        }
    }

    fn teardown(mut self) -> Teardown<S> {
        let mut released = vec![Registration::ProtocolEvents, Registration::UserActions];
        if !self.in_flight.is_empty() {
            released.push(Registration::AbandonedCalls(self.in_flight.len()));
            self.state.breakpoints.abandon_round_trips();
        }
        Teardown {
            state: self.state,
            surface: self.surface,
            released,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    ProtocolEvents,
    UserActions,
    AbandonedCalls(usize),
}

pub struct Teardown<S> {
    /// Final session. Pass it to the next panel to keep its breakpoints.
    pub state: SessionState,
    pub surface: S,
    pub released: Vec<Registration>,
}

#[derive(Debug, Clone)]
pub struct PanelOptions {
    pub action_queue_capacity: usize,
    pub initial_state: SessionState,
}

impl Default for PanelOptions {
    fn default() -> Self {
        Self {
            action_queue_capacity: DEFAULT_ACTION_QUEUE_CAPACITY,
            initial_state: SessionState::default(),
        }
    }
}

pub async fn startup<S>(
    target: &dyn DebugTarget,
    surface: S,
    options: PanelOptions,
) -> Result<PanelHandle<S>, PanelError>
where
    S: RenderSurface + 'static,
{
    let client = target
        .attach_thread()
        .await
        .map_err(|err| PanelError::AttachFailed(format!("{err:#}")))?;

    let events = client.subscribe_events();
    let mut panel = DebuggerPanel::new(Arc::clone(&client), surface, options.initial_state);
    panel.reset_session();

    match client.list_sources().await {
        Ok(sources) => {
            info!(count = sources.len(), "listed sources");
            panel.sources_listed(sources);
        }
        Err(err) => warn!("failed to list sources: {err:#}"),
    }

    let (commands, command_rx) = mpsc::channel(options.action_queue_capacity.max(1));
    let task = tokio::spawn(panel.run(events, command_rx));
    info!("debugger panel started");

    Ok(PanelHandle { commands, task })
}

pub struct PanelHandle<S> {
    commands: mpsc::Sender<Command>,
    task: JoinHandle<DebuggerPanel<S>>,
}

impl<S: RenderSurface + 'static> PanelHandle<S> {
    pub fn dispatch(&self, action: PanelAction) -> Result<(), PanelError> {
        queue_action(&self.commands, action)
    }

    /// Resolves once every action queued before it has been handled and all
    /// protocol calls in flight have completed.
    pub async fn flush(&self) -> Result<(), PanelError> {
        let (done, wait) = oneshot::channel();
        self.commands
            .send(Command::Flush(done))
            .await
            .map_err(|_| PanelError::Disconnected)?;
        wait.await.map_err(|_| PanelError::Disconnected)
    }

    pub async fn shutdown(self) -> Result<Teardown<S>, PanelError> {
        // A closed queue means the loop already stopped on its own.
        let _ = self.commands.send(Command::Shutdown).await;
        let panel = self
            .task
            .await
            .map_err(|err| PanelError::EventLoop(err.to_string()))?;
        info!("debugger panel shut down");
        Ok(panel.teardown())
    }
}

#[cfg(test)]
#[path = "tests/panel_tests.rs"]
mod tests;
