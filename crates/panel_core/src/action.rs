use editor_integration::GutterClick;
use shared::domain::{LineNumber, Source};
use tokio::sync::{
    mpsc::{error::TrySendError, Sender},
    oneshot,
};

use crate::error::PanelError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelAction {
    SelectSource(Source),
    ToggleBreakpoint(LineNumber),
    /// Raw gutter click from the editor widget; translated by the editor view.
    GutterClick(GutterClick),
    TogglePaused,
}

impl PanelAction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SelectSource(_) => "select_source",
            Self::ToggleBreakpoint(_) => "toggle_breakpoint",
            Self::GutterClick(_) => "gutter_click",
            Self::TogglePaused => "toggle_paused",
        }
    }
}

pub(crate) enum Command {
    Action(PanelAction),
    Flush(oneshot::Sender<()>),
    Shutdown,
}

pub(crate) fn queue_action(commands: &Sender<Command>, action: PanelAction) -> Result<(), PanelError> {
    let name = action.name();
    match commands.try_send(Command::Action(action)) {
        Ok(()) => {
            tracing::debug!(action = name, "queued panel action");
            Ok(())
        }
        Err(TrySendError::Full(_)) => Err(PanelError::QueueFull),
        Err(TrySendError::Closed(_)) => Err(PanelError::Disconnected),
    }
}
