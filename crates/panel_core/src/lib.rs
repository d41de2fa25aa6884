use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use shared::{
    domain::{BreakpointLocation, Source},
    protocol::{ProtocolEvent, SourceText},
};
use tokio::sync::broadcast;

pub mod action;
pub mod error;
pub mod panel;
pub mod state;
pub mod store;
pub mod surface;
pub mod view;

pub use action::PanelAction;
pub use error::PanelError;
pub use panel::{startup, DebuggerPanel, PanelHandle, PanelOptions, Registration, Teardown};
pub use state::{Breakpoint, BreakpointBook, LoadedSource, SelectedSource, SessionState};
pub use surface::{EditorSurface, RenderSurface};
pub use view::PanelView;

#[async_trait]
pub trait ProtocolClient: Send + Sync {
    async fn list_sources(&self) -> Result<Vec<Source>>;
    async fn fetch_source_text(&self, source: &Source) -> Result<SourceText>;
    async fn set_breakpoint(
        &self,
        location: &BreakpointLocation,
    ) -> Result<Arc<dyn BreakpointHandle>>;
    async fn interrupt(&self) -> Result<()>;
    async fn resume(&self) -> Result<()>;
    fn subscribe_events(&self) -> broadcast::Receiver<ProtocolEvent>;
}

#[async_trait]
pub trait BreakpointHandle: Send + Sync {
    /// Protocol actor backing the breakpoint.
    fn actor(&self) -> &str;
    async fn remove(&self) -> Result<()>;
}

#[async_trait]
pub trait DebugTarget: Send + Sync {
    async fn attach_thread(&self) -> Result<Arc<dyn ProtocolClient>>;
}

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
