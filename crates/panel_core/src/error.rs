use thiserror::Error;

#[derive(Debug, Error)]
pub enum PanelError {
    #[error("couldn't attach to thread: {0}")]
    AttachFailed(String),
    #[error("panel action queue is full; retry")]
    QueueFull,
    #[error("panel event loop is not running")]
    Disconnected,
    #[error("panel event loop failed: {0}")]
    EventLoop(String),
}
