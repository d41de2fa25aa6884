use serde::{Deserialize, Serialize};

use crate::domain::{LineNumber, Source, SourceUrl};

/// Why the debuggee halted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PauseReason {
    Breakpoint,
    Interrupted,
    DebuggerStatement,
    Exception,
    ResumeLimit,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameLocation {
    pub url: SourceUrl,
    pub line: LineNumber,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    #[serde(rename = "where")]
    pub location: FrameLocation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PausePacket {
    pub why: PauseReason,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame: Option<Frame>,
}

impl PausePacket {
    pub fn breakpoint_hit(url: impl Into<String>, line: u32) -> Self {
        Self {
            why: PauseReason::Breakpoint,
            frame: Some(Frame {
                location: FrameLocation {
                    url: SourceUrl::new(url),
                    line: LineNumber(line),
                },
            }),
        }
    }

    pub fn interrupted() -> Self {
        Self {
            why: PauseReason::Interrupted,
            frame: None,
        }
    }

    /// Frame location when the pause was caused by a breakpoint hit.
    pub fn breakpoint_location(&self) -> Option<&FrameLocation> {
        match self.why {
            PauseReason::Breakpoint => self.frame.as_ref().map(|frame| &frame.location),
            _ => None,
        }
    }
}

/// Asynchronous notifications from the protocol client and its target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ProtocolEvent {
    NewSource { source: Source },
    Paused(PausePacket),
    Resumed,
    WillNavigate,
}

/// Result of a successful source-text fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceText {
    pub text: String,
    pub content_type: String,
}
