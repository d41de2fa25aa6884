use std::fmt;

use serde::{Deserialize, Serialize};

/// URL of a script known to the debuggee. Identity of a [`Source`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceUrl(pub String);

impl SourceUrl {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short label for list entries: the last non-empty path segment, or the
    /// raw URL when it does not parse or has no path.
    pub fn display_name(&self) -> String {
        url::Url::parse(&self.0)
            .ok()
            .and_then(|parsed| {
                parsed
                    .path_segments()
                    .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
                    .map(str::to_owned)
            })
            .unwrap_or_else(|| self.0.clone())
    }
}

impl fmt::Display for SourceUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SourceUrl {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// One-based line number, the convention used by the debugging protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineNumber(pub u32);

impl LineNumber {
    /// Converts a zero-based editor line into a protocol line.
    pub fn from_zero_based(line: u32) -> Self {
        Self(line.saturating_add(1))
    }

    /// Zero-based index for editor widgets. Line 0 is not a valid protocol
    /// line and clamps to the first row.
    pub fn zero_based(self) -> u32 {
        self.0.saturating_sub(1)
    }
}

impl fmt::Display for LineNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub url: SourceUrl,
    pub content_type: String,
}

impl Source {
    pub fn new(url: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self {
            url: SourceUrl::new(url),
            content_type: content_type.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BreakpointLocation {
    pub url: SourceUrl,
    pub line: LineNumber,
}

impl BreakpointLocation {
    pub fn new(url: SourceUrl, line: LineNumber) -> Self {
        Self { url, line }
    }
}

impl fmt::Display for BreakpointLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.url, self.line)
    }
}
