use std::{collections::HashMap, fs, path::Path};

use editor_integration::EditorConfig;
use serde::Deserialize;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PanelSettings {
    pub log_filter: String,
    pub event_capacity: usize,
    pub action_queue_capacity: usize,
    pub read_only: bool,
    pub line_numbers: bool,
}

impl Default for PanelSettings {
    fn default() -> Self {
        Self {
            log_filter: "info".into(),
            event_capacity: 256,
            action_queue_capacity: 64,
            read_only: true,
            line_numbers: true,
        }
    }
}

impl PanelSettings {
    pub fn editor_config(&self) -> EditorConfig {
        EditorConfig {
            read_only: self.read_only,
            line_numbers: self.line_numbers,
            ..EditorConfig::default()
        }
    }

    fn set(&mut self, key: &str, value: &str) {
        match key {
            "log_filter" => self.log_filter = value.to_string(),
            "event_capacity" => parse_into(key, value, &mut self.event_capacity),
            "action_queue_capacity" => parse_into(key, value, &mut self.action_queue_capacity),
            "read_only" => parse_into(key, value, &mut self.read_only),
            "line_numbers" => parse_into(key, value, &mut self.line_numbers),
            _ => {}
        }
    }
}

fn parse_into<T: std::str::FromStr>(key: &str, value: &str, slot: &mut T) {
    match value.trim().parse() {
        Ok(parsed) => *slot = parsed,
        Err(_) => warn!(key, value, "ignoring unparsable setting"),
    }
}

/// Defaults, then the flat `path` toml file, then `PANEL__*` environment
/// variables. `RUST_LOG` overrides the log filter last.
pub fn load_settings(path: &Path) -> PanelSettings {
    let mut settings = PanelSettings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        apply_file(&mut settings, &raw);
    }

    apply_env(&mut settings, |name| std::env::var(name).ok());

    settings
}

fn apply_file(settings: &mut PanelSettings, raw: &str) {
    let Ok(file_cfg) = toml::from_str::<HashMap<String, toml::Value>>(raw) else {
        return;
    };
    for (key, value) in &file_cfg {
        match value {
            toml::Value::String(v) => settings.set(key, v),
            other => settings.set(key, &other.to_string()),
        }
    }
}

fn apply_env(settings: &mut PanelSettings, lookup: impl Fn(&str) -> Option<String>) {
    for key in [
        "log_filter",
        "event_capacity",
        "action_queue_capacity",
        "read_only",
        "line_numbers",
    ] {
        if let Some(v) = lookup(&format!("PANEL__{}", key.to_ascii_uppercase())) {
            settings.set(key, &v);
        }
    }
    if let Some(v) = lookup("RUST_LOG") {
        settings.log_filter = v;
    }
}
