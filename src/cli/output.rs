use std::io::IsTerminal;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    /// `--json` wins, then `--format`, then the configured default.
    pub fn resolve(json_flag: bool, format_flag: Option<&str>, configured: &str) -> Self {
        if json_flag {
            return Self::Json;
        }
        match format_flag.unwrap_or(configured) {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OutputOptions {
    pub format: OutputFormat,
    pub pretty: bool,
    pub use_color: bool,
    pub verbose: bool,
}

impl OutputOptions {
    pub fn to_json<T: Serialize>(&self, value: &T) -> serde_json::Result<String> {
        if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        }
    }
}

/// `color_flag` is false when `--no-color` was given; `mode` is the
/// configured `auto|always|never`.
pub fn detect_color(color_flag: bool, mode: &str) -> bool {
    if !color_flag {
        return false;
    }
    match mode {
        "always" => true,
        "never" => false,
        _ => std::env::var_os("NO_COLOR").is_none() && std::io::stdout().is_terminal(),
    }
}

/// Terminal width in columns, 80 when stdout is not a terminal.
pub fn terminal_width() -> usize {
    crossterm::terminal::size()
        .map(|(cols, _)| cols as usize)
        .unwrap_or(80)
}
