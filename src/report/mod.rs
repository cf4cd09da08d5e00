//! Result reporting
//!
//! Supports two output formats:
//! - `text` - one line per engine, with ANSI emphasis
//! - `json` - pretty-printed array for scripting

mod json;
mod text;

use std::collections::BTreeSet;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(anyhow!("Unknown format '{}'. Valid formats: text, json", s)),
        }
    }
}

impl TryFrom<String> for OutputFormat {
    type Error = anyhow::Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// What one engine found
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineReport {
    pub engine: String,
    pub score: f64,
    /// Ascending vertex ids
    pub vertices: Vec<usize>,
    /// Wall time, present for timed comparison runs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_ms: Option<f64>,
}

impl EngineReport {
    pub fn new(engine: impl Into<String>, score: f64, vertices: &BTreeSet<usize>) -> Self {
        Self {
            engine: engine.into(),
            score,
            vertices: vertices.iter().copied().collect(),
            elapsed_ms: None,
        }
    }

    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed_ms = Some(elapsed.as_secs_f64() * 1000.0);
        self
    }
}

/// Render engine reports in the given format
pub fn render(reports: &[EngineReport], format: OutputFormat, color: bool) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(text::render(reports, color)),
        OutputFormat::Json => json::render(reports),
    }
}
