//! Pre-flight checks before expensive operations.
//!
//! Validates that required tools and configuration are available
//! before starting operations that would otherwise fail midway.

use crate::config::Settings;
use crate::content_source::ContentKind;
use crate::error::{Result, SiftError};
use std::process::Command;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Analysis needs the LLM key, plus the search key when fact-checking.
    Analyze { fact_check: bool },
    /// The server needs the LLM key; the search key is optional.
    Serve,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(settings: &Settings, operation: Operation) -> Result<()> {
    match operation {
        Operation::Analyze { fact_check } => {
            settings.require_llm_key()?;
            if fact_check {
                settings.require_search_key()?;
            }
        }
        Operation::Serve => {
            settings.require_llm_key()?;
        }
    }
    Ok(())
}

/// Check the external tools a source kind needs.
pub fn check_source(kind: ContentKind) -> Result<()> {
    match kind {
        ContentKind::YouTube => check_tool("yt-dlp"),
        ContentKind::WebPage => Ok(()),
    }
}

/// Check if an external tool is available.
fn check_tool(name: &str) -> Result<()> {
    match Command::new(name).arg("--version").output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(SiftError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(SiftError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(SiftError::ToolNotFound(format!("{}: {}", name, e))),
    }
}
