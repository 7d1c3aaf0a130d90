//! Analyze command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::{Output, OutputFormat};
use crate::config::Settings;
use crate::orchestrator::{Orchestrator, Request};
use crate::report::{render_error, render_markdown};
use anyhow::Result;

/// Run the analyze command.
pub async fn run_analyze(
    url: &str,
    fact_check: bool,
    format: OutputFormat,
    model: Option<String>,
    mut settings: Settings,
) -> Result<()> {
    if let Some(model) = model {
        settings.llm.model = model;
    }

    let request = match Request::new(url, fact_check) {
        Ok(request) => request,
        Err(e) => {
            Output::error(&render_error(&e));
            return Err(e.into());
        }
    };

    // Pre-flight checks
    if let Err(e) = preflight::check(&settings, Operation::Analyze { fact_check }) {
        Output::error(&render_error(&e));
        Output::info("Run 'sift doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let orchestrator = Orchestrator::new(settings)?;

    let kind = match orchestrator.retriever().classify(request.url()) {
        Ok(kind) => kind,
        Err(e) => {
            Output::error(&render_error(&e));
            return Err(e.into());
        }
    };
    if let Err(e) = preflight::check_source(kind) {
        Output::error(&render_error(&e));
        return Err(e.into());
    }

    let spinner = Output::spinner(&format!(
        "Analyzing {}{}...",
        kind.describe(),
        if fact_check { " and checking claims" } else { "" }
    ));

    let response = match orchestrator.handle(&request).await {
        Ok(response) => {
            spinner.finish_and_clear();
            response
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&render_error(&e));
            return Err(e.into());
        }
    };

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            let title = response.source.title.as_deref().unwrap_or(&response.source.url);
            Output::success(&format!("Analyzed {}: {}", kind, title));
            for verdict in &response.verdicts {
                Output::verdict_line(verdict);
            }
            println!("\n{}", render_markdown(&response));
        }
    }

    Ok(())
}
