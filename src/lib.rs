//! Sift - Summarize and fact-check videos and articles
//!
//! Give Sift a URL and it returns a short bulleted summary of the content
//! behind it, optionally followed by a fact-check of the claims it makes.
//!
//! # Overview
//!
//! Each request runs through a fixed pipeline:
//! - Classify the URL and retrieve its content (YouTube transcript or web page)
//! - Summarize it in 3 to 5 bullet points with a hosted LLM
//! - Optionally extract the main claims and judge each one against web search
//! - Render the result as markdown or JSON
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration and prompt templates
//! - `content_source` - URL classification and content retrieval
//! - `llm` - Chat model abstraction (OpenRouter by default)
//! - `search` - Web search for claim evidence
//! - `summary` - Bullet-point summarization
//! - `fact_check` - Claim extraction and verdicts
//! - `orchestrator` - Pipeline coordination
//! - `report` - Markdown rendering
//!
//! # Example
//!
//! ```rust,no_run
//! use sift::config::Settings;
//! use sift::orchestrator::{Orchestrator, Request};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     let request = Request::new("https://en.wikipedia.org/wiki/Rust_(programming_language)", true)?;
//!     let response = orchestrator.handle(&request).await?;
//!     println!("{}", sift::report::render_markdown(&response));
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod content_source;
pub mod error;
pub mod fact_check;
pub mod llm;
pub mod openai;
pub mod orchestrator;
pub mod report;
pub mod search;
pub mod summary;

pub use error::{Result, SiftError};
