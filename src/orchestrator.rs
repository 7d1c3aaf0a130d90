//! Pipeline orchestrator for Sift.
//!
//! Runs one request through a fixed sequence: retrieve, summarize, and
//! (when asked) fact-check. Retrieval and summarization errors end the
//! request; fact-check problems only degrade its verdicts.

use crate::config::{Prompts, Settings};
use crate::content_source::{ContentKind, ContentSource, RetrievedContent, Retriever};
use crate::error::{Result, SiftError};
use crate::fact_check::{FactCheckOutcome, FactChecker, Verdict};
use crate::llm::{ChatModel, OpenAIChat};
use crate::search::{SerperSearcher, WebSearcher};
use crate::summary::Summarizer;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// A single analysis request. Only built through [`Request::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Request {
    url: String,
    fact_check: bool,
}

impl Request {
    /// Create a request. The URL is trimmed and must not be empty.
    pub fn new(url: impl AsRef<str>, fact_check: bool) -> Result<Self> {
        let url = url.as_ref().trim();
        if url.is_empty() {
            return Err(SiftError::InvalidInput(
                "Please enter a URL to analyze.".to_string(),
            ));
        }

        Ok(Self {
            url: url.to_string(),
            fact_check,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn fact_check(&self) -> bool {
        self.fact_check
    }
}

/// Describes where the analyzed content came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceInfo {
    pub kind: ContentKind,
    pub url: String,
    pub title: Option<String>,
    /// Whether the content was cut before analysis.
    pub truncated: bool,
}

impl From<&RetrievedContent> for SourceInfo {
    fn from(content: &RetrievedContent) -> Self {
        Self {
            kind: content.kind,
            url: content.url.clone(),
            title: content.title.clone(),
            truncated: content.truncated,
        }
    }
}

/// Result of a successful analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub source: SourceInfo,
    /// 3 to 5 summary bullets.
    pub summary: Vec<String>,
    /// One verdict per checked claim. Always empty when fact-checking was off.
    pub verdicts: Vec<Verdict>,
    /// Whether fact-checking was requested.
    pub fact_checked: bool,
    /// Whether fact-checking was requested but no claims could be extracted.
    #[serde(default)]
    pub claim_extraction_failed: bool,
}

/// The main orchestrator for the Sift pipeline.
pub struct Orchestrator {
    settings: Settings,
    retriever: Retriever,
    summarizer: Summarizer,
    fact_checker: Option<FactChecker>,
}

impl Orchestrator {
    /// Create an orchestrator with the real YouTube, web, LLM and search clients.
    ///
    /// The LLM key is required. Without a search key the orchestrator still
    /// summarizes but rejects fact-check requests.
    pub fn new(settings: Settings) -> Result<Self> {
        settings.require_llm_key()?;

        let retriever = Retriever::new(&settings.retrieval)?;
        let llm: Arc<dyn ChatModel> = Arc::new(OpenAIChat::new(&settings.llm)?);
        info!("Using model {}", settings.llm.model);

        let searcher: Option<Arc<dyn WebSearcher>> = match settings.require_search_key() {
            Ok(_) => Some(Arc::new(SerperSearcher::new(&settings.search)?) as Arc<dyn WebSearcher>),
            Err(e) => {
                warn!("Fact-checking unavailable: {}", e);
                None
            }
        };

        Self::assemble(settings, retriever, llm, searcher)
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        sources: Vec<Arc<dyn ContentSource>>,
        llm: Arc<dyn ChatModel>,
        searcher: Option<Arc<dyn WebSearcher>>,
    ) -> Result<Self> {
        Self::assemble(settings, Retriever::with_sources(sources), llm, searcher)
    }

    fn assemble(
        settings: Settings,
        retriever: Retriever,
        llm: Arc<dyn ChatModel>,
        searcher: Option<Arc<dyn WebSearcher>>,
    ) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let summarizer = Summarizer::new(llm.clone(), prompts.clone(), settings.llm.max_input_chars);

        let fact_checker = searcher.map(|searcher| {
            FactChecker::new(llm, searcher, prompts)
                .with_max_claims(settings.fact_check.max_claims)
                .with_query_suffix(settings.search.query_suffix.clone())
                .with_max_input_chars(settings.llm.max_input_chars)
        });

        Ok(Self {
            settings,
            retriever,
            summarizer,
            fact_checker,
        })
    }

    /// Get the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Get the retriever.
    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    /// Whether fact-check requests can be served.
    pub fn can_fact_check(&self) -> bool {
        self.fact_checker.is_some()
    }

    /// Analyze one URL.
    #[instrument(skip(self), fields(url = %request.url(), fact_check = request.fact_check()))]
    pub async fn handle(&self, request: &Request) -> Result<Response> {
        let fact_checker = match (request.fact_check(), &self.fact_checker) {
            (true, None) => {
                return Err(SiftError::Config(format!(
                    "Fact-checking requires a search API key. Set {}.",
                    crate::config::SEARCH_API_KEY_ENV
                )))
            }
            (true, Some(checker)) => Some(checker),
            (false, _) => None,
        };

        let content = self.retriever.retrieve(request.url()).await?;
        let summary = self.summarizer.summarize(&content).await?;

        let outcome = match fact_checker {
            Some(checker) => checker.run(&content).await,
            None => FactCheckOutcome::default(),
        };
        let verdicts = outcome.verdicts;

        info!(
            "Analysis complete: {} summary points, {} verdicts",
            summary.len(),
            verdicts.len()
        );

        Ok(Response {
            source: SourceInfo::from(&content),
            summary,
            verdicts,
            fact_checked: request.fact_check(),
            claim_extraction_failed: outcome.extraction_failed,
        })
    }
}
