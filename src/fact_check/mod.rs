//! Claim extraction and verification.
//!
//! One model call pulls verifiable claims out of the content. Each claim is
//! then searched for and judged on its own, in order. A failure while
//! checking one claim turns that claim into an `unverified` verdict and
//! never affects the others.

mod claims;
mod verdict;

pub use claims::parse_claims;
pub use verdict::{parse_verdict, VerdictReply};

use crate::config::Prompts;
use crate::content_source::RetrievedContent;
use crate::error::{Result, SiftError};
use crate::llm::{truncate_chars, ChatModel};
use crate::search::{format_results, SearchResult, WebSearcher};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// A verifiable factual assertion taken from the content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Claim {
    pub text: String,
}

impl Claim {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl From<&str> for Claim {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for Claim {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

/// Outcome of checking one claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerdictLabel {
    Supported,
    Contradicted,
    Mixed,
    Unverified,
}

impl VerdictLabel {
    /// Parse a label, ignoring case and surrounding whitespace.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "supported" => Some(Self::Supported),
            "contradicted" => Some(Self::Contradicted),
            "mixed" => Some(Self::Mixed),
            "unverified" => Some(Self::Unverified),
            _ => None,
        }
    }
}

impl std::fmt::Display for VerdictLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Supported => write!(f, "Supported"),
            Self::Contradicted => write!(f, "Contradicted"),
            Self::Mixed => write!(f, "Mixed"),
            Self::Unverified => write!(f, "Unverified"),
        }
    }
}

/// How strongly the evidence backs a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "Low"),
            Self::Medium => write!(f, "Medium"),
            Self::High => write!(f, "High"),
        }
    }
}

/// Verdict for a single claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub claim: Claim,
    pub label: VerdictLabel,
    pub confidence: Confidence,
    /// Search results the verdict relies on.
    pub sources: Vec<SearchResult>,
}

impl Verdict {
    /// Verdict used when a claim could not be checked.
    pub fn unverified(claim: impl Into<Claim>) -> Self {
        Self {
            claim: claim.into(),
            label: VerdictLabel::Unverified,
            confidence: Confidence::Low,
            sources: Vec::new(),
        }
    }
}

/// Verdicts from one fact-check run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FactCheckOutcome {
    pub verdicts: Vec<Verdict>,
    /// Set when no claims could be extracted at all, as opposed to the
    /// content containing none.
    pub extraction_failed: bool,
}

/// Extracts claims from content and checks each one against web search.
pub struct FactChecker {
    llm: Arc<dyn ChatModel>,
    searcher: Arc<dyn WebSearcher>,
    prompts: Prompts,
    max_claims: usize,
    query_suffix: String,
    max_input_chars: usize,
}

impl FactChecker {
    pub fn new(llm: Arc<dyn ChatModel>, searcher: Arc<dyn WebSearcher>, prompts: Prompts) -> Self {
        Self {
            llm,
            searcher,
            prompts,
            max_claims: 5,
            query_suffix: " fact check".to_string(),
            max_input_chars: 24_000,
        }
    }

    /// Set the maximum number of claims checked per request.
    pub fn with_max_claims(mut self, max_claims: usize) -> Self {
        self.max_claims = max_claims;
        self
    }

    /// Set the suffix appended to each claim when searching.
    pub fn with_query_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.query_suffix = suffix.into();
        self
    }

    /// Set the character budget for content embedded in the extraction prompt.
    pub fn with_max_input_chars(mut self, max_input_chars: usize) -> Self {
        self.max_input_chars = max_input_chars;
        self
    }

    /// Extract and check claims. Never fails; problems degrade to fewer or
    /// unverified verdicts.
    pub async fn verify(&self, content: &RetrievedContent) -> Vec<Verdict> {
        self.run(content).await.verdicts
    }

    /// Like [`verify`](Self::verify), but also reports whether claim
    /// extraction itself failed.
    #[instrument(skip(self, content), fields(url = %content.url))]
    pub async fn run(&self, content: &RetrievedContent) -> FactCheckOutcome {
        let claims = match self.extract_claims(content).await {
            Ok(claims) => claims,
            Err(e) => {
                warn!("Claim extraction failed, skipping fact-check: {}", e);
                return FactCheckOutcome {
                    verdicts: Vec::new(),
                    extraction_failed: true,
                };
            }
        };

        info!("Checking {} claims", claims.len());

        let mut verdicts = Vec::with_capacity(claims.len());
        for (i, claim) in claims.iter().enumerate() {
            let verdict = match self.check_claim(claim).await {
                Ok(verdict) => verdict,
                Err(e) => {
                    warn!("Claim {} could not be checked: {}", i + 1, e);
                    Verdict::unverified(claim.clone())
                }
            };
            debug!("Claim {}: {}", i + 1, verdict.label);
            verdicts.push(verdict);
        }

        FactCheckOutcome {
            verdicts,
            extraction_failed: false,
        }
    }

    /// Ask the model for the verifiable claims in the content.
    pub async fn extract_claims(&self, content: &RetrievedContent) -> Result<Vec<Claim>> {
        let document = content.to_prompt_text();
        let (document, _) = truncate_chars(&document, self.max_input_chars);

        let mut vars = HashMap::new();
        vars.insert("max_claims".to_string(), self.max_claims.to_string());
        vars.insert("kind".to_string(), content.kind.describe().to_string());
        vars.insert("content".to_string(), document.to_string());

        let system = self
            .prompts
            .render_with_custom(&self.prompts.claims.system, &vars);
        let user = self.prompts.render_with_custom(&self.prompts.claims.user, &vars);

        let reply = self.llm.complete(&system, &user).await?;
        parse_claims(&reply, self.max_claims)
    }

    /// Search for one claim and ask the model for a verdict.
    pub async fn check_claim(&self, claim: &Claim) -> Result<Verdict> {
        let query = format!("{}{}", claim.text, self.query_suffix);
        let results = self.searcher.search(&query).await?;
        debug!("{} search results for claim", results.len());

        let mut vars = HashMap::new();
        vars.insert("claim".to_string(), claim.text.clone());
        vars.insert("results".to_string(), format_results(&results));

        let system = self
            .prompts
            .render_with_custom(&self.prompts.verdict.system, &vars);
        let user = self
            .prompts
            .render_with_custom(&self.prompts.verdict.user, &vars);

        let reply = self.llm.complete(&system, &user).await?;
        let parsed = parse_verdict(&reply)?;

        let label = VerdictLabel::parse(&parsed.verdict).ok_or_else(|| {
            SiftError::Llm(format!("Unknown verdict label '{}'", parsed.verdict))
        })?;
        let confidence = parsed
            .confidence
            .as_deref()
            .and_then(Confidence::parse)
            .unwrap_or(Confidence::Low);

        Ok(Verdict {
            claim: claim.clone(),
            label,
            confidence,
            sources: parsed.select_sources(&results),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content_source::ContentKind;
    use crate::llm::ScriptedModel;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Searcher returning canned results; queries containing `fail_on` error out.
    struct FakeSearcher {
        fail_on: Option<&'static str>,
        queries: Mutex<Vec<String>>,
    }

    impl FakeSearcher {
        fn new(fail_on: Option<&'static str>) -> Self {
            Self {
                fail_on,
                queries: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl WebSearcher for FakeSearcher {
        async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
            self.queries.lock().unwrap().push(query.to_string());
            if self.fail_on.is_some_and(|needle| query.contains(needle)) {
                return Err(SiftError::SearchProvider("HTTP 500".to_string()));
            }
            Ok(vec![
                SearchResult::new("Encyclopedia", "Confirms it", "https://a.example"),
                SearchResult::new("News", "Also confirms", "https://b.example"),
            ])
        }
    }

    fn content() -> RetrievedContent {
        RetrievedContent {
            kind: ContentKind::WebPage,
            url: "https://example.com/facts".to_string(),
            title: None,
            text: "The Eiffel Tower opened in 1889. Water boils at 100 C.".to_string(),
            metadata: Vec::new(),
            truncated: false,
        }
    }

    #[tokio::test]
    async fn test_one_verdict_per_claim_in_order() {
        let model = Arc::new(
            ScriptedModel::new()
                .reply(r#"["The Eiffel Tower opened in 1889.", "Water boils at 100 C."]"#)
                .reply(r#"{"verdict": "supported", "confidence": "high", "sources": [1, 2]}"#)
                .reply(r#"```json
{"verdict": "Mixed", "confidence": "medium", "sources": [2, 7]}
```"#),
        );
        let searcher = Arc::new(FakeSearcher::new(None));
        let checker = FactChecker::new(model.clone(), searcher.clone(), Prompts::default());

        let verdicts = checker.verify(&content()).await;

        assert_eq!(verdicts.len(), 2);
        assert_eq!(verdicts[0].claim, Claim::new("The Eiffel Tower opened in 1889."));
        assert_eq!(verdicts[0].label, VerdictLabel::Supported);
        assert_eq!(verdicts[0].confidence, Confidence::High);
        assert_eq!(verdicts[0].sources.len(), 2);

        assert_eq!(verdicts[1].label, VerdictLabel::Mixed);
        assert_eq!(verdicts[1].sources.len(), 1);
        assert_eq!(verdicts[1].sources[0].url, "https://b.example");

        let queries = searcher.queries.lock().unwrap().clone();
        assert_eq!(
            queries,
            vec![
                "The Eiffel Tower opened in 1889. fact check",
                "Water boils at 100 C. fact check"
            ]
        );
        assert_eq!(model.calls(), 3);
    }

    #[tokio::test]
    async fn test_search_failure_isolated_to_one_claim() {
        let model = Arc::new(
            ScriptedModel::new()
                .reply(r#"["Claim alpha", "Claim beta"]"#)
                .reply(r#"{"verdict": "contradicted", "confidence": "medium", "sources": [1]}"#),
        );
        let searcher = Arc::new(FakeSearcher::new(Some("alpha")));
        let checker = FactChecker::new(model.clone(), searcher, Prompts::default());

        let verdicts = checker.verify(&content()).await;

        assert_eq!(verdicts.len(), 2);
        assert_eq!(verdicts[0], Verdict::unverified("Claim alpha"));
        assert_eq!(verdicts[1].label, VerdictLabel::Contradicted);
        assert_eq!(verdicts[1].sources.len(), 1);
        // Extraction plus one verdict call; the failed claim never reached the model.
        assert_eq!(model.calls(), 2);
    }

    #[tokio::test]
    async fn test_unknown_label_and_garbage_become_unverified() {
        let model = Arc::new(
            ScriptedModel::new()
                .reply(r#"["One", "Two", "Three"]"#)
                .reply(r#"{"verdict": "probably true", "confidence": "high", "sources": [1]}"#)
                .reply("I cannot decide.")
                .fail("timeout"),
        );
        let checker = FactChecker::new(model, Arc::new(FakeSearcher::new(None)), Prompts::default());

        let verdicts = checker.verify(&content()).await;
        assert_eq!(
            verdicts,
            vec![
                Verdict::unverified("One"),
                Verdict::unverified("Two"),
                Verdict::unverified("Three"),
            ]
        );
    }

    #[tokio::test]
    async fn test_extraction_failure_yields_no_verdicts() {
        let model = Arc::new(ScriptedModel::new().reply("There are several claims here."));
        let searcher = Arc::new(FakeSearcher::new(None));
        let checker = FactChecker::new(model, searcher.clone(), Prompts::default());

        let outcome = checker.run(&content()).await;
        assert!(outcome.verdicts.is_empty());
        assert!(outcome.extraction_failed);
        assert!(searcher.queries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_no_claims_is_not_a_failure() {
        let model = Arc::new(ScriptedModel::new().reply("[]"));
        let checker = FactChecker::new(model, Arc::new(FakeSearcher::new(None)), Prompts::default());

        assert_eq!(checker.run(&content()).await, FactCheckOutcome::default());
    }

    #[tokio::test]
    async fn test_claims_capped_and_prompt_rendered() {
        let model = Arc::new(
            ScriptedModel::new()
                .reply(r#"["A", "B", "C"]"#)
                .reply(r#"{"verdict": "unverified", "confidence": "low", "sources": []}"#)
                .reply(r#"{"verdict": "supported"}"#),
        );
        let checker = FactChecker::new(model.clone(), Arc::new(FakeSearcher::new(None)), Prompts::default())
            .with_max_claims(2)
            .with_query_suffix("");

        let verdicts = checker.verify(&content()).await;
        assert_eq!(verdicts.len(), 2);
        assert_eq!(verdicts[1].label, VerdictLabel::Supported);
        assert_eq!(verdicts[1].confidence, Confidence::Low);
        assert!(verdicts[1].sources.is_empty());

        let prompts = model.prompts();
        assert!(prompts[0].user.contains("up to 2 "));
        assert!(prompts[1].user.contains("Claim: A"));
        assert!(prompts[1].user.contains("[1] Encyclopedia"));
    }

    #[test]
    fn test_label_parsing() {
        assert_eq!(VerdictLabel::parse(" Supported "), Some(VerdictLabel::Supported));
        assert_eq!(VerdictLabel::parse("CONTRADICTED"), Some(VerdictLabel::Contradicted));
        assert_eq!(VerdictLabel::parse("false"), None);
        assert_eq!(Confidence::parse("Medium"), Some(Confidence::Medium));
        assert_eq!(VerdictLabel::Mixed.to_string(), "Mixed");
    }

    #[test]
    fn test_verdict_serializes_lowercase() {
        let json = serde_json::to_value(Verdict::unverified("x")).unwrap();
        assert_eq!(json["label"], "unverified");
        assert_eq!(json["confidence"], "low");
        assert_eq!(json["claim"], "x");
    }
}
