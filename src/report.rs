//! Markdown rendering of analysis results.

use crate::config::{LLM_API_KEY_ENV, SEARCH_API_KEY_ENV};
use crate::error::SiftError;
use crate::fact_check::Verdict;
use crate::orchestrator::Response;

/// Render a response as markdown.
pub fn render_markdown(response: &Response) -> String {
    let mut out = String::from("## Summary\n\n");
    for bullet in &response.summary {
        out.push_str("- ");
        out.push_str(bullet);
        out.push('\n');
    }

    if !response.verdicts.is_empty() {
        out.push_str("\n## Fact-Check Results\n\n");
        out.push_str("| Claim | Verdict | Confidence | Sources |\n");
        out.push_str("|---|---|---|---|\n");
        for verdict in &response.verdicts {
            out.push_str(&verdict_row(verdict));
            out.push('\n');
        }
    } else if response.claim_extraction_failed {
        out.push_str("\n_Claims could not be extracted from the content, so nothing was fact-checked._\n");
    } else if response.fact_checked {
        out.push_str("\n_No verifiable factual claims were found to fact-check._\n");
    }

    if response.source.truncated {
        out.push_str("\n_Note: the content was long and only its beginning was analyzed._\n");
    }

    out
}

fn verdict_row(verdict: &Verdict) -> String {
    let sources = if verdict.sources.is_empty() {
        "-".to_string()
    } else {
        verdict
            .sources
            .iter()
            .map(|s| {
                let title = if s.title.trim().is_empty() { &s.url } else { &s.title };
                format!("[{}]({})", escape_link_text(title), s.url.replace(' ', "%20"))
            })
            .collect::<Vec<_>>()
            .join("<br>")
    };

    format!(
        "| {} | {} | {} | {} |",
        escape_cell(&verdict.claim.text),
        verdict.label,
        verdict.confidence,
        escape_cell(&sources)
    )
}

/// Make text safe for a table cell.
fn escape_cell(text: &str) -> String {
    text.replace('\n', " ").replace('|', "\\|")
}

fn escape_link_text(text: &str) -> String {
    text.replace('[', "\\[").replace(']', "\\]")
}

/// Render a user-facing error message.
pub fn render_error(error: &SiftError) -> String {
    let mut out = format!("Error processing URL: {}", error);

    let hint = match error {
        SiftError::Config(msg) if msg.contains(SEARCH_API_KEY_ENV) => Some(format!(
            "Get a Serper API key at https://serper.dev and set {}.",
            SEARCH_API_KEY_ENV
        )),
        SiftError::Config(_) => Some(format!(
            "Get an OpenRouter API key at https://openrouter.ai/keys and set {}.",
            LLM_API_KEY_ENV
        )),
        SiftError::ToolNotFound(tool) if tool == "yt-dlp" => {
            Some("Install yt-dlp to analyze YouTube videos: pip install yt-dlp".to_string())
        }
        SiftError::TranscriptUnavailable(_) => {
            Some("The video may have captions disabled. Try a different video.".to_string())
        }
        SiftError::UnsupportedSource(_) => {
            Some("Provide a YouTube link or an http(s) URL of a web article.".to_string())
        }
        _ => None,
    };

    if let Some(hint) = hint {
        out.push_str("\n\n");
        out.push_str(&hint);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content_source::ContentKind;
    use crate::fact_check::{Claim, Confidence, VerdictLabel};
    use crate::orchestrator::SourceInfo;
    use crate::search::SearchResult;

    fn response(verdicts: Vec<Verdict>, fact_checked: bool) -> Response {
        Response {
            source: SourceInfo {
                kind: ContentKind::WebPage,
                url: "https://example.com".to_string(),
                title: None,
                truncated: false,
            },
            summary: vec!["First".to_string(), "Second".to_string(), "Third".to_string()],
            verdicts,
            fact_checked,
            claim_extraction_failed: false,
        }
    }

    #[test]
    fn test_summary_only() {
        let text = render_markdown(&response(Vec::new(), false));
        assert_eq!(text, "## Summary\n\n- First\n- Second\n- Third\n");
        assert!(!text.contains("Fact-Check"));
    }

    #[test]
    fn test_table_rows() {
        let verdicts = vec![
            Verdict {
                claim: Claim::new("Revenue was 5 | 6 billion"),
                label: VerdictLabel::Supported,
                confidence: Confidence::High,
                sources: vec![
                    SearchResult::new("Report [PDF]", "s", "https://a.example/r"),
                    SearchResult::new("", "s", "https://b.example"),
                ],
            },
            Verdict::unverified("Unknown thing"),
        ];

        let text = render_markdown(&response(verdicts, true));
        assert!(text.contains("## Fact-Check Results\n\n| Claim | Verdict | Confidence | Sources |\n|---|---|---|---|\n"));
        assert!(text.contains(
            "| Revenue was 5 \\| 6 billion | Supported | High | [Report \\[PDF\\]](https://a.example/r)<br>[https://b.example](https://b.example) |"
        ));
        assert!(text.contains("| Unknown thing | Unverified | Low | - |"));
        assert_eq!(text.matches("\n| ").count(), 3);
    }

    #[test]
    fn test_fact_check_without_claims_notes_it() {
        let text = render_markdown(&response(Vec::new(), true));
        assert!(text.contains("No verifiable factual claims"));
        assert!(!text.contains("| Claim |"));
    }

    #[test]
    fn test_extraction_failure_not_reported_as_no_claims() {
        let mut failed = response(Vec::new(), true);
        failed.claim_extraction_failed = true;

        let text = render_markdown(&failed);
        assert!(text.contains("Claims could not be extracted"));
        assert!(!text.contains("No verifiable factual claims"));
    }

    #[test]
    fn test_render_error_hints() {
        let text = render_error(&SiftError::Config(format!("{} is not set", LLM_API_KEY_ENV)));
        assert!(text.starts_with("Error processing URL: "));
        assert!(text.contains("openrouter.ai"));

        let text = render_error(&SiftError::Config(format!("{} is not set", SEARCH_API_KEY_ENV)));
        assert!(text.contains("serper.dev"));

        let text = render_error(&SiftError::Fetch("HTTP 404".to_string()));
        assert!(text.contains("HTTP 404"));
        assert!(!text.contains("\n\n"));
    }
}
