//! Prompt templates for Sift.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub summary: SummaryPrompts,
    pub claims: ClaimPrompts,
    pub verdict: VerdictPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: std::collections::HashMap<String, String>,
}

/// Prompts for the summarization step.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryPrompts {
    pub system: String,
    pub user: String,
}

impl Default for SummaryPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are a careful analyst who writes short, faithful summaries of videos and articles.

Guidelines:
- Use only information present in the provided content
- Cover the main topic or thesis, the key arguments or information, and the important conclusions
- Each point is a single sentence
- Do not add opinions, caveats, or information from outside the content"#
                .to_string(),

            user: r#"Summarize the following {{kind}} in 3 to 5 bullet points.

Source: {{url}}

Content:
{{content}}

Respond with the bullet points only, one per line, each starting with "- "."#
                .to_string(),
        }
    }
}

/// Prompts for claim extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClaimPrompts {
    pub system: String,
    pub user: String,
}

impl Default for ClaimPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are a fact-checking assistant. You identify discrete factual assertions that can be checked against public sources.

A verifiable claim:
- States a concrete fact (a number, date, event, attribution, or measurable outcome)
- Is self-contained and understandable without the surrounding text
- Is not an opinion, prediction, joke, or rhetorical question

Output a JSON array of strings."#
                .to_string(),

            user: r#"Identify up to {{max_claims}} of the most important verifiable factual claims in the following {{kind}}.

Content:
{{content}}

Respond with a JSON array of claim strings, most important first. Example:
["The Eiffel Tower was completed in 1889.", "The company reported revenue of $4.2 billion in 2023."]

If the content makes no verifiable claims, respond with []."#
                .to_string(),
        }
    }
}

/// Prompts for assigning a verdict to one claim.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VerdictPrompts {
    pub system: String,
    pub user: String,
}

impl Default for VerdictPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are a fact-checker. You judge a single claim using only the search results provided.

Verdicts:
- "supported": the results confirm the claim
- "contradicted": the results refute the claim
- "mixed": the results partly confirm and partly refute the claim, or reliable sources disagree
- "unverified": the results do not contain enough information to judge

Confidence is "low", "medium", or "high".

Output a single JSON object."#
                .to_string(),

            user: r#"Claim: {{claim}}

Search results:
{{results}}

Respond with a JSON object of the form:
{"verdict": "supported", "confidence": "high", "sources": [1, 3]}

"sources" lists the numbers of the search results you relied on."#
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&std::collections::HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let summary_path = custom_path.join("summary.toml");
            if summary_path.exists() {
                let content = std::fs::read_to_string(&summary_path)?;
                prompts.summary = toml::from_str(&content)?;
            }

            let claims_path = custom_path.join("claims.toml");
            if claims_path.exists() {
                let content = std::fs::read_to_string(&claims_path)?;
                prompts.claims = toml::from_str(&content)?;
            }

            let verdict_path = custom_path.join("verdict.toml");
            if verdict_path.exists() {
                let content = std::fs::read_to_string(&verdict_path)?;
                prompts.verdict = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    ///
    /// Placeholders are filled in one pass over the template, so `{{...}}`
    /// inside a substituted value stays as-is. Unknown placeholders are kept.
    pub fn render(template: &str, vars: &std::collections::HashMap<String, String>) -> String {
        let placeholder = Regex::new(r"\{\{(\w+)\}\}").expect("Invalid regex");
        placeholder
            .replace_all(template, |caps: &Captures| match vars.get(&caps[1]) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(
        &self,
        template: &str,
        vars: &std::collections::HashMap<String, String>,
    ) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        assert!(prompts.summary.user.contains("{{content}}"));
        assert!(prompts.claims.user.contains("{{max_claims}}"));
        assert!(prompts.verdict.user.contains("{{claim}}"));
        assert!(prompts.verdict.user.contains("{{results}}"));
    }

    #[test]
    fn test_render_template() {
        let template = "Hello {{name}}, you have {{count}} messages.";
        let mut vars = HashMap::new();
        vars.insert("name".to_string(), "Alice".to_string());
        vars.insert("count".to_string(), "5".to_string());

        let result = Prompts::render(template, &vars);
        assert_eq!(result, "Hello Alice, you have 5 messages.");
    }

    #[test]
    fn test_render_does_not_expand_inside_values() {
        let template = "Claim: {{claim}}\nEvidence:\n{{results}}\nKeep {{unknown}}.";
        let mut vars = HashMap::new();
        vars.insert("claim".to_string(), "Quoted {{results}} text".to_string());
        vars.insert("results".to_string(), "[1] Snippet about {{claim}}".to_string());

        let result = Prompts::render(template, &vars);
        assert_eq!(
            result,
            "Claim: Quoted {{results}} text\nEvidence:\n[1] Snippet about {{claim}}\nKeep {{unknown}}."
        );
    }

    #[test]
    fn test_provided_vars_override_custom() {
        let mut custom = HashMap::new();
        custom.insert("audience".to_string(), "students".to_string());
        custom.insert("kind".to_string(), "custom".to_string());
        let prompts = Prompts::load(None, Some(&custom)).unwrap();

        let mut vars = HashMap::new();
        vars.insert("kind".to_string(), "article".to_string());
        let rendered = prompts.render_with_custom("{{kind}} for {{audience}}", &vars);
        assert_eq!(rendered, "article for students");
    }

    #[test]
    fn test_custom_dir_overrides_one_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("summary.toml"),
            "system = \"Be brief.\"\nuser = \"Summarize {{content}}\"\n",
        )
        .unwrap();

        let prompts = Prompts::load(dir.path().to_str(), None).unwrap();
        assert_eq!(prompts.summary.system, "Be brief.");
        assert_eq!(prompts.claims.system, ClaimPrompts::default().system);
    }
}
