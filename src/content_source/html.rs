//! HTML to lightweight markdown conversion.
//!
//! Keeps document structure (headings, lists, paragraphs, links, quotes,
//! preformatted blocks) and drops page chrome and non-content elements.

use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};

/// Elements whose whole subtree is dropped.
const SKIP_TAGS: &[&str] = &[
    "script", "style", "nav", "header", "footer", "noscript", "svg", "iframe", "form",
    "template", "img", "picture", "video", "audio", "canvas", "button", "select",
];

/// Elements that start on their own line.
const LINE_TAGS: &[&str] = &["div", "tr", "dt", "dd", "figcaption", "caption", "address"];

/// Elements separated from their surroundings by a blank line.
const BLOCK_TAGS: &[&str] = &[
    "p", "section", "article", "main", "aside", "table", "figure", "dl", "details", "hr",
];

/// Text extracted from an HTML page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageText {
    /// Contents of `<title>` (or the first `<h1>`).
    pub title: Option<String>,
    /// Markdown rendering of the body.
    pub markdown: String,
}

/// Convert an HTML document to markdown.
pub fn html_to_markdown(html: &str) -> PageText {
    let doc = Html::parse_document(html);

    let title = first_text(&doc, "title").or_else(|| first_text(&doc, "h1"));

    let mut writer = MarkdownWriter::default();
    match Selector::parse("body").ok().and_then(|sel| doc.select(&sel).next()) {
        Some(body) => writer.children(body),
        None => writer.children(doc.root_element()),
    }

    PageText {
        title,
        markdown: writer.finish(),
    }
}

fn first_text(doc: &Html, selector: &str) -> Option<String> {
    let sel = Selector::parse(selector).ok()?;
    let el = doc.select(&sel).next()?;
    let text = collapse_whitespace(&el.text().collect::<String>());
    (!text.is_empty()).then_some(text)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[derive(Debug, Clone, Copy)]
enum ListKind {
    Unordered,
    Ordered(usize),
}

#[derive(Default)]
struct MarkdownWriter {
    out: String,
    lists: Vec<ListKind>,
}

impl MarkdownWriter {
    fn children(&mut self, el: ElementRef<'_>) {
        for child in el.children() {
            match child.value() {
                Node::Text(text) => self.text(text),
                Node::Element(_) => {
                    if let Some(child_el) = ElementRef::wrap(child) {
                        self.element(child_el);
                    }
                }
                _ => {}
            }
        }
    }

    fn element(&mut self, el: ElementRef<'_>) {
        let name = el.value().name();
        if SKIP_TAGS.contains(&name) {
            return;
        }

        match name {
            "br" => self.newline(),
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level = name[1..].parse::<usize>().unwrap_or(1);
                let text = self.inline(el);
                if !text.is_empty() {
                    self.blank_line();
                    self.out.push_str(&"#".repeat(level));
                    self.out.push(' ');
                    self.out.push_str(&text);
                    self.blank_line();
                }
            }
            "ul" | "ol" => {
                let kind = if name == "ol" {
                    ListKind::Ordered(0)
                } else {
                    ListKind::Unordered
                };
                if self.lists.is_empty() {
                    self.blank_line();
                } else {
                    self.newline();
                }
                self.lists.push(kind);
                self.children(el);
                self.lists.pop();
                if self.lists.is_empty() {
                    self.blank_line();
                } else {
                    self.newline();
                }
            }
            "li" => {
                self.newline();
                let depth = self.lists.len().saturating_sub(1);
                let marker = match self.lists.last_mut() {
                    Some(ListKind::Ordered(n)) => {
                        *n += 1;
                        format!("{}. ", n)
                    }
                    _ => "- ".to_string(),
                };
                self.out.push_str(&"  ".repeat(depth));
                self.out.push_str(&marker);
                self.children(el);
                self.newline();
            }
            "blockquote" => {
                let mut inner = MarkdownWriter::default();
                inner.children(el);
                let quoted = inner.finish();
                if !quoted.is_empty() {
                    self.blank_line();
                    let lines: Vec<String> = quoted
                        .lines()
                        .map(|l| if l.is_empty() { ">".to_string() } else { format!("> {}", l) })
                        .collect();
                    self.out.push_str(&lines.join("\n"));
                    self.blank_line();
                }
            }
            "pre" => {
                let code: String = el.text().collect();
                let code = code.trim_matches('\n');
                if !code.trim().is_empty() {
                    self.blank_line();
                    self.out.push_str("```\n");
                    self.out.push_str(code);
                    self.out.push_str("\n```");
                    self.blank_line();
                }
            }
            "code" => {
                let code = collapse_whitespace(&el.text().collect::<String>());
                if !code.is_empty() {
                    self.inline_raw(&format!("`{}`", code));
                }
            }
            "strong" | "b" => self.wrapped(el, "**"),
            "em" | "i" => self.wrapped(el, "_"),
            "a" => {
                let text = self.inline(el);
                if text.is_empty() {
                    return;
                }
                match el.value().attr("href").filter(|h| is_linkable(h)) {
                    Some(href) => self.inline_raw(&format!("[{}]({})", text, href)),
                    None => self.inline_raw(&text),
                }
            }
            "td" | "th" => {
                self.children(el);
                self.inline_raw(" |");
            }
            _ if BLOCK_TAGS.contains(&name) => {
                self.blank_line();
                self.children(el);
                self.blank_line();
            }
            _ if LINE_TAGS.contains(&name) => {
                self.newline();
                self.children(el);
                self.newline();
            }
            _ => self.children(el),
        }
    }

    /// Render an element's children as a single trimmed line.
    fn inline(&self, el: ElementRef<'_>) -> String {
        let mut inner = MarkdownWriter::default();
        inner.children(el);
        collapse_whitespace(&inner.out)
    }

    fn wrapped(&mut self, el: ElementRef<'_>, marker: &str) {
        let text = self.inline(el);
        if !text.is_empty() {
            self.inline_raw(&format!("{}{}{}", marker, text, marker));
        }
    }

    /// Append text from the document, collapsing whitespace runs.
    fn text(&mut self, text: &str) {
        if text.trim().is_empty() {
            if !text.is_empty() && !self.at_word_boundary() {
                self.out.push(' ');
            }
            return;
        }

        if text.starts_with(char::is_whitespace) && !self.at_word_boundary() {
            self.out.push(' ');
        }
        self.out.push_str(&collapse_whitespace(text));
        if text.ends_with(char::is_whitespace) {
            self.out.push(' ');
        }
    }

    /// Append already-formatted inline markdown.
    fn inline_raw(&mut self, text: &str) {
        if let Some(last) = self.out.chars().last() {
            if !last.is_whitespace() && !matches!(last, '(' | '[' | '"' | '\'') {
                self.out.push(' ');
            }
        }
        self.out.push_str(text);
    }

    fn at_word_boundary(&self) -> bool {
        self.out.is_empty() || self.out.ends_with(char::is_whitespace)
    }

    fn trim_trailing_spaces(&mut self) {
        let trimmed = self.out.trim_end_matches([' ', '\t']).len();
        self.out.truncate(trimmed);
    }

    fn newline(&mut self) {
        self.trim_trailing_spaces();
        if !self.out.is_empty() && !self.out.ends_with('\n') {
            self.out.push('\n');
        }
    }

    fn blank_line(&mut self) {
        self.trim_trailing_spaces();
        if self.out.is_empty() || self.out.ends_with("\n\n") {
            return;
        }
        if self.out.ends_with('\n') {
            self.out.push('\n');
        } else {
            self.out.push_str("\n\n");
        }
    }

    fn finish(self) -> String {
        let lines: Vec<&str> = self.out.lines().map(|l| l.trim_end()).collect();
        let joined = lines.join("\n");
        let blank_lines = Regex::new(r"\n{3,}").expect("Invalid regex");
        blank_lines.replace_all(&joined, "\n\n").trim().to_string()
    }
}

fn is_linkable(href: &str) -> bool {
    href.starts_with("http://") || href.starts_with("https://")
}
