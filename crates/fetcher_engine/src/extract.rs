use ego_tree::NodeId;
use scraper::{Html, Selector};
use url::Url;

use crate::convert::{Converter, Html2MdConverter};

/// Scripting and presentation-only nodes, removed for every strategy.
const SCRIPTING: &[&str] = &["script", "style", "noscript"];

/// Page shell elements that rarely carry article content.
const CHROME: &[&str] = &["nav", "footer", "aside", "form", "figure", "header"];

/// MediaWiki scaffolding: edit links, citation markers, reference lists,
/// navboxes and category footers.
const WIKI_CHROME: &[&str] = &[
    ".mw-editsection",
    "sup.reference",
    "ol.references",
    ".reflist",
    ".navbox",
    ".catlinks",
    ".hatnote",
];

const FALLBACK_TITLE: &str = "No Title";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("invalid selector {selector}: {message}")]
    Selector { selector: String, message: String },
}

/// One content-extraction strategy. Selection between strategies happens
/// per item in [`extractor_for`], keyed on the request flag and the URL.
pub trait Extractor: Send + Sync {
    fn extract(&self, html: &str) -> Result<String, ExtractError>;
}

/// Picks the strategy for one URL: plain text when Markdown was not
/// requested, otherwise the encyclopedia profile for Wikipedia hosts and
/// the generic converter for everything else.
pub fn extractor_for(url: &str, to_markdown: bool) -> Box<dyn Extractor> {
    if !to_markdown {
        Box::new(PlainTextExtractor)
    } else if is_encyclopedia_url(url) {
        Box::new(EncyclopediaMarkdownExtractor)
    } else {
        Box::new(GenericMarkdownExtractor)
    }
}

fn is_encyclopedia_url(url: &str) -> bool {
    Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(|h| h.to_ascii_lowercase()))
        .is_some_and(|host| host == "wikipedia.org" || host.ends_with(".wikipedia.org"))
}

/// Visible text only: scripting nodes dropped, whitespace collapsed, one
/// trimmed line per text run.
#[derive(Debug, Default)]
pub struct PlainTextExtractor;

impl Extractor for PlainTextExtractor {
    fn extract(&self, html: &str) -> Result<String, ExtractError> {
        let mut doc = Html::parse_document(html);
        strip_nodes(&mut doc, SCRIPTING)?;

        let mut lines: Vec<String> = Vec::new();
        for text in doc.root_element().text() {
            for line in text.lines() {
                let collapsed = line.split_whitespace().collect::<Vec<_>>().join(" ");
                if !collapsed.is_empty() {
                    lines.push(collapsed);
                }
            }
        }
        Ok(lines.join("\n"))
    }
}

/// Markdown rendering of the whole document, minus scripting nodes and
/// page-shell chrome, with a `# title` heading ensured at the top.
#[derive(Debug, Default)]
pub struct GenericMarkdownExtractor;

impl Extractor for GenericMarkdownExtractor {
    fn extract(&self, html: &str) -> Result<String, ExtractError> {
        let mut doc = Html::parse_document(html);
        let title = document_title(&doc)?;
        strip_nodes(&mut doc, SCRIPTING)?;
        strip_nodes(&mut doc, CHROME)?;

        let markdown = Html2MdConverter.to_markdown(&doc.root_element().html());
        Ok(finish_markdown(markdown, title.as_deref()))
    }
}

/// Wikipedia-article profile: after the generic stripping, also removes
/// MediaWiki scaffolding and converts only the article body subtree,
/// titled from the page heading. Best effort: a page without the expected
/// body container falls back to the generic conversion.
#[derive(Debug, Default)]
pub struct EncyclopediaMarkdownExtractor;

impl Extractor for EncyclopediaMarkdownExtractor {
    fn extract(&self, html: &str) -> Result<String, ExtractError> {
        let mut doc = Html::parse_document(html);
        let page_title = document_title(&doc)?;
        strip_nodes(&mut doc, SCRIPTING)?;
        strip_nodes(&mut doc, CHROME)?;
        strip_nodes(&mut doc, WIKI_CHROME)?;

        let body_sel = parse_selector("div#mw-content-text")?;
        let Some(body) = doc.select(&body_sel).next() else {
            let markdown = Html2MdConverter.to_markdown(&doc.root_element().html());
            return Ok(finish_markdown(markdown, page_title.as_deref()));
        };

        let heading_sel = parse_selector("span.mw-page-title-main")?;
        let title = doc
            .select(&heading_sel)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|t| !t.is_empty())
            .or(page_title);

        let markdown = Html2MdConverter.to_markdown(&body.html());
        Ok(finish_markdown(markdown, title.as_deref()))
    }
}

fn parse_selector(selector: &str) -> Result<Selector, ExtractError> {
    Selector::parse(selector).map_err(|err| ExtractError::Selector {
        selector: selector.to_string(),
        message: err.to_string(),
    })
}

/// Detaches every node matching any of `selectors` from the document tree.
fn strip_nodes(doc: &mut Html, selectors: &[&str]) -> Result<(), ExtractError> {
    for selector in selectors {
        let sel = parse_selector(selector)?;
        let ids: Vec<NodeId> = doc.select(&sel).map(|el| el.id()).collect();
        for id in ids {
            if let Some(mut node) = doc.tree.get_mut(id) {
                node.detach();
            }
        }
    }
    Ok(())
}

fn document_title(doc: &Html) -> Result<Option<String>, ExtractError> {
    let sel = parse_selector("title")?;
    Ok(doc
        .select(&sel)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty()))
}

/// Normalizes line endings, collapses runs of blank lines and makes sure
/// the document opens with a level-one heading.
fn finish_markdown(markdown: String, title: Option<&str>) -> String {
    let normalized = markdown.replace("\r\n", "\n");
    let collapsed = collapse_blank_lines(&normalized);
    let body = collapsed.trim();
    if body.starts_with("# ") {
        body.to_string()
    } else {
        let title = title.unwrap_or(FALLBACK_TITLE);
        format!("# {title}\n\n{body}")
    }
}

fn collapse_blank_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut newlines = 0usize;
    for ch in text.chars() {
        if ch == '\n' {
            newlines += 1;
            if newlines <= 2 {
                out.push(ch);
            }
        } else {
            newlines = 0;
            out.push(ch);
        }
    }
    out
}
