use crate::decode::{decode_html, declared_charset};
use crate::extract::extractor_for;
use crate::fetch::Fetcher;
use crate::types::FetchOutcome;
use fetcher_logging::fetcher_warn;

/// Runs one URL from fetch through extraction to a terminal outcome. Every
/// failure is captured on the outcome record; nothing escapes to the batch.
/// `elapsed_ms` is stamped by the caller, which owns the dispatch clock.
pub(crate) async fn run_url(
    url: &str,
    fetcher: &dyn Fetcher,
    to_markdown: bool,
    allowed_content_keywords: &[String],
) -> FetchOutcome {
    let mut outcome = FetchOutcome::pending(url);

    let output = match fetcher.fetch(url).await {
        Ok(output) => output,
        Err(err) => {
            fetcher_warn!("fetch failed for {url}: {err}");
            outcome.error = Some(err.to_string());
            return outcome;
        }
    };

    outcome.status_code = Some(output.status);
    outcome.bytes_downloaded = Some(output.bytes.len() as u64);
    // Declared charset first; decoding refines it when the item gets there.
    outcome.charset = output.content_type.as_deref().and_then(declared_charset);

    if !(200..300).contains(&output.status) {
        fetcher_warn!("http status {} for {url}", output.status);
        outcome.error = Some(format!("http status {}", output.status));
        return outcome;
    }

    let content_type = output.content_type.as_deref().unwrap_or("");
    if !content_type_allowed(content_type, allowed_content_keywords) {
        outcome.error = Some(format!("unsupported content type: {content_type}"));
        return outcome;
    }

    let decoded = decode_html(&output.bytes, output.content_type.as_deref());
    outcome.charset = Some(decoded.encoding_label);

    match extractor_for(url, to_markdown).extract(&decoded.html) {
        Ok(content) => {
            outcome.content = Some(content);
            outcome.ok = true;
        }
        Err(err) => {
            fetcher_warn!("extraction failed for {url}: {err}");
            outcome.error = Some(err.to_string());
        }
    }

    outcome
}

/// Keyword allow-list over the Content-Type header. An empty list disables
/// the check; a missing header never matches a keyword.
fn content_type_allowed(content_type: &str, keywords: &[String]) -> bool {
    if keywords.is_empty() {
        return true;
    }
    let lowered = content_type.to_ascii_lowercase();
    keywords.iter().any(|kw| lowered.contains(kw.as_str()))
}
