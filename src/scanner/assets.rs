//! Asset collection: the target page plus every script it references,
//! concatenated into one text corpus for extraction.

use futures::future::join_all;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use url::Url;

use crate::scanner::fetcher::{FetchError, HttpFetch};

static SCRIPT_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("script").expect("static selector"));

/// Script content discovered in a page: inline bodies plus the resolved
/// URLs of externally-referenced scripts.
#[derive(Debug, Default, PartialEq)]
pub struct PageScripts {
    pub inline: Vec<String>,
    pub external: Vec<Url>,
}

/// Parse a page and locate every script element.
///
/// External `src` attributes are resolved against the page URL; a malformed
/// reference is logged and skipped, never fatal.
pub fn parse_scripts(page_url: &Url, html: &str) -> PageScripts {
    let document = Html::parse_document(html);
    let mut scripts = PageScripts::default();

    for element in document.select(&SCRIPT_SELECTOR) {
        match element.value().attr("src") {
            Some(src) => match page_url.join(src) {
                Ok(resolved) => scripts.external.push(resolved),
                Err(e) => {
                    tracing::warn!(src, error = %e, "Skipping malformed script URL");
                }
            },
            None => {
                let body = element.text().collect::<String>();
                if !body.trim().is_empty() {
                    scripts.inline.push(body);
                }
            }
        }
    }

    scripts
}

/// Fetch the target page and build the script corpus.
///
/// Only a failure to retrieve the root page itself aborts collection; a bad
/// or slow external script is dropped from the corpus with a warning.
/// Concatenation order is not significant since extraction over the corpus
/// is order-independent.
pub async fn collect_corpus(
    fetcher: &dyn HttpFetch,
    target_url: &Url,
) -> Result<String, FetchError> {
    let page = fetcher.get(target_url.as_str(), &[]).await?;
    if !page.is_success() {
        return Err(FetchError::Network {
            url: target_url.to_string(),
            reason: format!("unexpected status {}", page.status),
        });
    }

    let PageScripts { inline, external } = parse_scripts(target_url, &page.body);
    tracing::debug!(
        inline = inline.len(),
        external = external.len(),
        "Collected script references"
    );

    let fetches = external.iter().map(|script_url| async move {
        match fetcher.get(script_url.as_str(), &[]).await {
            Ok(response) if response.is_success() => Some(response.body),
            Ok(response) => {
                tracing::warn!(url = %script_url, status = response.status, "Script fetch rejected");
                None
            }
            Err(e) => {
                tracing::warn!(url = %script_url, error = %e, "Script fetch failed");
                None
            }
        }
    });

    let mut corpus: Vec<String> = inline;
    corpus.extend(join_all(fetches).await.into_iter().flatten());
    Ok(corpus.join("\n"))
}
