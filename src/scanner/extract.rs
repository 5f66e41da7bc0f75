//! Credential and path extraction over the collected script corpus.
//!
//! Pure pattern matching, no I/O. First match wins for both the base URL
//! and the token: if a page references several backends only the first is
//! scanned. Known limitation, kept deliberately since downstream probing
//! assumes exactly one backend.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

static BASE_URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"https://[a-zA-Z0-9-]+\.supabase\.co").expect("static regex"));

// Compact JWT: three dot-separated segments, header starting with `eyJ`
// (base64 of `{"`).
static TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"eyJ[A-Za-z0-9_-]*\.[A-Za-z0-9_-]+\.[A-Za-z0-9_-]+").expect("static regex")
});

static CLIENT_PATH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"path:\s*["']([^"']+)["']"#).expect("static regex"));

/// Everything the extractor pulled out of one corpus.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub base_url: Option<String>,
    pub token: Option<String>,
    /// Resource path literals declared in client code. These may not map to
    /// backend-exposed resources at all; they are reported, never probed.
    pub client_declared_paths: BTreeSet<String>,
}

/// Run all pattern searches over the corpus.
pub fn extract(corpus: &str) -> Extraction {
    let base_url = BASE_URL_RE.find(corpus).map(|m| m.as_str().to_string());
    let token = TOKEN_RE.find(corpus).map(|m| m.as_str().to_string());
    let client_declared_paths = CLIENT_PATH_RE
        .captures_iter(corpus)
        .map(|c| c[1].to_string())
        .collect();

    Extraction {
        base_url,
        token,
        client_declared_paths,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_url_and_token_from_bundle() {
        let corpus =
            "const SUPABASE_URL='https://abcd1234.supabase.co'; const KEY='eyJabc.def.ghi'";
        let extraction = extract(corpus);
        assert_eq!(
            extraction.base_url.as_deref(),
            Some("https://abcd1234.supabase.co")
        );
        assert_eq!(extraction.token.as_deref(), Some("eyJabc.def.ghi"));
    }

    #[test]
    fn first_base_url_wins() {
        let corpus = "https://first000.supabase.co and https://second00.supabase.co";
        let extraction = extract(corpus);
        assert_eq!(
            extraction.base_url.as_deref(),
            Some("https://first000.supabase.co")
        );
    }

    #[test]
    fn token_requires_three_segments() {
        let extraction = extract("const KEY='eyJonly.two'");
        assert_eq!(extraction.token, None);
    }

    #[test]
    fn empty_corpus_yields_nothing() {
        let extraction = extract("");
        assert_eq!(extraction.base_url, None);
        assert_eq!(extraction.token, None);
        assert!(extraction.client_declared_paths.is_empty());
    }

    #[test]
    fn client_paths_are_collected_and_deduplicated() {
        let corpus = r#"
            route({ path: "users", component: Users });
            route({ path: 'orders', component: Orders });
            route({ path: "users", component: UsersAgain });
        "#;
        let extraction = extract(corpus);
        let expected: BTreeSet<String> =
            ["users".to_string(), "orders".to_string()].into_iter().collect();
        assert_eq!(extraction.client_declared_paths, expected);
    }

    #[test]
    fn extraction_is_idempotent() {
        let corpus = r#"
            const SUPABASE_URL = 'https://abcd1234.supabase.co';
            const KEY = 'eyJhbGciOiJIUzI1NiJ9.eyJyb2xlIjoiYW5vbiJ9.sig';
            router.add({ path: "profiles" });
        "#;
        assert_eq!(extract(corpus), extract(corpus));
    }
}
