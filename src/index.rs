use std::fs;

use anyhow::{Context, Result};
use log::{info, warn};
use regex::Regex;
use serde_json::Value;

use crate::merge::Fetch;

/// Loose HTTP(S) URL token: scheme, then anything up to whitespace, a quote
/// or a comma. Built once and passed into `resolve_urls`.
pub struct UrlPattern(Regex);

impl UrlPattern {
    pub fn new() -> Result<Self> {
        Ok(Self(Regex::new(r#"https?://[^\s'",]+"#)?))
    }
}

/// Load the index document from a local path or an HTTP(S) URL. Any failure
/// here is fatal for the run.
pub fn load_input(path_or_url: &str, fetcher: &dyn Fetch) -> Result<Value> {
    if is_http_url(path_or_url) {
        info!("fetching index JSON from URL: {path_or_url}");
        let body = fetcher
            .fetch(path_or_url)
            .with_context(|| format!("fetching index {path_or_url}"))?;
        serde_json::from_str(&body).with_context(|| format!("parsing index from {path_or_url}"))
    } else {
        info!("loading index JSON from local file: {path_or_url}");
        let data = fs::read_to_string(path_or_url).with_context(|| format!("reading {path_or_url}"))?;
        serde_json::from_str(&data).with_context(|| format!("parsing {path_or_url}"))
    }
}

fn is_http_url(s: &str) -> bool {
    reqwest::Url::parse(s)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}

/// Derive the fetch targets from the index document. The recognized shape is
/// a top-level `urls` list whose entries are either the URL string itself or
/// an object carrying one of `url`, `Url`, `link` (in that priority order);
/// entries with none of these are skipped. Any other shape falls back to
/// scanning the re-serialized document for URL tokens, which is deliberately
/// fuzzy and may pick up URLs embedded in unrelated string values.
pub fn resolve_urls(index: &Value, pattern: &UrlPattern) -> Vec<String> {
    if let Some(entries) = index.get("urls").and_then(Value::as_array) {
        let mut urls = Vec::new();
        for entry in entries {
            match entry {
                Value::String(s) => urls.push(s.clone()),
                Value::Object(map) => {
                    let found = ["url", "Url", "link"]
                        .iter()
                        .filter_map(|k| map.get(*k).and_then(Value::as_str))
                        .find(|s| !s.is_empty());
                    if let Some(u) = found {
                        urls.push(u.to_string());
                    }
                }
                _ => {}
            }
        }
        urls
    } else {
        warn!("index has no top-level 'urls' list, scanning serialized document for URLs");
        let text = index.to_string();
        pattern
            .0
            .find_iter(&text)
            .map(|m| m.as_str().to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use serde_json::json;
    use std::io::Write;

    fn pattern() -> UrlPattern {
        UrlPattern::new().unwrap()
    }

    struct OneBody(&'static str);

    impl Fetch for OneBody {
        fn fetch(&self, _url: &str) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct AlwaysFails;

    impl Fetch for AlwaysFails {
        fn fetch(&self, url: &str) -> Result<String> {
            Err(anyhow!("connection refused: {url}"))
        }
    }

    #[test]
    fn mixed_entries_resolve_in_order() {
        let index = json!({"urls": [
            "http://x/1",
            {"url": "http://x/2"},
            {"link": "http://x/3"},
            {"nope": "z"},
        ]});
        assert_eq!(
            resolve_urls(&index, &pattern()),
            vec!["http://x/1", "http://x/2", "http://x/3"]
        );
    }

    #[test]
    fn url_key_priority_and_empty_values_fall_through() {
        let index = json!({"urls": [
            {"url": "http://a", "link": "http://b"},
            {"Url": "http://c", "link": "http://d"},
            {"url": "", "link": "http://e"},
        ]});
        assert_eq!(
            resolve_urls(&index, &pattern()),
            vec!["http://a", "http://c", "http://e"]
        );
    }

    #[test]
    fn missing_urls_list_falls_back_to_scanning() {
        let index = json!({"readme": "mirrors at http://m/1 and https://m/2,plus junk"});
        assert_eq!(resolve_urls(&index, &pattern()), vec!["http://m/1", "https://m/2"]);
    }

    #[test]
    fn urls_of_wrong_type_also_falls_back() {
        let index = json!({"urls": "see https://only.example/list"});
        assert_eq!(resolve_urls(&index, &pattern()), vec!["https://only.example/list"]);
    }

    #[test]
    fn fallback_keeps_duplicate_urls() {
        let index = json!(["http://dup/x", "http://dup/x"]);
        assert_eq!(resolve_urls(&index, &pattern()), vec!["http://dup/x", "http://dup/x"]);
    }

    #[test]
    fn load_input_reads_local_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");
        let mut f = fs::File::create(&path).unwrap();
        writeln!(f, r#"{{"urls": ["http://x/1"]}}"#).unwrap();

        let index = load_input(path.to_str().unwrap(), &AlwaysFails).unwrap();
        assert_eq!(index["urls"][0], "http://x/1");
    }

    #[test]
    fn load_input_rejects_invalid_local_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{not json").unwrap();
        assert!(load_input(path.to_str().unwrap(), &AlwaysFails).is_err());
    }

    #[test]
    fn load_input_missing_file_is_an_error() {
        assert!(load_input("no/such/file.json", &AlwaysFails).is_err());
    }

    #[test]
    fn load_input_fetches_http_urls() {
        let index = load_input("https://host/index.json", &OneBody(r#"{"urls": []}"#)).unwrap();
        assert_eq!(index, json!({"urls": []}));
    }

    #[test]
    fn load_input_http_failure_is_an_error() {
        assert!(load_input("http://host/index.json", &AlwaysFails).is_err());
    }
}
