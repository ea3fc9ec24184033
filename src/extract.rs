use anyhow::Result;
use regex::Regex;
use serde_json::Value;

/// Compiled-once recovery patterns, built at startup and passed into the
/// extractor explicitly.
pub struct SitesPattern {
    sites_array: Regex,
    trailing_comma: Regex,
}

impl SitesPattern {
    pub fn new() -> Result<Self> {
        Ok(Self {
            // lazy bracket match: the capture stops at the first `]`, so a
            // nested array inside a site record truncates it early
            sites_array: Regex::new(r#"(?is)"sites"\s*:\s*(\[.*?\])"#)?,
            trailing_comma: Regex::new(r",\s*([\]\}])")?,
        })
    }
}

/// Best-effort recovery of a sites list from unreliable response text.
/// Tries a strict whole-document parse, then a regex capture of
/// `"sites": [...]`, then the same capture with trailing commas stripped.
/// An empty result is not an error.
pub fn extract_sites(patterns: &SitesPattern, text: &str) -> Vec<Value> {
    whole_document(text)
        .or_else(|| regex_recovery(patterns, text))
        .unwrap_or_default()
}

fn whole_document(text: &str) -> Option<Vec<Value>> {
    match serde_json::from_str::<Value>(text).ok()? {
        Value::Object(mut map) => match map.remove("sites") {
            Some(Value::Array(sites)) => Some(sites),
            // wrong shape falls through, the regex may still match inside
            _ => None,
        },
        // degenerate convention: the whole document is the sites list
        Value::Array(items) => Some(items),
        _ => None,
    }
}

fn regex_recovery(patterns: &SitesPattern, text: &str) -> Option<Vec<Value>> {
    let captured = patterns.sites_array.captures(text)?.get(1)?.as_str();
    parse_array(captured).or_else(|| {
        // single textual repair: drop commas dangling before `]` or `}`
        let repaired = patterns.trailing_comma.replace_all(captured, "$1");
        parse_array(&repaired)
    })
}

fn parse_array(text: &str) -> Option<Vec<Value>> {
    match serde_json::from_str::<Value>(text).ok()? {
        Value::Array(items) => Some(items),
        _ => None,
    }
}
