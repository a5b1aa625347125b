//! Utility functions for hostname processing.
//!
//! This module contains the cleaning, scope filtering and deduplication
//! steps of the discovery pipeline, plus small parsing helpers shared with
//! the configuration layer.

use std::collections::HashSet;
use std::time::Duration;

/// Normalize a raw hostname reported by a source.
///
/// Lowercases the name, then drops one leading `*` or `%` and after that one
/// leading `.`. Inputs shorter than two bytes are returned lowercased but
/// otherwise untouched. The length check happens once, before stripping, so
/// `"*."` cleans all the way down to an empty string.
///
/// # Example
///
/// ```rust
/// use assetfinder_lib::clean_hostname;
///
/// assert_eq!(clean_hostname("*.EXAMPLE.com"), "example.com");
/// assert_eq!(clean_hostname("%sub.example.com"), "sub.example.com");
/// assert_eq!(clean_hostname("a"), "a");
/// ```
pub fn clean_hostname(raw: &str) -> String {
    let lowered = raw.to_lowercase();

    // no idea what this is, but we can't clean it
    if lowered.len() < 2 {
        return lowered;
    }

    let host = lowered
        .strip_prefix(|c: char| c == '*' || c == '%')
        .unwrap_or(&lowered);
    let host = host.strip_prefix('.').unwrap_or(host);

    host.to_string()
}

/// Whether `host` is `domain` itself or a subdomain of it.
///
/// The match is label-aware: `notexample.com` is not in scope for
/// `example.com`, `www.example.com` is.
pub fn is_in_scope(host: &str, domain: &str) -> bool {
    host == domain
        || host
            .strip_suffix(domain)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

/// Remove duplicates while keeping the first occurrence of every hostname.
pub fn dedup_preserving_order(hosts: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::with_capacity(hosts.len());
    let mut unique = Vec::with_capacity(hosts.len());

    for host in hosts {
        if seen.insert(host.clone()) {
            unique.push(host);
        }
    }

    unique
}

/// Parse a duration string like "500ms", "5s", "2m" or a bare number of seconds.
pub fn parse_duration(value: &str) -> Option<Duration> {
    let value = value.trim().to_lowercase();

    if let Some(millis) = value.strip_suffix("ms") {
        millis.trim().parse::<u64>().ok().map(Duration::from_millis)
    } else if let Some(secs) = value.strip_suffix('s') {
        secs.trim().parse::<u64>().ok().map(Duration::from_secs)
    } else if let Some(mins) = value.strip_suffix('m') {
        mins.trim()
            .parse::<u64>()
            .ok()
            .map(|m| Duration::from_secs(m * 60))
    } else {
        // Assume seconds if no unit
        value.parse::<u64>().ok().map(Duration::from_secs)
    }
}

/// Split a list of domains into entries, one per line.
///
/// Empty lines and `#` comments (whole-line or trailing) are skipped.
/// Entries are trimmed but otherwise kept as written; case folding happens
/// in the discovery worker.
pub fn parse_domain_list(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| line.split('#').next())
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_hostname_wildcards() {
        assert_eq!(clean_hostname("*.EXAMPLE.com"), "example.com");
        assert_eq!(clean_hostname("%sub.example.com"), "sub.example.com");
        assert_eq!(clean_hostname("%.sub.example.com"), "sub.example.com");
        assert_eq!(clean_hostname(".example.com"), "example.com");
        assert_eq!(clean_hostname("WWW.Example.COM"), "www.example.com");
    }

    #[test]
    fn test_clean_hostname_strips_one_character_per_class() {
        assert_eq!(clean_hostname("**.example.com"), "*.example.com");
        assert_eq!(clean_hostname("..example.com"), ".example.com");
        assert_eq!(clean_hostname("*%example.com"), "%example.com");
    }

    #[test]
    fn test_clean_hostname_short_inputs() {
        assert_eq!(clean_hostname("a"), "a");
        assert_eq!(clean_hostname("*"), "*");
        assert_eq!(clean_hostname("."), ".");
        assert_eq!(clean_hostname(""), "");
        // The length guard runs once, before both strips
        assert_eq!(clean_hostname("*."), "");
        assert_eq!(clean_hostname("**"), "*");
        assert_eq!(clean_hostname(".a"), "a");
    }

    #[test]
    fn test_is_in_scope() {
        assert!(is_in_scope("example.com", "example.com"));
        assert!(is_in_scope("www.example.com", "example.com"));
        assert!(is_in_scope("a.b.example.com", "example.com"));

        assert!(!is_in_scope("notexample.com", "example.com"));
        assert!(!is_in_scope("example.com.evil.net", "example.com"));
        assert!(!is_in_scope("com", "example.com"));
        assert!(!is_in_scope("", "example.com"));
    }

    #[test]
    fn test_dedup_preserving_order() {
        let hosts = vec![
            "b.example.com".to_string(),
            "a.example.com".to_string(),
            "b.example.com".to_string(),
            "c.example.com".to_string(),
            "a.example.com".to_string(),
        ];

        assert_eq!(
            dedup_preserving_order(hosts),
            vec!["b.example.com", "a.example.com", "c.example.com"]
        );
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("5s"), Some(Duration::from_secs(5)));
        assert_eq!(parse_duration("2m"), Some(Duration::from_secs(120)));
        assert_eq!(parse_duration("250ms"), Some(Duration::from_millis(250)));
        assert_eq!(parse_duration(" 7 "), Some(Duration::from_secs(7)));
        assert_eq!(parse_duration("soon"), None);
        assert_eq!(parse_duration(""), None);
    }

    #[test]
    fn test_parse_domain_list() {
        let text = "example.com\n\n# comment\n  Other.org  # trailing\n#\n";
        assert_eq!(parse_domain_list(text), vec!["example.com", "Other.org"]);
    }
}
