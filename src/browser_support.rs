use std::collections::HashMap;
use std::sync::RwLock;

use crate::helpers::version_ge;

/// Minimum versions from which a browser supports a feature; `None` = never.
struct SupportRow {
    name: &'static str,
    webp: Option<&'static str>,
    avif: Option<&'static str>,
    client_hints: Option<&'static str>,
}

const SUPPORT_TABLE: &[SupportRow] = &[
    SupportRow { name: "chrome", webp: Some("32"), avif: Some("85"), client_hints: Some("89") },
    SupportRow { name: "and_chr", webp: Some("32"), avif: Some("85"), client_hints: Some("89") },
    SupportRow { name: "edge", webp: Some("18"), avif: Some("121"), client_hints: Some("89") },
    SupportRow { name: "opera", webp: Some("19"), avif: Some("71"), client_hints: Some("75") },
    SupportRow { name: "samsung", webp: Some("4"), avif: Some("14"), client_hints: Some("15") },
    SupportRow { name: "brave", webp: Some("0"), avif: Some("0"), client_hints: Some("0") },
    SupportRow { name: "firefox", webp: Some("65"), avif: Some("93"), client_hints: None },
    SupportRow { name: "and_ff", webp: Some("68"), avif: Some("113"), client_hints: None },
    SupportRow { name: "safari", webp: Some("14"), avif: Some("16.4"), client_hints: None },
    SupportRow { name: "ios_saf", webp: Some("14"), avif: Some("16"), client_hints: None },
    SupportRow { name: "android", webp: Some("4.2"), avif: None, client_hints: None },
    SupportRow { name: "ie", webp: None, avif: None, client_hints: None },
];

fn row(name: &str) -> Option<&'static SupportRow> {
    SUPPORT_TABLE.iter().find(|r| r.name == name)
}

fn since(min: Option<&str>, version: &str) -> bool {
    match min {
        Some(min) => min == "0" || (!version.is_empty() && version_ge(version, min)),
        None => false,
    }
}

/// `(webp, avif)` support for a canonical browser token and version.
/// Unknown browsers and empty versions support neither.
pub fn format_support(name: &str, version: &str) -> (bool, bool) {
    match row(name) {
        Some(r) => (since(r.webp, version), since(r.avif, version)),
        None => (false, false),
    }
}

/// Whether the browser sends Client Hints when asked to.
pub fn supports_client_hints(name: &str, version: &str) -> bool {
    row(name).map_or(false, |r| since(r.client_hints, version))
}

// ---------------------------------------------------------------------------
// Memo tables
// ---------------------------------------------------------------------------

/// Bounded concurrent memo table. When full, it is cleared wholesale; the
/// values are cheap to recompute, so this only costs a few regex runs.
pub(crate) struct Memo<K, V> {
    entries: RwLock<HashMap<K, V>>,
    limit: usize,
}

impl<K: std::hash::Hash + Eq, V: Copy> Memo<K, V> {
    pub fn new(limit: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            limit,
        }
    }

    pub fn get_or_insert_with(&self, key: K, compute: impl FnOnce() -> V) -> V {
        if let Some(v) = self
            .entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&key)
        {
            return *v;
        }
        let value = compute();
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        if entries.len() >= self.limit {
            entries.clear();
        }
        entries.insert(key, value);
        value
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modern_chrome_supports_both() {
        assert_eq!(format_support("chrome", "119.0"), (true, true));
        assert_eq!(format_support("chrome", "84.0"), (true, false));
        assert_eq!(format_support("chrome", "31.0"), (false, false));
    }

    #[test]
    fn safari_avif_boundary() {
        assert_eq!(format_support("safari", "16.3"), (true, false));
        assert_eq!(format_support("safari", "16.4"), (true, true));
        assert_eq!(format_support("ios_saf", "16.0"), (true, true));
        assert_eq!(format_support("ios_saf", "13.7"), (false, false));
    }

    #[test]
    fn unknown_and_versionless() {
        assert_eq!(format_support("netscape", "4.0"), (false, false));
        assert_eq!(format_support("chrome", ""), (false, false));
        assert_eq!(format_support("brave", ""), (true, true));
        assert_eq!(format_support("ie", "11.0"), (false, false));
    }

    #[test]
    fn client_hints_support() {
        assert!(supports_client_hints("chrome", "119.0"));
        assert!(supports_client_hints("edge", "120"));
        assert!(!supports_client_hints("chrome", "88.0"));
        assert!(!supports_client_hints("firefox", "120.0"));
        assert!(!supports_client_hints("safari", "17.1"));
    }

    #[test]
    fn memo_computes_once_and_stays_bounded() {
        let memo: Memo<String, u32> = Memo::new(2);
        let mut calls = 0;
        assert_eq!(memo.get_or_insert_with("a".into(), || { calls += 1; 1 }), 1);
        assert_eq!(memo.get_or_insert_with("a".into(), || { calls += 1; 99 }), 1);
        assert_eq!(calls, 1);
        memo.get_or_insert_with("b".into(), || 2);
        memo.get_or_insert_with("c".into(), || 3);
        assert!(memo.len() <= 2);
    }
}
