use aho_corasick::AhoCorasick;
use fancy_regex::Regex;
use rayon::prelude::*;

use crate::error::Result;
use crate::helpers::expand_version;
use crate::literal::required_prefixes;

/// Needles shorter than this are too common to be worth prefiltering on.
const MIN_PREFIX_LEN: usize = 3;

/// Compile a rule pattern case-insensitively.
pub(crate) fn compile_rule(pattern: &str) -> Result<Regex> {
    Ok(Regex::new(&format!("(?i){}", pattern))?)
}

// ---------------------------------------------------------------------------
// RuleSet: ordered first-match rules with an Aho-Corasick prefilter
// ---------------------------------------------------------------------------

/// Ordered list of regex rules; the first rule that matches wins.
///
/// Each rule's required prefix literals are loaded into one Aho-Corasick
/// automaton. A scan of the input marks which rules can possibly match, and
/// only those (plus rules without usable literals) are run through the regex
/// engine. Skipping is exact: a rule is only skipped when none of the
/// prefixes every match must start with occurs in the input.
pub(crate) struct RuleSet<T> {
    rules: Vec<(Regex, T)>,
    /// Rules that must always be tried.
    always: Vec<bool>,
    prefilter: AhoCorasick,
    /// Maps Aho-Corasick pattern index → rule index.
    needle_owner: Vec<usize>,
}

impl<T: Send> RuleSet<T> {
    pub fn build(items: Vec<(&'static str, T)>) -> Result<Self> {
        let prefixes: Vec<Option<Vec<String>>> = items
            .iter()
            .map(|(pattern, _)| required_prefixes(pattern, MIN_PREFIX_LEN))
            .collect();

        let rules: Vec<(Regex, T)> = items
            .into_par_iter()
            .map(|(pattern, data)| Ok((compile_rule(pattern)?, data)))
            .collect::<Result<Vec<_>>>()?;

        let mut needles: Vec<String> = Vec::new();
        let mut needle_owner: Vec<usize> = Vec::new();
        let mut always = vec![false; rules.len()];
        for (idx, p) in prefixes.into_iter().enumerate() {
            match p {
                Some(lits) => {
                    for lit in lits {
                        needles.push(lit);
                        needle_owner.push(idx);
                    }
                }
                None => always[idx] = true,
            }
        }

        let prefilter = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .build(&needles)?;

        Ok(Self {
            rules,
            always,
            prefilter,
            needle_owner,
        })
    }

    /// First matching rule, in rule order, with its captures.
    pub fn match_first<'a>(&'a self, input: &'a str) -> Option<(&'a T, fancy_regex::Captures<'a>)> {
        let mut candidate = self.always.clone();
        for m in self.prefilter.find_overlapping_iter(input) {
            candidate[self.needle_owner[m.pattern().as_usize()]] = true;
        }

        self.rules
            .iter()
            .zip(candidate)
            .filter(|(_, is_candidate)| *is_candidate)
            .find_map(|((re, data), _)| match re.captures(input) {
                Ok(Some(caps)) => Some((data, caps)),
                _ => None,
            })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }
}

// ---------------------------------------------------------------------------
// User-Agent parser
// ---------------------------------------------------------------------------

pub(crate) struct BrowserRule {
    /// Canonical browser token.
    pub name: &'static str,
    /// Version template over the rule's capture groups.
    pub version: &'static str,
}

/// Browser rules, first match wins. iOS comes first because every iOS browser
/// renders with the system WebKit, so the OS version is what decides format
/// support. Chromium derivatives precede Chrome since their UAs also contain
/// a `Chrome/` token; likewise Chrome precedes Safari.
const BROWSER_RULES: &[(&str, &str, &str)] = &[
    (r"(?:iPhone|iPad|iPod)[^)]*? OS (\d+)_(\d+)", "ios_saf", "$1.$2"),
    (r"SamsungBrowser/(\d+)\.(\d+)", "samsung", "$1.$2"),
    (r"Edg(?:e|A|iOS)?/(\d+)\.(\d+)", "edge", "$1.$2"),
    (r"(?:OPR|Opera)[/ ](\d+)\.(\d+)", "opera", "$1.$2"),
    (r"Brave(?:/(\d+)\.(\d+))?", "brave", "$1.$2"),
    (r"Android.*?Firefox/(\d+)\.(\d+)", "and_ff", "$1.$2"),
    (r"Android.*?Chrome/(\d+)\.(\d+)", "and_chr", "$1.$2"),
    (r"Android (\d+)(?:\.(\d+))?", "android", "$1.$2"),
    (r"(?:Chrome|CriOS)/(\d+)\.(\d+)", "chrome", "$1.$2"),
    (r"(?:Firefox|FxiOS)/(\d+)\.(\d+)", "firefox", "$1.$2"),
    (r"Version/(\d+)\.(\d+)(?:\.\d+)?.*?Safari/", "safari", "$1.$2"),
    (r"MSIE (\d+)\.(\d+)", "ie", "$1.$2"),
    (r"Trident/[\d.]+;.*?rv:(\d+)\.(\d+)", "ie", "$1.$2"),
];

const PLATFORM_RULES: &[(&str, &str)] = &[
    (r"iPhone|iPad|iPod", "iOS"),
    (r"Android", "Android"),
    (r"CrOS", "Chrome OS"),
    (r"Windows", "Windows"),
    (r"Macintosh|Mac OS X", "macOS"),
    (r"Linux|X11", "Linux"),
];

const MOBILE_MARKERS: &str =
    r"Mobi|iPhone|iPod|Android.*Mobile|Opera Mini|IEMobile|BlackBerry|webOS|Windows Phone";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserMatch {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedUserAgent {
    /// `None` when no browser rule matched.
    pub browser: Option<BrowserMatch>,
    pub mobile: bool,
    pub platform: Option<String>,
}

/// Rule-based User-Agent parser shared by the user-agent, static-data and
/// client-hints strategies.
pub struct UserAgentParser {
    mobile: Regex,
    browsers: RuleSet<BrowserRule>,
    platforms: RuleSet<&'static str>,
}

impl UserAgentParser {
    pub fn new() -> Result<Self> {
        let (browsers, platforms) = rayon::join(
            || {
                RuleSet::build(
                    BROWSER_RULES
                        .iter()
                        .map(|&(pattern, name, version)| (pattern, BrowserRule { name, version }))
                        .collect(),
                )
            },
            || RuleSet::build(PLATFORM_RULES.to_vec()),
        );
        Ok(Self {
            mobile: compile_rule(MOBILE_MARKERS)?,
            browsers: browsers?,
            platforms: platforms?,
        })
    }

    pub fn parse(&self, ua: &str) -> ParsedUserAgent {
        let mobile = self.mobile.is_match(ua).unwrap_or(false);
        let platform = self
            .platforms
            .match_first(ua)
            .map(|(name, _)| name.to_string());
        let browser = self.browsers.match_first(ua).map(|(rule, caps)| BrowserMatch {
            name: rule.name.to_string(),
            version: expand_version(rule.version, &caps),
        });
        ParsedUserAgent {
            browser,
            mobile,
            platform,
        }
    }

    pub fn rule_count(&self) -> usize {
        self.browsers.len() + self.platforms.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHROME_WIN: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36";
    const SAFARI_IPHONE: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_1 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Mobile/15E148 Safari/604.1";
    const CHROME_ANDROID: &str = "Mozilla/5.0 (Linux; Android 13; Pixel 7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/118.0.5993.111 Mobile Safari/537.36";
    const EDGE: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edg/120.0.2210.61";
    const FIREFOX_MAC: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:109.0) Gecko/20100101 Firefox/118.0";
    const IE11: &str = "Mozilla/5.0 (Windows NT 10.0; WOW64; Trident/7.0; rv:11.0) like Gecko";

    fn parser() -> UserAgentParser {
        UserAgentParser::new().unwrap()
    }

    fn browser(ua: &str) -> (String, String) {
        let b = parser().parse(ua).browser.unwrap();
        (b.name, b.version)
    }

    #[test]
    fn desktop_chrome() {
        let p = parser().parse(CHROME_WIN);
        assert_eq!(
            p.browser,
            Some(BrowserMatch {
                name: "chrome".into(),
                version: "119.0".into()
            })
        );
        assert!(!p.mobile);
        assert_eq!(p.platform.as_deref(), Some("Windows"));
    }

    #[test]
    fn ios_uses_os_version() {
        let p = parser().parse(SAFARI_IPHONE);
        assert_eq!(p.browser.unwrap().name, "ios_saf");
        assert!(p.mobile);
        assert_eq!(p.platform.as_deref(), Some("iOS"));
        assert_eq!(browser(SAFARI_IPHONE).1, "17.1");
    }

    #[test]
    fn derivatives_before_chrome() {
        assert_eq!(browser(EDGE), ("edge".into(), "120.0".into()));
        assert_eq!(browser(CHROME_ANDROID), ("and_chr".into(), "118.0".into()));
        assert_eq!(browser(FIREFOX_MAC), ("firefox".into(), "118.0".into()));
        assert_eq!(browser(IE11), ("ie".into(), "11.0".into()));
    }

    #[test]
    fn android_is_mobile_only_with_marker() {
        assert!(parser().parse(CHROME_ANDROID).mobile);
        let tablet = "Mozilla/5.0 (Linux; Android 13; SM-X700) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/118.0.0.0 Safari/537.36";
        assert!(!parser().parse(tablet).mobile);
    }

    #[test]
    fn unknown_agent() {
        let p = parser().parse("curl/8.4.0");
        assert_eq!(p.browser, None);
        assert!(!p.mobile);
        assert_eq!(p.platform, None);
    }

    #[test]
    fn prefilter_keeps_rule_order() {
        let set = RuleSet::build(vec![(r"Foo/(\d+)", 1), (r".*Bar", 2), (r"Foo", 3)]).unwrap();
        assert_eq!(*set.match_first("xx Foo/1 Bar").unwrap().0, 1);
        assert_eq!(*set.match_first("xx Bar").unwrap().0, 2);
        assert_eq!(*set.match_first("xx foo").unwrap().0, 3);
        assert!(set.match_first("nothing").is_none());
    }
}
