use std::sync::Arc;

use crate::browser_support::{format_support, Memo};
use crate::error::Result;
use crate::headers::{self, RequestHeaders};
use crate::prefilter::HeaderFamilies;
use crate::types::{FormatSource, FormatSupport};
use crate::ua_parser::UserAgentParser;

use super::{DetectionStrategy, PartialDetection};

const MEMO_LIMIT: usize = 1024;

/// Last-resort format support from the static browser table.
///
/// Only reached when nothing above it settled the formats, e.g. when the
/// user-agent strategy is disabled.
pub struct StaticDataStrategy {
    priority: i32,
    parser: Arc<UserAgentParser>,
    /// `name:version` → (webp, avif).
    memo: Memo<String, (bool, bool)>,
}

impl StaticDataStrategy {
    pub fn new(priority: i32, parser: Arc<UserAgentParser>) -> Self {
        Self {
            priority,
            parser,
            memo: Memo::new(MEMO_LIMIT),
        }
    }
}

impl DetectionStrategy for StaticDataStrategy {
    fn name(&self) -> &'static str {
        "static-data"
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn requires(&self) -> HeaderFamilies {
        HeaderFamilies::USER_AGENT
    }

    fn detect(&self, request: &dyn RequestHeaders) -> Result<Option<PartialDetection>> {
        let ua = match request.first_header(&[headers::USER_AGENT]) {
            Some(ua) => ua,
            None => return Ok(None),
        };
        let browser = match self.parser.parse(ua).browser {
            Some(b) => b,
            None => return Ok(None),
        };
        let key = format!("{}:{}", browser.name, browser.version);
        let (webp, avif) = self
            .memo
            .get_or_insert_with(key, || format_support(&browser.name, &browser.version));

        Ok(Some(PartialDetection {
            formats: Some(FormatSupport {
                webp,
                avif,
                source: FormatSource::StaticData,
            }),
            ..Default::default()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headers::HeaderMap;

    #[test]
    fn formats_only() {
        let s = StaticDataStrategy::new(20, Arc::new(UserAgentParser::new().unwrap()));
        let h = HeaderMap::new().with(
            "User-Agent",
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:109.0) Gecko/20100101 Firefox/118.0",
        );
        let p = s.detect(&h).unwrap().unwrap();
        assert!(p.browser.is_none());
        assert!(p.network.is_none());
        let f = p.formats.unwrap();
        assert!(f.webp && f.avif);
        assert_eq!(f.source, FormatSource::StaticData);

        s.detect(&h).unwrap();
        assert_eq!(s.memo.len(), 1);
    }
}
