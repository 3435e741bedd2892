use crate::error::Result;
use crate::headers::{self, RequestHeaders};
use crate::prefilter::HeaderFamilies;
use crate::types::{FormatSource, FormatSupport};

use super::{DetectionStrategy, PartialDetection};

/// Format support from explicit content negotiation.
pub struct AcceptHeaderStrategy {
    priority: i32,
}

impl AcceptHeaderStrategy {
    pub fn new(priority: i32) -> Self {
        Self { priority }
    }
}

impl DetectionStrategy for AcceptHeaderStrategy {
    fn name(&self) -> &'static str {
        "accept-header"
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn requires(&self) -> HeaderFamilies {
        HeaderFamilies::ACCEPT
    }

    fn detect(&self, request: &dyn RequestHeaders) -> Result<Option<PartialDetection>> {
        let accept = match request.first_header(&[headers::ACCEPT]) {
            Some(a) => a.to_ascii_lowercase(),
            None => return Ok(None),
        };
        // `*/*` alone says nothing about images.
        if !accept.contains("image/") {
            return Ok(None);
        }
        Ok(Some(PartialDetection {
            formats: Some(FormatSupport {
                webp: accept.contains("image/webp"),
                avif: accept.contains("image/avif"),
                source: FormatSource::AcceptHeader,
            }),
            ..Default::default()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headers::HeaderMap;

    fn formats(accept: &str) -> Option<FormatSupport> {
        let h = HeaderMap::new().with("Accept", accept);
        AcceptHeaderStrategy::new(80)
            .detect(&h)
            .unwrap()
            .and_then(|p| p.formats)
    }

    #[test]
    fn webp_only() {
        let f = formats("image/webp,*/*").unwrap();
        assert!(f.webp && !f.avif);
        assert_eq!(f.source, FormatSource::AcceptHeader);
    }

    #[test]
    fn chrome_image_accept() {
        let f = formats("image/avif,image/webp,image/apng,image/svg+xml,image/*,*/*;q=0.8").unwrap();
        assert!(f.webp && f.avif);
    }

    #[test]
    fn image_token_without_modern_formats() {
        let f = formats("image/png,image/*;q=0.8").unwrap();
        assert!(!f.webp && !f.avif);
    }

    #[test]
    fn no_image_token_is_no_opinion() {
        assert!(formats("*/*").is_none());
        assert!(formats("text/html,application/xhtml+xml").is_none());
        assert!(AcceptHeaderStrategy::new(80).detect(&HeaderMap::new()).unwrap().is_none());
    }
}
