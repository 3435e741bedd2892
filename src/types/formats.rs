use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Avif,
    Webp,
    Jpeg,
    Png,
}

impl ImageFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Avif => "avif",
            Self::Webp => "webp",
            Self::Jpeg => "jpeg",
            Self::Png => "png",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FormatSource {
    AcceptHeader,
    ClientHints,
    UserAgent,
    StaticData,
    Defaults,
}

impl FormatSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AcceptHeader => "accept-header",
            Self::ClientHints => "client-hints",
            Self::UserAgent => "user-agent",
            Self::StaticData => "static-data",
            Self::Defaults => "defaults",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatSupport {
    pub webp: bool,
    pub avif: bool,
    pub source: FormatSource,
}

impl FormatSupport {
    /// AVIF first, then WebP; `None` if neither is supported.
    pub fn best_modern(&self) -> Option<ImageFormat> {
        if self.avif {
            Some(ImageFormat::Avif)
        } else if self.webp {
            Some(ImageFormat::Webp)
        } else {
            None
        }
    }
}
