use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkTier {
    Slow,
    Medium,
    Fast,
}

impl NetworkTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Slow => "slow",
            Self::Medium => "medium",
            Self::Fast => "fast",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkQuality {
    pub tier: NetworkTier,
    pub description: Option<String>,
    /// True when the tier was guessed rather than measured.
    pub estimated: bool,
}

impl NetworkQuality {
    pub fn estimated(tier: NetworkTier, description: &str) -> Self {
        Self {
            tier,
            description: Some(description.to_string()),
            estimated: true,
        }
    }

    pub fn measured(tier: NetworkTier, description: &str) -> Self {
        Self {
            tier,
            description: Some(description.to_string()),
            estimated: false,
        }
    }
}
